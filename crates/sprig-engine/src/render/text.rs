use crate::coords::Color;
use crate::device::RenderDevice;
use crate::error::RenderError;
use crate::text::Font;

use super::renderer::Renderer;

impl<D: RenderDevice> Renderer<D> {
    /// Draws `text` with its top-left at `(x, y)`, one sprite per glyph.
    ///
    /// All glyphs come from the font's atlas, so a run of text batches into a
    /// single draw unless other textures are interleaved.
    pub fn draw_text(
        &mut self,
        font: &Font<D>,
        text: &str,
        x: f32,
        y: f32,
        tint: Color,
    ) -> Result<(), RenderError> {
        for quad in font.layout(text, x, y) {
            self.draw_sprite(font.atlas(), quad.src, quad.dst, tint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::testing::{test_config, test_renderer, MockDevice, TEST_FONT};

    #[test]
    fn text_batches_against_the_atlas() {
        let (mut r, _) = test_renderer(MockDevice::new(800, 600), test_config());
        let font = r.create_font(TEST_FONT, 16.0).unwrap();

        r.begin_frame(Color::BLACK).unwrap();
        r.draw_text(&font, "Hi there", 10.0, 10.0, Color::WHITE).unwrap();
        let stats = r.end_frame(true).unwrap();

        // The space only advances the pen.
        assert_eq!(stats, crate::render::FrameStats { draw_calls: 1, sprites: 7 });
        let draw = &r.device().draws[0];
        assert_eq!(draw.texture, font.atlas().raw().id);
        assert_eq!(draw.constants.texture_size, [512.0, 512.0]);

        let atlas = font.atlas().bounds();
        for instance in &draw.instances {
            let [x, y, w, h] = instance.src;
            assert!(atlas.contains_rect(Rect::new(x, y, w, h)));
            assert!(instance.dst[0] >= 10.0 - font.pixel_size());
        }
    }

    #[test]
    fn text_between_sprites_keeps_order() {
        let (mut r, _) = test_renderer(MockDevice::new(800, 600), test_config());
        let font = r.create_font(TEST_FONT, 16.0).unwrap();

        r.begin_frame(Color::BLACK).unwrap();
        r.draw_rect(Rect::new(0.0, 0.0, 100.0, 20.0), Color::BLACK).unwrap();
        r.draw_text(&font, "ab", 0.0, 0.0, Color::WHITE).unwrap();
        r.draw_rect(Rect::new(0.0, 20.0, 100.0, 20.0), Color::BLACK).unwrap();
        r.end_frame(true).unwrap();

        assert_eq!(r.device().draw_sizes(), [1, 2, 1]);
    }
}
