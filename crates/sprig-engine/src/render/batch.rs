use std::sync::Arc;

use crate::coords::{Color, Rect};
use crate::device::RenderDevice;
use crate::error::RenderError;
use crate::resource::TextureHandle;

use super::common::{ShaderConstants, SpriteInstance};
use super::renderer::Renderer;

/// One queued sprite: texel source rect, pixel destination rect, tint.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteDrawCmd {
    pub src: Rect,
    pub dst: Rect,
    pub tint: Color,
}

/// The open batch. All commands share `texture`; no texture means no commands.
pub(crate) struct SpriteBatch<D: RenderDevice> {
    texture: Option<TextureHandle<D>>,
    commands: Vec<SpriteDrawCmd>,
    capacity: usize,
}

/// A batch that is ready to draw: it has a texture and at least one command.
pub(crate) struct ClosedBatch<'a, D: RenderDevice> {
    pub texture: &'a TextureHandle<D>,
    pub commands: &'a [SpriteDrawCmd],
}

impl<D: RenderDevice> SpriteBatch<D> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            texture: None,
            commands: Vec::new(),
            capacity,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queuing a sprite of `texture` requires flushing first.
    pub(crate) fn needs_flush(&self, texture: &TextureHandle<D>) -> bool {
        let other_texture = self
            .texture
            .as_ref()
            .is_some_and(|t| !Arc::ptr_eq(t, texture));
        other_texture || self.commands.len() >= self.capacity
    }

    pub(crate) fn push(&mut self, texture: &TextureHandle<D>, cmd: SpriteDrawCmd) {
        debug_assert!(!self.needs_flush(texture));
        if self.texture.is_none() {
            self.texture = Some(Arc::clone(texture));
        }
        self.commands.push(cmd);
    }

    pub(crate) fn closed(&self) -> Option<ClosedBatch<'_, D>> {
        match &self.texture {
            Some(texture) if !self.commands.is_empty() => Some(ClosedBatch {
                texture,
                commands: &self.commands,
            }),
            _ => None,
        }
    }

    /// Empties the batch and releases its texture reference.
    pub(crate) fn reset(&mut self) {
        self.texture = None;
        self.commands.clear();
    }
}

impl<D: RenderDevice> Renderer<D> {
    /// Queues a sprite. `src` is in texels of `texture`, `dst` in window pixels.
    ///
    /// Flushes the open batch first if it uses a different texture or is full,
    /// so sprites are drawn in submission order.
    pub fn draw_sprite(
        &mut self,
        texture: &TextureHandle<D>,
        src: Rect,
        dst: Rect,
        tint: Color,
    ) -> Result<(), RenderError> {
        if !self.frame_open {
            return Err(RenderError::NoFrameInProgress);
        }
        if self.batch.needs_flush(texture) {
            self.flush()?;
        }
        self.batch.push(texture, SpriteDrawCmd { src, dst, tint });
        Ok(())
    }

    /// Fills `dst` with a solid color.
    pub fn draw_rect(&mut self, dst: Rect, color: Color) -> Result<(), RenderError> {
        let white = Arc::clone(&self.white);
        self.draw_sprite(&white, white.bounds(), dst, color)
    }

    /// Draws the open batch, if any, with one instanced call. The batch is
    /// empty afterwards whether or not the draw succeeded.
    pub(crate) fn flush(&mut self) -> Result<(), RenderError> {
        let drawn = self.submit_batch();
        self.batch.reset();
        drawn
    }

    fn submit_batch(&mut self) -> Result<(), RenderError> {
        let Some(batch) = self.batch.closed() else {
            return Ok(());
        };
        let pipeline = self
            .shaders
            .program()
            .and_then(|p| p.pipeline())
            .ok_or(RenderError::NoShader)?;

        self.instances.clear();
        self.instances
            .extend(batch.commands.iter().map(SpriteInstance::from));

        let texture = batch.texture;
        let constants = ShaderConstants {
            window_size: [self.window_size.width as f32, self.window_size.height as f32],
            texture_size: [texture.width() as f32, texture.height() as f32],
        };
        self.device
            .draw_sprites(pipeline, texture.raw(), &constants, &self.instances)?;

        self.stats.draw_calls += 1;
        self.stats.sprites += self.instances.len() as u32;
        Ok(())
    }
}
