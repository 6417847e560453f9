use std::fmt;
use std::sync::Arc;

use crate::coords::Vec2;
use crate::device::RenderDevice;
use crate::resource::TextureHandle;

use super::atlas::GlyphTable;
use super::layout::{measure, TextLayout};

/// Shared font handle.
pub type FontHandle<D> = Arc<Font<D>>;

/// A font baked at one pixel size: its atlas texture plus glyph table.
///
/// Immutable once created. Draw with
/// [`Renderer::draw_text`](crate::render::Renderer::draw_text).
pub struct Font<D: RenderDevice> {
    atlas: TextureHandle<D>,
    glyphs: GlyphTable,
}

impl<D: RenderDevice> Font<D> {
    pub(crate) fn new(atlas: TextureHandle<D>, glyphs: GlyphTable) -> Self {
        Self { atlas, glyphs }
    }

    /// Atlas texture; white RGB with glyph coverage in alpha.
    pub fn atlas(&self) -> &TextureHandle<D> {
        &self.atlas
    }

    pub fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }

    pub fn pixel_size(&self) -> f32 {
        self.glyphs.pixel_size()
    }

    pub fn ascent(&self) -> f32 {
        self.glyphs.ascent()
    }

    pub fn descent(&self) -> f32 {
        self.glyphs.descent()
    }

    pub fn line_gap(&self) -> f32 {
        self.glyphs.line_gap()
    }

    /// Baseline-to-baseline distance.
    pub fn y_advance(&self) -> f32 {
        self.glyphs.y_advance()
    }

    /// Glyph quads for `text` with its top-left at `(x, y)`.
    pub fn layout<'a>(&'a self, text: &'a str, x: f32, y: f32) -> TextLayout<'a> {
        TextLayout::new(&self.glyphs, text, x, y)
    }

    /// Width of the widest line and total height of `text`.
    pub fn measure(&self, text: &str) -> Vec2 {
        measure(&self.glyphs, text)
    }
}

impl<D: RenderDevice> fmt::Debug for Font<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("pixel_size", &self.glyphs.pixel_size())
            .field("atlas", &self.atlas)
            .finish_non_exhaustive()
    }
}
