use std::fmt;
use std::sync::Arc;

use crate::coords::Rect;
use crate::device::RenderDevice;

/// Shared texture handle.
///
/// The same texture may be held by client code, by the open sprite batch and by
/// a font; the native resource is released when the last handle drops.
pub type TextureHandle<D> = Arc<Texture<D>>;

/// Immutable 2D RGBA texture.
pub struct Texture<D: RenderDevice> {
    width: u32,
    height: u32,
    raw: D::Texture,
}

impl<D: RenderDevice> Texture<D> {
    pub(crate) fn new(width: u32, height: u32, raw: D::Texture) -> Self {
        Self { width, height, raw }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source rect covering the whole texture.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[inline]
    pub fn raw(&self) -> &D::Texture {
        &self.raw
    }
}

impl<D: RenderDevice> fmt::Debug for Texture<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
