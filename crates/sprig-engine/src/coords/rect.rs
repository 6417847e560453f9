/// Axis-aligned rectangle in pixels: top-left corner plus extent.
///
/// Used both for destination rects (window pixels) and source rects (texel
/// coordinates inside a texture).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rect covering a whole `width` x `height` texture.
    #[inline]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    #[inline]
    pub fn right(self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Returns `true` if `other` lies entirely inside `self` (edges inclusive).
    #[inline]
    pub fn contains_rect(self, other: Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// `[x, y, w, h]`, the layout consumed by the sprite shader.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.w, self.h]
    }
}
