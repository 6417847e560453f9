//! Geometry and color value types shared by the batcher, text layout and the
//! GPU backend.
//!
//! Canonical CPU space:
//! - Pixels, origin top-left
//! - +X right, +Y down
//!
//! The sprite shader converts pixel positions to NDC using the window size
//! uniform, and source rects to UVs using the texture size uniform.

mod color;
mod rect;
mod vec2;

pub use color::Color;
pub use rect::Rect;
pub use vec2::Vec2;
