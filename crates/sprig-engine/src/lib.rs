//! Sprig engine crate.
//!
//! Immediate-mode 2D renderer: textured sprites and bitmap text batched into
//! instanced draws, with a hot-reloaded WGSL sprite shader.
//!
//! A frame looks like:
//!
//! ```ignore
//! renderer.begin_frame(Color::BLACK)?;
//! renderer.draw_sprite(&texture, texture.bounds(), Rect::new(10.0, 10.0, 64.0, 64.0), Color::WHITE)?;
//! renderer.draw_text(&font, "hello", 10.0, 90.0, Color::WHITE)?;
//! let stats = renderer.end_frame(true)?;
//! ```

pub mod coords;
pub mod device;
pub mod error;
pub mod files;
pub mod logging;
pub mod render;
pub mod resource;
pub mod shader;
pub mod text;

#[cfg(test)]
mod testing;

pub use coords::{Color, Rect, Vec2};
pub use error::{FontError, RenderError, ShaderError};
pub use render::{FrameStats, Renderer, RendererConfig};
