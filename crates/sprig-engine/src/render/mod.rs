//! Sprite batching and the frame loop.
//!
//! Convention:
//! - Destination rects are window pixels (top-left origin, +Y down).
//! - Source rects are texels of the sprite's texture.
//! - The vertex shader converts both using the `ShaderConstants` uniform.

mod batch;
mod common;
mod frame;
mod renderer;
mod text;

pub use batch::SpriteDrawCmd;
pub use common::{ShaderConstants, SpriteInstance};
pub use frame::FrameStats;
pub use renderer::{Renderer, RendererConfig};

pub(crate) use common::{
    alpha_blend, constants_min_binding_size, SpriteVertex, QUAD_INDICES, QUAD_VERTICES,
    SPRITE_INPUT_LOCATIONS, SPRITE_RESOURCE_BINDINGS,
};
