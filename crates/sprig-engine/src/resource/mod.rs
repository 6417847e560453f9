//! GPU-backed resources shared between client code and the batcher.

mod decode;
mod texture;

pub use decode::{decode_image, DecodedImage};
pub use texture::{Texture, TextureHandle};
