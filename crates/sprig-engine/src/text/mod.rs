//! Bitmap fonts: atlas packing, glyph lookup and text layout.

mod atlas;
mod font;
mod layout;

pub use atlas::{
    coverage_to_rgba, pack_font, FontAtlasConfig, GlyphTable, PackedChar, PackedFont,
    MAX_ATLAS_SIZE,
};
pub use font::{Font, FontHandle};
pub use layout::{measure, GlyphQuad, TextLayout};
