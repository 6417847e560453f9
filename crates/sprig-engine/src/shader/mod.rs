//! Sprite shader: compilation, error fallback and hot reload.
//!
//! The program is compiled from a single WGSL file. The same file compiled
//! with [`ERROR_SHADER_DEFINE`] yields the error shader, which must always
//! build; it is drawn whenever an edit to the file fails to compile.

mod hot_reload;
mod manager;
mod preprocess;
mod program;
mod reflect;

pub use hot_reload::HotReload;
pub use manager::{ActiveShader, ReloadOutcome, ShaderManager};
pub use preprocess::preprocess;
pub use program::ShaderProgram;
pub use reflect::{check_bindings, check_input_layout, validate_stage, StageInfo};

/// Built-in sprite shader source, as shipped in `shaders/sprite.wgsl`.
pub const SPRITE_SHADER_SOURCE: &str = include_str!("../../shaders/sprite.wgsl");

/// Path of the shipped shader inside this crate's source tree. Pointing
/// [`crate::render::RendererConfig::shader_path`] here enables live editing
/// during development.
pub const SPRITE_SHADER_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/sprite.wgsl");

pub const ERROR_SHADER_DEFINE: &str = "ERROR_SHADER";
pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";
