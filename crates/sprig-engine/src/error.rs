//! Error types.
//!
//! Fatal setup failures, recoverable resource failures and frame-protocol
//! misuse all surface as [`RenderError`]. Font packing and shader compilation
//! have their own enums so callers can inspect the cause.

use std::fmt;
use std::path::PathBuf;

/// Top-level renderer error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The GPU backend rejected an operation.
    #[error("device error: {0}")]
    Device(String),

    /// The error shader could not be built; the renderer cannot start.
    #[error("error shader from {} failed to compile: {source}", path.display())]
    ErrorShader {
        path: PathBuf,
        #[source]
        source: ShaderError,
    },

    /// The configured instance buffer cannot hold a single sprite instance.
    #[error("instance buffer of {size} bytes holds no sprite instances ({instance_size} bytes each)")]
    InstanceBufferTooSmall { size: u64, instance_size: usize },

    /// Pixel buffer does not match the declared texture dimensions.
    #[error("invalid texture data: {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidTextureData {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("failed to read {}", path.display())]
    FileRead { path: PathBuf },

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error(transparent)]
    Font(#[from] FontError),

    /// The swapchain had no frame to give; skip this frame and try again.
    #[error("surface frame unavailable: {0}")]
    FrameSkipped(String),

    /// No shader program is installed (only possible before start-up completes).
    #[error("no shader program is loaded")]
    NoShader,

    #[error("begin_frame called while a frame is already in progress")]
    FrameInProgress,

    /// Drawing or `end_frame` without a matching `begin_frame`.
    #[error("no frame in progress; call begin_frame first")]
    NoFrameInProgress,
}

/// Font loading and atlas packing failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FontError {
    #[error("failed to parse font: {0}")]
    Parse(String),

    #[error("invalid font pixel size {0}")]
    InvalidSize(f32),

    #[error("invalid character range [{first}, {last})")]
    InvalidRange { first: u32, last: u32 },

    /// Atlas sides must be in `1..=MAX_ATLAS_SIZE` and larger than the padding.
    #[error("invalid glyph atlas {width}x{height} with padding {padding}")]
    InvalidAtlas { width: u32, height: u32, padding: u32 },

    #[error("font has no horizontal line metrics")]
    MissingMetrics,

    /// The glyph range does not fit into the fixed-size atlas.
    #[error("glyph atlas {width}x{height} is full while packing U+{code:04X}")]
    AtlasFull { width: u32, height: u32, code: u32 },
}

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader build failures. Recoverable during hot reload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShaderError {
    #[error("shader source {} is empty or unreadable", path.display())]
    EmptySource { path: PathBuf },

    #[error("shader source is not valid UTF-8")]
    NotUtf8,

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// Diagnostics text produced by the WGSL front-end.
    #[error("{stage} compile error:\n{diagnostics}")]
    Compile { stage: ShaderStage, diagnostics: String },

    #[error("{stage} entry point `{entry_point}` not found")]
    MissingEntryPoint { stage: ShaderStage, entry_point: String },

    /// The vertex stage reads an attribute the sprite vertex layout does not supply.
    #[error("vertex input @location({location}) is not provided by the sprite vertex layout")]
    UnboundVertexInput { location: u32 },

    /// The module declares a resource the sprite pipeline layout does not have.
    #[error("{stage} stage declares @group({group}) @binding({binding}), which the sprite pipeline does not provide")]
    UnboundResource { stage: ShaderStage, group: u32, binding: u32 },

    #[error("device rejected the pipeline: {0}")]
    Device(String),
}

/// Malformed `#ifdef`/`#ifndef`/`#else`/`#endif` structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreprocessError {
    #[error("line {line}: `{directive}` without a matching #ifdef/#ifndef")]
    Unmatched { line: usize, directive: &'static str },

    #[error("line {line}: duplicate #else")]
    DuplicateElse { line: usize },

    #[error("line {line}: unknown directive `{text}`")]
    UnknownDirective { line: usize, text: String },

    #[error("line {line}: `{directive}` needs a define name")]
    MissingName { line: usize, directive: &'static str },

    #[error("{open} conditional block(s) left open at end of source")]
    Unterminated { open: usize },
}
