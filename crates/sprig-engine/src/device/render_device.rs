use winit::dpi::PhysicalSize;

use crate::coords::Color;
use crate::error::{RenderError, ShaderError, ShaderStage};
use crate::render::{ShaderConstants, SpriteInstance};

/// GPU device service consumed by the renderer core.
///
/// The renderer never touches the native API directly; it only needs these
/// operations to either succeed or return a clear failure. [`super::Gpu`] is
/// the wgpu implementation.
///
/// Frame protocol: `begin_frame` → any number of `draw_sprites` → `present`.
pub trait RenderDevice {
    /// Native texture bundle (image, view, sampler, bindings).
    type Texture;
    /// A compiled shader stage.
    type Stage;
    /// Vertex input layout bound to a vertex + fragment pair. For wgpu this is
    /// the whole render pipeline.
    type Pipeline;

    /// Current drawable size in physical pixels.
    fn window_size(&self) -> PhysicalSize<u32>;

    /// Recreates the backbuffer/viewport for `size`.
    fn resize(&mut self, size: PhysicalSize<u32>);

    /// Allocates the fixed-size instance upload buffer. Called once at start-up.
    fn create_instance_buffer(&mut self, size: u64) -> Result<(), RenderError>;

    /// Creates an immutable RGBA8 texture with its own sampler.
    ///
    /// `rgba.len()` is `width * height * 4`; the renderer validates this.
    fn create_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, RenderError>;

    /// Compiles one stage of a preprocessed WGSL source.
    fn compile_stage(
        &mut self,
        source: &str,
        stage: ShaderStage,
        entry_point: &str,
        label: &str,
    ) -> Result<Self::Stage, ShaderError>;

    /// Derives the sprite input layout from the vertex stage and binds both stages.
    fn create_input_layout(
        &mut self,
        vertex: &Self::Stage,
        fragment: &Self::Stage,
    ) -> Result<Self::Pipeline, ShaderError>;

    /// Acquires the frame's render target and clears it.
    fn begin_frame(&mut self, clear: Color) -> Result<(), RenderError>;

    /// Uploads `instances` and issues one instanced indexed draw of the unit quad.
    ///
    /// `instances` is never empty and never exceeds the instance buffer capacity.
    fn draw_sprites(
        &mut self,
        pipeline: &Self::Pipeline,
        texture: &Self::Texture,
        constants: &ShaderConstants,
        instances: &[SpriteInstance],
    ) -> Result<(), RenderError>;

    /// Presents the frame. `vsync` selects the present mode.
    fn present(&mut self, vsync: bool) -> Result<(), RenderError>;
}
