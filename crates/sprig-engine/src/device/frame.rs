/// The swapchain image being rendered this frame.
///
/// Held between `begin_frame` and `present`. Holding the surface texture
/// blocks acquisition of the next one, so it must not outlive the frame.
pub(crate) struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
