/// Device and surface bring-up options for [`super::Gpu`].
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Textures are uploaded as sRGB, so an sRGB target keeps sprite colors
    /// unchanged.
    pub prefer_srgb: bool,

    /// Present with vsync until the first `end_frame` says otherwise.
    pub vsync: bool,

    /// Optional alpha mode preference for the surface.
    ///
    /// Falls back to the first supported mode when unsupported.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Hint for how many frames may be queued ahead of the GPU.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            vsync: true,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
