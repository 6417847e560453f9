use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *caps.formats.first()?;
    if prefer_srgb {
        let srgb = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = srgb.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    }
    Some(first)
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// `Auto*` modes always resolve to something the surface supports.
pub(crate) fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// wgpu cannot configure a 0x0 surface (minimized window).
#[inline]
pub(crate) fn is_drawable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

pub(crate) fn surface_error_action(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}
