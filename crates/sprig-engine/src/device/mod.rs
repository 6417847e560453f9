//! GPU device service.
//!
//! [`RenderDevice`] is everything the renderer core asks of the GPU. [`Gpu`]
//! implements it on wgpu:
//! - creates the Instance/Adapter/Device/Queue and the window surface
//! - owns the sprite pipeline layout, quad buffers and instance buffer
//! - acquires, clears and presents swapchain frames

mod error;
mod frame;
mod gpu;
mod init;
mod pipeline;
mod render_device;
mod surface;

pub use error::SurfaceErrorAction;
pub use gpu::{Gpu, GpuTexture};
pub use init::GpuInit;
pub use pipeline::GpuStage;
pub use render_device::RenderDevice;
