use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::Color;
use crate::error::{RenderError, ShaderError, ShaderStage};
use crate::render::{ShaderConstants, SpriteInstance, QUAD_INDICES, QUAD_VERTICES};

use super::frame::GpuFrame;
use super::pipeline::{compile_stage, create_sprite_pipeline, GpuStage, SpriteLayouts};
use super::surface::{
    choose_alpha_mode, choose_surface_format, is_drawable, present_mode, surface_error_action,
};
use super::{GpuInit, RenderDevice, SurfaceErrorAction};

/// Sprite textures are sRGB-encoded images.
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// An uploaded texture with its sampler, bound as `@group(1)`.
pub struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

/// wgpu implementation of [`RenderDevice`].
///
/// Owns the window surface, the sprite pipeline layout and the static quad
/// and instance buffers. Every flush records and submits its own encoder, so
/// per-flush buffer writes never overwrite data an earlier draw still needs.
pub struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Size the surface was last configured for, in physical pixels.
    size: PhysicalSize<u32>,

    layouts: SpriteLayouts,

    // bindings
    constants_ubo: wgpu::Buffer,
    constants_bind_group: wgpu::BindGroup,

    // geometry
    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,
    instance_vbo: Option<wgpu::Buffer>,

    frame: Option<GpuFrame>,
}

impl Gpu {
    /// Creates the device and a surface for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(is_drawable(size), "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sprig device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: present_mode(init.vsync),
            alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let layouts = SpriteLayouts::new(&device);

        let constants_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprig constants ubo"),
            size: std::mem::size_of::<ShaderConstants>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let constants_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprig constants bind group"),
            layout: &layouts.constants,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: constants_ubo.as_entire_binding(),
            }],
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprig quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprig quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "gpu ready: {:?} surface {}x{}, {:?}",
            format,
            size.width,
            size.height,
            config.present_mode
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            size,
            layouts,
            constants_ubo,
            constants_bind_group,
            quad_vbo,
            quad_ibo,
            instance_vbo: None,
            frame: None,
        })
    }

    /// [`Gpu::new`] driven to completion on the current thread.
    pub fn new_blocking(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(window, init))
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn configure(&mut self) {
        if is_drawable(self.size) {
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigures if needed and turns `err` into a renderer error.
    fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> RenderError {
        match surface_error_action(&err) {
            SurfaceErrorAction::Reconfigured => {
                log::debug!("surface {err}; reconfiguring");
                self.configure();
                RenderError::FrameSkipped(err.to_string())
            }
            SurfaceErrorAction::SkipFrame => {
                log::warn!("surface {err}; skipping frame");
                RenderError::FrameSkipped(err.to_string())
            }
            SurfaceErrorAction::Fatal => {
                log::error!("surface {err}");
                RenderError::Device(err.to_string())
            }
        }
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}

impl RenderDevice for Gpu {
    type Texture = GpuTexture;
    type Stage = GpuStage;
    type Pipeline = wgpu::RenderPipeline;

    fn window_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
        if is_drawable(size) {
            self.config.width = size.width;
            self.config.height = size.height;
            self.configure();
        }
    }

    fn create_instance_buffer(&mut self, size: u64) -> Result<(), RenderError> {
        let max = self.device.limits().max_buffer_size;
        if size > max {
            return Err(RenderError::Device(format!(
                "instance buffer of {size} bytes exceeds the device limit of {max}"
            )));
        }
        self.instance_vbo = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprig instance vbo"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        Ok(())
    }

    fn create_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<GpuTexture, RenderError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::Device(format!(
                "texture {width}x{height} exceeds the device limit of {max}"
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprig sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprig sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprig texture bind group"),
            layout: &self.layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(GpuTexture { texture, bind_group })
    }

    fn compile_stage(
        &mut self,
        source: &str,
        stage: ShaderStage,
        entry_point: &str,
        label: &str,
    ) -> Result<GpuStage, ShaderError> {
        compile_stage(&self.device, source, stage, entry_point, label)
    }

    fn create_input_layout(
        &mut self,
        vertex: &GpuStage,
        fragment: &GpuStage,
    ) -> Result<wgpu::RenderPipeline, ShaderError> {
        create_sprite_pipeline(&self.device, &self.layouts, self.config.format, vertex, fragment)
    }

    fn begin_frame(&mut self, clear: Color) -> Result<(), RenderError> {
        if !is_drawable(self.size) {
            return Err(RenderError::FrameSkipped("window is minimized".into()));
        }
        // A frame left open by a failed end_frame is dropped unpresented.
        self.frame = None;

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => return Err(self.handle_surface_error(err)),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.encoder("sprig clear encoder");
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprig clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        self.queue.submit(std::iter::once(encoder.finish()));

        self.frame = Some(GpuFrame {
            surface_texture,
            view,
        });
        Ok(())
    }

    fn draw_sprites(
        &mut self,
        pipeline: &wgpu::RenderPipeline,
        texture: &GpuTexture,
        constants: &ShaderConstants,
        instances: &[SpriteInstance],
    ) -> Result<(), RenderError> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| RenderError::Device("draw_sprites outside a frame".into()))?;
        let instance_vbo = self
            .instance_vbo
            .as_ref()
            .ok_or_else(|| RenderError::Device("instance buffer was never created".into()))?;

        let bytes: &[u8] = bytemuck::cast_slice(instances);
        if bytes.len() as u64 > instance_vbo.size() {
            return Err(RenderError::Device(format!(
                "{} sprite instances overflow the instance buffer",
                instances.len()
            )));
        }

        // Writes are applied at the next submit, which is this flush's own.
        self.queue
            .write_buffer(&self.constants_ubo, 0, bytemuck::bytes_of(constants));
        self.queue.write_buffer(instance_vbo, 0, bytes);

        let mut encoder = self.encoder("sprig sprite encoder");
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprig sprite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &self.constants_bind_group, &[]);
            rpass.set_bind_group(1, &texture.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
            rpass.set_vertex_buffer(1, instance_vbo.slice(..bytes.len() as u64));
            rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..instances.len() as u32);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn present(&mut self, vsync: bool) -> Result<(), RenderError> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| RenderError::Device("present without a frame".into()))?;
        drop(frame.view);
        frame.surface_texture.present();

        let mode = present_mode(vsync);
        if mode != self.config.present_mode {
            log::debug!("present mode {:?} -> {mode:?}", self.config.present_mode);
            self.config.present_mode = mode;
            self.configure();
        }
        Ok(())
    }
}
