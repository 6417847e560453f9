//! Sprite pipeline construction on a bare `wgpu::Device`.
//!
//! naga catches most broken edits before anything reaches wgpu, but only
//! stage by stage. Mismatches between the two stages, or between a stage and
//! the pipeline layout, are found by wgpu itself. Both device calls therefore
//! run inside a validation error scope; an uncaptured validation error would
//! otherwise reach wgpu's default handler and abort the process.

use crate::error::{ShaderError, ShaderStage};
use crate::render::{
    alpha_blend, constants_min_binding_size, SpriteInstance, SpriteVertex,
    SPRITE_INPUT_LOCATIONS, SPRITE_RESOURCE_BINDINGS,
};
use crate::shader::{check_bindings, check_input_layout, validate_stage, StageInfo};

/// A WGSL module that passed naga and device validation for one stage.
pub struct GpuStage {
    module: wgpu::ShaderModule,
    info: StageInfo,
}

impl GpuStage {
    pub fn info(&self) -> &StageInfo {
        &self.info
    }
}

/// Bind group and pipeline layouts shared by every sprite pipeline.
pub(crate) struct SpriteLayouts {
    pub constants: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
    pub pipeline: wgpu::PipelineLayout,
}

impl SpriteLayouts {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let constants = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprig constants bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(constants_min_binding_size()),
                },
                count: None,
            }],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprig texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprig sprite pipeline layout"),
            bind_group_layouts: &[&constants, &texture],
            immediate_size: 0,
        });

        Self {
            constants,
            texture,
            pipeline,
        }
    }
}

/// Runs `build` inside a validation error scope and returns the captured
/// error, if any, as text.
fn capture_validation<T>(device: &wgpu::Device, build: impl FnOnce() -> T) -> Result<T, String> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err.to_string()),
        None => Ok(value),
    }
}

pub(crate) fn compile_stage(
    device: &wgpu::Device,
    source: &str,
    stage: ShaderStage,
    entry_point: &str,
    label: &str,
) -> Result<GpuStage, ShaderError> {
    let info = validate_stage(source, stage, entry_point)?;
    let module = capture_validation(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
    .map_err(|diagnostics| ShaderError::Compile { stage, diagnostics })?;
    Ok(GpuStage { module, info })
}

/// Links `vertex` and `fragment` against the sprite vertex buffers and
/// `layouts`, rendering into `format`.
pub(crate) fn create_sprite_pipeline(
    device: &wgpu::Device,
    layouts: &SpriteLayouts,
    format: wgpu::TextureFormat,
    vertex: &GpuStage,
    fragment: &GpuStage,
) -> Result<wgpu::RenderPipeline, ShaderError> {
    check_input_layout(&vertex.info, &SPRITE_INPUT_LOCATIONS)?;
    check_bindings(&vertex.info, &SPRITE_RESOURCE_BINDINGS)?;
    check_bindings(&fragment.info, &SPRITE_RESOURCE_BINDINGS)?;

    capture_validation(device, || {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprig sprite pipeline"),
            layout: Some(&layouts.pipeline),
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(vertex.info.entry_point.as_str()),
                compilation_options: Default::default(),
                buffers: &[SpriteVertex::layout(), SpriteInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(fragment.info.entry_point.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    })
    .map_err(ShaderError::Device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{
        preprocess, ERROR_SHADER_DEFINE, FRAGMENT_ENTRY_POINT, SPRITE_SHADER_SOURCE,
        VERTEX_ENTRY_POINT,
    };

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn device() -> wgpu::Device {
        wgpu::Device::noop(&wgpu::DeviceDescriptor::default()).0
    }

    fn link(
        device: &wgpu::Device,
        source: &str,
        defines: &[&str],
    ) -> Result<wgpu::RenderPipeline, ShaderError> {
        let source = &preprocess(source, defines)?;
        let layouts = SpriteLayouts::new(device);
        let vs = compile_stage(device, source, ShaderStage::Vertex, VERTEX_ENTRY_POINT, "vs")?;
        let fs = compile_stage(device, source, ShaderStage::Fragment, FRAGMENT_ENTRY_POINT, "fs")?;
        create_sprite_pipeline(device, &layouts, FORMAT, &vs, &fs)
    }

    #[test]
    fn builtin_variants_link() {
        let device = device();
        assert!(link(&device, SPRITE_SHADER_SOURCE, &[]).is_ok());
        assert!(link(&device, SPRITE_SHADER_SOURCE, &[ERROR_SHADER_DEFINE]).is_ok());
    }

    #[test]
    fn fragment_input_without_vertex_output_is_a_shader_error() {
        let device = device();
        let source = SPRITE_SHADER_SOURCE.replace(
            "fn fs_main(in: VertexOutput)",
            "fn fs_main(in: VertexOutput, @location(5) extra: vec4<f32>)",
        );
        assert_ne!(source, SPRITE_SHADER_SOURCE);

        let err = link(&device, &source, &[]).unwrap_err();
        assert!(matches!(err, ShaderError::Device(_)), "{err:?}");

        // The scope is balanced: the device keeps working afterwards.
        assert!(link(&device, SPRITE_SHADER_SOURCE, &[]).is_ok());
    }

    #[test]
    fn oversized_uniform_is_a_shader_error() {
        let device = device();
        let source = SPRITE_SHADER_SOURCE.replace(
            "texture_size: vec2<f32>,",
            "texture_size: vec2<f32>,\n    extra: vec4<f32>,",
        );
        assert_ne!(source, SPRITE_SHADER_SOURCE);
        assert!(matches!(link(&device, &source, &[]), Err(ShaderError::Device(_))));
    }
}
