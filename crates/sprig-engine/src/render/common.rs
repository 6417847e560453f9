//! GPU-facing types shared by the batcher and the wgpu backend.

use bytemuck::{Pod, Zeroable};

use super::batch::SpriteDrawCmd;

// ── blend ─────────────────────────────────────────────────────────────────

/// Straight alpha: `src * src_alpha + dst * (1 - src_alpha)` on color and alpha.
pub(crate) fn alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

// ── shader constants ──────────────────────────────────────────────────────

/// Uniform block bound at `@group(0) @binding(0)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShaderConstants {
    pub window_size: [f32; 2],
    pub texture_size: [f32; 2],
}

pub(crate) fn constants_min_binding_size() -> wgpu::BufferSize {
    const SIZE: wgpu::BufferSize =
        match wgpu::BufferSize::new(std::mem::size_of::<ShaderConstants>() as u64) {
            Some(size) => size,
            None => panic!("ShaderConstants is zero-sized"),
        };
    SIZE
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct SpriteVertex {
    pub pos: [f32; 2], // 0..1
    pub uv: [f32; 2],  // 0..1
}

impl SpriteVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2  // uv
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(crate) const QUAD_VERTICES: [SpriteVertex; 4] = [
    SpriteVertex { pos: [0.0, 0.0], uv: [0.0, 0.0] },
    SpriteVertex { pos: [1.0, 0.0], uv: [1.0, 0.0] },
    SpriteVertex { pos: [1.0, 1.0], uv: [1.0, 1.0] },
    SpriteVertex { pos: [0.0, 1.0], uv: [0.0, 1.0] },
];

pub(crate) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── sprite instance ───────────────────────────────────────────────────────

/// Per-instance record (48 bytes):
///
///  offset  0  color  [f32; 4]   loc 2
///  offset 16  src    [f32; 4]   loc 3  (texels: x, y, w, h)
///  offset 32  dst    [f32; 4]   loc 4  (pixels: x, y, w, h)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    pub color: [f32; 4],
    pub src: [f32; 4],
    pub dst: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<SpriteInstance>() == 48);

impl SpriteInstance {
    pub const SIZE: usize = std::mem::size_of::<SpriteInstance>();

    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        2 => Float32x4, // color
        3 => Float32x4, // src
        4 => Float32x4  // dst
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

impl From<&SpriteDrawCmd> for SpriteInstance {
    fn from(cmd: &SpriteDrawCmd) -> Self {
        Self {
            color: cmd.tint.to_array(),
            src: cmd.src.to_array(),
            dst: cmd.dst.to_array(),
        }
    }
}

/// Vertex input locations supplied by [`SpriteVertex`] and [`SpriteInstance`].
pub(crate) const SPRITE_INPUT_LOCATIONS: [u32; 5] = [0, 1, 2, 3, 4];

/// `(group, binding)` slots of the sprite pipeline layout: constants, then
/// texture and sampler.
pub(crate) const SPRITE_RESOURCE_BINDINGS: [(u32, u32); 3] = [(0, 0), (1, 0), (1, 1)];
