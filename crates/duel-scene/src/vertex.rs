//! Packed vertex format shared by every scene buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// One scene vertex (28 bytes).
///
///  offset  0  position  [f32; 3]   loc 0
///  offset 12  color     [u8; 4]    loc 1  white, alpha = object opacity
///  offset 16  hcolor    [u8; 4]    loc 2  white, alpha = highlight intensity
///  offset 20  texcoord  [f32; 2]   loc 3
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct FieldVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
    pub hcolor: [u8; 4],
    pub texcoord: [f32; 2],
}

impl FieldVertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Unorm8x4,
        2 => Unorm8x4,
        3 => Float32x2
    ];

    pub const SIZE: u64 = std::mem::size_of::<FieldVertex>() as u64;

    pub fn new(position: Vec3, texcoord: Vec2, alpha: f32, highlight: f32) -> Self {
        Self {
            position: position.to_array(),
            color: pack_intensity(alpha),
            hcolor: pack_intensity(highlight),
            texcoord: texcoord.to_array(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.color[3] as f32 / 255.0
    }

    pub fn highlight(&self) -> f32 {
        self.hcolor[3] as f32 / 255.0
    }
}

/// White with `value` (clamped to 0..=1) in the alpha channel.
pub fn pack_intensity(value: f32) -> [u8; 4] {
    [255, 255, 255, (value.clamp(0.0, 1.0) * 255.0).round() as u8]
}

/// Index list for `quads` consecutive quads of four vertices each.
///
/// Vertices are ordered top-left, top-right, bottom-left, bottom-right; each
/// quad becomes the triangles (0, 2, 1) and (1, 2, 3).
pub fn quad_indices(quads: usize) -> Vec<u16> {
    debug_assert!(quads * 4 <= u16::MAX as usize + 1, "quad count exceeds u16 indices");
    (0..quads)
        .flat_map(|q| {
            let b = (q * 4) as u16;
            [b, b + 2, b + 1, b + 1, b + 2, b + 3]
        })
        .collect()
}
