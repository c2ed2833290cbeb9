// Mesh buffer types shared by the generator, the extruder and the mesh sinks.
//
// Two layers:
//   MeshBuffers (struct-of-arrays, CPU side) → GlowVertex (interleaved, GPU side)

use glam::{Vec2, Vec3};
use super::color::LinearColor;
use super::{GlowError, Result};

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex for the glow pipeline.
///   @location(0) position: vec3<f32>
///   @location(1) color:    vec4<f32>
///   @location(2) uv:       vec2<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlowVertex {
    pub position: [f32; 3],
    pub color:    [f32; 4],
    pub uv:       [f32; 2],
}

impl GlowVertex {
    pub fn new(position: Vec3, color: LinearColor, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color:    color.to_array(),
            uv:       uv.to_array(),
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlowVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 7]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

// ============================================================================
// MESH BUFFERS
// ============================================================================

/// One mesh section's worth of buffers.
///
/// Invariants (checked by `validate`):
///   - `indices.len() % 3 == 0`, every index < `positions.len()`
///   - `colors` matches `positions` in length
///   - each UV channel is either empty or matches `positions` in length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    pub indices:   Vec<u32>,
    pub colors:    Vec<LinearColor>,
    pub uv0:       Vec<Vec2>,
    pub uv1:       Vec<Vec2>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
    pub fn triangle_count(&self) -> usize { self.indices.len() / 3 }

    /// Iterate triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(GlowError::IndicesNotTriangles { len: self.indices.len() });
        }
        let vertex_count = self.positions.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GlowError::IndexOutOfBounds { index, vertex_count });
        }
        check_len("colors", self.colors.len(), vertex_count, false)?;
        check_len("uv0", self.uv0.len(), vertex_count, true)?;
        check_len("uv1", self.uv1.len(), vertex_count, true)?;
        Ok(())
    }

    /// Interleave into GPU vertices. UV channel 0 is used when present.
    pub fn to_gpu_vertices(&self) -> Vec<GlowVertex> {
        self.positions.iter()
            .zip(self.colors.iter())
            .enumerate()
            .map(|(i, (&p, &c))| GlowVertex::new(p, c, self.uv0.get(i).copied().unwrap_or(Vec2::ZERO)))
            .collect()
    }

    /// Cast index slice to raw bytes for wgpu buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn check_len(attribute: &'static str, len: usize, expected: usize, optional: bool) -> Result<()> {
    if len == expected || (optional && len == 0) {
        Ok(())
    } else {
        Err(GlowError::AttributeLength { attribute, len, expected })
    }
}

// ============================================================================
// FAN TRIANGULATION
// ============================================================================

/// Fan-triangulate a convex polygon of `n` vertices starting at `base`.
/// Emits `(i, 0, i+1)` for i in 1..n-1, matching the flap ring's winding.
/// Non-convex input yields overlapping triangles; that is the caller's problem.
pub fn push_fan_indices(indices: &mut Vec<u32>, base: u32, n: u32) {
    for i in 1..n.saturating_sub(1) {
        indices.push(base + i);
        indices.push(base);
        indices.push(base + i + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_buffers() -> MeshBuffers {
        MeshBuffers {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices:   vec![0, 1, 2],
            colors:    vec![LinearColor::WHITE; 3],
            uv0:       vec![],
            uv1:       vec![],
        }
    }

    #[test]
    fn gpu_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<GlowVertex>(), 9 * 4);
    }

    #[test]
    fn valid_buffers_pass() {
        assert!(triangle_buffers().validate().is_ok());
    }

    #[test]
    fn dangling_index_is_rejected() {
        let mut mesh = triangle_buffers();
        mesh.indices[2] = 3;
        assert!(matches!(
            mesh.validate(),
            Err(GlowError::IndexOutOfBounds { index: 3, vertex_count: 3 })
        ));
    }

    #[test]
    fn partial_triangle_is_rejected() {
        let mut mesh = triangle_buffers();
        mesh.indices.push(0);
        assert!(matches!(mesh.validate(), Err(GlowError::IndicesNotTriangles { len: 4 })));
    }

    #[test]
    fn short_uv_channel_is_rejected() {
        let mut mesh = triangle_buffers();
        mesh.uv1 = vec![Vec2::ZERO; 2];
        assert!(matches!(
            mesh.validate(),
            Err(GlowError::AttributeLength { attribute: "uv1", len: 2, expected: 3 })
        ));
    }

    #[test]
    fn fan_of_pentagon() {
        let mut indices = Vec::new();
        push_fan_indices(&mut indices, 0, 5);
        assert_eq!(indices, vec![1, 0, 2, 2, 0, 3, 3, 0, 4]);
    }

    #[test]
    fn fan_of_triangle_is_one_triangle() {
        let mut indices = Vec::new();
        push_fan_indices(&mut indices, 0, 3);
        assert_eq!(indices, vec![1, 0, 2]);
    }
}
