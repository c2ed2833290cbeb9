// Glow mesh generation for arbitrary convex polygons.
//
// Camera-independent: the mesh only encodes topology plus per-vertex hints, and a
// shader does the view-dependent push at draw time.
//
// Vertex layout for an N-gon (4N vertices):
//   0..N          input points (fill)
//   N + 3i + 0    P_i - eps * next_dir   mask MASK_NEXT
//   N + 3i + 1    P_i - eps * prev_dir   mask MASK_PREV
//   N + 3i + 2    P_i - eps * center_dir mask MASK_CENTER
//
// Index layout:
//   fill fan       N-2 triangles  (combined mode only)
//   flaps          2 per edge     (2N)
//   connectors     2 per vertex   (2N)

use glam::{Vec2, Vec3};
use log::debug;
use super::color::LinearColor;
use super::math::safe_normal;
use super::mesh::{push_fan_indices, MeshBuffers};
use super::{GlowError, Result};

/// Offset that keeps the three rim vertices from being welded onto their corner.
pub const DEFAULT_EPS: f32 = 0.1;

/// Fill and glow ring as independent sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitGlowMesh {
    pub fill: MeshBuffers,
    pub glow: MeshBuffers,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Fill fan + glow ring in one buffer set.
pub fn build_glow_mesh(points: &[Vec3], eps: f32) -> Result<MeshBuffers> {
    let mut out = MeshBuffers::new();
    build_glow_mesh_into(points, eps, &mut out)?;
    Ok(out)
}

/// Like `build_glow_mesh`, reusing `out`'s allocations. `out` is untouched on error.
pub fn build_glow_mesh_into(points: &[Vec3], eps: f32, out: &mut MeshBuffers) -> Result<()> {
    check_point_count(points)?;
    write_glow_ring(points, eps, true, out);
    debug!("glow mesh: {} points -> {} vertices, {} indices", points.len(), out.vertex_count(), out.indices.len());
    Ok(())
}

/// Fill (N vertices, N-2 triangles) and glow ring (4N vertices, 4N triangles) separately.
pub fn build_split_glow_mesh(points: &[Vec3], eps: f32) -> Result<SplitGlowMesh> {
    let mut out = SplitGlowMesh::default();
    build_split_glow_mesh_into(points, eps, &mut out)?;
    Ok(out)
}

pub fn build_split_glow_mesh_into(points: &[Vec3], eps: f32, out: &mut SplitGlowMesh) -> Result<()> {
    check_point_count(points)?;
    write_glow_ring(points, eps, false, &mut out.glow);
    write_fill(points, &mut out.fill);
    debug!(
        "split glow mesh: {} points -> fill {}v/{}i, glow {}v/{}i",
        points.len(),
        out.fill.vertex_count(),
        out.fill.indices.len(),
        out.glow.vertex_count(),
        out.glow.indices.len(),
    );
    Ok(())
}

/// Index count of the combined mesh: `3 * (N - 2 + 4N)`.
/// Only meaningful for `n >= 3`; smaller counts saturate instead of underflowing.
pub fn combined_index_count(n: usize) -> usize {
    3 * (5 * n).saturating_sub(2)
}

// ============================================================================
// BUILDERS
// ============================================================================

fn check_point_count(points: &[Vec3]) -> Result<()> {
    if points.len() < 3 {
        return Err(GlowError::TooFewPoints { count: points.len() });
    }
    Ok(())
}

fn write_glow_ring(points: &[Vec3], eps: f32, with_fill: bool, out: &mut MeshBuffers) {
    let n = points.len();
    let vertex_count = 4 * n;
    let fill_indices = if with_fill { 3 * (n - 2) } else { 0 };

    out.positions.clear();
    out.colors.clear();
    out.uv0.clear();
    out.uv1.clear();
    out.indices.clear();
    out.positions.reserve(vertex_count);
    out.colors.reserve(vertex_count);
    out.uv0.reserve(vertex_count);
    out.uv1.reserve(vertex_count);
    out.indices.reserve(fill_indices + 3 * 4 * n);

    let center = points.iter().copied().sum::<Vec3>() / n as f32;

    // Directions per corner, computed once; UVs need them for both the corner and its rim.
    let dirs: Vec<(Vec3, Vec3, Vec3)> = (0..n)
        .map(|i| {
            let p = points[i];
            (
                safe_normal(points[(i + 1) % n] - p),
                safe_normal(points[(i + n - 1) % n] - p),
                safe_normal(center - p),
            )
        })
        .collect();

    // ---- Corners ----------------------------------------------------------
    for (i, &p) in points.iter().enumerate() {
        let (next, prev, _) = dirs[i];
        out.positions.push(p);
        out.colors.push(LinearColor::TRANSPARENT);
        out.uv0.push(pack_direction(next));
        out.uv1.push(pack_direction(prev));
    }

    // ---- Rim: three offset copies per corner -------------------------------
    for (i, &p) in points.iter().enumerate() {
        let (next, prev, to_center) = dirs[i];
        let rim = [
            (p - eps * next, LinearColor::MASK_NEXT),
            (p - eps * prev, LinearColor::MASK_PREV),
            (p - eps * to_center, LinearColor::MASK_CENTER),
        ];
        for (pos, mask) in rim {
            out.positions.push(pos);
            out.colors.push(mask);
            out.uv0.push(pack_direction(next));
            out.uv1.push(pack_direction(prev));
        }
    }

    // ---- Indices -----------------------------------------------------------
    let n = n as u32;
    if with_fill {
        push_fan_indices(&mut out.indices, 0, n);
    }
    let rim = |i: u32, j: u32| n + 3 * i + j;
    for i in 0..n {
        let next = (i + 1) % n;
        out.indices.extend_from_slice(&[rim(i, 1), i, rim(next, 0)]);
        out.indices.extend_from_slice(&[rim(next, 0), i, next]);
    }
    for i in 0..n {
        out.indices.extend_from_slice(&[rim(i, 0), i, rim(i, 2)]);
        out.indices.extend_from_slice(&[rim(i, 2), i, rim(i, 1)]);
    }
}

fn write_fill(points: &[Vec3], out: &mut MeshBuffers) {
    let n = points.len();
    out.positions.clear();
    out.positions.extend_from_slice(points);
    out.colors.clear();
    out.colors.resize(n, LinearColor::TRANSPARENT);
    out.uv0.clear();
    out.uv0.resize(n, Vec2::ZERO);
    out.uv1.clear();
    out.uv1.resize(n, Vec2::ZERO);
    out.indices.clear();
    push_fan_indices(&mut out.indices, 0, n as u32);
}

/// XY of a unit direction remapped from [-1, 1] to [0, 1].
fn pack_direction(dir: Vec3) -> Vec2 {
    0.5 * dir.truncate() + Vec2::splat(0.5)
}
