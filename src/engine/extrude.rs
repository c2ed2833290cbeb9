// View-dependent extrusion of a glowing quad.
//
// Every frame the 4 corners are copied into a 16-vertex buffer and each corner
// gets 3 flap vertices pushed away from the quad along planes through the eye:
//
//   vertex 0..4          quad corners (possibly P1/P3 swapped for the back side)
//   vertex 4 + 3i + 0    pushed across edge (i-1, i)
//   vertex 4 + 3i + 1    pushed across edge (i, i+1)
//   vertex 4 + 3i + 2    pushed along the corner bisector
//
// Corners carry the fill color with angle-faded alpha; flap vertices always have
// alpha 0, so the rasterizer interpolates a soft edge across the flaps.

use glam::{Vec2, Vec3};
use super::color::LinearColor;
use super::curve::DistanceFadeCurve;
use super::math::{mapped_range_clamped, safe_normal, sign, LocalFrame};

pub const QUAD_VERTEX_COUNT: usize = 4;
pub const EXTRUDED_VERTEX_COUNT: usize = 16;

// ============================================================================
// FIXED TOPOLOGY
// ============================================================================

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Two triangles per edge, corner i to the flap vertices facing corner i+1.
pub const FLAP_INDICES: [u32; 24] = [
    0, 5, 7, 0, 7, 1,
    1, 8, 10, 1, 10, 2,
    2, 11, 13, 2, 13, 3,
    3, 14, 4, 3, 4, 0,
];

/// Two triangles per corner, closing the gap between its own three flap vertices.
pub const CONNECTOR_INDICES: [u32; 24] = [
    0, 4, 6, 0, 6, 5,
    1, 7, 9, 1, 9, 8,
    2, 10, 12, 2, 12, 11,
    3, 13, 15, 3, 15, 14,
];

/// UVs for the quad when it is drawn as its own section.
pub const QUAD_UVS: [Vec2; 4] = [
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
];

/// Index buffer for the glow section: flaps + connectors, with the quad
/// triangles in front when fill and glow share one section (54 vs 48 indices).
pub fn glow_indices(include_quad: bool) -> Vec<u32> {
    let mut indices = Vec::with_capacity(QUAD_INDICES.len() + FLAP_INDICES.len() + CONNECTOR_INDICES.len());
    if include_quad {
        indices.extend_from_slice(&QUAD_INDICES);
    }
    indices.extend_from_slice(&FLAP_INDICES);
    indices.extend_from_slice(&CONNECTOR_INDICES);
    indices
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// How the glow width relates to the object's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Width is in local units and grows or shrinks with the object.
    #[default]
    Local,
    /// Width is in world units regardless of the object's scale.
    World,
}

/// Style inputs for one extrusion.
#[derive(Clone, Copy)]
pub struct FadeParams<'a> {
    pub glow_color: LinearColor,
    pub fill_color: LinearColor,
    pub glow_size: f32,
    /// Cosine of the view angle: alpha is 0 at or below `x`, 1 at or above `y`.
    pub angle_fade_range: Vec2,
    /// Flip the quad toward the viewer when seen from behind.
    pub show_bottom: bool,
    pub scale_mode: ScaleMode,
    pub distance_fade: Option<&'a dyn DistanceFadeCurve>,
}

// ============================================================================
// OUTPUT
// ============================================================================

/// One frame's extrusion result plus the intermediate terms worth displaying.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExtrudedQuad {
    pub vertices: [Vec3; EXTRUDED_VERTEX_COUNT],
    pub colors: [LinearColor; EXTRUDED_VERTEX_COUNT],
    /// Cosine between the eye->center direction and the quad normal.
    pub dot: f32,
    /// Push direction sign after any two-sided flip.
    pub sign: f32,
    pub alpha: f32,
    pub push_distance: f32,
    /// P1 and P3 were swapped to face the viewer.
    pub flipped: bool,
}

impl ExtrudedQuad {
    /// Unextruded state for `points`: every flap sits on its corner.
    pub fn collapsed(points: &[Vec3; 4], fill_color: LinearColor) -> Self {
        let mut out = Self::default();
        out.vertices[..QUAD_VERTEX_COUNT].copy_from_slice(points);
        for i in 0..QUAD_VERTEX_COUNT {
            out.vertices[QUAD_VERTEX_COUNT + 3 * i..QUAD_VERTEX_COUNT + 3 * i + 3].fill(points[i]);
        }
        out.colors[..QUAD_VERTEX_COUNT].fill(fill_color);
        out.colors[QUAD_VERTEX_COUNT..].fill(LinearColor::TRANSPARENT);
        out
    }

    pub fn corners(&self) -> &[Vec3] {
        &self.vertices[..QUAD_VERTEX_COUNT]
    }

    /// The three flap vertices of corner `i`.
    pub fn flaps(&self, i: usize) -> &[Vec3] {
        let start = QUAD_VERTEX_COUNT + 3 * i;
        &self.vertices[start..start + 3]
    }

    /// Quad UVs matching the (possibly flipped) corner order.
    pub fn quad_uvs(&self) -> [Vec2; 4] {
        let mut uvs = QUAD_UVS;
        if self.flipped {
            uvs.swap(1, 3);
        }
        uvs
    }
}

// ============================================================================
// EXTRUSION
// ============================================================================

/// Extrude `points` for a viewer at `viewer` (both in local space).
///
/// `frame` places the mesh in the world. Eye directions are measured in world
/// space and offsets mapped back per `params.scale_mode`; pass
/// `LocalFrame::IDENTITY` to work purely in local space.
pub fn extrude_quad(points: &[Vec3; 4], viewer: Vec3, frame: &LocalFrame, params: &FadeParams) -> ExtrudedQuad {
    let mut out = ExtrudedQuad::default();
    extrude_quad_into(points, viewer, frame, params, &mut out);
    out
}

/// In-place form of `extrude_quad` for the per-frame refresh path.
pub fn extrude_quad_into(
    points: &[Vec3; 4],
    viewer: Vec3,
    frame: &LocalFrame,
    params: &FadeParams,
    out: &mut ExtrudedQuad,
) {
    let v = &mut out.vertices;
    v[..QUAD_VERTEX_COUNT].copy_from_slice(points);

    // A zero-area quad gives a zero normal: dot = 0, sign = 0, every flap collapses.
    let normal = safe_normal((v[1] - v[0]).cross(v[2] - v[0]));
    let center = 0.25 * (v[0] + v[1] + v[2] + v[3]);

    let dot = safe_normal(center - viewer).dot(normal);
    let mut push_sign = sign(dot);
    let alpha = mapped_range_clamped(params.angle_fade_range, dot.abs());

    let flipped = dot < 0.0 && params.show_bottom;
    if flipped {
        v.swap(1, 3);
        push_sign = -push_sign;
    }

    let mut eye_to_point = [Vec3::ZERO; 4];
    for (i, e) in eye_to_point.iter_mut().enumerate() {
        *e = safe_normal(frame.transform_vector(v[i] - viewer));
    }

    let mut push_distance = params.glow_size;
    if let Some(curve) = params.distance_fade {
        push_distance *= curve.evaluate(viewer.distance(center));
    }

    for i in 0..4 {
        let e = eye_to_point[i];
        let e_prev = eye_to_point[(i + 3) % 4];
        let e_next = eye_to_point[(i + 1) % 4];

        let d0 = push_sign * safe_normal(e.cross(e_prev));
        let d1 = push_sign * safe_normal(e_next.cross(e));
        let d2 = safe_normal(d0 + d1);

        for (j, dir) in [d0, d1, d2].into_iter().enumerate() {
            let offset = push_distance * dir;
            let offset = match params.scale_mode {
                ScaleMode::World => frame.inverse_transform_vector(offset),
                ScaleMode::Local => frame.inverse_transform_vector_no_scale(offset),
            };
            v[QUAD_VERTEX_COUNT + 3 * i + j] = v[i] + offset;
        }
    }

    let fill = params.fill_color.with_alpha(alpha * params.fill_color.a);
    let edge = params.glow_color.with_alpha(0.0);
    out.colors[..QUAD_VERTEX_COUNT].fill(fill);
    out.colors[QUAD_VERTEX_COUNT..].fill(edge);

    out.dot = dot;
    out.sign = push_sign;
    out.alpha = alpha;
    out.push_distance = push_distance;
    out.flipped = flipped;
}

/// World-space wireframe of an extruded quad: 7 segments per corner.
pub fn debug_edges<'a>(quad: &'a ExtrudedQuad, frame: &LocalFrame) -> impl Iterator<Item = (Vec3, Vec3)> + use<'a> {
    let v = &quad.vertices;
    let frame = *frame;
    (0..4).flat_map(move |i| {
        let flap = |j: usize| v[QUAD_VERTEX_COUNT + 3 * i + j];
        let next_flap0 = v[QUAD_VERTEX_COUNT + 3 * ((i + 1) % 4)];
        [
            (flap(1), next_flap0),
            (flap(0), flap(2)),
            (flap(1), flap(2)),
            (v[i], v[(i + 1) % 4]),
            (v[i], flap(0)),
            (v[i], flap(1)),
            (v[i], flap(2)),
        ]
        .into_iter()
        .map(move |(a, b)| (frame.transform_point(a), frame.transform_point(b)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::curve::FadeCurve;
    use crate::engine::math::approx_eq;
    use glam::Quat;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn unit_square() -> [Vec3; 4] {
        [
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ]
    }

    fn params(glow_size: f32) -> FadeParams<'static> {
        FadeParams {
            glow_color: LinearColor::CYAN,
            fill_color: LinearColor::WHITE,
            glow_size,
            angle_fade_range: Vec2::new(0.001, 0.1),
            show_bottom: false,
            scale_mode: ScaleMode::Local,
            distance_fade: None,
        }
    }

    fn flap_distances_match(quad: &ExtrudedQuad, d: f32, tol: f32) -> bool {
        (0..4).all(|i| quad.flaps(i).iter().all(|f| (f.distance(quad.vertices[i]) - d).abs() <= tol))
    }

    #[test]
    fn index_tables_are_in_range() {
        let all = glow_indices(true);
        assert_eq!(all.len(), 54);
        assert_eq!(glow_indices(false).len(), 48);
        assert_eq!(&glow_indices(false)[..], &all[6..]);
        assert!(all.iter().all(|&i| (i as usize) < EXTRUDED_VERTEX_COUNT));
        // Every flap vertex is referenced at least once.
        for v in 4..16 {
            assert!(all.contains(&v), "vertex {v} unreferenced");
        }
    }

    #[test]
    fn index_layout_is_fixed() {
        let expected: [u32; 54] = [
            0, 1, 2, 0, 2, 3,
            0, 5, 7, 0, 7, 1, 1, 8, 10, 1, 10, 2, 2, 11, 13, 2, 13, 3, 3, 14, 4, 3, 4, 0,
            0, 4, 6, 0, 6, 5, 1, 7, 9, 1, 9, 8, 2, 10, 12, 2, 12, 11, 3, 13, 15, 3, 15, 14,
        ];
        assert_eq!(glow_indices(true), expected.to_vec());
    }

    #[test]
    fn head_on_view_extrudes_in_plane() {
        let quad = extrude_quad(&unit_square(), Vec3::new(0.0, 0.0, 100.0), &LocalFrame::IDENTITY, &params(10.0));

        assert!((quad.dot.abs() - 1.0).abs() < 1e-5);
        assert_eq!(quad.alpha, 1.0);
        assert!(!quad.flipped);
        assert!(flap_distances_match(&quad, 10.0, 1e-3));
        for i in 0..4 {
            for f in quad.flaps(i) {
                assert!(f.z.abs() < 0.1, "flap left the plane: {f}");
                // Pushed away from the center.
                assert!(f.truncate().length() > quad.vertices[i].truncate().length());
            }
        }
    }

    #[test]
    fn corner_flaps_push_across_their_edges() {
        let quad = extrude_quad(&unit_square(), Vec3::new(0.0, 0.0, 100.0), &LocalFrame::IDENTITY, &params(1.0));
        // Corner 0: flap 0 crosses the left edge (-X), flap 1 the bottom edge (-Y).
        let f = quad.flaps(0);
        assert!(f[0].x < -1.4 && f[0].y.abs() < 0.6);
        assert!(f[1].y < -1.4 && f[1].x.abs() < 0.6);
        assert!(f[2].x < -0.5 && f[2].y < -0.5);
    }

    #[test]
    fn colors_fade_to_transparent_rim() {
        let mut p = params(5.0);
        p.fill_color = LinearColor::new(1.0, 0.5, 0.25, 0.8);
        let quad = extrude_quad(&unit_square(), Vec3::new(0.0, 0.0, 50.0), &LocalFrame::IDENTITY, &p);
        for c in &quad.colors[..4] {
            assert_eq!(*c, LinearColor::new(1.0, 0.5, 0.25, 0.8 * quad.alpha));
        }
        for c in &quad.colors[4..] {
            assert_eq!(*c, LinearColor::new(0.0, 1.0, 1.0, 0.0));
        }
    }

    #[test]
    fn alpha_follows_view_angle() {
        let mut p = params(1.0);
        p.angle_fade_range = Vec2::new(0.2, 0.6);
        let square = unit_square();
        // Viewer direction at cosine c from the plane normal, far away.
        let at_cos = |c: f32| {
            let s = (1.0 - c * c).sqrt();
            extrude_quad(&square, Vec3::new(s, 0.0, c) * 1000.0, &LocalFrame::IDENTITY, &p)
        };
        assert_eq!(at_cos(0.1).alpha, 0.0);
        assert_eq!(at_cos(0.19).alpha, 0.0);
        assert!((at_cos(0.4).alpha - 0.5).abs() < 1e-3);
        assert_eq!(at_cos(0.61).alpha, 1.0);
        assert_eq!(at_cos(0.95).alpha, 1.0);

        let mut last = 0.0;
        for step in 0..=50 {
            let a = at_cos(step as f32 / 50.0).alpha;
            assert!(a + 1e-6 >= last, "alpha not monotonic");
            last = a;
        }
    }

    #[test]
    fn zero_width_collapses_flaps() {
        let quad = extrude_quad(&unit_square(), Vec3::new(3.0, 1.0, 20.0), &LocalFrame::IDENTITY, &params(0.0));
        for i in 0..4 {
            assert!(quad.flaps(i).iter().all(|&f| f == quad.vertices[i]));
        }
    }

    #[test]
    fn viewer_on_plane_collapses_flaps() {
        // sign(0) = 0: no push direction, but alpha and colors are still defined.
        let quad = extrude_quad(&unit_square(), Vec3::new(0.0, -50.0, 0.0), &LocalFrame::IDENTITY, &params(10.0));
        assert_eq!(quad.dot, 0.0);
        assert_eq!(quad.sign, 0.0);
        assert_eq!(quad.alpha, 0.0);
        for i in 0..4 {
            assert!(quad.flaps(i).iter().all(|&f| f == quad.vertices[i]));
        }
    }

    #[test]
    fn degenerate_quad_stays_finite() {
        let line = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::X * 3.0];
        let quad = extrude_quad(&line, Vec3::new(0.0, 0.0, 10.0), &LocalFrame::IDENTITY, &params(5.0));
        assert!(quad.vertices.iter().all(|v| v.is_finite()));
        assert_eq!(quad.sign, 0.0);

        let point = [Vec3::ONE; 4];
        let quad = extrude_quad(&point, Vec3::ONE, &LocalFrame::IDENTITY, &params(5.0));
        assert!(quad.vertices.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn two_sided_flip_mirrors_flaps() {
        let mut p = params(4.0);
        p.show_bottom = true;
        let square = unit_square();
        let front = extrude_quad(&square, Vec3::new(0.3, 0.2, 40.0), &LocalFrame::IDENTITY, &p);
        let back = extrude_quad(&square, Vec3::new(0.3, 0.2, -40.0), &LocalFrame::IDENTITY, &p);

        assert!(front.dot < 0.0 && back.dot > 0.0);
        assert!(front.flipped && !back.flipped);
        assert_eq!(front.corners(), &[square[0], square[3], square[2], square[1]]);
        assert_eq!(back.corners(), &square[..]);
        assert_eq!(front.sign, -sign(front.dot));
        assert_eq!(back.sign, sign(back.dot));
        assert_eq!(front.quad_uvs()[1], QUAD_UVS[3]);

        // As point sets, the flaps reflect across z = 0.
        for f in &front.vertices[4..] {
            let mirrored = Vec3::new(f.x, f.y, -f.z);
            assert!(
                back.vertices[4..].iter().any(|b| approx_eq(*b, mirrored, 1e-3)),
                "no mirror image for {f}"
            );
        }
    }

    #[test]
    fn one_sided_back_view_keeps_winding() {
        let quad = extrude_quad(&unit_square(), Vec3::new(0.0, 0.0, 30.0), &LocalFrame::IDENTITY, &params(2.0));
        assert!(quad.dot < 0.0);
        assert!(!quad.flipped);
        assert_eq!(quad.sign, -1.0);
        assert_eq!(quad.corners(), &unit_square()[..]);
    }

    #[test]
    fn distance_curve_scales_push() {
        let curve = FadeCurve::fade_out(0.0, 200.0);
        let p = FadeParams { distance_fade: Some(&curve), ..params(10.0) };
        let quad = extrude_quad(&unit_square(), Vec3::new(0.0, 0.0, 100.0), &LocalFrame::IDENTITY, &p);
        assert!((quad.push_distance - 5.0).abs() < 1e-4);
        assert!(flap_distances_match(&quad, 5.0, 1e-3));
    }

    #[test]
    fn scale_mode_controls_local_offset_length() {
        let frame = LocalFrame::new(Vec3::splat(2.0), Quat::IDENTITY, Vec3::ZERO);
        let viewer = Vec3::new(0.0, 0.0, 60.0);

        let local = extrude_quad(&unit_square(), viewer, &frame, &params(3.0));
        assert!(flap_distances_match(&local, 3.0, 1e-3));

        let mut p = params(3.0);
        p.scale_mode = ScaleMode::World;
        let world = extrude_quad(&unit_square(), viewer, &frame, &p);
        // In local space the offset is halved; after the 2x scale it is 3 world units.
        assert!(flap_distances_match(&world, 1.5, 1e-3));
    }

    #[test]
    fn rotated_frame_matches_local_result() {
        let rotation = Quat::from_rotation_x(0.9);
        let frame = LocalFrame::new(Vec3::ONE, rotation, Vec3::new(5.0, -2.0, 7.0));
        let viewer = Vec3::new(1.0, 2.0, 40.0);
        let local = extrude_quad(&unit_square(), viewer, &LocalFrame::IDENTITY, &params(3.0));
        let placed = extrude_quad(&unit_square(), viewer, &frame, &params(3.0));
        for (a, b) in local.vertices.iter().zip(placed.vertices.iter()) {
            assert!(approx_eq(*a, *b, 1e-3));
        }
    }

    #[test]
    fn random_quads_push_exactly_glow_size() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let half = Vec2::new(rng.gen_range(0.5..20.0), rng.gen_range(0.5..20.0));
            let square = [
                Vec3::new(-half.x, -half.y, 0.0),
                Vec3::new(half.x, -half.y, 0.0),
                Vec3::new(half.x, half.y, 0.0),
                Vec3::new(-half.x, half.y, 0.0),
            ];
            let mut viewer = Vec3::new(
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
                rng.gen_range(5.0..100.0),
            );
            if rng.gen_bool(0.5) {
                viewer.z = -viewer.z;
            }
            let mut p = params(rng.gen_range(0.1..30.0));
            p.show_bottom = rng.gen_bool(0.5);
            let quad = extrude_quad(&square, viewer, &LocalFrame::IDENTITY, &p);

            assert!(flap_distances_match(&quad, p.glow_size, 1e-3 * p.glow_size.max(1.0)));
            assert!((0.0..=1.0).contains(&quad.alpha));
            assert!(quad.colors[4..].iter().all(|c| c.a == 0.0));
        }
    }

    #[test]
    fn random_convex_quads_keep_corners_and_push_width() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..300 {
            // Corners on an ellipse at increasing angles, one per quadrant: convex, counter-clockwise.
            let radii = Vec2::new(rng.gen_range(1.0..20.0), rng.gen_range(1.0..20.0));
            let flat: Vec<Vec3> = (0..4)
                .map(|q| {
                    let t = (q as f32 + rng.gen_range(0.1..0.9)) * std::f32::consts::FRAC_PI_2;
                    Vec3::new(radii.x * t.cos(), radii.y * t.sin(), 0.0)
                })
                .collect();

            // Tilt the plane and move it off the origin.
            let tilt = Quat::from_euler(
                glam::EulerRot::XYZ,
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-3.0..3.0),
            );
            let offset = Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let points = [0usize, 1, 2, 3].map(|i| tilt * flat[i] + offset);
            let normal = tilt * Vec3::Z;

            let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let in_plane = tilt * Vec3::new(rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0), 0.0);
            let viewer = offset + in_plane + normal * side * rng.gen_range(5.0..100.0);

            let frame = LocalFrame::new(
                Vec3::new(rng.gen_range(0.5..2.0), rng.gen_range(0.5..2.0), rng.gen_range(0.5..2.0)),
                Quat::from_rotation_y(rng.gen_range(-3.0..3.0)),
                Vec3::new(rng.gen_range(-10.0..10.0), 0.0, rng.gen_range(-10.0..10.0)),
            );
            let mut p = params(rng.gen_range(0.1..30.0));
            p.show_bottom = rng.gen_bool(0.5);
            let quad = extrude_quad(&points, viewer, &frame, &p);

            let expected = if quad.flipped {
                [points[0], points[3], points[2], points[1]]
            } else {
                points
            };
            assert_eq!(quad.corners(), &expected[..]);
            assert_eq!(quad.flipped, p.show_bottom && quad.dot < 0.0);
            assert_ne!(quad.sign, 0.0);
            assert!(flap_distances_match(&quad, quad.push_distance, 1e-3 * p.glow_size.max(1.0)));
        }
    }

    #[test]
    fn debug_edges_cover_every_corner() {
        let frame = LocalFrame::new(Vec3::ONE, Quat::IDENTITY, Vec3::new(0.0, 0.0, 5.0));
        let quad = extrude_quad(&unit_square(), Vec3::new(0.0, 0.0, 30.0), &frame, &params(1.0));
        let edges: Vec<_> = debug_edges(&quad, &frame).collect();
        assert_eq!(edges.len(), 28);
        assert_eq!(edges[3], (quad.vertices[0] + Vec3::Z * 5.0, quad.vertices[1] + Vec3::Z * 5.0));
    }
}
