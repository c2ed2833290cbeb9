// Small vector helpers shared by the extruder and the mesh generator.
//
// Conventions:
//   - safe_normal() never produces NaN: zero-length input -> Vec3::ZERO
//   - sign() keeps zero (unlike f32::signum, which maps +0.0 to 1.0)

use glam::{Quat, Vec2, Vec3};

const NEARLY_ZERO: f32 = 1e-8;

// ============================================================================
// SCALAR HELPERS
// ============================================================================

/// Unit vector in the direction of `v`, or `Vec3::ZERO` for a zero-length `v`.
#[inline]
pub fn safe_normal(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// -1, 0 or +1. Zero stays zero so a viewer exactly on the plane pushes nothing.
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Map `value` from `range.x..range.y` onto `0..1`, clamped.
/// A collapsed range behaves as a step at `range.y`.
pub fn mapped_range_clamped(range: Vec2, value: f32) -> f32 {
    let divisor = range.y - range.x;
    let pct = if divisor.abs() <= NEARLY_ZERO {
        if value >= range.y { 1.0 } else { 0.0 }
    } else {
        (value - range.x) / divisor
    };
    pct.clamp(0.0, 1.0)
}

// ============================================================================
// LOCAL FRAME
// ============================================================================

/// Placement of the glow mesh in the world: scale, then rotate, then translate.
///
/// Mesh buffers always live in local space. The frame is only needed where the
/// extruder has to reason about the viewer in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub scale: Vec3,
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LocalFrame {
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    pub fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self { scale, rotation, translation }
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation * (self.scale * p) + self.translation
    }

    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation * (self.scale * v)
    }

    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.inverse_transform_vector(p - self.translation)
    }

    /// World -> local for directions, undoing scale. Zero scale axes map to zero.
    pub fn inverse_transform_vector(&self, v: Vec3) -> Vec3 {
        let unrotated = self.rotation.inverse() * v;
        Vec3::new(
            safe_div(unrotated.x, self.scale.x),
            safe_div(unrotated.y, self.scale.y),
            safe_div(unrotated.z, self.scale.z),
        )
    }

    /// World -> local for directions, rotation only.
    pub fn inverse_transform_vector_no_scale(&self, v: Vec3) -> Vec3 {
        self.rotation.inverse() * v
    }

    /// Model matrix for rendering.
    pub fn to_mat4(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

fn safe_div(a: f32, b: f32) -> f32 {
    if b.abs() <= NEARLY_ZERO { 0.0 } else { a / b }
}

#[cfg(test)]
pub(crate) fn approx_eq(a: Vec3, b: Vec3, tol: f32) -> bool {
    (a - b).abs().max_element() <= tol
}
