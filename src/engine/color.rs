// Linear-space RGBA color used for vertex colors and masks.

/// Linear RGBA color. Alpha carries the glow fade; in generator output the
/// channels are one-hot masks telling the shader which offset rule a vertex uses.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl LinearColor {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const CYAN: Self = Self::new(0.0, 1.0, 1.0, 1.0);

    // Offset-rule masks written by the glow mesh generator.
    pub const MASK_NEXT: Self = Self::new(0.0, 1.0, 0.0, 0.0);
    pub const MASK_PREV: Self = Self::new(1.0, 0.0, 0.0, 0.0);
    pub const MASK_CENTER: Self = Self::new(0.0, 0.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same RGB, replaced alpha.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
