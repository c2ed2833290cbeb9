// Wireframe debug output. Purely diagnostic; hosts may pass `NoDebugLines`.

use glam::Vec3;
use super::color::LinearColor;

pub const DEBUG_EDGE_COLOR: LinearColor = LinearColor::new(0.0, 0.0, 1.0, 1.0);

pub trait DebugLineSink {
    fn line(&mut self, from: Vec3, to: Vec3, color: LinearColor);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDebugLines;

impl DebugLineSink for NoDebugLines {
    fn line(&mut self, _from: Vec3, _to: Vec3, _color: LinearColor) {}
}

/// World-space segments collected for one frame. `clear` keeps the allocation.
#[derive(Debug, Default, Clone)]
pub struct DebugLines {
    pub segments: Vec<(Vec3, Vec3, LinearColor)>,
}

impl DebugLines {
    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

impl DebugLineSink for DebugLines {
    fn line(&mut self, from: Vec3, to: Vec3, color: LinearColor) {
        self.segments.push((from, to, color));
    }
}
