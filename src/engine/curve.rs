// Distance-fade curves: viewer distance -> glow width multiplier.

/// Maps the viewer's distance from the quad center to a multiplier on the glow width.
/// Expected to be monotonic and non-negative; neither is enforced.
pub trait DistanceFadeCurve {
    fn evaluate(&self, distance: f32) -> f32;
}

impl<F: Fn(f32) -> f32> DistanceFadeCurve for F {
    fn evaluate(&self, distance: f32) -> f32 {
        self(distance)
    }
}

/// Piecewise-linear curve through `(distance, multiplier)` keys.
/// Values outside the keyed range are held at the first/last key.
/// An empty curve evaluates to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FadeCurve {
    keys: Vec<(f32, f32)>,
}

impl FadeCurve {
    /// Keys are sorted by distance; order of the input does not matter.
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Full width up to `near`, fading linearly to zero at `far`.
    pub fn fade_out(near: f32, far: f32) -> Self {
        Self::new(vec![(near, 1.0), (far, 0.0)])
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }
}

impl DistanceFadeCurve for FadeCurve {
    fn evaluate(&self, distance: f32) -> f32 {
        let (Some(&first), Some(&last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };
        // NaN fails every comparison below and would index before the first key.
        if distance.is_nan() || distance <= first.0 {
            return first.1;
        }
        if distance >= last.0 {
            return last.1;
        }
        // keys[hi - 1].0 <= distance < keys[hi].0
        let hi = self.keys.partition_point(|k| k.0 <= distance);
        let (x0, y0) = self.keys[hi - 1];
        let (x1, y1) = self.keys[hi];
        let t = (distance - x0) / (x1 - x0);
        y0 + (y1 - y0) * t
    }
}
