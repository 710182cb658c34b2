//! One-pole exponential smoother.
//!
//! ```text
//! current += (target - current) * coefficient
//! ```
//!
//! The echo glides its delay time with `coefficient = 0.00005`. That pole
//! is so slow (about 20000 samples per time constant) that a delay-time
//! change is heard as a tape-speed swoop instead of a jump. The distance to
//! the target shrinks by a factor of `1 - coefficient` every sample, so it
//! takes `ln(0.01) / ln(1 - coefficient)` samples (about 92 100 at this
//! coefficient) to get within 1%.
//!
//! The state is kept in `f64`. Near the end of a glide the per-sample step
//! is a few `f32` ULPs wide, and rounding would visibly bend the curve.

/// Per-sample pole of the echo's delay-time glide.
pub const DELAY_GLIDE_COEFFICIENT: f32 = 0.00005;

#[derive(Debug, Clone)]
pub struct OnePoleSmoother {
    current: f64,
    target: f64,
    coefficient: f64,
}

impl OnePoleSmoother {
    /// Start settled at `value`.
    pub fn new(value: f32, coefficient: f32) -> Self {
        Self {
            current: f64::from(value),
            target: f64::from(value),
            coefficient: f64::from(coefficient),
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = f64::from(target);
    }

    /// Jump straight to `value` with no glide.
    pub fn snap_to(&mut self, value: f32) {
        self.current = f64::from(value);
        self.target = self.current;
    }

    /// Move one sample toward the target and return the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.current += (self.target - self.current) * self.coefficient;
        self.current as f32
    }

    pub fn current(&self) -> f32 {
        self.current as f32
    }

    pub fn target(&self) -> f32 {
        self.target as f32
    }
}
