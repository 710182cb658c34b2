//! Soft-knee saturation for the echo's feedback loop.
//!
//! ```text
//! y = x / (KNEE + |x|)      KNEE = 0.75
//! ```
//!
//! Near zero the gain is `1 / 0.75`, about +2.5 dB. As `|x|` grows the
//! output approaches ±1 without reaching it. With regeneration above unity
//! the loop would otherwise grow without bound; the saturator caps what goes
//! into the delay line, so every echo stays below full scale.

/// Knee constant of the saturator.
pub const SATURATION_KNEE: f32 = 0.75;

/// Apply the soft-knee curve to one sample. `|soft_saturate(x)| < 1` for all
/// finite `x`.
#[inline]
pub fn soft_saturate(x: f32) -> f32 {
    x / (SATURATION_KNEE + x.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_maps_to_zero() {
        assert_eq!(soft_saturate(0.0), 0.0);
    }

    #[test]
    fn test_odd_symmetry() {
        for x in [0.1, 0.5, 1.0, 3.0, 100.0] {
            assert_eq!(soft_saturate(-x), -soft_saturate(x));
        }
    }

    #[test]
    fn test_bounded_below_unity() {
        for x in [1.0, 10.0, 1.0e3, 1.0e6] {
            let y = soft_saturate(x);
            assert!(y < 1.0 && y > 0.0, "saturate({x}) = {y}");
        }
    }

    /// Half-scale lands exactly on the knee.
    #[test]
    fn test_known_points() {
        assert!((soft_saturate(0.75) - 0.5).abs() < 1e-6);
        assert!((soft_saturate(2.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic() {
        let mut previous = soft_saturate(-10.0);
        for i in -999..=1000 {
            let y = soft_saturate(i as f32 / 100.0);
            assert!(y > previous, "not increasing at {}", i as f32 / 100.0);
            previous = y;
        }
    }
}
