//! Configuration-time errors.
//!
//! Nothing in here is ever produced by audio processing. The per-sample path
//! has no failure modes: out-of-range values are clamped by setters, delay
//! offsets are masked, and feedback is bounded by saturation. These errors
//! only come out of engine construction and activation, where the plugin glue
//! can still refuse the host's configuration.
//!
//! `validate_sample_rate` only sets the lower bound. The upper bound depends
//! on how long a ring each engine was built with, so the engines check it
//! themselves.

/// Lowest sample rate the engines accept.
///
/// The LFO phase wrap subtracts one full turn per step, which is only exact
/// while the per-sample increment stays far below a turn. At 8 kHz the fastest
/// LFO (6.8 Hz) advances about 0.005 rad per sample.
pub const MIN_SAMPLE_RATE: f32 = 8000.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unsupported sample rate {0} Hz (must be finite and at least 8000 Hz)")]
    UnsupportedSampleRate(f32),

    #[error("maximum block size must be non-zero")]
    BlockSizeZero,

    /// The engine's delay ring was sized for a lower rate than it is being
    /// activated at. Rebuild the engine with `new` instead.
    #[error("{needed} samples of delay needed at {sample_rate} Hz, but the ring holds {available}")]
    DelayCapacityExceeded {
        sample_rate: f32,
        needed: f32,
        available: f32,
    },
}

/// Check a host sample rate before any coefficients are derived from it.
pub fn validate_sample_rate(sample_rate: f32) -> Result<f32, EngineError> {
    if sample_rate.is_finite() && sample_rate >= MIN_SAMPLE_RATE {
        Ok(sample_rate)
    } else {
        Err(EngineError::UnsupportedSampleRate(sample_rate))
    }
}
