//! # Two-Pole Resonant Lowpass
//!
//! Every tone-shaping stage in both effects is the same filter: a two-pole
//! (12 dB/octave) lowpass with a resonance control. The chorus uses three of
//! them (one pre-emphasis, a cascade of two after the voices), the echo uses
//! two (pre-emphasis and a post-filter whose cutoff follows the delay time).
//!
//! ## Coefficients
//!
//! The coefficients come from the "corrected" state-variable form described
//! by Fons Adriaensen. With `F` the cutoff as a fraction of the sample rate:
//!
//! ```text
//! w  = 2 * tan(π * F)
//! a  = w / Q
//! b  = w * w
//! c1 = (a + b) / (1 + a/2 + b/4)
//! c2 = b / (a + b)
//! d0 = c1 * c2 / 4
//! ```
//!
//! The `tan` prewarp keeps the cutoff where it was asked for even well above
//! a quarter of the sample rate, where a plain bilinear design drifts.
//!
//! ## Per-Sample Update
//!
//! ```text
//! x       = input - z1 - z2
//! z2     += c2 * z1
//! z1     += c1 * x
//! output  = d0 * x + z2
//! ```
//!
//! `z1` and `z2` are the two integrator memories. At DC, `z1` settles to zero
//! and `z2` settles to the input, so the steady-state gain is exactly 1.
//!
//! ## Parameter Safety
//!
//! [`ResonantFilter::configure`] does no validation: a cutoff at or above
//! Nyquist, or a resonance at or below zero, yields infinite or NaN
//! coefficients. The engines always go through
//! [`ResonantFilter::configure_clamped`], which pins the cutoff into
//! `[20 Hz, 0.49 × sample_rate]` and the resonance to at least 0.1.

use std::f32::consts::PI;

/// Lowest cutoff accepted by [`ResonantFilter::configure_clamped`].
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Highest cutoff accepted by [`ResonantFilter::configure_clamped`], as a
/// fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Lowest resonance accepted by [`ResonantFilter::configure_clamped`].
pub const MIN_RESONANCE: f32 = 0.1;

/// A fixed cutoff/resonance pair, used for the engines' built-in tunings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterTuning {
    pub cutoff_hz: f32,
    pub resonance: f32,
}

impl FilterTuning {
    pub const fn new(cutoff_hz: f32, resonance: f32) -> Self {
        Self {
            cutoff_hz,
            resonance,
        }
    }
}

/// A two-pole resonant lowpass filter.
///
/// A freshly constructed filter has all coefficients at zero and outputs
/// silence until it is configured.
#[derive(Debug, Clone, Default)]
pub struct ResonantFilter {
    /// First integrator memory.
    z1: f32,
    /// Second integrator memory. Holds the lowpass output before the `d0`
    /// correction term is added.
    z2: f32,

    c1: f32,
    c2: f32,
    d0: f32,
}

impl ResonantFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the coefficients for a cutoff, resonance (Q) and sample rate.
    ///
    /// The integrator memories are left alone, so a filter can be retuned
    /// between blocks without a click.
    ///
    /// No validation happens here. Callers that take values from the outside
    /// world should use [`configure_clamped`](Self::configure_clamped).
    pub fn configure(&mut self, cutoff_hz: f32, resonance: f32, sample_rate: f32) {
        let f = cutoff_hz / sample_rate;
        let w = 2.0 * (PI * f).tan();
        let a = w / resonance;
        let b = w * w;

        self.c1 = (a + b) / (1.0 + a / 2.0 + b / 4.0);
        self.c2 = b / (a + b);
        self.d0 = self.c1 * self.c2 / 4.0;
    }

    /// Like [`configure`](Self::configure), but with the cutoff clamped to
    /// `[MIN_CUTOFF_HZ, MAX_CUTOFF_RATIO × sample_rate]` and the resonance to
    /// at least `MIN_RESONANCE`, so the coefficients are always finite.
    pub fn configure_clamped(&mut self, cutoff_hz: f32, resonance: f32, sample_rate: f32) {
        let safe_cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, sample_rate * MAX_CUTOFF_RATIO);
        let safe_resonance = resonance.max(MIN_RESONANCE);
        self.configure(safe_cutoff, safe_resonance, sample_rate);
    }

    /// Apply one of the engines' built-in tunings.
    pub fn apply(&mut self, tuning: FilterTuning, sample_rate: f32) {
        self.configure_clamped(tuning.cutoff_hz, tuning.resonance, sample_rate);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let x = input - self.z1 - self.z2;
        self.z2 += self.c2 * self.z1;
        self.z1 += self.c1 * x;
        self.d0 * x + self.z2
    }

    /// Filter `input` into `output`. Only the overlapping length is processed
    /// if the slices differ in size.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = self.process(sample);
        }
    }

    /// Filter a block in place.
    pub fn process_in_place(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear the integrator memories. Coefficients are kept.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
