//! # Phase-Accumulator LFOs
//!
//! The modulation sources are bare phase accumulators. Each step adds a fixed
//! angular increment and wraps the phase back by one full turn once it passes
//! `2π`:
//!
//! ```text
//! increment = 2π * frequency / sample_rate
//! phase    += increment
//! if phase > 2π { phase -= 2π }
//! ```
//!
//! The oscillator hands out the raw phase, not a waveform. Callers take
//! `sin(phase + offset)` themselves, which is how one pair of LFOs drives the
//! three chorus voices at 0°, 120° and 240°.
//!
//! The wrap is a single subtraction, not a modulo. It is exact as long as the
//! increment is smaller than one turn, which holds for every sample rate the
//! engines accept (see [`crate::error::MIN_SAMPLE_RATE`]).
//!
//! Phases are kept in `f64`: at 0.5 Hz and 192 kHz the increment is about
//! 1.6e-5 rad, and an `f32` accumulator near 2π would lose most of it.

use std::f64::consts::TAU;

/// A single free-running phase accumulator.
#[derive(Debug, Clone, Default)]
pub struct Oscillator {
    phase: f64,
    increment: f64,
}

impl Oscillator {
    /// Set the rate from a frequency in Hz. The phase is not touched.
    pub fn set_frequency(&mut self, frequency_hz: f64, sample_rate: f64) {
        self.increment = TAU * frequency_hz / sample_rate;
        nih_plug::nih_debug_assert!(
            self.increment < TAU,
            "LFO increment must stay below one turn"
        );
    }

    /// Advance one sample and return the new phase.
    #[inline]
    pub fn step(&mut self) -> f64 {
        self.phase += self.increment;
        if self.phase > TAU {
            self.phase -= TAU;
        }
        self.phase
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// The fast and slow LFOs every engine carries.
#[derive(Debug, Clone)]
pub struct OscillatorPair {
    fast_hz: f64,
    slow_hz: f64,
    fast: Oscillator,
    slow: Oscillator,
}

impl OscillatorPair {
    /// Create a pair with fixed rates. Increments stay at zero until
    /// [`reset`](Self::reset) supplies a sample rate.
    pub fn new(fast_hz: f64, slow_hz: f64) -> Self {
        Self {
            fast_hz,
            slow_hz,
            fast: Oscillator::default(),
            slow: Oscillator::default(),
        }
    }

    /// Derive both increments from `sample_rate` and zero both phases.
    pub fn reset(&mut self, sample_rate: f32) {
        let sample_rate = f64::from(sample_rate);
        self.fast.set_frequency(self.fast_hz, sample_rate);
        self.slow.set_frequency(self.slow_hz, sample_rate);
        self.fast.reset();
        self.slow.reset();
    }

    /// Advance both LFOs one sample and return `(fast_phase, slow_phase)`.
    #[inline]
    pub fn step(&mut self) -> (f64, f64) {
        (self.fast.step(), self.slow.step())
    }

    pub fn fast(&self) -> &Oscillator {
        &self.fast
    }

    pub fn slow(&self) -> &Oscillator {
        &self.slow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_from_frequency() {
        let mut osc = Oscillator::default();
        osc.set_frequency(1.0, 4.0);
        assert!((osc.increment() - TAU / 4.0).abs() < 1e-12);
    }

    /// A 1 Hz oscillator at 100 Hz wraps once every 100 steps and its phase
    /// never leaves [0, 2π].
    #[test]
    fn test_phase_wraps_once_per_cycle() {
        let mut osc = Oscillator::default();
        osc.set_frequency(1.0, 100.0);

        let mut wraps = 0;
        let mut previous = osc.phase();
        for _ in 0..1050 {
            let phase = osc.step();
            assert!((0.0..=TAU).contains(&phase), "phase out of range: {phase}");
            if phase < previous {
                wraps += 1;
            }
            previous = phase;
        }
        assert_eq!(wraps, 10);
    }

    #[test]
    fn test_pair_steps_independently() {
        let mut pair = OscillatorPair::new(5.7, 0.5);
        pair.reset(48000.0);

        let (fast, slow) = pair.step();
        assert!((fast - TAU * 5.7 / 48000.0).abs() < 1e-12);
        assert!((slow - TAU * 0.5 / 48000.0).abs() < 1e-12);
        assert!(fast > slow);
    }

    #[test]
    fn test_pair_reset_zeroes_phase() {
        let mut pair = OscillatorPair::new(6.8, 0.7);
        pair.reset(44100.0);
        for _ in 0..1234 {
            pair.step();
        }
        assert!(pair.fast().phase() > 0.0);

        pair.reset(96000.0);
        assert_eq!(pair.fast().phase(), 0.0);
        assert_eq!(pair.slow().phase(), 0.0);
        assert!((pair.fast().increment() - TAU * 6.8 / 96000.0).abs() < 1e-12);
    }
}
