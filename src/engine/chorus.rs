//! # Triple Chorus Engine
//!
//! An emulation of a string-machine ensemble: one short delay line read by
//! three taps, each swept by the same two LFOs at a different phase, then
//! averaged.
//!
//! ## Signal Flow
//!
//! ```text
//!            ┌──────────────┐     ┌────────────┐   ┌─► tap   0° ─┐
//! Input ────►│ Pre-emphasis │────►│ Delay line │───┼─► tap 120° ─┼─► ÷3 ──► Post 12 kHz ──► Post 5 kHz ──► Output
//!            │ 12.6 kHz Q1.3│     │  1024 slots│   └─► tap 240° ─┘          Q 0.7            Q 3
//!            └──────────────┘     └────────────┘
//!                                        ▲
//!                  fast 5.7 Hz ──┐       │
//!                                ├── per-voice delay modulation
//!                  slow 0.5 Hz ──┘
//! ```
//!
//! ## Per-Voice Modulation
//!
//! For each voice, every sample:
//!
//! ```text
//! lfo   = fast_depth * sin(fast_phase + offset) + slow_depth * sin(slow_phase + offset)
//! delay = (BASE_DELAY + MOD_AMOUNT * lfo) * sample_rate
//! ```
//!
//! The depth weights come from a simulation of the ensemble's LFO mixing
//! network. They are tuning data, not a formula.
//!
//! No voice's weights sum past 1, so a tap never reaches further back than
//! `BASE_DELAY + MOD_AMOUNT`. The ring is sized from that in `new()`, and
//! `activate()` refuses a sample rate the ring can no longer serve.

use super::EngineState;
use crate::dsp::delay_line::DelayLine;
use crate::dsp::filter::{FilterTuning, ResonantFilter};
use crate::dsp::oscillator::OscillatorPair;
use crate::error::{validate_sample_rate, EngineError};

/// Smallest ring the engine allocates. Enough for the 4 ms worst-case tap
/// up to ~255 kHz; `new` allocates more above that.
pub const CHORUS_CAPACITY: usize = 1024;

pub const CHORUS_FAST_LFO_HZ: f64 = 5.7;
pub const CHORUS_SLOW_LFO_HZ: f64 = 0.5;

/// Centre of every voice's delay sweep.
pub const BASE_DELAY_SECONDS: f64 = 0.002;
/// Delay change per unit of LFO signal.
pub const MOD_AMOUNT_SECONDS: f64 = 0.002;

/// Input emphasis, modelled on the ensemble's Sallen-Key stage.
pub const PRE_EMPHASIS: FilterTuning = FilterTuning::new(12600.0, 1.3);
/// First post stage, a gentle rolloff.
pub const POST_SMOOTHING: FilterTuning = FilterTuning::new(12000.0, 0.7);
/// Second, sharper post stage that takes the edge off the modulated taps.
pub const POST_ROUGHNESS: FilterTuning = FilterTuning::new(5000.0, 3.0);

const VOICE_COUNT: f32 = 3.0;

/// Longest delay any voice can ask for at `sample_rate`, in samples.
fn worst_case_delay_samples(sample_rate: f32) -> f64 {
    (BASE_DELAY_SECONDS + MOD_AMOUNT_SECONDS) * f64::from(sample_rate)
}

/// One modulated tap of the chorus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusVoice {
    /// Offset added to both LFO phases, in radians.
    pub phase_offset: f64,
    /// Weight of the fast LFO.
    pub fast_depth: f64,
    /// Weight of the slow LFO.
    pub slow_depth: f64,
    /// Output level of this tap before averaging. 1.0 for the ensemble.
    pub level: f32,
}

/// The ensemble voice table: phase offsets of roughly 0°, 120° and 240°.
pub const ENSEMBLE_VOICES: [ChorusVoice; 3] = [
    ChorusVoice {
        phase_offset: 0.0,
        fast_depth: 0.203,
        slow_depth: 0.635,
        level: 1.0,
    },
    ChorusVoice {
        phase_offset: 2.09,
        fast_depth: 0.248,
        slow_depth: 0.745,
        level: 1.0,
    },
    ChorusVoice {
        phase_offset: 4.18,
        fast_depth: 0.252,
        slow_depth: 0.609,
        level: 1.0,
    },
];

impl ChorusVoice {
    /// Delay of this tap, in samples, for the given LFO phases.
    #[inline]
    pub fn delay_samples(&self, fast_phase: f64, slow_phase: f64, sample_rate: f32) -> f32 {
        let lfo = self.fast_depth * (fast_phase + self.phase_offset).sin()
            + self.slow_depth * (slow_phase + self.phase_offset).sin();
        ((BASE_DELAY_SECONDS + MOD_AMOUNT_SECONDS * lfo) * f64::from(sample_rate)) as f32
    }
}

#[derive(Debug, Clone)]
pub struct ChorusEngine {
    state: EngineState,
    sample_rate: f32,
    voices: [ChorusVoice; 3],

    pre_filter: ResonantFilter,
    post_filters: [ResonantFilter; 2],
    lfo: OscillatorPair,
    delay: DelayLine,
}

impl ChorusEngine {
    /// Allocate the engine. It starts [`EngineState::Inactive`]; call
    /// [`activate`](Self::activate) before processing.
    pub fn new(sample_rate: f32) -> Result<Self, EngineError> {
        let sample_rate = validate_sample_rate(sample_rate)?;

        // Interpolation reads one slot past the tap, and the ring keeps one
        // more for the sample being written.
        let needed = worst_case_delay_samples(sample_rate).ceil() as usize + 2;

        Ok(Self {
            state: EngineState::Inactive,
            sample_rate,
            voices: ENSEMBLE_VOICES,
            pre_filter: ResonantFilter::new(),
            post_filters: [ResonantFilter::new(), ResonantFilter::new()],
            lfo: OscillatorPair::new(CHORUS_FAST_LFO_HZ, CHORUS_SLOW_LFO_HZ),
            delay: DelayLine::new(needed.max(CHORUS_CAPACITY)),
        })
    }

    /// Retune every filter and LFO for `sample_rate`, zero all filter
    /// memories, rewind the LFOs and clear the delay line.
    ///
    /// Must be called again whenever the sample rate changes. Does not
    /// allocate, so a rate higher than the one passed to `new` fails with
    /// [`EngineError::DelayCapacityExceeded`] once the taps would outgrow
    /// the ring. On error the engine is left untouched.
    pub fn activate(&mut self, sample_rate: f32) -> Result<(), EngineError> {
        let sample_rate = validate_sample_rate(sample_rate)?;

        let needed = worst_case_delay_samples(sample_rate);
        let available = self.delay.max_delay_samples();
        if needed > f64::from(available) {
            return Err(EngineError::DelayCapacityExceeded {
                sample_rate,
                needed: needed as f32,
                available,
            });
        }

        self.sample_rate = sample_rate;

        self.pre_filter.apply(PRE_EMPHASIS, self.sample_rate);
        self.post_filters[0].apply(POST_SMOOTHING, self.sample_rate);
        self.post_filters[1].apply(POST_ROUGHNESS, self.sample_rate);
        self.pre_filter.reset();
        for filter in &mut self.post_filters {
            filter.reset();
        }

        self.lfo.reset(self.sample_rate);
        self.delay.clear();
        self.state = EngineState::Active;
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Longest delay the ring can serve, in samples.
    pub fn max_delay_samples(&self) -> f32 {
        self.delay.max_delay_samples()
    }

    pub fn voices(&self) -> &[ChorusVoice; 3] {
        &self.voices
    }

    /// Replace the voice table. Takes effect on the next sample.
    pub fn set_voices(&mut self, voices: [ChorusVoice; 3]) {
        self.voices = voices;
    }

    /// Process `input` into `output`. If the lengths differ, only the
    /// overlapping part is written.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let len = input.len().min(output.len());
        let (input, output) = (&input[..len], &mut output[..len]);

        if self.state != EngineState::Active {
            nih_plug::nih_debug_assert_failure!("chorus processed before activate()");
            output.fill(0.0);
            return;
        }

        self.pre_filter.process_block(input, output);
        self.render(output);
    }

    /// Process a block in place.
    pub fn process_in_place(&mut self, block: &mut [f32]) {
        if self.state != EngineState::Active {
            nih_plug::nih_debug_assert_failure!("chorus processed before activate()");
            block.fill(0.0);
            return;
        }

        self.pre_filter.process_in_place(block);
        self.render(block);
    }

    /// Run the voices and post-filters over an already pre-filtered block.
    fn render(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let (fast_phase, slow_phase) = self.lfo.step();
            self.delay.write(*sample);

            let mut sum = 0.0;
            for voice in &self.voices {
                let delay = voice.delay_samples(fast_phase, slow_phase, self.sample_rate);
                sum += voice.level * self.delay.read(delay);
            }
            *sample = sum / VOICE_COUNT;
        }

        for filter in &mut self.post_filters {
            filter.process_in_place(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn active_engine() -> ChorusEngine {
        let mut engine = ChorusEngine::new(SR).unwrap();
        engine.activate(SR).unwrap();
        engine
    }

    fn test_signal(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / SR;
                0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
                    + 0.25 * (2.0 * std::f32::consts::PI * 3150.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_new_starts_inactive() {
        let engine = ChorusEngine::new(SR).unwrap();
        assert_eq!(engine.state(), EngineState::Inactive);
        assert!(ChorusEngine::new(0.0).is_err());
    }

    #[test]
    fn test_inactive_outputs_silence() {
        let mut engine = ChorusEngine::new(SR).unwrap();
        let input = vec![1.0; 64];
        let mut output = vec![0.5; 64];
        engine.process(&input, &mut output);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut engine = active_engine();
        let input = vec![0.0; 4096];
        let mut output = vec![1.0; 4096];
        engine.process(&input, &mut output);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_zero_length_block_is_noop() {
        let mut engine = active_engine();
        let mut empty: [f32; 0] = [];
        engine.process(&[], &mut empty);
        engine.process_in_place(&mut empty);
    }

    /// All three taps read a constant, so after the filters settle the
    /// output is that constant.
    #[test]
    fn test_dc_gain_is_unity() {
        let mut engine = active_engine();
        let input = vec![0.4; 48000];
        let mut output = vec![0.0; 48000];
        engine.process(&input, &mut output);
        let last = output[output.len() - 1];
        assert!((last - 0.4).abs() < 1e-3, "expected 0.4, got {last}");
    }

    /// Every voice's delay stays inside the ring at any phase, including
    /// rates past the point where the minimum ring would be too short.
    #[test]
    fn test_voice_delays_fit_capacity() {
        for sr in [22050.0, 44100.0, 48000.0, 96000.0, 192000.0, 384000.0, 768000.0] {
            let engine = ChorusEngine::new(sr).unwrap();
            for voice in &ENSEMBLE_VOICES {
                for i in 0..360 {
                    let fast = f64::from(i) * std::f64::consts::TAU / 360.0;
                    for j in 0..36 {
                        let slow = f64::from(j) * std::f64::consts::TAU / 36.0;
                        let d = voice.delay_samples(fast, slow, sr);
                        assert!(
                            d >= 0.0 && d <= engine.max_delay_samples(),
                            "delay {d} out of range at {sr} Hz"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_ring_grows_with_sample_rate() {
        assert_eq!(ChorusEngine::new(48000.0).unwrap().max_delay_samples(), 1022.0);
        assert_eq!(ChorusEngine::new(384000.0).unwrap().max_delay_samples(), 2046.0);
    }

    /// An engine built for 48 kHz cannot serve 384 kHz without reallocating,
    /// so activation refuses and the engine keeps its old configuration.
    #[test]
    fn test_activate_rejects_rate_beyond_ring() {
        let mut engine = active_engine();
        let err = engine.activate(384000.0).unwrap_err();
        assert!(
            matches!(err, EngineError::DelayCapacityExceeded { available, .. } if available == 1022.0),
            "unexpected error: {err:?}"
        );
        assert_eq!(engine.sample_rate(), SR);
        assert_eq!(engine.state(), EngineState::Active);

        // Lower rates always fit.
        engine.activate(44100.0).unwrap();
        assert_eq!(engine.sample_rate(), 44100.0);
    }

    /// At 384 kHz the engine matches a reference built on a ring far
    /// longer than any tap, so no voice reads an aliased slot.
    #[test]
    fn test_high_rate_taps_do_not_alias() {
        let sr = 384000.0;
        let mut engine = ChorusEngine::new(sr).unwrap();
        engine.activate(sr).unwrap();

        let input: Vec<f32> = (0..8192)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr).sin())
            .collect();
        let mut output = vec![0.0; input.len()];
        engine.process(&input, &mut output);

        let mut pre = ResonantFilter::new();
        pre.apply(PRE_EMPHASIS, sr);
        let mut post_a = ResonantFilter::new();
        post_a.apply(POST_SMOOTHING, sr);
        let mut post_b = ResonantFilter::new();
        post_b.apply(POST_ROUGHNESS, sr);
        let mut lfo = OscillatorPair::new(CHORUS_FAST_LFO_HZ, CHORUS_SLOW_LFO_HZ);
        lfo.reset(sr);
        let mut ring = DelayLine::new(8192);

        for (i, &x) in input.iter().enumerate() {
            let (fast, slow) = lfo.step();
            ring.write(pre.process(x));
            let mut sum = 0.0;
            for voice in &ENSEMBLE_VOICES {
                sum += ring.read(voice.delay_samples(fast, slow, sr));
            }
            let expected = post_b.process(post_a.process(sum / 3.0));
            assert!(
                (output[i] - expected).abs() < 1e-5,
                "sample {i}: engine {} vs reference {expected}",
                output[i]
            );
        }
    }

    /// With two voices muted, the output is the remaining voice's tap,
    /// divided by three, through the post cascade.
    #[test]
    fn test_single_voice_isolation() {
        let mut voices = ENSEMBLE_VOICES;
        voices[1].level = 0.0;
        voices[2].level = 0.0;

        let mut engine = ChorusEngine::new(SR).unwrap();
        engine.set_voices(voices);
        engine.activate(SR).unwrap();

        let input = test_signal(8192);
        let mut output = vec![0.0; input.len()];
        engine.process(&input, &mut output);

        let mut pre = ResonantFilter::new();
        pre.apply(PRE_EMPHASIS, SR);
        let mut post_a = ResonantFilter::new();
        post_a.apply(POST_SMOOTHING, SR);
        let mut post_b = ResonantFilter::new();
        post_b.apply(POST_ROUGHNESS, SR);
        let mut lfo = OscillatorPair::new(CHORUS_FAST_LFO_HZ, CHORUS_SLOW_LFO_HZ);
        lfo.reset(SR);
        let mut ring = DelayLine::new(CHORUS_CAPACITY);

        for (i, &x) in input.iter().enumerate() {
            let (fast, slow) = lfo.step();
            ring.write(pre.process(x));
            let tap = ring.read(ENSEMBLE_VOICES[0].delay_samples(fast, slow, SR)) / 3.0;
            let expected = post_b.process(post_a.process(tap));
            assert!(
                (output[i] - expected).abs() < 1e-6,
                "sample {i}: engine {} vs reference {expected}",
                output[i]
            );
        }
    }

    #[test]
    fn test_in_place_matches_separate_buffers() {
        let input = test_signal(2048);

        let mut a = active_engine();
        let mut separate = vec![0.0; input.len()];
        for (inp, out) in input.chunks(256).zip(separate.chunks_mut(256)) {
            a.process(inp, out);
        }

        let mut b = active_engine();
        let mut in_place = input.clone();
        for block in in_place.chunks_mut(100) {
            b.process_in_place(block);
        }

        assert_eq!(separate, in_place);
    }

    /// Re-activating wipes all history: the engine behaves like a new one.
    #[test]
    fn test_activate_resets_history() {
        let noise = test_signal(3000);
        let probe = test_signal(1500);

        let mut used = active_engine();
        let mut scratch = vec![0.0; noise.len()];
        used.process(&noise, &mut scratch);
        used.activate(SR).unwrap();

        let mut fresh = active_engine();

        let mut out_used = vec![0.0; probe.len()];
        let mut out_fresh = vec![0.0; probe.len()];
        used.process(&probe, &mut out_used);
        fresh.process(&probe, &mut out_fresh);
        assert_eq!(out_used, out_fresh);
    }

    /// One second of program material stays finite and well below clipping,
    /// and the averaged taps do not cancel each other out.
    #[test]
    fn test_output_is_bounded_and_audible() {
        let input = test_signal(48000);
        let mut engine = active_engine();
        let mut output = vec![0.0; input.len()];
        engine.process(&input, &mut output);

        assert!(output.iter().all(|s| s.is_finite() && s.abs() < 2.0));

        let energy: f32 = output[24000..].iter().map(|s| s * s).sum();
        assert!(energy > 1.0, "chorus output unexpectedly quiet: {energy}");
    }
}
