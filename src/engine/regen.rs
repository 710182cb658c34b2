//! # Regenerative Echo Engine
//!
//! A tape-style echo: one long delay line, a feedback path closed around a
//! soft saturator, a delay time that glides instead of jumping, and a
//! post-filter that darkens as the delay gets longer.
//!
//! ## Signal Flow
//!
//! ```text
//!            ┌──────────────┐                ┌─────────────┐      ┌─────────────┐     ┌─────────────┐
//! Input ────►│ Pre-emphasis │──►(+)──► sat ──►│ Delay line  │─────►│ read at     │────►│ Post-filter │──┬──► Output
//!            │ 12.6 kHz Q1.3│    ▲            │ 65536 slots │      │ glide × sr  │     │ 6 kHz - 1k×t│  │
//!            └──────────────┘    │            └─────────────┘      └─────────────┘     └─────────────┘  │
//!                                │                                                                      │
//!                                └──────── × regeneration ◄── previous block's output ◄─────────────────┘
//! ```
//!
//! ## The Feedback Path Runs One Block Behind
//!
//! The post-filter runs over the whole output block after the per-sample
//! loop. Its result is kept and becomes the feedback signal of the *next*
//! block, sample by sample:
//!
//! ```text
//! z[i] = soft_saturate(filtered_input[i] + regeneration * previous_output[i])
//! ```
//!
//! Each repeat therefore arrives one block later than the delay time alone
//! would suggest. With the default 64-512 sample blocks this is a few
//! milliseconds on a delay of hundreds.
//!
//! "One block" means the block actually processed, which the host may vary.
//! The feedback buffer is indexed by position within the block, so after a
//! short block only its head is refreshed. If a 512-sample block is followed
//! by a 64-sample one and then another 512, samples 64..512 of the third
//! block feed back the first block's output, two blocks behind.
//!
//! ## Delay-Time Glide
//!
//! The host's delay time is clamped once per block so the read never reaches
//! past the ring, then approached by a one-pole smoother with a pole of
//! 0.00005 per sample. Turning the knob sounds like a tape machine changing
//! speed.
//!
//! ## Tone Tracking
//!
//! Once per block the post-filter is retuned to
//! `6000 Hz - 1000 Hz × smoothed_delay_seconds`, so longer echoes come back
//! darker.

use super::EngineState;
use crate::dsp::delay_line::DelayLine;
use crate::dsp::filter::{FilterTuning, ResonantFilter};
use crate::dsp::oscillator::OscillatorPair;
use crate::dsp::saturation::soft_saturate;
use crate::dsp::smoother::{OnePoleSmoother, DELAY_GLIDE_COEFFICIENT};
use crate::error::{validate_sample_rate, EngineError};

/// Ring size. Bounds the longest delay to `65534 / sample_rate` seconds,
/// about 1.49 s at 44.1 kHz and 0.68 s at 96 kHz.
pub const ECHO_CAPACITY: usize = 65536;

pub const ECHO_FAST_LFO_HZ: f64 = 6.8;
pub const ECHO_SLOW_LFO_HZ: f64 = 0.7;

pub const MIN_DELAY_SECONDS: f32 = 0.01;
pub const DEFAULT_DELAY_SECONDS: f32 = 0.65;

/// Upper bound of the regeneration gain. Above 1.0 the loop self-oscillates
/// and the saturator holds it at a steady level.
pub const MAX_REGENERATION: f32 = 1.1;
pub const DEFAULT_REGENERATION: f32 = 0.5;

/// Delay excursion, in seconds, at full wobble and unit LFO signal.
pub const WOBBLE_SECONDS: f64 = 0.005;
pub const WOBBLE_FAST_DEPTH: f64 = 0.5;
pub const WOBBLE_SLOW_DEPTH: f64 = 0.0;

pub const PRE_EMPHASIS: FilterTuning = FilterTuning::new(12600.0, 1.3);

/// Post-filter cutoff at zero delay.
pub const POST_BASE_CUTOFF_HZ: f32 = 6000.0;
/// Post-filter cutoff drop per second of delay.
pub const POST_CUTOFF_PER_SECOND: f32 = 1000.0;
pub const POST_RESONANCE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct RegenDelayEngine {
    state: EngineState,
    sample_rate: f32,
    max_block_size: usize,

    /// Host delay time in seconds, clamped to `MIN_DELAY_SECONDS` and above.
    /// The ring-capacity bound is applied once per block.
    delay_time: f32,
    regeneration: f32,
    wobble: f32,

    glide: OnePoleSmoother,
    post_cutoff_hz: f32,

    pre_filter: ResonantFilter,
    post_filter: ResonantFilter,
    lfo: OscillatorPair,
    delay: DelayLine,

    /// Post-filtered output of the previous block, `max_block_size` long.
    feedback: Vec<f32>,
}

impl RegenDelayEngine {
    /// Allocate the engine for blocks of up to `max_block_size` samples.
    /// Longer blocks are still accepted and processed in chunks.
    pub fn new(sample_rate: f32, max_block_size: usize) -> Result<Self, EngineError> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        if max_block_size == 0 {
            return Err(EngineError::BlockSizeZero);
        }

        Ok(Self {
            state: EngineState::Inactive,
            sample_rate,
            max_block_size,
            delay_time: DEFAULT_DELAY_SECONDS,
            regeneration: DEFAULT_REGENERATION,
            wobble: 0.0,
            glide: OnePoleSmoother::new(DEFAULT_DELAY_SECONDS, DELAY_GLIDE_COEFFICIENT),
            post_cutoff_hz: POST_BASE_CUTOFF_HZ,
            pre_filter: ResonantFilter::new(),
            post_filter: ResonantFilter::new(),
            lfo: OscillatorPair::new(ECHO_FAST_LFO_HZ, ECHO_SLOW_LFO_HZ),
            delay: DelayLine::new(ECHO_CAPACITY),
            feedback: vec![0.0; max_block_size],
        })
    }

    /// Retune for `sample_rate`, clear the ring, the feedback block and all
    /// filter memories, rewind the LFOs, and settle the glide on the current
    /// delay time.
    ///
    /// Must be called again whenever the sample rate changes. Does not
    /// allocate.
    pub fn activate(&mut self, sample_rate: f32) -> Result<(), EngineError> {
        self.sample_rate = validate_sample_rate(sample_rate)?;

        self.glide.snap_to(self.bounded_delay_time());
        self.pre_filter.apply(PRE_EMPHASIS, self.sample_rate);
        self.retune_post_filter();
        self.pre_filter.reset();
        self.post_filter.reset();

        self.lfo.reset(self.sample_rate);
        self.delay.clear();
        self.feedback.fill(0.0);
        self.state = EngineState::Active;
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Set the target delay time in seconds. Values below
    /// `MIN_DELAY_SECONDS` are raised to it; non-finite values are ignored.
    pub fn set_delay_time(&mut self, seconds: f32) {
        if seconds.is_finite() {
            self.delay_time = seconds.max(MIN_DELAY_SECONDS);
        }
    }

    pub fn delay_time(&self) -> f32 {
        self.delay_time
    }

    /// Set the feedback gain, clamped to `[0, MAX_REGENERATION]`. Non-finite
    /// values are ignored.
    pub fn set_regeneration(&mut self, gain: f32) {
        if gain.is_finite() {
            self.regeneration = gain.clamp(0.0, MAX_REGENERATION);
        }
    }

    pub fn regeneration(&self) -> f32 {
        self.regeneration
    }

    /// Set the depth of the LFO wobble on the delay time, clamped to
    /// `[0, 1]`. Non-finite values are ignored.
    pub fn set_wobble(&mut self, amount: f32) {
        if amount.is_finite() {
            self.wobble = amount.clamp(0.0, 1.0);
        }
    }

    pub fn wobble(&self) -> f32 {
        self.wobble
    }

    /// The glided delay time the read head is currently at, in seconds.
    pub fn smoothed_delay_time(&self) -> f32 {
        self.glide.current()
    }

    /// Cutoff the post-filter was last tuned to.
    pub fn post_cutoff_hz(&self) -> f32 {
        self.post_cutoff_hz
    }

    /// Longest delay time the ring can serve at the current sample rate,
    /// leaving room for the full wobble excursion.
    pub fn max_delay_time(&self) -> f32 {
        let wobble_room = WOBBLE_SECONDS * (WOBBLE_FAST_DEPTH.abs() + WOBBLE_SLOW_DEPTH.abs());
        self.delay.max_delay_samples() / self.sample_rate - wobble_room as f32
    }

    fn bounded_delay_time(&self) -> f32 {
        self.delay_time.min(self.max_delay_time())
    }

    fn retune_post_filter(&mut self) {
        self.post_cutoff_hz =
            POST_BASE_CUTOFF_HZ - POST_CUTOFF_PER_SECOND * self.glide.current();
        self.post_filter
            .configure_clamped(self.post_cutoff_hz, POST_RESONANCE, self.sample_rate);
    }

    /// Process `input` into `output`. If the lengths differ, only the
    /// overlapping part is written.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let len = input.len().min(output.len());
        let (input, output) = (&input[..len], &mut output[..len]);

        if self.state != EngineState::Active {
            nih_plug::nih_debug_assert_failure!("echo processed before activate()");
            output.fill(0.0);
            return;
        }

        let chunk = self.max_block_size;
        for (inp, out) in input.chunks(chunk).zip(output.chunks_mut(chunk)) {
            self.pre_filter.process_block(inp, out);
            self.render(out);
        }
    }

    /// Process a block in place.
    pub fn process_in_place(&mut self, block: &mut [f32]) {
        if self.state != EngineState::Active {
            nih_plug::nih_debug_assert_failure!("echo processed before activate()");
            block.fill(0.0);
            return;
        }

        let chunk = self.max_block_size;
        for part in block.chunks_mut(chunk) {
            self.pre_filter.process_in_place(part);
            self.render(part);
        }
    }

    /// Run the feedback loop and post-filter over one pre-filtered block of
    /// at most `max_block_size` samples.
    fn render(&mut self, block: &mut [f32]) {
        self.glide.set_target(self.bounded_delay_time());
        self.retune_post_filter();

        let sample_rate = f64::from(self.sample_rate);
        let wobble = f64::from(self.wobble) * WOBBLE_SECONDS;

        for (sample, &previous) in block.iter_mut().zip(&self.feedback) {
            let (fast_phase, slow_phase) = self.lfo.step();

            let z = soft_saturate(*sample + self.regeneration * previous);
            self.delay.write(z);

            let delay_seconds = f64::from(self.glide.next())
                + wobble
                    * (WOBBLE_FAST_DEPTH * fast_phase.sin()
                        + WOBBLE_SLOW_DEPTH * slow_phase.sin());
            *sample = self.delay.read((delay_seconds * sample_rate) as f32);
        }

        self.post_filter.process_in_place(block);
        self.feedback[..block.len()].copy_from_slice(block);
    }
}
