//! # Effect Engines
//!
//! Each engine is a mono, block-based processor built from the primitives
//! in [`crate::dsp`]:
//!
//! - **`chorus`**: three phase-offset modulated taps on one short delay
//!   line, averaged and tone-shaped into an ensemble chorus.
//! - **`regen`**: one long delay line with a saturated feedback loop, a
//!   gliding delay time and a post-filter whose cutoff follows that time.
//!
//! Both share the same lifecycle:
//!
//! ```text
//! new(sample_rate) ──► Inactive ──activate(sample_rate)──► Active
//!                                         ▲                  │
//!                                         └──────────────────┘
//!                                    (sample rate change, reset)
//! ```
//!
//! `new()` allocates every buffer the engine will ever use. `activate()` only
//! recomputes coefficients and LFO rates and zero-fills buffers in place, so
//! it is safe to call from the audio thread. Processing an inactive engine
//! outputs silence.
//!
//! Engines are single-threaded: the host calls `process` from one real-time
//! thread, and parameter setters are plain field writes read once per block.

pub mod chorus;
pub mod regen;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed but not yet activated. No coefficients or LFO rates have
    /// been derived.
    #[default]
    Inactive,
    /// Activated at a known sample rate; `process` runs the full pipeline.
    Active,
}
