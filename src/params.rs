//! # Plugin Parameters
//!
//! The knobs each plugin shows the host. String IDs (`#[id = "..."]`) are
//! what presets store; never change a published one.
//!
//! Only `mix` goes through nih-plug's smoother. The echo's delay time has its
//! own, much slower glide inside the engine, and its regeneration and wobble
//! are read once per block. A value that changes mid-block takes effect at
//! the next one.

use nih_plug::prelude::*;

use crate::engine::regen::{
    DEFAULT_DELAY_SECONDS, DEFAULT_REGENERATION, MAX_REGENERATION, MIN_DELAY_SECONDS,
};

/// Longest delay time offered to the host. The engine clamps further when the
/// sample rate is too high for its ring to hold this much.
pub const MAX_DELAY_PARAM_SECONDS: f32 = 1.3;

/// Dry/wet balance shared by both plugins. Defaults to fully wet, which is
/// how the effects were voiced.
fn mix_param() -> FloatParam {
    FloatParam::new("Mix", 1.0, FloatRange::Linear { min: 0.0, max: 1.0 })
        .with_unit("%")
        .with_smoother(SmoothingStyle::Linear(20.0))
        .with_value_to_string(formatters::v2s_f32_percentage(1))
        .with_string_to_value(formatters::s2v_f32_percentage())
}

#[derive(Params)]
pub struct ChorusParams {
    /// **Mix**: 0% is the untouched input, 100% is the ensemble alone.
    #[id = "mix"]
    pub mix: FloatParam,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self { mix: mix_param() }
    }
}

#[derive(Params)]
pub struct EchoParams {
    /// **Delay Time** in seconds. Changes glide like a tape machine changing
    /// speed rather than jumping.
    ///
    /// Skewed toward short times, where small changes are most audible.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Regeneration**: how much of the echo is fed back.
    ///
    /// The saturator in the loop has a small-signal gain of 1/0.75, so from
    /// 75% upward the repeats stop decaying and settle at a saturated level
    /// instead. The range ends at 110%.
    #[id = "regen"]
    pub regeneration: FloatParam,

    /// **Wobble**: depth of the LFO modulation on the delay time, up to
    /// ±2.5 ms.
    #[id = "wobble"]
    pub wobble: FloatParam,

    #[id = "mix"]
    pub mix: FloatParam,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                DEFAULT_DELAY_SECONDS,
                FloatRange::Skewed {
                    min: MIN_DELAY_SECONDS,
                    max: MAX_DELAY_PARAM_SECONDS,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" s")
            .with_value_to_string(formatters::v2s_f32_rounded(3))
            .with_step_size(0.001),

            regeneration: FloatParam::new(
                "Regeneration",
                DEFAULT_REGENERATION,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_REGENERATION,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            wobble: FloatParam::new("Wobble", 0.0, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            mix: mix_param(),
        }
    }
}
