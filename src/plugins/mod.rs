//! # Host Glue
//!
//! The two plugins wrap the mono engines for the host. Each audio channel
//! gets its own engine instance, so stereo is simply two independent copies
//! of the mono effect.
//!
//! Per block, every plugin does the same thing:
//!
//! 1. read the block-rate parameters once and hand them to the engines;
//! 2. save the dry channel, run the engine in place on the host buffer;
//! 3. crossfade dry and wet with the smoothed `mix` value.
//!
//! All scratch space (`dry`, `mix_values`) is sized from the host's maximum
//! block size in `initialize()`, and blocks are walked in chunks of that size,
//! so `process()` never allocates.

pub mod chorus;
pub mod echo;

use std::num::NonZeroU32;

use nih_plug::prelude::*;

use crate::dsp::saturation::SATURATION_KNEE;

/// Mono and stereo layouts, stereo first since most DAW tracks are stereo.
pub(crate) const MONO_AND_STEREO: &[AudioIOLayout] = &[
    AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    },
    AudioIOLayout {
        main_input_channels: NonZeroU32::new(1),
        main_output_channels: NonZeroU32::new(1),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    },
];

pub(crate) fn channel_count(layout: &AudioIOLayout) -> usize {
    layout
        .main_input_channels
        .map(|c| c.get() as usize)
        .unwrap_or(2)
}

/// `wet[i] = dry[i] * (1 - mix[i]) + wet[i] * mix[i]`, over the common length.
pub(crate) fn mix_dry_wet(wet: &mut [f32], dry: &[f32], mix: &[f32]) {
    for ((wet, &dry), &mix) in wet.iter_mut().zip(dry).zip(mix) {
        *wet = dry * (1.0 - mix) + *wet * mix;
    }
}

/// How long the host should keep calling `process()` after the input stops.
///
/// Each trip around the loop scales a small signal by
/// `regeneration / SATURATION_KNEE` and takes one delay time plus one block.
/// Once that gain reaches 1 the echoes never die out, so the plugin asks to
/// be kept alive. Otherwise the tail lasts until the repeats fall to -60 dB:
///
/// ```text
/// repeats = log10(0.001) / log10(loop_gain)
/// ```
pub(crate) fn echo_tail(
    delay_seconds: f32,
    regeneration: f32,
    sample_rate: f32,
    block_len: usize,
) -> ProcessStatus {
    let round_trip = delay_seconds * sample_rate + block_len as f32;
    let loop_gain = regeneration / SATURATION_KNEE;

    if loop_gain >= 1.0 {
        ProcessStatus::KeepAlive
    } else if loop_gain > 0.001 {
        let repeats = -3.0 / loop_gain.log10();
        ProcessStatus::Tail((repeats * round_trip) as u32)
    } else {
        ProcessStatus::Tail(round_trip as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_extremes() {
        let dry = [0.25, -0.5, 1.0];
        let original_wet = [0.75, 0.5, -1.0];

        let mut wet = original_wet;
        mix_dry_wet(&mut wet, &dry, &[0.0; 3]);
        assert_eq!(wet, dry);

        let mut wet = original_wet;
        mix_dry_wet(&mut wet, &dry, &[1.0; 3]);
        assert_eq!(wet, original_wet);

        let mut wet = original_wet;
        mix_dry_wet(&mut wet, &dry, &[0.5; 3]);
        assert_eq!(wet, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_channel_count_from_layout() {
        assert_eq!(channel_count(&MONO_AND_STEREO[0]), 2);
        assert_eq!(channel_count(&MONO_AND_STEREO[1]), 1);
    }

    #[test]
    fn test_echo_tail_without_feedback_is_one_round_trip() {
        match echo_tail(0.5, 0.0, 48000.0, 512) {
            ProcessStatus::Tail(samples) => assert_eq!(samples, 24512),
            _ => panic!("expected a finite tail"),
        }
    }

    #[test]
    fn test_echo_tail_grows_with_regeneration() {
        let tail = |regeneration| match echo_tail(0.5, regeneration, 48000.0, 512) {
            ProcessStatus::Tail(samples) => samples,
            _ => panic!("expected a finite tail at {regeneration}"),
        };
        assert!(tail(0.6) > tail(0.3));
        assert!(tail(0.3) > tail(0.0));
    }

    #[test]
    fn test_echo_tail_self_oscillation_keeps_alive() {
        assert!(matches!(
            echo_tail(0.5, 0.75, 48000.0, 512),
            ProcessStatus::KeepAlive
        ));
        assert!(matches!(
            echo_tail(0.5, 1.1, 48000.0, 512),
            ProcessStatus::KeepAlive
        ));
    }
}
