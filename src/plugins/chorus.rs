//! Triple Chorus: the ensemble engine as a CLAP/VST3/AUv2 effect.

use std::sync::Arc;

use nih_plug::prelude::*;

use super::{channel_count, mix_dry_wet, MONO_AND_STEREO};
use crate::engine::chorus::ChorusEngine;
use crate::error::EngineError;
use crate::params::ChorusParams;

pub struct TripleChorus {
    params: Arc<ChorusParams>,

    /// One engine per channel, built in `initialize()`.
    engines: Vec<ChorusEngine>,

    /// Copy of the current channel before the engine overwrites it.
    dry: Vec<f32>,
    /// Smoothed mix values for the current block.
    mix_values: Vec<f32>,
}

impl Default for TripleChorus {
    fn default() -> Self {
        Self {
            params: Arc::new(ChorusParams::default()),
            engines: Vec::new(),
            dry: Vec::new(),
            mix_values: Vec::new(),
        }
    }
}

fn build_engines(channels: usize, sample_rate: f32) -> Result<Vec<ChorusEngine>, EngineError> {
    (0..channels)
        .map(|_| {
            let mut engine = ChorusEngine::new(sample_rate)?;
            engine.activate(sample_rate)?;
            Ok(engine)
        })
        .collect()
}

impl Plugin for TripleChorus {
    const NAME: &'static str = "Triple Chorus";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = MONO_AND_STEREO;
    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let channels = channel_count(audio_io_layout);
        let sample_rate = buffer_config.sample_rate;
        let max_block = buffer_config.max_buffer_size.max(1) as usize;

        match build_engines(channels, sample_rate) {
            Ok(engines) => self.engines = engines,
            Err(err) => {
                nih_error!("Triple Chorus cannot run: {err}");
                return false;
            }
        }
        self.dry = vec![0.0; max_block];
        self.mix_values = vec![0.0; max_block];

        nih_log!("Triple Chorus ready: {channels} channel(s) at {sample_rate} Hz, blocks up to {max_block}");
        true
    }

    /// Playback stopped or the plugin was bypassed: wipe every delay line,
    /// filter memory and LFO phase so nothing stale leaks into the next play.
    fn reset(&mut self) {
        for engine in &mut self.engines {
            if let Err(err) = engine.activate(engine.sample_rate()) {
                nih_error!("Triple Chorus reset failed: {err}");
            }
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let max_block = self.dry.len();

        // Walk the host buffer in blocks no longer than the scratch space we
        // allocated in initialize(). Most hosts never exceed it, so this is
        // usually a single pass.
        for (_, mut block) in buffer.iter_blocks(max_block) {
            let len = block.samples();

            // One smoothed mix value per sample, shared by every channel, so
            // a mix automation ramp moves left and right together.
            self.params
                .mix
                .smoothed
                .next_block(&mut self.mix_values[..len], len);

            for channel_idx in 0..block.channels() {
                let Some(samples) = block.get_mut(channel_idx) else {
                    continue;
                };
                let Some(engine) = self.engines.get_mut(channel_idx) else {
                    continue;
                };

                // Step 1: SAVE the dry signal. The engine works in place and
                // overwrites the host buffer with the ensemble.
                let dry = &mut self.dry[..len];
                dry.copy_from_slice(samples);

                // Step 2: RUN the engine: pre-emphasis, three swept taps,
                // then the two post filters.
                engine.process_in_place(samples);

                // Step 3: MIX dry and wet back into the host buffer.
                mix_dry_wet(samples, dry, &self.mix_values[..len]);
            }
        }

        // The longest tap is 4 ms and the filters ring out in a few more, so
        // there is no tail worth reporting.
        ProcessStatus::Normal
    }
}

impl ClapPlugin for TripleChorus {
    const CLAP_ID: &'static str = "com.loveless-audio.triple-chorus";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A three-voice ensemble chorus modelled on string-machine circuitry");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Chorus,
    ];
}

impl Vst3Plugin for TripleChorus {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssTriChorus01";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Modulation];
}
