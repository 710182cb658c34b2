//! Regen Echo: the bucket-brigade style feedback delay as a CLAP/VST3/AUv2
//! effect.

use std::sync::Arc;

use nih_plug::prelude::*;

use super::{channel_count, echo_tail, mix_dry_wet, MONO_AND_STEREO};
use crate::engine::regen::RegenDelayEngine;
use crate::error::EngineError;
use crate::params::EchoParams;

pub struct RegenEcho {
    params: Arc<EchoParams>,

    /// One engine per channel. Each owns a 64k-sample ring, so this is the
    /// only big allocation the plugin makes, and it happens in `initialize()`.
    engines: Vec<RegenDelayEngine>,

    dry: Vec<f32>,
    mix_values: Vec<f32>,
}

impl Default for RegenEcho {
    fn default() -> Self {
        Self {
            params: Arc::new(EchoParams::default()),
            engines: Vec::new(),
            dry: Vec::new(),
            mix_values: Vec::new(),
        }
    }
}

fn build_engines(
    channels: usize,
    sample_rate: f32,
    max_block: usize,
) -> Result<Vec<RegenDelayEngine>, EngineError> {
    (0..channels)
        .map(|_| RegenDelayEngine::new(sample_rate, max_block))
        .collect()
}

impl RegenEcho {
    /// Push the block-rate parameters into every engine.
    fn sync_engines(&mut self) {
        let delay_time = self.params.delay_time.value();
        let regeneration = self.params.regeneration.value();
        let wobble = self.params.wobble.value();

        for engine in &mut self.engines {
            engine.set_delay_time(delay_time);
            engine.set_regeneration(regeneration);
            engine.set_wobble(wobble);
        }
    }
}

impl Plugin for RegenEcho {
    const NAME: &'static str = "Regen Echo";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = MONO_AND_STEREO;
    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Delay time, regeneration and wobble are only read once per block.
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

        match build_engines(channels, sample_rate, max_block) {
            Ok(engines) => self.engines = engines,
            Err(err) => {
                nih_error!("Regen Echo cannot run: {err}");
                return false;
            }
        }
        self.dry = vec![0.0; max_block];
        self.mix_values = vec![0.0; max_block];

        // Activate after syncing so the glide starts on the restored preset's
        // delay time instead of sweeping there from the default.
        self.sync_engines();
        for engine in &mut self.engines {
            if let Err(err) = engine.activate(sample_rate) {
                nih_error!("Regen Echo cannot run: {err}");
                return false;
            }
        }

        if let Some(engine) = self.engines.first() {
            if engine.max_delay_time() < self.params.delay_time.value() {
                nih_log!(
                    "Regen Echo: delay time limited to {:.3} s at {sample_rate} Hz",
                    engine.max_delay_time()
                );
            }
        }
        nih_log!("Regen Echo ready: {channels} channel(s) at {sample_rate} Hz, blocks up to {max_block}");
        true
    }

    /// Clears the rings and the pending feedback block, so pressing play
    /// after stop doesn't bring back old repeats.
    fn reset(&mut self) {
        self.sync_engines();
        for engine in &mut self.engines {
            if let Err(err) = engine.activate(engine.sample_rate()) {
                nih_error!("Regen Echo reset failed: {err}");
            }
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // Read delay time, regeneration and wobble once for the whole buffer.
        // The engine clamps them, and the delay time glides on its own, so
        // there is nothing to gain from updating them per sample.
        self.sync_engines();
        let max_block = self.dry.len();

        // Blocks here never exceed the engine's feedback buffer. A shorter
        // block only refreshes the head of it, so the echo's extra lag
        // follows whatever block sizes the host actually sends.
        for (_, mut block) in buffer.iter_blocks(max_block) {
            let len = block.samples();
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

                // Step 1: SAVE the dry signal before the engine overwrites it.
                let dry = &mut self.dry[..len];
                dry.copy_from_slice(samples);

                // Step 2: RUN the echo. Saturated feedback goes into the ring,
                // the glided read comes out, and the post-filter darkens it.
                engine.process_in_place(samples);

                // Step 3: MIX. At 0% the echoes keep building inside the
                // engine but stay inaudible until the mix comes back up.
                mix_dry_wet(samples, dry, &self.mix_values[..len]);
            }
        }

        // Report the tail from the first channel's engine. Every channel
        // shares the same settings, so they all ring out for the same time.
        // Each trip round the loop takes the glided delay plus one block, and
        // from regeneration 0.75 up the repeats never fade.
        match self.engines.first() {
            Some(engine) => echo_tail(
                engine.smoothed_delay_time(),
                engine.regeneration(),
                engine.sample_rate(),
                max_block,
            ),
            None => ProcessStatus::Normal,
        }
    }
}

impl ClapPlugin for RegenEcho {
    const CLAP_ID: &'static str = "com.loveless-audio.regen-echo";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A saturating feedback echo with wobbling delay time");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for RegenEcho {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssRegenEcho01";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}
