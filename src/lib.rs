//! # Ensemble Echo: A String-Ensemble Chorus and a Regenerating Echo
//!
//! Two mono effects modelled on the modulation section of a vintage string
//! machine, built with [nih-plug](https://github.com/robbert-vdh/nih-plug)
//! and exported as CLAP, VST3 and (through clap-wrapper) AUv2 from a single
//! binary.
//!
//! ## Triple Chorus
//!
//! ```text
//!                      ┌─► tap 1 (LFO phase 0)    ─┐
//! Input ─► [Pre LPF] ─►┤─► tap 2 (LFO phase 2.09) ─┼─► ÷3 ─► [LPF 12k] ─► [LPF 5k] ─► Output
//!          12.6 kHz    └─► tap 3 (LFO phase 4.18) ─┘
//!                       delay line, 2 ms ± LFOs
//! ```
//!
//! ## Regen Echo
//!
//! ```text
//! Input ─► [Pre LPF] ─►(+)─► [Saturate] ─► [Delay Line] ─► [Post LPF] ──┬─► Output
//!                       ▲                   glided time,                │
//!                       │                   ± wobble                    │
//!                       └──── × regeneration ◄── previous block ◄───────┘
//! ```
//!
//! The building blocks live in [`dsp`], the two signal chains in [`engine`],
//! and the host-facing wrappers in [`plugins`].

pub mod dsp;
pub mod engine;
pub mod error;
pub mod params;
pub mod plugins;

use nih_plug::prelude::*;

pub use plugins::chorus::TripleChorus;
pub use plugins::echo::RegenEcho;

nih_export_clap!(TripleChorus, RegenEcho);
nih_export_vst3!(TripleChorus, RegenEcho);

// Re-export the CLAP factory as an Audio Unit for Logic Pro.
clap_wrapper::export_auv2!();
