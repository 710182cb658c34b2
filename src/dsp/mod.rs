//! # DSP Primitives
//!
//! The building blocks both effects are assembled from:
//!
//! - **`filter`**: the two-pole resonant lowpass used for every pre- and
//!   post-emphasis stage.
//! - **`oscillator`**: free-running phase accumulators; each engine owns a
//!   fast/slow pair that modulates its delay taps.
//! - **`delay_line`**: a power-of-two ring buffer with linearly interpolated
//!   fractional reads.
//! - **`saturation`**: the soft-knee curve that keeps the echo's feedback
//!   loop bounded.
//! - **`smoother`**: the one-pole glide applied to the echo's delay time.
//!
//! Everything here owns its state as plain fields. Nothing is shared between
//! instances, so one engine per audio channel just works.

pub mod delay_line;
pub mod filter;
pub mod oscillator;
pub mod saturation;
pub mod smoother;
