//! # Delay Line (Power-of-Two Ring Buffer)
//!
//! A delay line stores past samples and reads them back at an arbitrary,
//! possibly fractional, distance behind the newest one. Both effects are
//! built on it: the chorus reads three modulated taps a few milliseconds
//! back, the echo reads one long tap and writes its own output back in.
//!
//! ## Masking Instead of Modulo
//!
//! The capacity is always a power of two, so wrapping an index is a single
//! bitwise AND with `capacity - 1`:
//!
//! ```text
//! index & mask    where mask = capacity - 1
//! ```
//!
//! Indices are computed with wrapping unsigned arithmetic, so
//! `write_index - delay` never underflows. It just wraps, and the mask brings
//! it back into the ring.
//!
//! ## Bounds Policy
//!
//! The delay line does not validate delays. The policy at this boundary is:
//!
//! - negative delays clamp to 0 (the newest sample);
//! - delays of `capacity - 1` samples or more alias: the mask folds them back
//!   into the ring, so the read returns a valid but wrong sample.
//!
//! No read can ever touch memory outside the ring. Keeping the delay below
//! `capacity - 1` is the caller's job; the engines clamp their delay-time
//! parameters so it holds.
//!
//! ## Linear Interpolation
//!
//! For a delay `d = n + frac`:
//!
//! ```text
//! s0 = ring[(write_index - n)     & mask]
//! s1 = ring[(write_index - n - 1) & mask]
//! out = s0 + (s1 - s0) * frac
//! ```
//!
//! A two-point interpolator slightly dulls high frequencies as the delay is
//! modulated. At chorus depths that is inaudible.

/// A fixed-capacity ring buffer with fractional-delay reads.
///
/// The ring is allocated once in [`new`](Self::new) and never resized.
/// [`clear`](Self::clear) zero-fills it in place, so it is safe to call from
/// the audio thread.
#[derive(Debug, Clone)]
pub struct DelayLine {
    ring: Vec<f32>,

    /// Slot holding the most recently written sample. A delay of 0 reads it.
    write_index: usize,

    /// `ring.len() - 1`; the ring length is a power of two.
    mask: usize,
}

impl DelayLine {
    /// Create a delay line holding at least `min_capacity` samples.
    ///
    /// The capacity is rounded up to the next power of two (and to at least
    /// 2), so `DelayLine::new(1024)` holds exactly 1024 samples and
    /// `DelayLine::new(1028)` holds 2048.
    pub fn new(min_capacity: usize) -> Self {
        let capacity = min_capacity.max(2).next_power_of_two();
        Self {
            ring: vec![0.0; capacity],
            write_index: 0,
            mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.len()
    }

    /// Largest delay, in samples, whose interpolated read stays inside the
    /// written history: `capacity - 2`, so that both `n` and `n + 1` are at
    /// most `capacity - 1` samples back.
    pub fn max_delay_samples(&self) -> f32 {
        (self.capacity() - 2) as f32
    }

    /// Store a sample as the newest entry in the ring.
    ///
    /// The write index advances first, then the slot is written, so after
    /// this call `read(0.0)` returns `sample`.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.write_index = self.write_index.wrapping_add(1) & self.mask;
        self.ring[self.write_index] = sample;
    }

    /// Read `delay_samples` behind the newest sample, linearly interpolating
    /// between the two slots bracketing a fractional delay.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        nih_plug::nih_debug_assert!(delay_samples >= 0.0);
        let delay = delay_samples.max(0.0);

        // `delay` is non-negative, so truncation is floor. Float-to-int `as`
        // saturates, so even an absurd delay yields a finite index that the
        // mask folds back into the ring.
        let delay_int = delay as usize;
        let frac = delay - delay_int as f32;

        let tap = self.write_index.wrapping_sub(delay_int);
        let s0 = self.ring[tap & self.mask];
        let s1 = self.ring[tap.wrapping_sub(1) & self.mask];

        s0 + (s1 - s0) * frac
    }

    /// Zero the whole ring and rewind the write index.
    pub fn clear(&mut self) {
        self.ring.fill(0.0);
        self.write_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        assert_eq!(DelayLine::new(1024).capacity(), 1024);
        assert_eq!(DelayLine::new(1028).capacity(), 2048);
        assert_eq!(DelayLine::new(65536).capacity(), 65536);
        assert_eq!(DelayLine::new(0).capacity(), 2);
        assert_eq!(DelayLine::new(3).capacity(), 4);
    }

    /// Delay 0 is the sample just written.
    #[test]
    fn test_zero_delay_reads_newest() {
        let mut dl = DelayLine::new(16);
        dl.write(0.75);
        assert!((dl.read(0.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_fifo_sequence() {
        let mut dl = DelayLine::new(16);
        for i in 1..=5 {
            dl.write(i as f32);
        }

        // 0 back = 5.0 (newest) ... 4 back = 1.0 (oldest)
        for d in 0..5 {
            let expected = (5 - d) as f32;
            let got = dl.read(d as f32);
            assert!((got - expected).abs() < 1e-6, "delay {d}: expected {expected}, got {got}");
        }
    }

    /// Halfway between two slots is their mean.
    #[test]
    fn test_interpolation() {
        let mut dl = DelayLine::new(16);
        dl.write(0.0);
        dl.write(1.0);

        // 0 back = 1.0, 1 back = 0.0
        let result = dl.read(0.5);
        assert!((result - 0.5).abs() < 1e-6, "expected 0.5, got {result}");

        let result = dl.read(0.25);
        assert!((result - 0.75).abs() < 1e-6, "expected 0.75, got {result}");
    }

    #[test]
    fn test_wrapping() {
        let mut dl = DelayLine::new(4);

        // Six writes into a ring of four: only 2, 3, 4, 5 survive.
        for i in 0..6 {
            dl.write(i as f32);
        }

        assert!((dl.read(0.0) - 5.0).abs() < 1e-6);
        assert!((dl.read(1.0) - 4.0).abs() < 1e-6);
        assert!((dl.read(3.0) - 2.0).abs() < 1e-6);
    }

    /// A delay of exactly one capacity aliases back onto the newest sample:
    /// wrong content, but never out of bounds.
    #[test]
    fn test_oversized_delay_aliases() {
        let mut dl = DelayLine::new(8);
        for i in 0..8 {
            dl.write(i as f32);
        }
        assert!((dl.read(8.0) - dl.read(0.0)).abs() < 1e-6);
        assert!((dl.read(9.0) - dl.read(1.0)).abs() < 1e-6);
        assert!(dl.read(1.0e12).is_finite());
    }

    #[test]
    fn test_clear() {
        let mut dl = DelayLine::new(8);
        for _ in 0..8 {
            dl.write(0.5);
        }
        dl.clear();

        for delay in [0.0, 1.0, 3.5, 6.0] {
            let result = dl.read(delay);
            assert!(result.abs() < 1e-6, "expected silence at {delay}, got {result}");
        }
    }

    #[test]
    fn test_max_delay_samples() {
        let dl = DelayLine::new(1024);
        assert_eq!(dl.max_delay_samples(), 1022.0);
    }
}
