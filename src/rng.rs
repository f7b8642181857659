//! The random-number seam used by every mutation operator.

use rand::{rngs::SmallRng, Rng as _, SeedableRng};

const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// A source of randomness for mutation draws.
///
/// Only [`next_u64`][Rand::next_u64] is required; the provided methods
/// cover every kind of draw the operators make. Implement this trait
/// yourself when you need scripted, reproducible draws (for example in
/// tests) and install it with [`Session::rng`][crate::Session::rng].
///
/// # Example
///
/// ```
/// use mangle::Rand;
///
/// struct Lcg(u64);
///
/// impl Rand for Lcg {
///     fn next_u64(&mut self) -> u64 {
///         self.0 = self.0
///             .wrapping_mul(6364136223846793005)
///             .wrapping_add(1442695040888963407);
///         self.0
///     }
/// }
///
/// let mut rng = Lcg(1);
/// let v = rng.between(10, 20);
/// assert!((10..=20).contains(&v));
/// assert!((0x20..=0x7e).contains(&rng.printable_byte()));
/// ```
pub trait Rand {
    /// Return the next random 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Return a uniform value in the inclusive range `[lo, hi]`.
    ///
    /// The default implementation reduces [`next_u64`][Rand::next_u64]
    /// modulo the span, which is close enough to uniform for the spans
    /// this crate draws.
    fn between(&mut self, lo: u64, hi: u64) -> u64 {
        debug_assert!(lo <= hi, "bad range for between()");
        if lo == hi {
            return lo;
        }
        if lo == 0 && hi == u64::MAX {
            return self.next_u64();
        }
        lo + self.next_u64() % (hi - lo + 1)
    }

    /// Fill `dst` with random bytes.
    ///
    /// The default implementation carves little-endian
    /// [`next_u64`][Rand::next_u64] values into 8-byte chunks.
    fn fill(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    /// Fill `dst` with random printable-ASCII bytes.
    fn fill_printable(&mut self, dst: &mut [u8]) {
        self.fill(dst);
        turn_to_printable(dst);
    }

    /// Return one random printable-ASCII byte.
    fn printable_byte(&mut self) -> u8 {
        self.between(0x20, 0x7e) as u8
    }
}

/// The default random source: a thin wrapper over
/// [`rand::rngs::SmallRng`].
///
/// Deterministic given a seed, and not cryptographically secure. The
/// `Default` instance uses a fixed seed; pick your own with
/// [`Session::seed`][crate::Session::seed].
#[derive(Clone, Debug)]
pub struct Rng {
    inner: SmallRng,
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl Rng {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Rand for Rng {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.inner.gen()
    }

    #[inline]
    fn between(&mut self, lo: u64, hi: u64) -> u64 {
        self.inner.gen_range(lo..=hi)
    }

    #[inline]
    fn fill(&mut self, dst: &mut [u8]) {
        self.inner.fill(dst);
    }
}

/// Project every byte of `buf` onto the printable-ASCII range
/// `[0x20, 0x7E]`.
pub(crate) fn turn_to_printable(buf: &mut [u8]) {
    for b in buf {
        *b = *b % 95 + 32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic counter source exercising the trait's default
    // methods.
    struct Counter(u64);

    impl Rand for Counter {
        fn next_u64(&mut self) -> u64 {
            let v = self.0;
            self.0 += 1;
            v
        }
    }

    #[test]
    fn between_is_inclusive() {
        let mut rng = Counter(0);
        for _ in 0..100 {
            let v = rng.between(3, 7);
            assert!((3..=7).contains(&v));
        }
        assert_eq!(rng.between(5, 5), 5);
    }

    #[test]
    fn fill_carves_little_endian_chunks() {
        let mut rng = Counter(0x0102_0304_0506_0708);
        let mut buf = [0u8; 11];
        rng.fill(&mut buf);
        assert_eq!(&buf[..8], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        // The short tail chunk takes the low bytes of the next value.
        assert_eq!(&buf[8..], &[0x09, 0x07, 0x06]);
    }

    #[test]
    fn fill_printable_stays_printable() {
        let mut rng = Counter(u64::MAX - 1000);
        let mut buf = [0u8; 64];
        rng.fill_printable(&mut buf);
        assert!(buf.iter().all(|b| (0x20..=0x7e).contains(b)));
    }

    #[test]
    fn projection_covers_the_printable_range() {
        let mut all = [0u8; 256];
        for (i, b) in all.iter_mut().enumerate() {
            *b = i as u8;
        }
        turn_to_printable(&mut all);
        assert!(all.iter().all(|b| (0x20..=0x7e).contains(b)));
        assert_eq!(all[0], 0x20);
        assert_eq!(all[94], 0x7e);
        assert_eq!(all[95], 0x20);
    }

    #[test]
    fn default_rng_is_deterministic() {
        let mut a = Rng::default();
        let mut b = Rng::default();
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }
}
