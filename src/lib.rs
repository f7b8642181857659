#![doc = include_str!("../README.md")]
#![no_std]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod log;
mod magic;
mod mutations;
mod rng;

pub use rng::{Rand, Rng};

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops;
use mutations::Mangle;

const DEFAULT_MAX_SIZE: usize = 1024 * 1024;
const DEFAULT_MUTATIONS_PER_RUN: usize = 6;

/// A mangling session: configuration plus the random source driving it.
///
/// A session is built once and then reused across many
/// [`mangle`][Session::mangle] calls; reusing it keeps the random stream
/// rolling so successive calls produce different mutants.
///
/// # Example
///
/// ```
/// use mangle::Session;
///
/// let mut session = Session::new().seed(0x12345678).max_size(256);
///
/// let mut input = vec![0u8; 32];
/// session.mangle(&mut input);
///
/// assert!((1..=256).contains(&input.len()));
/// ```
#[derive(Debug)]
pub struct Session<R = Rng> {
    rng: R,
    max_size: usize,
    mutations_per_run: usize,
    only_printable: bool,
    dictionary: Dictionary,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a new session with the default configuration: a fixed RNG
    /// seed, a 1 MiB size ceiling, at most 6 stacked mutations per call,
    /// binary output, and an empty dictionary.
    pub fn new() -> Self {
        Session {
            rng: Rng::default(),
            max_size: DEFAULT_MAX_SIZE,
            mutations_per_run: DEFAULT_MUTATIONS_PER_RUN,
            only_printable: false,
            dictionary: Dictionary::new(),
        }
    }

    /// Set the seed for the default random number generator.
    ///
    /// Two sessions with the same seed and configuration mangle
    /// identically.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Rng::new(seed);
        self
    }
}

impl<R: Rand> Session<R> {
    /// Replace the random source with any [`Rand`] implementation.
    ///
    /// Useful for scripting exact draws in tests; everything else about
    /// the session is kept.
    pub fn rng<R2: Rand>(self, rng: R2) -> Session<R2> {
        Session {
            rng,
            max_size: self.max_size,
            mutations_per_run: self.mutations_per_run,
            only_printable: self.only_printable,
            dictionary: self.dictionary,
        }
    }

    /// Set the hard ceiling on the buffer size in bytes.
    ///
    /// [`mangle`][Session::mangle] never grows a buffer past this, and
    /// resizes over-long seed buffers down to it.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero; a mangled buffer always keeps at least one
    /// byte.
    pub fn max_size(mut self, n: usize) -> Self {
        assert!(n >= 1, "max_size must be at least 1");
        self.max_size = n;
        self
    }

    /// Set the ceiling on stacked mutations per [`mangle`][Session::mangle]
    /// call; the actual count is drawn uniformly from `1..=n`.
    ///
    /// Setting this to `0` turns [`mangle`][Session::mangle] into a
    /// no-op.
    ///
    /// Defaults to 6.
    pub fn mutations_per_run(mut self, n: usize) -> Self {
        self.mutations_per_run = n;
        self
    }

    /// Restrict every newly written byte to printable ASCII
    /// (`0x20..=0x7E`).
    ///
    /// Bytes a mutation does not touch are left as-is, so feed printable
    /// seed buffers (and a printable [`Dictionary`]) to keep whole
    /// buffers printable.
    ///
    /// Defaults to `false`.
    pub fn only_printable(mut self, yes: bool) -> Self {
        self.only_printable = yes;
        self
    }

    /// Install the dictionary whose entries get spliced into inputs.
    ///
    /// Entry bytes are written verbatim, even in printable mode.
    pub fn dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Mangle `buf` in place: resize it once, then stack a random number
    /// of mutations over it.
    ///
    /// On return `buf` holds between 1 byte and the configured
    /// [`max_size`][Session::max_size] — unless
    /// [`mutations_per_run`][Session::mutations_per_run] is 0, in which
    /// case `buf` is untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use mangle::{Dictionary, Session};
    ///
    /// let mut dictionary = Dictionary::new();
    /// dictionary.push(b"\x7fELF");
    ///
    /// let mut session = Session::new()
    ///     .seed(3)
    ///     .max_size(64)
    ///     .dictionary(dictionary);
    ///
    /// let mut input = b"seed".to_vec();
    /// for _ in 0..1000 {
    ///     session.mangle(&mut input);
    /// }
    /// assert!((1..=64).contains(&input.len()));
    /// ```
    pub fn mangle(&mut self, buf: &mut Vec<u8>) {
        let mut run = Mangle {
            buf,
            rng: &mut self.rng,
            max_size: self.max_size,
            mutations_per_run: self.mutations_per_run,
            only_printable: self.only_printable,
            dictionary: &self.dictionary,
        };
        run.mangle_content();
    }
}

/// An ordered list of byte strings spliced into inputs by the dictionary
/// mutations — typically magic tokens extracted from the target.
///
/// Entries are addressed by zero-based position and the order never
/// changes once built, so a given seed keeps picking the same entries.
///
/// # Example
///
/// ```
/// use mangle::Dictionary;
///
/// let dictionary: Dictionary = ["MAGIC", "\x7fELF"].into_iter().collect();
///
/// assert_eq!(dictionary.len(), 2);
/// assert_eq!(dictionary.get(0), Some(&b"MAGIC"[..]));
/// assert_eq!(&dictionary[1], &b"\x7fELF"[..]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    entries: Vec<Box<[u8]>>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: impl AsRef<[u8]>) {
        self.entries.push(entry.as_ref().into());
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.entries.get(index).map(|entry| &entry[..])
    }
}

impl ops::Index<usize> for Dictionary {
    type Output = [u8];

    fn index(&self, index: usize) -> &[u8] {
        &self.entries[index]
    }
}

impl<S: AsRef<[u8]>> FromIterator<S> for Dictionary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut dictionary = Dictionary::new();
        dictionary.extend(iter);
        dictionary
    }
}

impl<S: AsRef<[u8]>> Extend<S> for Dictionary {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry);
        }
    }
}
