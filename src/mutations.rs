//! The mutation operators and the stacked-mutation driver.
//!
//! Every operator draws its own offsets and lengths, clamps them against
//! the current buffer, and leaves the buffer within `[1, max_size]`
//! bytes. In printable mode an operator projects every byte it writes
//! onto `[0x20, 0x7E]`; bytes it does not touch are left alone.

use alloc::format;
use alloc::vec::Vec;

use crate::log;
use crate::magic::MAGIC;
use crate::rng::{turn_to_printable, Rand};
use crate::Dictionary;

#[cfg(feature = "log")]
const NAMES: [&str; 16] = [
    "bit",
    "bytes",
    "magic",
    "inc-byte",
    "dec-byte",
    "neg-byte",
    "add-sub",
    "dictionary",
    "dictionary-insert",
    "mem-move",
    "mem-set",
    "random",
    "byte-swap",
    "expand",
    "shrink",
    "ascii-val",
];

/// One mangling pass over a caller-owned buffer.
///
/// Bundles the buffer with the session's RNG and configuration for the
/// duration of a single [`mangle_content`][Mangle::mangle_content] call.
pub(crate) struct Mangle<'a, R> {
    pub(crate) buf: &'a mut Vec<u8>,
    pub(crate) rng: &'a mut R,
    pub(crate) max_size: usize,
    pub(crate) mutations_per_run: usize,
    pub(crate) only_printable: bool,
    pub(crate) dictionary: &'a Dictionary,
}

/// Foreign-endian-capable add on a fixed-width little-endian integer.
macro_rules! add_sub_width {
    ($self:ident, $off:ident, $delta:ident, $ty:ty) => {{
        const W: usize = core::mem::size_of::<$ty>();
        let mut val = <$ty>::from_le_bytes($self.buf[$off..$off + W].try_into().unwrap());
        if $self.rng.next_u64() & 1 == 1 {
            val = val.wrapping_add($delta as $ty);
        } else {
            val = val.swap_bytes().wrapping_add($delta as $ty).swap_bytes();
        }
        $self.overwrite(&val.to_le_bytes(), $off);
    }};
}

impl<'a, R: Rand> Mangle<'a, R> {
    fn size(&self) -> usize {
        self.buf.len()
    }

    fn set_size(&mut self, n: usize) {
        self.buf.resize(n, 0);
    }

    fn rand_offset(&mut self) -> usize {
        let hi = (self.size() - 1) as u64;
        self.rng.between(0, hi) as usize
    }

    fn rand_fill(&mut self, off: usize, len: usize, printable: bool) {
        let dst = &mut self.buf[off..off + len];
        if printable {
            self.rng.fill_printable(dst);
        } else {
            self.rng.fill(dst);
        }
    }

    /// Copy `src` over `buf[off..]`, clamped to the buffer tail. Returns
    /// the number of bytes actually copied. Never grows the buffer.
    fn overwrite(&mut self, src: &[u8], off: usize) -> usize {
        let n = src.len().min(self.size() - off);
        self.buf[off..off + n].copy_from_slice(&src[..n]);
        n
    }

    /// Overlap-safe in-buffer copy. A no-op when either offset is out of
    /// bounds; `len` is clamped so that neither window touches the final
    /// byte of the buffer.
    fn move_within(&mut self, from: usize, to: usize, len: usize) {
        let size = self.size();
        if from >= size || to >= size {
            return;
        }
        let len = len.min(size - from - 1).min(size - to - 1);
        self.buf.copy_within(from..from + len, to);
    }

    /// Grow the buffer by up to `len` bytes at `off`: extend, shift the
    /// old tail `buf[off..)` rightward, and fill the gap with random
    /// bytes. Growth is clamped to `max_size`; a no-op at the ceiling.
    fn inflate(&mut self, off: usize, len: usize, printable: bool) {
        let old = self.size();
        if old >= self.max_size {
            return;
        }
        let len = len.min(self.max_size - old);
        self.set_size(old + len);
        self.buf.copy_within(off..old, off + len);
        self.rand_fill(off, len, printable);
    }

    fn bit(&mut self, printable: bool) {
        let off = self.rand_offset();
        let bit = self.rng.between(0, 7);
        self.buf[off] ^= 1 << bit;
        if printable {
            turn_to_printable(&mut self.buf[off..off + 1]);
        }
    }

    fn bytes(&mut self, printable: bool) {
        let off = self.rand_offset();
        let mut scratch = [0u8; 8];
        if printable {
            self.rng.fill_printable(&mut scratch);
        } else {
            self.rng.fill(&mut scratch);
        }
        let n = self.rng.between(1, 8) as usize;
        self.overwrite(&scratch[..n], off);
    }

    fn magic(&mut self, printable: bool) {
        let off = self.rand_offset();
        let choice = self.rng.between(0, (MAGIC.len() - 1) as u64) as usize;
        let n = self.overwrite(MAGIC[choice], off);
        if printable {
            turn_to_printable(&mut self.buf[off..off + n]);
        }
    }

    fn inc_byte(&mut self, printable: bool) {
        let off = self.rand_offset();
        let b = self.buf[off];
        self.buf[off] = if printable {
            b.wrapping_sub(32).wrapping_add(1) % 95 + 32
        } else {
            b.wrapping_add(1)
        };
    }

    fn dec_byte(&mut self, printable: bool) {
        let off = self.rand_offset();
        let b = self.buf[off];
        self.buf[off] = if printable {
            b.wrapping_sub(32).wrapping_add(94) % 95 + 32
        } else {
            b.wrapping_sub(1)
        };
    }

    fn neg_byte(&mut self, printable: bool) {
        let off = self.rand_offset();
        let b = self.buf[off];
        self.buf[off] = if printable {
            94u8.wrapping_sub(b.wrapping_sub(32)).wrapping_add(32)
        } else {
            !b
        };
    }

    fn add_sub(&mut self, printable: bool) {
        let off = self.rand_offset();
        let mut width = 1usize << self.rng.between(0, 3);
        if self.size() - off < width {
            width = 1;
        }
        let delta = self.rng.between(0, 8192) as i64 - 4096;
        match width {
            1 => {
                let b = self.buf[off];
                self.buf[off] = b.wrapping_add(delta as u8);
            }
            2 => add_sub_width!(self, off, delta, i16),
            4 => add_sub_width!(self, off, delta, i32),
            8 => add_sub_width!(self, off, delta, i64),
            w => unreachable!("impossible add/sub width: {w}"),
        }
        if printable {
            turn_to_printable(&mut self.buf[off..off + width]);
        }
    }

    fn dictionary(&mut self, printable: bool) {
        if self.dictionary.is_empty() {
            return self.bit(printable);
        }
        let off = self.rand_offset();
        let choice = self.rng.between(0, (self.dictionary.len() - 1) as u64) as usize;
        let dict = self.dictionary;
        let entry = &dict[choice];
        self.overwrite(entry, off);
    }

    fn dictionary_insert(&mut self, printable: bool) {
        if self.dictionary.is_empty() {
            return self.bit(printable);
        }
        let choice = self.rng.between(0, (self.dictionary.len() - 1) as u64) as usize;
        let dict = self.dictionary;
        let entry = &dict[choice];
        let off = self.rand_offset();
        self.inflate(off, entry.len(), printable);
        self.overwrite(entry, off);
    }

    fn mem_move(&mut self, _printable: bool) {
        let from = self.rand_offset();
        let to = self.rand_offset();
        // Deliberately drawn one past what the clamp admits.
        let len = self.rng.between(0, self.size() as u64) as usize;
        self.move_within(from, to, len);
    }

    fn mem_set(&mut self, printable: bool) {
        let val = if printable {
            self.rng.printable_byte()
        } else {
            self.rng.between(0, u8::MAX as u64) as u8
        };
        let off = self.rand_offset();
        let sz = self.rng.between(1, (self.size() - off) as u64) as usize;
        self.buf[off..off + sz].fill(val);
    }

    fn random(&mut self, printable: bool) {
        let off = self.rand_offset();
        let len = self.rng.between(1, (self.size() - off) as u64) as usize;
        self.rand_fill(off, len, printable);
    }

    fn byte_swap(&mut self, _printable: bool) {
        let off1 = self.rand_offset();
        let off2 = self.rand_offset();
        self.buf.swap(off1, off2);
    }

    fn expand(&mut self, printable: bool) {
        let off = self.rand_offset();
        let len = self.rng.between(1, (self.size() - off) as u64) as usize;
        self.inflate(off, len, printable);
    }

    fn shrink(&mut self, _printable: bool) {
        if self.size() <= 1 {
            return;
        }
        let len = self.rng.between(1, (self.size() - 1) as u64) as usize;
        let off = self.rng.between(0, len as u64) as usize;
        let tail = off + len;
        if tail < self.size() {
            self.buf.copy_within(tail.., off);
        }
        let new = self.size() - len;
        self.set_size(new);
    }

    fn ascii_val(&mut self, _printable: bool) {
        let val = self.rng.next_u64() as i64;
        let digits = format!("{val}");
        let off = self.rand_offset();
        self.overwrite(digits.as_bytes(), off);
    }

    /// Whole-buffer resize, applied once per driver call before the
    /// stacked operators.
    fn resize(&mut self, printable: bool) {
        let old = self.size();
        let v = self.rng.between(0, 16);
        let new = match v {
            0 => self.rng.between(1, self.max_size as u64) as i64,
            1..=8 => old as i64 + v as i64,
            9..=16 => old as i64 + 8 - v as i64,
            v => unreachable!("impossible resize draw: {v}"),
        };
        let new = new.clamp(1, self.max_size as i64) as usize;
        self.set_size(new);
        if new > old {
            self.rand_fill(old, new - old, printable);
        }
    }

    /// Resize once, then stack `1..=mutations_per_run` uniformly drawn
    /// operators over the buffer.
    pub(crate) fn mangle_content(&mut self) {
        let table: [fn(&mut Self, bool); 16] = [
            Self::bit,
            Self::bytes,
            Self::magic,
            Self::inc_byte,
            Self::dec_byte,
            Self::neg_byte,
            Self::add_sub,
            Self::dictionary,
            Self::dictionary_insert,
            Self::mem_move,
            Self::mem_set,
            Self::random,
            Self::byte_swap,
            Self::expand,
            Self::shrink,
            Self::ascii_val,
        ];

        if self.mutations_per_run == 0 {
            return;
        }

        let printable = self.only_printable;
        self.resize(printable);

        let count = self.rng.between(1, self.mutations_per_run as u64);
        log::trace!("stacking {count} mutations");
        for _ in 0..count {
            let choice = self.rng.between(0, (table.len() - 1) as u64) as usize;
            log::trace!("applying {}", NAMES[choice]);
            table[choice](self, printable);
        }
    }
}
