//! End-to-end properties of the public mangling API.

use mangle::{Dictionary, Rand, Session};

/// Replays a fixed script of draws; `between` pops the next draw and
/// asserts it lies in the requested range.
struct ScriptRand {
    draws: Vec<u64>,
    next: usize,
}

impl ScriptRand {
    fn new(draws: &[u64]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: 0,
        }
    }
}

impl Rand for ScriptRand {
    fn next_u64(&mut self) -> u64 {
        let v = self.draws[self.next];
        self.next += 1;
        v
    }

    fn between(&mut self, lo: u64, hi: u64) -> u64 {
        let v = self.next_u64();
        assert!(
            (lo..=hi).contains(&v),
            "scripted draw {v} outside [{lo}, {hi}]"
        );
        v
    }
}

#[test]
fn same_seed_same_mutants() {
    let mut a = Session::new().seed(0xfeed).max_size(512);
    let mut b = Session::new().seed(0xfeed).max_size(512);

    let mut x = b"determinism".to_vec();
    let mut y = b"determinism".to_vec();
    for _ in 0..500 {
        a.mangle(&mut x);
        b.mangle(&mut y);
        assert_eq!(x, y);
    }
}

#[test]
fn size_stays_within_bounds() {
    for seed in 0..64 {
        let mut session = Session::new().seed(seed).max_size(33);
        let mut input = vec![0xaa; 16];
        for _ in 0..200 {
            session.mangle(&mut input);
            assert!(!input.is_empty(), "seed {seed} produced an empty buffer");
            assert!(
                input.len() <= 33,
                "seed {seed} grew past the ceiling: {}",
                input.len()
            );
        }
    }
}

#[test]
fn oversized_seed_buffers_are_pulled_under_the_ceiling() {
    let mut session = Session::new().seed(1).max_size(8);
    let mut input = vec![0x55; 100];
    session.mangle(&mut input);
    assert!((1..=8).contains(&input.len()));
}

#[test]
fn empty_seed_buffers_grow_to_at_least_one_byte() {
    for seed in 0..32 {
        let mut session = Session::new().seed(seed).max_size(64);
        let mut input = Vec::new();
        session.mangle(&mut input);
        assert!(!input.is_empty());
    }
}

#[test]
fn printable_buffers_stay_printable() {
    let dictionary: Dictionary = ["GET ", "HTTP/1.1", "Content-Length:"]
        .into_iter()
        .collect();
    let mut session = Session::new()
        .seed(0x5eed)
        .max_size(512)
        .only_printable(true)
        .dictionary(dictionary);

    let mut input = b"A printable seed buffer.".to_vec();
    for i in 0..10_000 {
        session.mangle(&mut input);
        assert!(
            input.iter().all(|b| (0x20..=0x7e).contains(b)),
            "non-printable byte after iteration {i}: {input:02x?}"
        );
    }
}

#[test]
fn zero_mutations_per_run_is_a_noop() {
    let mut session = Session::new().seed(7).mutations_per_run(0);
    let original = b"do not touch".to_vec();
    let mut input = original.clone();
    for _ in 0..100 {
        session.mangle(&mut input);
    }
    assert_eq!(input, original);
}

// With an empty dictionary, both dictionary slots degrade to the bit
// flip: identical trailing draws give identical buffers. Slot 8 is the
// inserting variant, slot 0 the bit flip itself. The leading `0, 4`
// draws make the resize restate the current size.
#[test]
fn empty_dictionary_slots_degrade_to_bit_flips() {
    for slot in [7u64, 8u64] {
        let mut via_slot = Session::new()
            .max_size(16)
            .mutations_per_run(1)
            .rng(ScriptRand::new(&[0, 4, 1, slot, 2, 5]));
        let mut via_bit = Session::new()
            .max_size(16)
            .mutations_per_run(1)
            .rng(ScriptRand::new(&[0, 4, 1, 0, 2, 5]));

        let mut x = b"abcd".to_vec();
        let mut y = b"abcd".to_vec();
        via_slot.mangle(&mut x);
        via_bit.mangle(&mut y);
        assert_eq!(x, y);
        assert_eq!(x, b"ab\x43d");
    }
}

// The full dictionary-insert path, driven through the public API with
// scripted draws: insert "ABC" into "xxxxx" at offset 2.
#[test]
fn dictionary_insert_splices_at_the_drawn_offset() {
    let dictionary: Dictionary = ["ABC"].into_iter().collect();
    let mut session = Session::new()
        .max_size(8)
        .mutations_per_run(1)
        .dictionary(dictionary)
        .rng(ScriptRand::new(&[0, 5, 1, 8, 0, 2, 0x2121_2121_2121_2121]));

    let mut input = b"xxxxx".to_vec();
    session.mangle(&mut input);
    assert_eq!(input, b"xxABCxxx");
}

#[test]
fn dictionary_entries_are_written_verbatim() {
    // A non-printable entry survives printable mode untouched.
    let dictionary: Dictionary = [&b"\xff\xfe"[..]].into_iter().collect();
    let mut session = Session::new()
        .max_size(8)
        .mutations_per_run(1)
        .only_printable(true)
        .dictionary(dictionary)
        .rng(ScriptRand::new(&[0, 4, 1, 7, 1, 0]));

    let mut input = b"abcd".to_vec();
    session.mangle(&mut input);
    assert_eq!(input, b"a\xff\xfed");
}

#[test]
fn buffers_eventually_grow_and_shrink() {
    let mut session = Session::new().seed(42).max_size(256);
    let mut grew = false;
    let mut shrank = false;
    let mut input = vec![0u8; 64];
    for _ in 0..2_000 {
        let before = input.len();
        session.mangle(&mut input);
        grew |= input.len() > before;
        shrank |= input.len() < before;
    }
    assert!(grew && shrank, "resizing operators never fired");
}
