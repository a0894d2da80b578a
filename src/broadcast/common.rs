//! Cache-line padded counter cells for the ring header.

use std::sync::atomic::{ AtomicU64, AtomicUsize };

/// Cache-line padded round-robin cursor.
///
/// The cursor is hammered by every producer on every publish; padding it to
/// its own cache line keeps that contention away from the sequence counter
/// and the slot table.
#[repr(align(128))]
pub struct PaddedCursor {
    pub index: AtomicUsize,
    _padding: [u8; 120], // 128 - 8 bytes for AtomicUsize
}

impl PaddedCursor {
    pub fn new(initial: usize) -> Self {
        Self {
            index: AtomicUsize::new(initial),
            _padding: [0; 120],
        }
    }
}

/// Cache-line padded global sequence counter.
#[repr(align(128))]
pub struct PaddedSequence {
    pub value: AtomicU64,
    _padding: [u8; 120], // 128 - 8 bytes for AtomicU64
}

impl PaddedSequence {
    pub fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
            _padding: [0; 120],
        }
    }
}
