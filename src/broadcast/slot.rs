//! One ring position and its write-marker protocol.

use std::cell::UnsafeCell;
use std::sync::atomic::{ fence, AtomicBool, AtomicU32, AtomicU64, Ordering };

use crate::broadcast::Sequence;

/// Snapshot of a slot's write markers, taken before and after a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WriteStamp {
    /// `write_active` at snapshot time.
    pub active: bool,
    /// `write_epoch` at snapshot time. Odd while a write is in progress.
    pub epoch: u64,
}

impl WriteStamp {
    /// True when a write window overlapped the interval between `self` and
    /// `later`: a write was active at either edge, or a publish started
    /// and/or finished in between (epoch moved).
    pub fn overlaps(&self, later: &WriteStamp) -> bool {
        self.active || later.active || self.epoch != later.epoch
    }
}

/// A single ring position.
///
/// The payload buffer is owned by the slot for the ring's whole lifetime;
/// only its contents mutate. Synchronization is entirely per-slot:
///
/// - `write_epoch` is bumped once when a publish enters the slot (odd) and
///   once when it leaves (even), so a reader comparing two snapshots can
///   tell whether any write touched the slot in between - even a complete
///   one that started and finished inside the read window.
/// - `write_active` covers the edges the epoch delta cannot: a snapshot
///   taken mid-write sees it set.
/// - `sequence` is stamped only after the payload bytes are written and is
///   meaningful only inside a validated snapshot pair.
/// - `readers` counts concurrent readers for diagnostics; it gates nothing.
#[repr(C, align(64))]
pub(crate) struct Slot {
    payload: Box<[UnsafeCell<u8>]>,
    sequence: AtomicU64,
    write_active: AtomicBool,
    write_epoch: AtomicU64,
    readers: AtomicU32,
}

// SAFETY: the payload cells are only written inside a slot's exclusive write
// window (one producer per slot, enforced by ring-level reservation) and only
// read through the optimistic snapshot protocol that detects overlap.
unsafe impl Sync for Slot {}

impl Slot {
    pub(crate) fn new(payload_len: usize) -> Self {
        let payload = (0..payload_len)
            .map(|_| UnsafeCell::new(0u8))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            payload,
            sequence: AtomicU64::new(0),
            write_active: AtomicBool::new(false),
            write_epoch: AtomicU64::new(0),
            readers: AtomicU32::new(0),
        }
    }

    /// Open the write window: markers first, payload bytes after.
    ///
    /// Release stores plus the trailing release fence pair with the acquire
    /// side in `snapshot()`/`read_latest`; a reader that observed any payload
    /// byte of this publish cannot miss the odd epoch.
    #[inline(always)]
    pub(crate) fn begin_write(&self) {
        self.write_active.store(true, Ordering::Release);
        self.write_epoch.fetch_add(1, Ordering::Release); // now odd
        fence(Ordering::Release);
    }

    /// Close the write window: stamp the sequence, then clear the markers.
    ///
    /// The release stores make the payload bytes visible to any reader whose
    /// acquire snapshot observes the even epoch.
    #[inline(always)]
    pub(crate) fn end_write(&self, sequence: Sequence) {
        self.sequence.store(sequence, Ordering::Release);
        self.write_epoch.fetch_add(1, Ordering::Release); // now even
        self.write_active.store(false, Ordering::Release);
    }

    /// Acquire-ordered snapshot of the write markers.
    #[inline(always)]
    pub(crate) fn stamp(&self) -> WriteStamp {
        WriteStamp {
            active: self.write_active.load(Ordering::Acquire),
            epoch: self.write_epoch.load(Ordering::Acquire),
        }
    }

    /// The sequence currently stamped on the slot.
    ///
    /// Only meaningful when bracketed by a validated snapshot pair; read in
    /// isolation it may belong to a publish that is being overwritten.
    #[inline(always)]
    pub(crate) fn sequence(&self) -> Sequence {
        self.sequence.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Raw pointer to the payload bytes.
    ///
    /// Writes through it are only sound inside this slot's write window
    /// (`begin_write` called, slot uniquely reserved); reads must be
    /// bracketed by `stamp()` snapshots and treated as unreliable when the
    /// stamps report overlap.
    #[inline(always)]
    pub(crate) fn payload_ptr(&self) -> *mut u8 {
        self.payload.as_ptr() as *mut u8
    }

    /// Track a reader entering the slot. Diagnostic only.
    #[inline(always)]
    pub(crate) fn enter_read(&self) {
        self.readers.fetch_add(1, Ordering::Relaxed);
    }

    /// Track a reader leaving the slot. Diagnostic only.
    #[inline(always)]
    pub(crate) fn exit_read(&self) {
        self.readers.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn reader_count(&self) -> u32 {
        self.readers.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_window_epoch_parity() {
        let slot = Slot::new(16);
        assert_eq!(slot.stamp().epoch % 2, 0);

        slot.begin_write();
        let open = slot.stamp();
        assert!(open.active);
        assert_eq!(open.epoch % 2, 1);

        slot.end_write(7);
        let closed = slot.stamp();
        assert!(!closed.active);
        assert_eq!(closed.epoch % 2, 0);
        assert_eq!(closed.epoch, open.epoch + 1);
        assert_eq!(slot.sequence(), 7);
    }

    #[test]
    fn test_stamp_overlap_detection() {
        let idle = WriteStamp { active: false, epoch: 2 };
        let same = WriteStamp { active: false, epoch: 2 };
        let mid_write = WriteStamp { active: true, epoch: 3 };
        let next_publish = WriteStamp { active: false, epoch: 4 };

        assert!(!idle.overlaps(&same));
        assert!(idle.overlaps(&mid_write));
        assert!(mid_write.overlaps(&next_publish));
        // A full publish inside the read window moves the epoch by 2.
        assert!(idle.overlaps(&next_publish));
    }

    #[test]
    fn test_reader_count_tracking() {
        let slot = Slot::new(4);
        assert_eq!(slot.reader_count(), 0);
        slot.enter_read();
        slot.enter_read();
        assert_eq!(slot.reader_count(), 2);
        slot.exit_read();
        slot.exit_read();
        assert_eq!(slot.reader_count(), 0);
    }

    #[test]
    fn test_payload_starts_zeroed() {
        let slot = Slot::new(8);
        assert_eq!(slot.payload_len(), 8);
        let bytes = unsafe {
            std::slice::from_raw_parts(slot.payload_ptr(), slot.payload_len())
        };
        assert!(bytes.iter().all(|b| *b == 0));
    }
}
