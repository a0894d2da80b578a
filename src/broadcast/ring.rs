//! The `BroadcastRing` publish and optimistic-read protocols.

use std::sync::atomic::{ fence, Ordering };

use crate::broadcast::common::{ PaddedCursor, PaddedSequence };
use crate::broadcast::slot::Slot;
use crate::broadcast::{ ReadOutcome, RingConfig, Sequence };
use crate::error::{ ReadError, Result };

/// Fixed-capacity, lock-free latest-value broadcast ring.
///
/// Producers call [`publish`](Self::publish) with a payload filler; readers
/// call [`read_latest`](Self::read_latest) with a payload consumer. Both
/// sides are non-blocking: producers never wait for readers, readers never
/// wait for producers, and an overlapped read is *reported* rather than
/// retried. Multiple independent rings may coexist; all state is owned by
/// the instance.
pub struct BroadcastRing {
    slots: Box<[Slot]>,
    cursor: PaddedCursor,
    next_sequence: PaddedSequence,
}

impl BroadcastRing {
    /// Create a ring with `slot_count` slots of `payload_len` bytes each.
    ///
    /// Both dimensions are fixed for the ring's lifetime. `slot_count < 2`
    /// and `payload_len == 0` are rejected.
    pub fn new(slot_count: usize, payload_len: usize) -> Result<Self> {
        Self::with_config(RingConfig::new(slot_count, payload_len)?)
    }

    /// Create a ring from a configuration, re-validating its dimensions.
    pub fn with_config(config: RingConfig) -> Result<Self> {
        let config = RingConfig::new(config.slot_count, config.payload_len)?;
        let slots = (0..config.slot_count)
            .map(|_| Slot::new(config.payload_len))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            slots,
            cursor: PaddedCursor::new(0),
            next_sequence: PaddedSequence::new(0),
        })
    }

    /// Reserve the next slot index, round-robin.
    ///
    /// Lock-free but not wait-free: the CAS retries until it wins, which
    /// under adversarial scheduling can delay one producer indefinitely.
    /// Accepted trade-off; producer concurrency is expected to be low.
    ///
    /// Returns the pre-advance cursor value, so the reserved slot is exactly
    /// the one `latest_index()` will target until the next reservation.
    #[inline]
    fn reserve_slot(&self) -> usize {
        let mut current = self.cursor.index.load(Ordering::Relaxed);
        loop {
            let next = if current + 1 == self.slots.len() { 0 } else { current + 1 };
            match
                self.cursor.index.compare_exchange_weak(
                    current,
                    next,
                    Ordering::Relaxed,
                    Ordering::Relaxed
                )
            {
                Ok(_) => {
                    return current;
                }
                Err(observed) => {
                    current = observed;
                    std::hint::spin_loop();
                }
            }
        }
    }

    /// Index of the most recently reserved slot.
    ///
    /// That slot may still be mid-write; `read_latest` detects and reports
    /// the overlap instead of waiting it out.
    #[inline]
    fn latest_index(&self) -> usize {
        let cursor = self.cursor.index.load(Ordering::Relaxed);
        if cursor == 0 {
            self.slots.len() - 1
        } else {
            cursor - 1
        }
    }

    /// Publish one payload.
    ///
    /// `fill` receives a mutable view of exactly `payload_len` bytes and
    /// reports success or failure. On success the assigned sequence number
    /// is returned.
    ///
    /// A `fill` error does not abort the slot protocol: the sequence is
    /// still stamped and the write markers are still cleared, so the slot is
    /// never left looking permanently in-progress. The payload content after
    /// a failed fill is whatever the callback left behind; the error is
    /// propagated to the caller, who decides whether to publish again.
    pub fn publish<F>(&self, fill: F) -> Result<Sequence>
        where F: FnOnce(&mut [u8]) -> Result<()>
    {
        // Sequence allocation and slot reservation are independent; two
        // producers may interleave them, each (slot, sequence) pairing is
        // consistent for its own publish.
        let sequence = self.next_sequence.value.fetch_add(1, Ordering::Relaxed);
        let slot = &self.slots[self.reserve_slot()];

        slot.begin_write();
        // SAFETY: reserve_slot hands each index to exactly one producer per
        // cursor generation, so this is the only writer in the window.
        let payload = unsafe {
            std::slice::from_raw_parts_mut(slot.payload_ptr(), slot.payload_len())
        };
        let filled = fill(payload);
        slot.end_write(sequence);

        filled.map(|()| sequence)
    }

    /// Read the most recently reserved slot.
    ///
    /// `read` receives an immutable view of the payload bytes and the slot's
    /// observed sequence number. The returned [`ReadOutcome`] reports whether
    /// a write overlapped the read window; on `PossiblyTorn` the bytes and
    /// sequence may mix two publishes and the caller should retry (a bounded
    /// retry loop is the recommended pattern - the ring itself never blocks
    /// or retries).
    ///
    /// A `read` error is propagated with the computed outcome attached.
    pub fn read_latest<F>(&self, read: F) -> std::result::Result<ReadOutcome, ReadError>
        where F: FnOnce(&[u8], Sequence) -> Result<()>
    {
        let slot = &self.slots[self.latest_index()];

        let before = slot.stamp();
        slot.enter_read();
        // SAFETY: access is bracketed by marker snapshots; an overlapping
        // writer is reported through the outcome below.
        let payload = unsafe {
            std::slice::from_raw_parts(slot.payload_ptr() as *const u8, slot.payload_len())
        };
        let consumed = read(payload, slot.sequence());
        slot.exit_read();
        // Pairs with the release fence in begin_write: payload reads cannot
        // drift past the second snapshot.
        fence(Ordering::Acquire);
        let after = slot.stamp();

        let outcome = if before.overlaps(&after) {
            ReadOutcome::PossiblyTorn
        } else {
            ReadOutcome::Clean
        };

        match consumed {
            Ok(()) => Ok(outcome),
            Err(source) => Err(ReadError { outcome, source }),
        }
    }

    /// Number of slots in the ring.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Payload size in bytes.
    pub fn payload_len(&self) -> usize {
        self.slots[0].payload_len()
    }

    /// Number of sequence numbers handed out so far.
    ///
    /// This counts publish *attempts* (a failed fill still consumes a
    /// sequence number). Zero means no publish has ever started, which is
    /// how embedding code distinguishes the initial zeroed payload from a
    /// real sequence-0 publish.
    pub fn published(&self) -> u64 {
        self.next_sequence.value.load(Ordering::Relaxed)
    }

    /// Readers currently inside `read_latest`, summed over all slots.
    /// Diagnostic only.
    pub fn active_readers(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| slot.reader_count() as usize)
            .sum()
    }
}
