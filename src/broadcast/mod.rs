//! Latest-value broadcast ring.
//!
//! A fixed-capacity, lock-free ring where producers publish fixed-size
//! payloads and readers always target the most recently reserved slot.
//! Nothing in the hot path blocks, sleeps, or retries:
//!
//! - Producers reserve slots round-robin through a CAS-advanced cursor, so
//!   no two producers ever write the same slot concurrently.
//! - Every publish is stamped with a globally unique, strictly increasing
//!   sequence number.
//! - Readers copy payload bytes out optimistically and validate the copy
//!   against the slot's write markers; an overlapped read is reported as
//!   [`ReadOutcome::PossiblyTorn`], never hidden and never retried
//!   internally.
//!
//! ## Freshness over certainty
//!
//! The read target is the most recently *reserved* slot, which may still be
//! mid-write. This maximizes freshness and pushes the torn/clean decision to
//! the caller; a bounded retry loop around `PossiblyTorn` is the intended
//! embedding pattern.
//!
//! ## Module Organization
//!
//! - `slot` - one ring position and its write-marker protocol
//! - `ring` - the `BroadcastRing` publish/read protocols
//! - `common` - cache-line padded cursor cells

pub mod common;
pub mod ring;
pub mod slot;

pub use ring::BroadcastRing;

use serde::{ Deserialize, Serialize };

use crate::constants::{ DEFAULT_PAYLOAD_LEN, DEFAULT_SLOT_COUNT, MIN_SLOT_COUNT };
use crate::error::{ PulseError, Result };

/// Sequence number type for published payloads.
pub type Sequence = u64;

/// Trustworthiness of a completed `read_latest` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadOutcome {
    /// No write overlapped the read window; the bytes are one complete publish.
    Clean,
    /// A write overlapped the read window; the bytes and sequence number may
    /// mix two publishes and must not be trusted.
    PossiblyTorn,
}

impl ReadOutcome {
    /// True when the copied bytes are guaranteed internally consistent.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// Validated construction parameters for a [`BroadcastRing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingConfig {
    /// Number of slots in the ring.
    pub slot_count: usize,
    /// Payload size in bytes, identical for every slot.
    pub payload_len: usize,
}

impl RingConfig {
    /// Create a configuration, rejecting dimensions the ring cannot support.
    ///
    /// A single slot cannot distinguish "currently being written" from
    /// "most recently readable", so `slot_count < 2` is refused outright.
    pub fn new(slot_count: usize, payload_len: usize) -> Result<Self> {
        if slot_count < MIN_SLOT_COUNT {
            return Err(
                PulseError::config(
                    format!("Slot count must be at least {} (got {})", MIN_SLOT_COUNT, slot_count)
                )
            );
        }
        if payload_len == 0 {
            return Err(PulseError::config("Payload size must be greater than 0"));
        }

        Ok(Self {
            slot_count,
            payload_len,
        })
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            payload_len: DEFAULT_PAYLOAD_LEN,
        }
    }
}
