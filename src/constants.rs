//! Core constants used across the crate.

use std::time::Duration;
use static_assertions::const_assert;

/// Smallest usable ring: one slot being written plus one readable slot.
pub const MIN_SLOT_COUNT: usize = 2;

/// Default slot count for `RingConfig::default()`.
pub const DEFAULT_SLOT_COUNT: usize = 8;

/// Default payload size in bytes for `RingConfig::default()`.
pub const DEFAULT_PAYLOAD_LEN: usize = 64;

/// Cache line size for alignment (64 bytes on most CPUs).
pub const CACHE_LINE_SIZE: usize = 64;

/// Consecutive missed watchdog checks before a thread is flagged stalled.
pub const WATCHDOG_STALL_CHECKS: u32 = 3;

/// Default watchdog check interval.
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(1);

const_assert!(MIN_SLOT_COUNT >= 2);
const_assert!(DEFAULT_SLOT_COUNT >= MIN_SLOT_COUNT);
const_assert!(CACHE_LINE_SIZE.is_power_of_two());
const_assert!(WATCHDOG_STALL_CHECKS > 0);
