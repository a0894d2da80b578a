//! Heartbeat liveness monitor for named threads.
//!
//! Worker threads register under a unique name and then kick the watchdog
//! periodically. A monitor thread wakes every interval and counts the
//! entries whose last kick has gone stale; after
//! [`WATCHDOG_STALL_CHECKS`](crate::constants::WATCHDOG_STALL_CHECKS)
//! consecutive misses the entry is flagged stalled. The flag clears on the
//! next kick - the watchdog observes and reports, it never kills anything.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{ self, JoinHandle, ThreadId };
use std::time::{ Duration, Instant };

use parking_lot::{ Condvar, Mutex };
use tracing::{ info, warn };

use crate::constants::WATCHDOG_STALL_CHECKS;
use crate::error::{ PulseError, Result };

struct Entry {
    thread: ThreadId,
    last_kick: Instant,
    missed: u32,
    stalled: bool,
}

struct WatchdogState {
    entries: HashMap<String, Entry>,
    stop: bool,
}

struct Shared {
    state: Mutex<WatchdogState>,
    wake: Condvar,
    interval: Duration,
    capacity: usize,
}

/// Tracks heartbeats of registered threads and flags silent ones.
pub struct Watchdog {
    shared: Arc<Shared>,
    monitor: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Create a watchdog checking every `interval`, tracking at most
    /// `capacity` threads.
    pub fn new(capacity: usize, interval: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(PulseError::config("Watchdog capacity must be greater than 0"));
        }
        if interval.is_zero() {
            return Err(PulseError::config("Watchdog interval must be nonzero"));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(WatchdogState {
                entries: HashMap::new(),
                stop: false,
            }),
            wake: Condvar::new(),
            interval,
            capacity,
        });

        let monitor_shared = shared.clone();
        let monitor = thread::Builder
            ::new()
            .name("watchdog".into())
            .spawn(move || Self::monitor_loop(&monitor_shared))
            .expect("failed to spawn watchdog monitor thread");

        Ok(Self {
            shared,
            monitor: Some(monitor),
        })
    }

    fn monitor_loop(shared: &Shared) {
        let mut state = shared.state.lock();
        loop {
            if state.stop {
                return;
            }
            shared.wake.wait_for(&mut state, shared.interval);
            if state.stop {
                return;
            }

            let now = Instant::now();
            for (name, entry) in state.entries.iter_mut() {
                if now.duration_since(entry.last_kick) <= shared.interval {
                    continue;
                }
                entry.missed += 1;
                if entry.missed >= WATCHDOG_STALL_CHECKS && !entry.stalled {
                    entry.stalled = true;
                    warn!(
                        thread = %name,
                        missed = entry.missed,
                        "watchdog: thread is unresponsive"
                    );
                }
            }
        }
    }

    /// Register the calling thread under `name`.
    ///
    /// Fails when the registry is full or the name is already taken.
    pub fn register(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let mut state = self.shared.state.lock();
        if state.entries.len() >= self.shared.capacity {
            return Err(
                PulseError::watchdog(
                    format!("Registry full ({} threads)", self.shared.capacity)
                )
            );
        }
        if state.entries.contains_key(&name) {
            return Err(PulseError::watchdog(format!("Thread name already registered: {name}")));
        }

        info!(thread = %name, "watchdog: registered");
        state.entries.insert(name, Entry {
            thread: thread::current().id(),
            last_kick: Instant::now(),
            missed: 0,
            stalled: false,
        });
        Ok(())
    }

    /// Refresh the heartbeat for `name`.
    ///
    /// Returns false for an unknown name or when the caller is not the
    /// thread that registered it.
    pub fn kick(&self, name: &str) -> bool {
        let mut state = self.shared.state.lock();
        match state.entries.get_mut(name) {
            Some(entry) if entry.thread == thread::current().id() => {
                entry.last_kick = Instant::now();
                entry.missed = 0;
                if entry.stalled {
                    entry.stalled = false;
                    info!(thread = %name, "watchdog: thread recovered");
                }
                true
            }
            _ => false,
        }
    }

    /// Remove `name` from the registry, with the same identity check as
    /// [`kick`](Self::kick).
    pub fn done(&self, name: &str) -> bool {
        let mut state = self.shared.state.lock();
        match state.entries.get(name) {
            Some(entry) if entry.thread == thread::current().id() => {
                state.entries.remove(name);
                info!(thread = %name, "watchdog: deregistered");
                true
            }
            _ => false,
        }
    }

    /// Names currently flagged as stalled.
    pub fn stalled(&self) -> Vec<String> {
        let state = self.shared.state.lock();
        state.entries
            .iter()
            .filter(|(_, entry)| entry.stalled)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of registered threads.
    pub fn watched(&self) -> usize {
        self.shared.state.lock().entries.len()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.stop = true;
            self.shared.wake.notify_all();
        }
        if let Some(monitor) = self.monitor.take() {
            let _ = monitor.join();
        }
    }
}
