//! Janitor for short-lived worker threads.
//!
//! In a design where workers are spawned ad hoc, somebody still has to join
//! them. `ThreadReaper` is that single, well-defined waiter: workers are
//! adopted into it, announce their own exit with [`notify_done`], and a
//! background janitor thread joins them off everyone else's critical path.
//!
//! [`notify_done`]: ThreadReaper::notify_done

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{ self, JoinHandle, ThreadId };

use parking_lot::{ Condvar, Mutex };
use tracing::{ debug, warn };

struct ReaperState {
    workers: HashMap<ThreadId, JoinHandle<()>>,
    finished: Vec<ThreadId>,
    // Done-notifications whose adopt() has not landed yet; moved back to
    // `finished` when the handle shows up.
    orphans: Vec<ThreadId>,
    stop: bool,
}

struct Shared {
    state: Mutex<ReaperState>,
    wake: Condvar,
}

/// Joins adopted worker threads as they announce completion.
///
/// `adopt` takes ownership of a worker's join handle; the worker's last
/// action should be `notify_done()`. Dropping the reaper stops the janitor
/// and joins every remaining worker, so no adopted thread is ever leaked -
/// which also means drop blocks until adopted workers actually exit.
pub struct ThreadReaper {
    shared: Arc<Shared>,
    janitor: Option<JoinHandle<()>>,
}

impl ThreadReaper {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(ReaperState {
                workers: HashMap::new(),
                finished: Vec::new(),
                orphans: Vec::new(),
                stop: false,
            }),
            wake: Condvar::new(),
        });

        let janitor_shared = shared.clone();
        let janitor = thread::Builder
            ::new()
            .name("thread-reaper".into())
            .spawn(move || Self::janitor_loop(&janitor_shared))
            .expect("failed to spawn reaper janitor thread");

        Self {
            shared,
            janitor: Some(janitor),
        }
    }

    fn janitor_loop(shared: &Shared) {
        loop {
            let (joinable, stopping) = {
                let mut state = shared.state.lock();
                while !state.stop && state.finished.is_empty() {
                    shared.wake.wait(&mut state);
                }
                let stopping = state.stop;

                let announced = std::mem::take(&mut state.finished);
                let mut joinable = Vec::with_capacity(announced.len());
                for id in announced {
                    match state.workers.remove(&id) {
                        Some(handle) => joinable.push(handle),
                        // Done arrived before adopt(); parked until the
                        // handle shows up. Dropped on stop - Drop joins
                        // whatever was actually adopted.
                        None if !stopping => state.orphans.push(id),
                        None => {}
                    }
                }
                (joinable, stopping)
            };

            // Join outside the lock; adopt/notify_done stay non-blocking.
            for handle in joinable {
                let id = handle.thread().id();
                if handle.join().is_err() {
                    warn!(?id, "reaped worker thread had panicked");
                } else {
                    debug!(?id, "reaped worker thread");
                }
            }

            if stopping {
                return;
            }
        }
    }

    /// Take ownership of a worker's join handle.
    ///
    /// The caller's handle is gone after this; the reaper is now the only
    /// waiter for that thread.
    pub fn adopt(&self, handle: JoinHandle<()>) {
        let id = handle.thread().id();
        let mut state = self.shared.state.lock();
        state.workers.insert(id, handle);
        // This worker may have announced done before the adopt landed.
        if let Some(position) = state.orphans.iter().position(|orphan| *orphan == id) {
            state.orphans.swap_remove(position);
            state.finished.push(id);
            self.shared.wake.notify_all();
        }
    }

    /// Announce that the calling worker thread is about to exit.
    ///
    /// Must be the worker's last action; the janitor will join it.
    pub fn notify_done(&self) {
        let id = thread::current().id();
        let mut state = self.shared.state.lock();
        state.finished.push(id);
        self.shared.wake.notify_all();
    }

    /// Number of adopted workers not yet joined. Diagnostic.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().workers.len()
    }
}

impl Default for ThreadReaper {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadReaper {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.stop = true;
            self.shared.wake.notify_all();
        }
        if let Some(janitor) = self.janitor.take() {
            let _ = janitor.join();
        }

        // Workers that never announced done are joined here so nothing
        // outlives the reaper.
        let stragglers: Vec<_> = {
            let mut state = self.shared.state.lock();
            state.workers.drain().collect()
        };
        for (id, handle) in stragglers {
            if handle.join().is_err() {
                warn!(?id, "straggler worker thread had panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::{ Duration, Instant };

    fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_worker_is_reaped_after_notify_done() {
        let reaper = Arc::new(ThreadReaper::new());
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let worker_reaper = reaper.clone();
        let worker = thread::spawn(move || {
            release_rx.recv().unwrap();
            worker_reaper.notify_done();
        });
        reaper.adopt(worker);
        assert_eq!(reaper.pending(), 1);

        release_tx.send(()).unwrap();
        assert!(wait_until(Duration::from_secs(5), || reaper.pending() == 0));
    }

    #[test]
    fn test_early_notify_done_is_not_lost() {
        let reaper = Arc::new(ThreadReaper::new());
        let (started_tx, started_rx) = mpsc::channel();

        let worker_reaper = reaper.clone();
        let worker = thread::spawn(move || {
            // Announce done before the main thread has adopted the handle.
            worker_reaper.notify_done();
            started_tx.send(()).unwrap();
        });
        started_rx.recv().unwrap();

        reaper.adopt(worker);
        assert!(wait_until(Duration::from_secs(5), || reaper.pending() == 0));
    }

    #[test]
    fn test_drop_joins_stragglers() {
        let reaper = ThreadReaper::new();
        let (done_tx, done_rx) = mpsc::channel();

        // This worker never calls notify_done.
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            done_tx.send(()).unwrap();
        });
        reaper.adopt(worker);

        drop(reaper);
        // If drop joined the straggler, its message must already be queued.
        assert!(done_rx.try_recv().is_ok());
    }
}
