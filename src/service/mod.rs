//! Service lifecycle management.
//!
//! Services are threaded components inside one process. They are started in
//! a controlled order and stopped in a controlled order, so no service ever
//! runs before a service it depends on exists, and no service's resources
//! are torn down while its threads are still alive:
//!
//! 1. start services in registration order
//! 2. on shutdown, ask every service to stop (`cancel`, non-blocking)
//! 3. then wait for every service's threads (`join`)
//! 4. only then drop the services themselves
//!
//! ## Module Organization
//!
//! - `reaper` - janitor that joins short-lived worker threads
//! - `watchdog` - heartbeat liveness monitor for named threads

pub mod reaper;
pub mod watchdog;

use tracing::{ error, info, warn };

use crate::error::{ PulseError, Result };

/// A threaded component with an ordered start/stop lifecycle.
///
/// `cancel` only *requests* the stop and must not block; the actual wait
/// happens in `join`. Splitting the two lets [`ServiceStack::shutdown`]
/// signal every service before waiting on any of them, so one service's
/// slow exit never delays another's stop request.
pub trait Service: Send {
    /// Human-readable service name used in logs.
    fn name(&self) -> &'static str;

    /// Allocate resources and spawn the service's threads.
    fn start(&mut self) -> Result<()>;

    /// Ask the service's threads to stop. Must not block.
    fn cancel(&mut self);

    /// Wait for the service's threads to finish.
    fn join(&mut self) -> Result<()>;
}

/// An ordered collection of services with all-or-nothing startup.
///
/// Registration order is start order. A service that fails to start causes
/// the already-started services to be cancelled and joined in reverse order
/// before the error is returned, so a partially-started stack never leaks
/// running threads.
#[derive(Default)]
pub struct ServiceStack {
    services: Vec<Box<dyn Service>>,
    running: bool,
}

impl ServiceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service. Has no effect on already-running stacks' threads;
    /// newly registered services start on the next `start_all`.
    pub fn register(&mut self, service: Box<dyn Service>) {
        self.services.push(service);
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Start every registered service, in registration order.
    pub fn start_all(&mut self) -> Result<()> {
        if self.running {
            return Err(PulseError::service("Service stack is already running"));
        }

        for index in 0..self.services.len() {
            let name = self.services[index].name();
            info!(service = name, "starting service");
            if let Err(err) = self.services[index].start() {
                error!(service = name, %err, "service failed to start, unwinding");
                // Unwind in reverse order so later services never outlive
                // the earlier ones they may depend on.
                for started in self.services[..index].iter_mut().rev() {
                    started.cancel();
                }
                for started in self.services[..index].iter_mut().rev() {
                    if let Err(join_err) = started.join() {
                        warn!(service = started.name(), %join_err, "service failed to join during unwind");
                    }
                }
                return Err(err);
            }
        }

        self.running = true;
        Ok(())
    }

    /// Stop every service: cancel all first, then join all.
    ///
    /// The first join error is returned; later join errors are logged so
    /// every service still gets its wait.
    pub fn shutdown(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }

        for service in self.services.iter_mut() {
            info!(service = service.name(), "cancelling service");
            service.cancel();
        }

        let mut first_error = None;
        for service in self.services.iter_mut() {
            if let Err(err) = service.join() {
                warn!(service = service.name(), %err, "service failed to join");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            } else {
                info!(service = service.name(), "service stopped");
            }
        }

        self.running = false;
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for ServiceStack {
    fn drop(&mut self) {
        if self.running {
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicBool, Ordering };
    use std::sync::{ Arc, Mutex };
    use std::thread::JoinHandle;

    type EventLog = Arc<Mutex<Vec<String>>>;

    struct RecordingService {
        name: &'static str,
        log: EventLog,
        fail_start: bool,
        stop: Arc<AtomicBool>,
        worker: Option<JoinHandle<()>>,
    }

    impl RecordingService {
        fn new(name: &'static str, log: EventLog, fail_start: bool) -> Self {
            Self {
                name,
                log,
                fail_start,
                stop: Arc::new(AtomicBool::new(false)),
                worker: None,
            }
        }

        fn record(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.name, event));
        }
    }

    impl Service for RecordingService {
        fn name(&self) -> &'static str {
            self.name
        }

        fn start(&mut self) -> Result<()> {
            self.record("start");
            if self.fail_start {
                return Err(PulseError::service("refusing to start"));
            }
            let stop = self.stop.clone();
            self.worker = Some(
                std::thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        std::thread::yield_now();
                    }
                })
            );
            Ok(())
        }

        fn cancel(&mut self) {
            self.record("cancel");
            self.stop.store(true, Ordering::Relaxed);
        }

        fn join(&mut self) -> Result<()> {
            self.record("join");
            if let Some(worker) = self.worker.take() {
                worker.join().map_err(|_| PulseError::service("worker panicked"))?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_start_and_shutdown_ordering() {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut stack = ServiceStack::new();
        stack.register(Box::new(RecordingService::new("alpha", log.clone(), false)));
        stack.register(Box::new(RecordingService::new("beta", log.clone(), false)));

        stack.start_all().unwrap();
        stack.shutdown().unwrap();

        let events = log.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "alpha:start",
                "beta:start",
                "alpha:cancel",
                "beta:cancel",
                "alpha:join",
                "beta:join"
            ]
        );
    }

    #[test]
    fn test_failed_start_unwinds_started_services() {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut stack = ServiceStack::new();
        stack.register(Box::new(RecordingService::new("alpha", log.clone(), false)));
        stack.register(Box::new(RecordingService::new("broken", log.clone(), true)));

        assert!(stack.start_all().is_err());

        let events = log.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["alpha:start", "broken:start", "alpha:cancel", "alpha:join"]
        );

        // The stack never reached running; shutdown is a no-op.
        assert!(stack.shutdown().is_ok());
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_double_start_is_rejected() {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut stack = ServiceStack::new();
        stack.register(Box::new(RecordingService::new("alpha", log, false)));

        stack.start_all().unwrap();
        assert!(stack.start_all().is_err());
        stack.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_without_start_is_noop() {
        let mut stack = ServiceStack::new();
        assert!(stack.is_empty());
        assert!(stack.shutdown().is_ok());
    }
}
