//! Latest-value broadcast demo.
//!
//! A ticker service publishes market-data-style ticks into a broadcast
//! ring while the main thread samples the latest value with a bounded
//! retry on torn reads. A watchdog tracks the ticker's heartbeat and a
//! reaper collects the short-lived sampler workers.
//!
//! Run with: cargo run --example latest_value

use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;
use std::thread::{ self, JoinHandle };
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pulse::{
    BroadcastRing,
    PulseError,
    Result,
    Service,
    ServiceStack,
    ThreadReaper,
    Watchdog,
};

const PAYLOAD_LEN: usize = 16;

struct TickerService {
    ring: Arc<BroadcastRing>,
    watchdog: Arc<Watchdog>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<()>>>,
}

impl Service for TickerService {
    fn name(&self) -> &'static str {
        "ticker"
    }

    fn start(&mut self) -> Result<()> {
        let ring = self.ring.clone();
        let watchdog = self.watchdog.clone();
        let stop = self.stop.clone();

        self.worker = Some(
            thread::spawn(move || {
                watchdog.register("ticker")?;
                let mut price: u64 = 10_000;
                while !stop.load(Ordering::Relaxed) {
                    price = price.wrapping_add(1);
                    ring.publish(|buf| {
                        buf[..8].copy_from_slice(&price.to_le_bytes());
                        buf[8..].copy_from_slice(&price.wrapping_mul(2).to_le_bytes());
                        Ok(())
                    })?;
                    watchdog.kick("ticker");
                    thread::sleep(Duration::from_millis(1));
                }
                watchdog.done("ticker");
                Ok(())
            })
        );
        Ok(())
    }

    fn cancel(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn join(&mut self) -> Result<()> {
        match self.worker.take() {
            Some(worker) =>
                worker.join().map_err(|_| PulseError::service("ticker worker panicked"))?,
            None => Ok(()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber
        ::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let ring = Arc::new(BroadcastRing::new(4, PAYLOAD_LEN)?);
    let watchdog = Arc::new(Watchdog::new(8, Duration::from_millis(200))?);
    let reaper = ThreadReaper::new();

    let mut stack = ServiceStack::new();
    stack.register(
        Box::new(TickerService {
            ring: ring.clone(),
            watchdog: watchdog.clone(),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    );
    stack.start_all()?;

    let reaper = Arc::new(reaper);
    for round in 0..5 {
        thread::sleep(Duration::from_millis(200));

        // Sample in a short-lived worker; the reaper joins it for us.
        let sample_ring = ring.clone();
        let sample_reaper = reaper.clone();
        let sampler = thread::spawn(move || {
            // Bounded retry: accept a torn read after a few attempts rather
            // than spin forever.
            for attempt in 0..4 {
                let mut price = 0u64;
                let outcome = sample_ring
                    .read_latest(|payload, seq| {
                        let mut word = [0u8; 8];
                        word.copy_from_slice(&payload[..8]);
                        price = u64::from_le_bytes(word);
                        info!(sequence = seq, "sampled");
                        Ok(())
                    })
                    .expect("sampler reader never fails");
                if outcome.is_clean() {
                    info!(round, attempt, price, "clean sample");
                    break;
                }
            }
            sample_reaper.notify_done();
        });
        reaper.adopt(sampler);

        if !watchdog.stalled().is_empty() {
            info!(stalled = ?watchdog.stalled(), "watchdog flagged threads");
        }
    }

    stack.shutdown()?;
    info!(published = ring.published(), "done");
    Ok(())
}
