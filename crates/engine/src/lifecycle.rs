use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::scanner::Scanner;

/// Cloneable handle used to observe and stop a running scheduler. Dropping
/// every handle also stops it.
#[derive(Clone)]
pub struct SchedulerHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
    cycles: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Ask the scheduler to exit. A cycle already in progress finishes first.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Completed scan cycles since start.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }
}

/// Runs scan cycles on a fixed period. Cycles never overlap: the next tick
/// waits for the current cycle, and missed ticks are delayed, not bunched.
pub struct Scheduler {
    scanner: Scanner,
    interval: Duration,
    first_delay: Duration,
    shutdown_rx: watch::Receiver<bool>,
    cycles: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(scanner: Scanner, interval: Duration, first_delay: Duration) -> (Self, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cycles = Arc::new(AtomicU64::new(0));

        let handle = SchedulerHandle {
            shutdown_tx: Arc::new(shutdown_tx),
            cycles: cycles.clone(),
        };

        let scheduler = Scheduler {
            scanner,
            interval,
            first_delay,
            shutdown_rx,
            cycles,
        };

        (scheduler, handle)
    }

    /// Run until stopped. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            interval = ?self.interval,
            first_delay = ?self.first_delay,
            "Scheduler started"
        );

        tokio::select! {
            _ = tokio::time::sleep(self.first_delay) => {}
            _ = self.shutdown_rx.changed() => {
                info!("Scheduler stopped before first cycle");
                return;
            }
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.scanner.run_cycle().await;
                    self.cycles.fetch_add(1, Ordering::SeqCst);
                }
                _ = self.shutdown_rx.changed() => {
                    info!(cycles = self.cycles.load(Ordering::SeqCst), "Scheduler stopped");
                    break;
                }
            }
        }
    }
}
