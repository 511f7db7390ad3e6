use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use common::{Result, Timeframe, Trend};
use store::SeriesStore;
use strategy::{analyze, evaluate, Decision, WatchlistConfig};

use crate::dispatch::SignalDispatcher;
use crate::trend::TrendClassifier;

/// Counters for one scan cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Instruments whose trend was determined.
    pub instruments: usize,
    /// Instruments skipped because their trend was undetermined.
    pub skipped: usize,
    /// (instrument, timeframe) pairs that reached a decision.
    pub evaluated: usize,
    pub signals: usize,
    /// Pairs that errored, panicked or timed out.
    pub failed: usize,
}

impl CycleReport {
    fn absorb(&mut self, other: CycleReport) {
        self.instruments += other.instruments;
        self.skipped += other.skipped;
        self.evaluated += other.evaluated;
        self.signals += other.signals;
        self.failed += other.failed;
    }
}

/// Runs one full pass over the watchlist: trend per instrument, then
/// refresh, enrich and vote per timeframe, dispatching any signal.
///
/// Each instrument runs in its own task and each of its timeframes in a
/// child task bounded by `pair_timeout`, so one failing or slow pair never
/// holds up the others.
#[derive(Clone)]
pub struct Scanner {
    store: Arc<SeriesStore>,
    trends: TrendClassifier,
    dispatcher: SignalDispatcher,
    watchlist: Arc<WatchlistConfig>,
    pair_timeout: Duration,
}

impl Scanner {
    pub fn new(
        store: Arc<SeriesStore>,
        trends: TrendClassifier,
        dispatcher: SignalDispatcher,
        watchlist: WatchlistConfig,
        pair_timeout: Duration,
    ) -> Self {
        Self {
            store,
            trends,
            dispatcher,
            watchlist: Arc::new(watchlist),
            pair_timeout,
        }
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        if !self.dispatcher.has_subscribers() {
            debug!("No subscribers, skipping cycle");
            return report;
        }

        let mut tasks = JoinSet::new();
        for instrument in &self.watchlist.symbols {
            let scanner = self.clone();
            let instrument = instrument.clone();
            tasks.spawn(async move { scanner.scan_instrument(&instrument).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(instrument_report) => report.absorb(instrument_report),
                Err(e) => error!(error = %e, "Instrument task panicked"),
            }
        }

        info!(
            instruments = report.instruments,
            skipped = report.skipped,
            evaluated = report.evaluated,
            signals = report.signals,
            failed = report.failed,
            "Scan cycle complete"
        );
        report
    }

    async fn scan_instrument(&self, instrument: &str) -> CycleReport {
        let mut report = CycleReport::default();
        let Some(trend) = self.trends.trend(instrument).await else {
            warn!(%instrument, "Skipping instrument, trend undetermined");
            report.skipped = 1;
            return report;
        };
        report.instruments = 1;

        let mut tasks = JoinSet::new();
        for &timeframe in &self.watchlist.timeframes {
            let scanner = self.clone();
            let instrument = instrument.to_string();
            let timeout = self.pair_timeout;
            tasks.spawn(async move {
                let outcome =
                    tokio::time::timeout(timeout, scanner.scan_pair(&instrument, timeframe, trend))
                        .await;
                (instrument, timeframe, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, Ok(Ok(decision)))) => {
                    report.evaluated += 1;
                    if matches!(decision, Decision::Emit(_)) {
                        report.signals += 1;
                    }
                }
                Ok((instrument, timeframe, Ok(Err(e)))) => {
                    warn!(%instrument, %timeframe, error = %e, "Pair evaluation failed");
                    report.failed += 1;
                }
                Ok((instrument, timeframe, Err(_))) => {
                    error!(%instrument, %timeframe, timeout = ?self.pair_timeout, "Pair evaluation timed out");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(%instrument, error = %e, "Pair task panicked");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Refresh, enrich and vote one (instrument, timeframe) pair, dispatching
    /// the signal if one is emitted.
    pub async fn scan_pair(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        trend: Trend,
    ) -> Result<Decision> {
        let series = self.store.ensure_fresh(instrument, timeframe).await;
        let (previous, latest) = analyze(&series)?;
        let decision = evaluate(instrument, timeframe, &previous, &latest, Some(trend));
        if let Decision::Emit(signal) = &decision {
            self.dispatcher.dispatch(signal).await;
        }
        Ok(decision)
    }
}
