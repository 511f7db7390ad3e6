use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, MarketDataProvider, SubscriberRegistry};
use engine::{BinanceClient, Scanner, Scheduler, SignalDispatcher, TrendClassifier};
use store::SeriesStore;
use strategy::{TrendCache, WatchlistConfig};
use telegram_ctrl::{start_bot, BotDeps, JsonSubscriberRegistry, TelegramNotifier};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    let filter = EnvFilter::from_default_env()
        .add_directive("info".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("teloxide=warn".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let watchlist = WatchlistConfig::load(cfg.watchlist_path.as_deref())
        .unwrap_or_else(|e| panic!("Failed to load watchlist: {e}"));
    info!(
        symbols = ?watchlist.symbols,
        timeframes = ?watchlist.timeframes,
        trend_timeframe = %watchlist.trend_timeframe,
        "SignalBot starting"
    );

    // ── Market data ───────────────────────────────────────────────────────────
    let provider: Arc<dyn MarketDataProvider> = Arc::new(
        BinanceClient::new(&cfg.binance_base_url, cfg.http_timeout)
            .unwrap_or_else(|e| panic!("Failed to create Binance client: {e}")),
    );
    let store = Arc::new(SeriesStore::new(&cfg.data_dir, provider));
    info!(dir = %store.dir().display(), "Series store ready");

    // ── Telegram ──────────────────────────────────────────────────────────────
    let bot = teloxide::Bot::new(&cfg.telegram_token);
    let subscribers: Arc<dyn SubscriberRegistry> = Arc::new(
        JsonSubscriberRegistry::open(&cfg.subscribers_file)
            .unwrap_or_else(|e| panic!("Failed to open subscribers file: {e}")),
    );
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));

    // ── Scanner ───────────────────────────────────────────────────────────────
    let trend_cache = TrendCache::new();
    let trends = TrendClassifier::new(store.clone(), trend_cache, watchlist.trend_timeframe);
    let dispatcher = SignalDispatcher::new(notifier, subscribers.clone(), cfg.notify_delay);
    let scanner = Scanner::new(store, trends, dispatcher, watchlist, cfg.pair_timeout);
    let (scheduler, scheduler_handle) =
        Scheduler::new(scanner, cfg.scan_interval, cfg.scan_first_delay);

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let scheduler_task = tokio::spawn(scheduler.run());
    tokio::spawn(start_bot(bot, BotDeps { subscribers }));

    info!("All subsystems started. Waiting for shutdown signal.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received. Finishing current cycle.");
    scheduler_handle.stop();
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "Scheduler task failed");
    }
    info!(cycles = scheduler_handle.cycles(), "Exiting.");
}
