use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub subscribers_file: String,

    // Market data
    pub binance_base_url: String,
    pub http_timeout: Duration,
    pub data_dir: String,

    // Watchlist file; built-in defaults when unset
    pub watchlist_path: Option<String>,

    // Scheduling
    pub scan_interval: Duration,
    pub scan_first_delay: Duration,
    pub pair_timeout: Duration,
    pub notify_delay: Duration,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            telegram_token: required_env("TELEGRAM_TOKEN"),
            subscribers_file: optional_env("SUBSCRIBERS_FILE")
                .unwrap_or_else(|| "subscribers.json".to_string()),
            binance_base_url: optional_env("BINANCE_BASE_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
            http_timeout: Duration::from_secs(parsed_env("HTTP_TIMEOUT_SECS", 10)),
            data_dir: optional_env("DATA_DIR").unwrap_or_else(|| "historical_data".to_string()),
            watchlist_path: optional_env("WATCHLIST_PATH"),
            scan_interval: Duration::from_secs(parsed_env("SCAN_INTERVAL_SECS", 60)),
            scan_first_delay: Duration::from_secs(parsed_env("SCAN_FIRST_DELAY_SECS", 10)),
            pair_timeout: Duration::from_secs(parsed_env("PAIR_TIMEOUT_SECS", 120)),
            notify_delay: Duration::from_millis(parsed_env("NOTIFY_DELAY_MS", 100)),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parsed_env(key: &str, default: u64) -> u64 {
    match optional_env(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            panic!("Environment variable '{key}' must be a non-negative integer, got: '{raw}'")
        }),
        None => default,
    }
}
