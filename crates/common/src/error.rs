use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Market-data provider unreachable or the request was rejected.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Malformed persisted artifact or provider payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Numeric degeneracy while computing indicators (NaN/inf in an evaluated row).
    #[error("Indicator computation failed: {0}")]
    IndicatorCompute(String),

    #[error("Insufficient data: need {needed} bars, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
