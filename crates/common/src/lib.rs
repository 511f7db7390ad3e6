pub mod config;
pub mod error;
pub mod notify;
pub mod provider;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use notify::{Notifier, SubscriberRegistry};
pub use provider::MarketDataProvider;
pub use types::*;
