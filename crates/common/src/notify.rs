use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::Result;

/// Outbound text transport. Best-effort: the caller never retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> Result<()>;
}

/// Set of recipient identifiers that receive emitted signals.
pub trait SubscriberRegistry: Send + Sync {
    /// Current subscribers. Read before each notification fan-out.
    fn subscribers(&self) -> BTreeSet<i64>;

    /// Returns `true` if the recipient was not already subscribed.
    fn add(&self, recipient: i64) -> Result<bool>;

    /// Returns `true` if the recipient was subscribed.
    fn remove(&self, recipient: i64) -> Result<bool>;
}
