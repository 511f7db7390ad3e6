use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use common::{Notifier, Signal, SubscriberRegistry};

/// Sends emitted signals to every current subscriber.
#[derive(Clone)]
pub struct SignalDispatcher {
    notifier: Arc<dyn Notifier>,
    subscribers: Arc<dyn SubscriberRegistry>,
    delay: Duration,
}

impl SignalDispatcher {
    /// `delay` is slept after each send to stay under transport rate limits.
    pub fn new(
        notifier: Arc<dyn Notifier>,
        subscribers: Arc<dyn SubscriberRegistry>,
        delay: Duration,
    ) -> Self {
        Self {
            notifier,
            subscribers,
            delay,
        }
    }

    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.subscribers().is_empty()
    }

    /// Deliver `signal` to each subscriber. A failed send is logged and the
    /// remaining recipients are still tried. Returns the number delivered.
    pub async fn dispatch(&self, signal: &Signal) -> usize {
        let text = signal.message();
        let recipients = self.subscribers.subscribers();
        let mut delivered = 0;

        for recipient in &recipients {
            match self.notifier.send(*recipient, &text).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(recipient, error = %e, "Failed to deliver signal"),
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            instrument = %signal.instrument,
            timeframe = %signal.timeframe,
            direction = %signal.direction,
            delivered,
            recipients = recipients.len(),
            "Signal dispatched"
        );
        delivered
    }
}
