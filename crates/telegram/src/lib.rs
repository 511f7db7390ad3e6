//! Telegram transport: signal delivery, the subscriber registry and the
//! subscription commands.

pub mod commands;
pub mod notifier;
pub mod subscribers;

pub use commands::{start_bot, BotDeps, Command};
pub use notifier::TelegramNotifier;
pub use subscribers::JsonSubscriberRegistry;
