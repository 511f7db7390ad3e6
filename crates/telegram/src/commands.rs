use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tracing::{error, info};

use common::SubscriberRegistry;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub subscribers: Arc<dyn SubscriberRegistry>,
}

/// Commands available to any chat.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Subscribe to trading signals")]
    Start,
    #[command(description = "Unsubscribe from trading signals")]
    Stop,
    #[command(description = "Show this help")]
    Help,
}

pub const SUBSCRIBED: &str = "✅ You are now subscribed to trading signals!";
pub const ALREADY_SUBSCRIBED: &str = "ℹ️ You are already subscribed to trading signals.";
pub const UNSUBSCRIBED: &str = "🛑 You have unsubscribed from trading signals.";
pub const NOT_SUBSCRIBED: &str = "ℹ️ You were not subscribed to signals.";
pub const REGISTRY_FAILED: &str = "⚠️ Could not update your subscription, please try again later.";

/// Apply `command` to the registry and build the reply. Registry failures
/// are logged and answered with a retry notice.
pub fn subscription_reply(
    command: &Command,
    chat_id: i64,
    subscribers: &dyn SubscriberRegistry,
) -> String {
    let outcome = match command {
        Command::Start => subscribers
            .add(chat_id)
            .map(|added| if added { SUBSCRIBED } else { ALREADY_SUBSCRIBED }),
        Command::Stop => subscribers
            .remove(chat_id)
            .map(|removed| if removed { UNSUBSCRIBED } else { NOT_SUBSCRIBED }),
        Command::Help => return Command::descriptions().to_string(),
    };
    match outcome {
        Ok(text) => {
            info!(chat_id, ?command, reply = text, "Subscription command handled");
            text.to_string()
        }
        Err(e) => {
            error!(chat_id, ?command, error = %e, "Failed to update subscribers");
            REGISTRY_FAILED.to_string()
        }
    }
}

/// `subscription_reply` on the blocking pool, since registry updates write
/// the subscribers file.
pub async fn handle_subscription(
    command: Command,
    chat_id: i64,
    subscribers: Arc<dyn SubscriberRegistry>,
) -> String {
    let task = tokio::task::spawn_blocking(move || {
        subscription_reply(&command, chat_id, subscribers.as_ref())
    });
    match task.await {
        Ok(reply) => reply,
        Err(e) => {
            error!(chat_id, error = %e, "Subscription task failed");
            REGISTRY_FAILED.to_string()
        }
    }
}

/// Start the Telegram bot in long-polling mode. Returns when the
/// dispatcher stops (Ctrl-C).
pub async fn start_bot(bot: Bot, deps: BotDeps) {
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    let command_handler = teloxide::filter_command::<Command, _>().endpoint(handle_command);

    Update::filter_message().branch(command_handler)
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, deps: Arc<BotDeps>) -> HandlerResult {
    let reply = handle_subscription(cmd, msg.chat.id.0, deps.subscribers.clone()).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
