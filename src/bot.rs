//! Long-running Telegram bot: update dispatch and command surface.

use crate::config::Config;
use crate::directory::Directory;
use crate::messenger::telegram::TelegramMessenger;
use crate::payload::Payload;
use crate::router::{Relay, Sender};
use anyhow::Result;
use std::sync::Arc;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// Available bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show your Telegram ID")]
    MyId,
    #[command(description = "Show help")]
    Help,
    #[command(description = "List recent users (admin only)")]
    Users,
    #[command(description = "Reply to a user by id (admin only)")]
    Reply(String),
    #[command(description = "Broadcast to all known users (admin only)")]
    Broadcast(String),
    #[command(description = "Send a message to an id or name (admin only)")]
    Send(String),
}

type TelegramRelay = Relay<TelegramMessenger>;

fn sender_of(msg: &Message) -> Option<Sender> {
    let user = msg.from.as_ref()?;
    Some(Sender {
        id: user.id.0 as i64,
        display_name: user.username.clone(),
    })
}

/// Handle a parsed command.
async fn command_handler(
    msg: Message,
    cmd: Command,
    relay: Arc<TelegramRelay>,
) -> ResponseResult<()> {
    let Some(sender) = sender_of(&msg) else {
        return Ok(());
    };
    let reply_payload = msg.reply_to_message().and_then(Payload::from_message);

    let result = match cmd {
        Command::Start => relay.on_start(&sender).await,
        Command::MyId => relay.on_myid(&sender).await,
        Command::Help => relay.on_help(&sender).await,
        Command::Users => relay.on_users(&sender).await,
        Command::Reply(arg) => relay.on_reply_command(&sender, &arg).await,
        Command::Broadcast(text) => relay.on_broadcast(&sender, &text, reply_payload).await,
        Command::Send(args) => relay.on_send(&sender, &args, reply_payload).await,
    };

    if let Err(err) = result {
        relay.report_error(sender.id, &err).await;
    }
    Ok(())
}

/// Handle free-form (non-command) messages.
async fn message_handler(msg: Message, relay: Arc<TelegramRelay>) -> ResponseResult<()> {
    let Some(sender) = sender_of(&msg) else {
        return Ok(());
    };
    // Unrecognized commands are ignored rather than relayed
    if msg.text().is_some_and(|t| t.starts_with('/')) {
        return Ok(());
    }

    let payload = Payload::from_message(&msg);
    if let Err(err) = relay.on_message(&sender, msg.id.0, payload).await {
        relay.report_error(sender.id, &err).await;
    }
    Ok(())
}

/// Handle inline reply-button presses.
async fn callback_handler(
    bot: Bot,
    query: CallbackQuery,
    relay: Arc<TelegramRelay>,
) -> ResponseResult<()> {
    // Clear the button's loading state
    let _ = bot.answer_callback_query(query.id.clone()).await;

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let clicker = Sender {
        id: query.from.id.0 as i64,
        display_name: query.from.username.clone(),
    };

    if let Err(err) = relay.on_callback(&clicker, data).await {
        relay.report_error(clicker.id, &err).await;
    }
    Ok(())
}

/// Main entry point for the bot.
pub async fn run(config: Config) -> Result<()> {
    let bot = Bot::new(&config.bot_token);
    let directory = Directory::open(&config.database_path).await?;

    tracing::info!(
        admins = config.admin_ids.len(),
        database = %config.database_path.display(),
        "Starting relay bot..."
    );

    let relay = Arc::new(Relay::new(
        TelegramMessenger::new(bot.clone()),
        directory,
        config.admin_ids.clone(),
    ));

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
