use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use telefetch::client::{ensure_download_root, InboundEvent, TelegramClient};
use telefetch::config::{Cli, ResolvedSettings, Settings, PENDING_TEXT_WINDOW};
use telefetch::ingress::Ingress;
use telefetch::pending::PendingMessages;
use telefetch::{queue, worker};
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting Telegram media downloader bot...");

    let settings = init_settings(&cli);

    if let Err(e) = ensure_download_root(&settings.download_folder).await {
        error!(
            "Failed to create download folder {}: {e}",
            settings.download_folder.display()
        );
        std::process::exit(1);
    }

    let bot = Bot::new(settings.bot_token.clone());
    let client = Arc::new(TelegramClient::new(bot.clone()));

    let (job_queue, consumer) = queue::channel();
    tokio::spawn(worker::Worker::new(Arc::clone(&client), consumer).run());

    let ingress = Arc::new(Ingress::new(
        client,
        PendingMessages::new(PENDING_TEXT_WINDOW),
        job_queue,
        settings.download_folder.clone(),
    ));

    info!("Listening for media messages...");

    let handler = Update::filter_message().endpoint(handle_update);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ingress])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Maps `-v` counts to a default log level; `RUST_LOG` always wins.
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_settings(cli: &Cli) -> ResolvedSettings {
    let loaded = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    match loaded.resolve(cli) {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    }
}

async fn handle_update(
    msg: Message,
    ingress: Arc<Ingress<TelegramClient>>,
) -> Result<(), teloxide::RequestError> {
    ingress.handle_event(InboundEvent::from_message(&msg)).await;
    respond(())
}
