// ABOUTME: Long-running bot process wiring configuration, ledger, gateway, and dispatcher
// ABOUTME: Exits nonzero with a logged diagnostic when required credentials are absent
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Morsel Bot Binary
//!
//! Starts the food-logging assistant: loads environment configuration,
//! opens the persisted nutrition ledger, assembles the recognition gateway
//! and the Telegram client, and runs the dispatcher until ctrl-c.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use morsel::chat::{ChatGateway, TelegramClient};
use morsel::config::BotConfig;
use morsel::constants::service;
use morsel::dispatcher::Dispatcher;
use morsel::ledger::{snapshot::SnapshotStore, NutritionLedger};
use morsel::logging;
use morsel::recognition::RecognitionGateway;
use morsel::session::SessionMachine;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Startup aborted: configuration error");
            std::process::exit(1);
        }
    };

    info!(service = service::NAME, "Starting Morsel food-logging assistant");
    info!("{}", config.summary());

    let ledger = Arc::new(
        NutritionLedger::open(SnapshotStore::new(config.ledger_path.clone())).await?,
    );
    let recognizer = Arc::new(RecognitionGateway::from_config(&config)?);
    let client = Arc::new(TelegramClient::new(config.telegram_token.clone()));

    let machine = Arc::new(SessionMachine::new(
        ledger,
        recognizer,
        Arc::clone(&client) as Arc<dyn ChatGateway>,
        config.targets,
        config.session_idle,
    ));

    let dispatcher = Dispatcher::new(client, machine);

    tokio::select! {
        () = dispatcher.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}
