// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Wires storage, the Telegram channel, the router, and the optional admin
//! API, then runs the desk loop until a shutdown signal arrives.

use std::sync::Arc;

use parley_config::model::ParleyConfig;
use parley_core::{ChannelAdapter, ParleyError, StorageAdapter};
use parley_desk::{DeskLoop, Router, shutdown};
use parley_storage::SqliteStorage;
use parley_telegram::TelegramChannel;
use tracing::{info, warn};

pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.bot.log_level);

    info!(
        name = config.bot.name.as_str(),
        variant = %config.support.variant,
        admins = config.telegram.admin_ids.len(),
        "starting parley serve"
    );

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = config.storage.database_path.as_str(), "storage ready");

    let mut telegram = TelegramChannel::new(&config.telegram)?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    let router = Arc::new(Router::new(
        &config,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        Arc::clone(&channel),
    ));

    let cancel = shutdown::install_signal_handler();

    #[cfg(feature = "gateway")]
    let gateway = if config.gateway.enabled {
        let state = parley_gateway::GatewayState::new(
            Arc::clone(&router),
            &config.telegram.admin_ids,
        );
        let gateway_config = config.gateway.clone();
        let gateway_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            if let Err(e) =
                parley_gateway::start_server(&gateway_config, state, gateway_cancel).await
            {
                tracing::error!(error = %e, "gateway stopped with error");
            }
        }))
    } else {
        None
    };

    let desk = DeskLoop::new(Arc::clone(&channel), router);
    let outcome = desk.run(cancel.clone()).await;

    // Stop side tasks even when the loop ended because the channel closed.
    cancel.cancel();

    #[cfg(feature = "gateway")]
    if let Some(handle) = gateway {
        if let Err(e) = handle.await {
            warn!(error = %e, "gateway task failed to join");
        }
    }

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage checkpoint failed");
    }

    outcome?;
    info!("parley serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
