// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support desk: routes customer conversations to a pool of admins.
//!
//! The [`DeskLoop`] is the central coordinator that:
//! - Receives events from a channel adapter
//! - Serializes handling per sender while running different senders concurrently
//! - Hands each event to the [`Router`], which owns identity, conversation
//!   lifecycle, admin reply sessions, and notification fan-out
//! - Drains in-flight events on shutdown

pub mod identity;
pub mod keyed;
pub mod notify;
pub mod render;
pub mod router;
pub mod session;
pub mod shutdown;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use parley_core::{ChannelAdapter, ParleyError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use identity::{Caller, IdentityResolver};
pub use router::{ReplyOutcome, Router};
pub use session::{AdminSession, SessionStore};
pub use store::{ConversationStore, Stats};

use crate::keyed::KeyedLocks;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Pulls events off a channel and runs them through the router.
pub struct DeskLoop {
    channel: Arc<dyn ChannelAdapter>,
    router: Arc<Router>,
    locks: Arc<KeyedLocks>,
    tracker: TaskTracker,
}

impl DeskLoop {
    pub fn new(channel: Arc<dyn ChannelAdapter>, router: Arc<Router>) -> Self {
        Self {
            channel,
            router,
            locks: Arc::new(KeyedLocks::new()),
            tracker: TaskTracker::new(),
        }
    }

    /// Runs until `cancel` fires or the channel closes, then waits for
    /// in-flight events to finish.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ParleyError> {
        info!("desk loop running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => self.spawn(event),
                        Err(ParleyError::ChannelClosed(source)) => {
                            info!(source = source.as_str(), "channel closed, stopping desk loop");
                            break;
                        }
                        Err(e) => error!(error = %e, "channel receive error"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping desk loop");
                    break;
                }
            }
        }

        self.drain().await;
        info!("desk loop stopped");
        Ok(())
    }

    fn spawn(&self, event: parley_core::types::InboundEvent) {
        let key = event.sender().external_id;
        debug!(external_id = key, kind = event.kind(), "event received");
        let router = Arc::clone(&self.router);
        let locks = Arc::clone(&self.locks);
        self.tracker.spawn(async move {
            let _guard = locks.lock(key).await;
            router.handle(event).await;
        });
    }

    async fn drain(&self) {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending == 0 {
            return;
        }
        info!(pending, "waiting for in-flight events");
        if tokio::time::timeout(DRAIN_TIMEOUT, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                remaining = self.tracker.len(),
                "drain timeout reached, abandoning in-flight events"
            );
        }
    }
}
