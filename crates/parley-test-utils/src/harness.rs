// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end router testing.
//!
//! `TestHarness` assembles a complete desk with a mock transport and a temp
//! SQLite database. Its helpers drive one event at a time through
//! [`Router::handle`], so each call returns after every send of that event
//! has been captured.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parley_config::model::{ParleyConfig, StorageConfig};
use parley_core::types::{Action, FileRef, InboundEvent, OutboundMessage, Sender, Variant};
use parley_core::{ChannelAdapter, ParleyError, StorageAdapter};
use parley_desk::Router;
use parley_storage::SqliteStorage;

use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    variant: Variant,
    admin_ids: Vec<i64>,
    conversations_per_page: Option<u32>,
    history_limit: Option<u32>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            variant: Variant::Threaded,
            admin_ids: vec![1],
            conversations_per_page: None,
            history_limit: None,
        }
    }

    /// Conversation variant of the deployment.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Admin allow-list. Defaults to `[1]`.
    pub fn with_admins(mut self, admin_ids: Vec<i64>) -> Self {
        self.admin_ids = admin_ids;
        self
    }

    pub fn with_conversations_per_page(mut self, per_page: u32) -> Self {
        self.conversations_per_page = Some(per_page);
        self
    }

    /// Cap on messages sent by a detailed history.
    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ParleyError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = ParleyConfig::default();
        config.telegram.admin_ids = self.admin_ids;
        config.support.variant = self.variant;
        if let Some(per_page) = self.conversations_per_page {
            config.support.conversations_per_page = per_page;
        }
        if let Some(limit) = self.history_limit {
            config.support.history_limit = limit;
        }
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let channel = Arc::new(MockChannel::new());
        let router = Arc::new(Router::new(
            &config,
            Arc::clone(&storage),
            Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        ));

        Ok(TestHarness {
            router,
            storage,
            channel,
            config,
            next_callback: AtomicU64::new(1),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete desk backed by a mock transport.
pub struct TestHarness {
    router: Arc<Router>,
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<MockChannel>,
    config: ParleyConfig,
    next_callback: AtomicU64,
    /// Holds the database directory alive for the harness lifetime.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start building a test harness with custom configuration.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn channel(&self) -> &Arc<MockChannel> {
        &self.channel
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// A sender named after its id, e.g. `User100`.
    pub fn sender(external_id: i64) -> Sender {
        Sender {
            external_id,
            username: Some(format!("user{external_id}")),
            first_name: format!("User{external_id}"),
            last_name: None,
        }
    }

    pub fn text_event(external_id: i64, text: &str) -> InboundEvent {
        InboundEvent::PlainMessage {
            text: Some(text.to_string()),
            caption: None,
            attachments: Vec::new(),
            sender: Self::sender(external_id),
            chat_id: external_id,
        }
    }

    /// A plain text message from a customer.
    pub async fn customer_says(&self, external_id: i64, text: &str) {
        self.router.handle(Self::text_event(external_id, text)).await;
    }

    /// A plain text message from an admin.
    pub async fn admin_says(&self, external_id: i64, text: &str) {
        self.router.handle(Self::text_event(external_id, text)).await;
    }

    /// A media message with an optional caption.
    pub async fn sends_file(&self, external_id: i64, file: FileRef, caption: Option<&str>) {
        self.router
            .handle(InboundEvent::PlainMessage {
                text: None,
                caption: caption.map(str::to_string),
                attachments: vec![file],
                sender: Self::sender(external_id),
                chat_id: external_id,
            })
            .await;
    }

    /// A button press. Returns the callback id used.
    pub async fn click(&self, external_id: i64, action: Action) -> String {
        let callback_id = format!("cb-{}", self.next_callback.fetch_add(1, Ordering::SeqCst));
        self.router
            .handle(InboundEvent::CallbackAction {
                callback_id: callback_id.clone(),
                action,
                sender: Self::sender(external_id),
                chat_id: external_id,
                message_id: None,
            })
            .await;
        callback_id
    }

    /// A `/name` command.
    pub async fn command(&self, external_id: i64, name: &str) {
        self.router
            .handle(InboundEvent::Command {
                name: name.to_string(),
                args: String::new(),
                sender: Self::sender(external_id),
                chat_id: external_id,
            })
            .await;
    }

    /// Messages sent to one chat so far.
    pub async fn sent_to(&self, chat_id: i64) -> Vec<OutboundMessage> {
        self.channel.sent_to(chat_id).await
    }

    /// The notice a callback was answered with.
    pub async fn answer_for(&self, callback_id: &str) -> Option<Option<String>> {
        self.channel
            .callback_answers()
            .await
            .into_iter()
            .find(|(id, _)| id == callback_id)
            .map(|(_, notice)| notice)
    }
}
