// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use parley_config::model::StorageConfig;
use parley_core::types::{
    Account, Conversation, ConversationEntry, ConversationStatus, Message, NewMessage, Sender,
    Variant,
};
use parley_core::{AdapterType, HealthStatus, ParleyError, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, ParleyError> {
        self.db.get().ok_or_else(|| ParleyError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        match self.db.get() {
            Some(db) => db.checkpoint().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ParleyError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ParleyError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ParleyError> {
        self.db()?.checkpoint().await
    }

    // --- Accounts ---

    async fn upsert_account(&self, sender: &Sender) -> Result<Account, ParleyError> {
        queries::accounts::upsert_account(self.db()?, sender).await
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>, ParleyError> {
        queries::accounts::get_account(self.db()?, id).await
    }

    async fn get_account_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Account>, ParleyError> {
        queries::accounts::get_account_by_external_id(self.db()?, external_id).await
    }

    async fn promote_admin(&self, external_id: i64) -> Result<(), ParleyError> {
        queries::accounts::promote_admin(self.db()?, external_id).await
    }

    // --- Conversations ---

    async fn create_or_get_active(
        &self,
        customer_id: i64,
        variant: Variant,
        subject: Option<String>,
    ) -> Result<(Conversation, bool), ParleyError> {
        queries::conversations::create_or_get_active(self.db()?, customer_id, variant, subject)
            .await
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>, ParleyError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn get_conversation_entry(
        &self,
        id: i64,
    ) -> Result<Option<ConversationEntry>, ParleyError> {
        queries::conversations::get_conversation_entry(self.db()?, id).await
    }

    async fn find_active_conversation(
        &self,
        customer_id: i64,
    ) -> Result<Option<Conversation>, ParleyError> {
        queries::conversations::find_active_conversation(self.db()?, customer_id).await
    }

    async fn list_conversations(
        &self,
        status: ConversationStatus,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<ConversationEntry>, ParleyError> {
        queries::conversations::list_conversations(self.db()?, status, limit, offset).await
    }

    async fn list_customer_conversations(
        &self,
        customer_id: i64,
        limit: u32,
    ) -> Result<Vec<Conversation>, ParleyError> {
        queries::conversations::list_customer_conversations(self.db()?, customer_id, limit).await
    }

    async fn count_conversations(&self, status: ConversationStatus) -> Result<u64, ParleyError> {
        queries::conversations::count_conversations(self.db()?, status).await
    }

    async fn count_unread_conversations(&self) -> Result<u64, ParleyError> {
        queries::conversations::count_unread_conversations(self.db()?).await
    }

    async fn close_conversation(&self, id: i64) -> Result<Conversation, ParleyError> {
        queries::conversations::close_conversation(self.db()?, id).await
    }

    async fn mark_read(&self, id: i64) -> Result<(), ParleyError> {
        queries::conversations::mark_read(self.db()?, id).await
    }

    // --- Messages ---

    async fn append_message(&self, message: NewMessage) -> Result<Message, ParleyError> {
        queries::messages::append_message(self.db()?, message).await
    }

    async fn list_messages(
        &self,
        conversation_id: i64,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Message>, ParleyError> {
        queries::messages::list_messages(self.db()?, conversation_id, limit, offset).await
    }

    async fn count_messages(&self, conversation_id: i64) -> Result<u64, ParleyError> {
        queries::messages::count_messages(self.db()?, conversation_id).await
    }
}
