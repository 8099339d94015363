// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Account, Conversation, ConversationEntry, ConversationStatus, Message, NewMessage, Sender,
    Variant,
};

/// Adapter for account, conversation, and message persistence.
///
/// Lookups return `Ok(None)` for unknown ids. Mutations of an unknown
/// conversation return [`ParleyError::NotFound`].
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ParleyError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), ParleyError>;

    // --- Accounts ---

    /// Creates the account on first contact, otherwise refreshes its name fields.
    async fn upsert_account(&self, sender: &Sender) -> Result<Account, ParleyError>;

    async fn get_account(&self, id: i64) -> Result<Option<Account>, ParleyError>;

    async fn get_account_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Account>, ParleyError>;

    /// Sets the admin flag. Never clears it.
    async fn promote_admin(&self, external_id: i64) -> Result<(), ParleyError>;

    // --- Conversations ---

    /// Returns the customer's non-terminal conversation, creating one if needed.
    ///
    /// The boolean is `true` when this call created the conversation.
    async fn create_or_get_active(
        &self,
        customer_id: i64,
        variant: Variant,
        subject: Option<String>,
    ) -> Result<(Conversation, bool), ParleyError>;

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>, ParleyError>;

    async fn get_conversation_entry(
        &self,
        id: i64,
    ) -> Result<Option<ConversationEntry>, ParleyError>;

    async fn find_active_conversation(
        &self,
        customer_id: i64,
    ) -> Result<Option<Conversation>, ParleyError>;

    /// Lists conversations in `status`, ordered for that status.
    async fn list_conversations(
        &self,
        status: ConversationStatus,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<ConversationEntry>, ParleyError>;

    /// A customer's conversations, newest first.
    async fn list_customer_conversations(
        &self,
        customer_id: i64,
        limit: u32,
    ) -> Result<Vec<Conversation>, ParleyError>;

    async fn count_conversations(&self, status: ConversationStatus) -> Result<u64, ParleyError>;

    /// Active conversations with at least one unread customer message.
    async fn count_unread_conversations(&self) -> Result<u64, ParleyError>;

    /// Moves the conversation to its variant's terminal status.
    ///
    /// Idempotent: an already-terminal conversation is returned unchanged.
    async fn close_conversation(&self, id: i64) -> Result<Conversation, ParleyError>;

    /// Zeroes the unread counter and flags customer messages as read.
    async fn mark_read(&self, id: i64) -> Result<(), ParleyError>;

    // --- Messages ---

    /// Inserts a message with its files and applies the variant's status
    /// transition, all or nothing.
    async fn append_message(&self, message: NewMessage) -> Result<Message, ParleyError>;

    /// Messages in creation order, with their attachments.
    async fn list_messages(
        &self,
        conversation_id: i64,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Message>, ParleyError>;

    async fn count_messages(&self, conversation_id: i64) -> Result<u64, ParleyError>;
}
