// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle on top of a [`StorageAdapter`].
//!
//! Adds the deployment's variant, pagination, and `NotFound` mapping to the
//! raw storage calls. Status transitions themselves run inside storage so
//! that each one is a single atomic write.

use std::sync::Arc;

use parley_config::model::SupportConfig;
use parley_core::types::{
    Conversation, ConversationEntry, ConversationStatus, FileRef, Message, NewMessage, Page,
    Variant,
};
use parley_core::{ParleyError, StorageAdapter};
use tracing::info;

/// Counts shown on the statistics screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub variant: Variant,
    /// One entry per status of the variant, in menu order.
    pub by_status: Vec<(ConversationStatus, u64)>,
    pub total: u64,
    /// Unread chats (threaded) or open tickets (ticketed).
    pub needs_attention: u64,
}

pub struct ConversationStore {
    storage: Arc<dyn StorageAdapter>,
    variant: Variant,
    conversations_per_page: u32,
    messages_per_page: u32,
    subject_max_chars: usize,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn StorageAdapter>, support: &SupportConfig) -> Self {
        Self {
            storage,
            variant: support.variant,
            conversations_per_page: support.conversations_per_page,
            messages_per_page: support.messages_per_page,
            subject_max_chars: support.subject_max_chars,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Returns the customer's open conversation or starts one.
    ///
    /// `first_text` seeds the subject of a new ticket.
    pub async fn create_or_get_active(
        &self,
        customer_id: i64,
        first_text: Option<&str>,
    ) -> Result<(Conversation, bool), ParleyError> {
        let subject = match self.variant {
            Variant::Ticketed => Some(derive_subject(first_text, self.subject_max_chars)),
            Variant::Threaded => None,
        };
        let (conversation, created) = self
            .storage
            .create_or_get_active(customer_id, self.variant, subject)
            .await?;
        if created {
            info!(
                conversation_id = conversation.id,
                customer_id,
                variant = %self.variant,
                "conversation created"
            );
        }
        Ok((conversation, created))
    }

    pub async fn find_active(&self, customer_id: i64) -> Result<Option<Conversation>, ParleyError> {
        self.storage.find_active_conversation(customer_id).await
    }

    pub async fn get(&self, id: i64) -> Result<ConversationEntry, ParleyError> {
        self.storage
            .get_conversation_entry(id)
            .await?
            .ok_or(ParleyError::conversation_not_found(id))
    }

    /// One page of conversations in `status`, recomputed from storage.
    pub async fn list_by_status(
        &self,
        status: ConversationStatus,
        page: u32,
    ) -> Result<Page<ConversationEntry>, ParleyError> {
        let page_size = self.conversations_per_page;
        let total = self.storage.count_conversations(status).await?;
        let items = self
            .storage
            .list_conversations(status, page_size, Page::<()>::offset(page, page_size))
            .await?;
        Ok(Page {
            items,
            page,
            page_size,
            total,
        })
    }

    pub async fn customer_conversations(
        &self,
        customer_id: i64,
        limit: u32,
    ) -> Result<Vec<Conversation>, ParleyError> {
        self.storage
            .list_customer_conversations(customer_id, limit)
            .await
    }

    /// Appends a message together with its files.
    pub async fn append_message(
        &self,
        conversation_id: i64,
        author_id: i64,
        content: Option<String>,
        from_customer: bool,
        files: &[FileRef],
    ) -> Result<Message, ParleyError> {
        self.storage
            .append_message(NewMessage {
                conversation_id,
                author_id,
                content,
                from_customer,
                files: files.to_vec(),
            })
            .await
    }

    /// Closes a ticket. Idempotent.
    pub async fn close(&self, id: i64) -> Result<Conversation, ParleyError> {
        self.terminate(id).await
    }

    /// Archives a chat. Idempotent.
    pub async fn archive(&self, id: i64) -> Result<Conversation, ParleyError> {
        self.terminate(id).await
    }

    async fn terminate(&self, id: i64) -> Result<Conversation, ParleyError> {
        let conversation = self.storage.close_conversation(id).await?;
        info!(conversation_id = id, status = %conversation.status, "conversation terminal");
        Ok(conversation)
    }

    pub async fn mark_read(&self, id: i64) -> Result<(), ParleyError> {
        self.storage.mark_read(id).await
    }

    /// One page of a conversation's message history, oldest first.
    pub async fn page_messages(
        &self,
        conversation_id: i64,
        page: u32,
    ) -> Result<Page<Message>, ParleyError> {
        let page_size = self.messages_per_page;
        let total = self.storage.count_messages(conversation_id).await?;
        let items = self
            .storage
            .list_messages(
                conversation_id,
                page_size,
                Page::<()>::offset(page, page_size),
            )
            .await?;
        Ok(Page {
            items,
            page,
            page_size,
            total,
        })
    }

    /// Up to `limit` messages from the start of the conversation.
    pub async fn history(&self, conversation_id: i64, limit: u32) -> Result<Vec<Message>, ParleyError> {
        self.storage.list_messages(conversation_id, limit, 0).await
    }

    /// Conversations waiting for an admin, for menus and alerts.
    pub async fn attention_count(&self) -> Result<u64, ParleyError> {
        match self.variant {
            Variant::Ticketed => {
                self.storage
                    .count_conversations(ConversationStatus::Open)
                    .await
            }
            Variant::Threaded => self.storage.count_unread_conversations().await,
        }
    }

    pub async fn stats(&self) -> Result<Stats, ParleyError> {
        let mut by_status = Vec::new();
        for status in self.variant.statuses() {
            by_status.push((*status, self.storage.count_conversations(*status).await?));
        }
        Ok(Stats {
            variant: self.variant,
            total: by_status.iter().map(|(_, n)| n).sum(),
            by_status,
            needs_attention: self.attention_count().await?,
        })
    }
}

/// Ticket subject from the first message: truncated text, or a placeholder.
pub fn derive_subject(first_text: Option<&str>, max_chars: usize) -> String {
    let text = first_text.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return "New ticket".to_string();
    }
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}
