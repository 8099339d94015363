// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event routing.
//!
//! Every event is resolved to a [`Caller`] and then dispatched by kind:
//! commands by name, button presses by decoded [`Action`], plain messages
//! by the admin's reply session. Handlers return an optional callback
//! notice; errors are turned into a user-facing reply in one place.

use std::collections::HashMap;
use std::sync::Arc;

use parley_config::model::ParleyConfig;
use parley_core::types::{
    Account, Action, Conversation, FileRef, InboundEvent, Message, OutboundMessage, Variant,
};
use parley_core::{ChannelAdapter, ParleyError, StorageAdapter};
use tracing::{debug, error, info, warn};

use crate::identity::{Caller, IdentityResolver};
use crate::notify::Notifier;
use crate::render;
use crate::session::{AdminSession, SessionStore};
use crate::store::ConversationStore;

const CUSTOMER_LIST_LIMIT: u32 = 10;

/// Text shown in the transport's callback toast.
type Notice = Option<String>;

/// Result of an admin reply that was recorded and delivered.
#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    pub message: Message,
    /// State of the conversation after the reply.
    pub conversation: Conversation,
    /// The replying admin's session after the post-reply transition.
    pub session: AdminSession,
}

pub struct Router {
    identity: IdentityResolver,
    store: ConversationStore,
    sessions: Arc<SessionStore>,
    notifier: Notifier,
    channel: Arc<dyn ChannelAdapter>,
    history_limit: u32,
}

impl Router {
    pub fn new(
        config: &ParleyConfig,
        storage: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
    ) -> Self {
        let admin_ids = config.telegram.admin_ids.clone();
        Self {
            identity: IdentityResolver::new(Arc::clone(&storage), admin_ids.iter().copied()),
            store: ConversationStore::new(storage, &config.support),
            sessions: Arc::new(SessionStore::new()),
            notifier: Notifier::new(Arc::clone(&channel), admin_ids),
            channel,
            history_limit: config.support.history_limit,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    fn variant(&self) -> Variant {
        self.store.variant()
    }

    /// Handles one event to completion. Failures are logged and reported
    /// to the sender; they never propagate.
    pub async fn handle(&self, event: InboundEvent) {
        let chat_id = event.chat_id();
        let kind = event.kind();
        let external_id = event.sender().external_id;
        let callback_id = match &event {
            InboundEvent::CallbackAction { callback_id, .. } => Some(callback_id.clone()),
            _ => None,
        };

        let result = self.dispatch(event).await;

        let notice = match result {
            Ok(notice) => notice,
            Err(e) => {
                match &e {
                    e if e.is_infrastructure() => {
                        error!(external_id, kind, error = %e, "event failed")
                    }
                    ParleyError::PermissionDenied(reason) => {
                        debug!(external_id, kind, reason = %reason, "permission denied")
                    }
                    e => debug!(external_id, kind, error = %e, "event rejected"),
                }
                let text = e.user_message();
                if callback_id.is_none() {
                    if let Err(send_err) = self.channel.send(OutboundMessage::text(chat_id, text)).await {
                        warn!(external_id, error = %send_err, "failed to report error to sender");
                    }
                    return;
                }
                Some(text)
            }
        };

        if let Some(callback_id) = callback_id {
            if let Err(e) = self
                .channel
                .answer_callback(&callback_id, notice.as_deref())
                .await
            {
                warn!(external_id, error = %e, "failed to answer callback");
            }
        }
    }

    async fn dispatch(&self, event: InboundEvent) -> Result<Notice, ParleyError> {
        let caller = self.identity.resolve(event.sender()).await?;
        match event {
            InboundEvent::Command {
                name, chat_id, ..
            } => self.on_command(&caller, &name, chat_id).await.map(|()| None),
            InboundEvent::CallbackAction {
                action, chat_id, ..
            } => self.on_action(&caller, action, chat_id).await,
            InboundEvent::PlainMessage {
                text,
                caption,
                attachments,
                chat_id,
                ..
            } => self
                .on_message(&caller, text, caption, attachments, chat_id)
                .await
                .map(|()| None),
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<(), ParleyError> {
        self.channel.send(msg).await.map(|_| ())
    }

    async fn on_command(&self, caller: &Caller, name: &str, chat_id: i64) -> Result<(), ParleyError> {
        debug!(external_id = caller.external_id(), command = name, "command");
        match name {
            "start" => self.send(render::welcome(chat_id, self.variant())).await,
            "help" => self.send(render::help(chat_id, caller.is_admin)).await,
            "admin" => {
                caller.require_admin("/admin")?;
                self.show_admin_menu(caller, chat_id).await
            }
            "cancel" => {
                caller.require_admin("/cancel")?;
                self.sessions.clear(caller.external_id());
                self.send(render::reply_cancelled(chat_id)).await
            }
            "tickets" => {
                caller.require_admin("/tickets")?;
                let status = self.variant().initial_status();
                let page = self.store.list_by_status(status, 0).await?;
                self.send(render::conversation_list(chat_id, status, &page)).await
            }
            _ => self.send(render::unknown_command(chat_id)).await,
        }
    }

    async fn show_admin_menu(&self, caller: &Caller, chat_id: i64) -> Result<(), ParleyError> {
        self.sessions.clear(caller.external_id());
        let attention = self.store.attention_count().await?;
        self.send(render::admin_menu(chat_id, self.variant(), attention))
            .await
    }

    async fn on_action(
        &self,
        caller: &Caller,
        action: Action,
        chat_id: i64,
    ) -> Result<Notice, ParleyError> {
        if action.requires_admin() {
            caller.require_admin(&action.to_string())?;
        }
        debug!(external_id = caller.external_id(), %action, "callback");

        match action {
            Action::CreateTicket => {
                if let Some(active) = self.store.find_active(caller.account.id).await? {
                    return Err(ParleyError::Conflict {
                        message: format!(
                            "You already have an open {} #{}",
                            active.variant.noun(),
                            active.id
                        ),
                        conversation_id: Some(active.id),
                    });
                }
                Ok(Some("Just write your question or problem!".into()))
            }
            Action::MyTickets => {
                let conversations = self
                    .store
                    .customer_conversations(caller.account.id, CUSTOMER_LIST_LIMIT)
                    .await?;
                self.send(render::customer_conversations(
                    chat_id,
                    self.variant(),
                    &conversations,
                ))
                .await?;
                Ok(None)
            }
            Action::Stats => {
                let stats = self.store.stats().await?;
                self.send(render::stats(chat_id, &stats)).await?;
                Ok(None)
            }
            Action::AdminMenu => {
                self.show_admin_menu(caller, chat_id).await?;
                Ok(Some("Back to the admin panel.".into()))
            }
            Action::ContinueChat => {
                self.send(render::continue_chat(chat_id)).await?;
                Ok(Some("Keep chatting.".into()))
            }
            Action::List { status, page } => {
                let page = self.store.list_by_status(status, page).await?;
                self.send(render::conversation_list(chat_id, status, &page))
                    .await?;
                Ok(None)
            }
            Action::Reply(id) if caller.is_admin => self.begin_reply(caller, id, chat_id).await,
            Action::Reply(id) => {
                let entry = self.store.get(id).await?;
                self.require_owner(caller, &entry.conversation)?;
                Ok(Some(format!(
                    "Just write your message, it will be added to {} #{id}.",
                    entry.conversation.variant.noun()
                )))
            }
            Action::AdminReply(id) => self.begin_reply(caller, id, chat_id).await,
            Action::Close(id) => {
                let entry = self.store.get(id).await?;
                if !caller.is_admin {
                    self.require_owner(caller, &entry.conversation)?;
                }
                let closed = self.store.close(id).await?;
                if caller.is_admin {
                    self.sessions.clear_if_target(caller.external_id(), id);
                }
                Ok(Some(format!("{} #{id} {}.", capitalized(closed.variant.noun()), closed.status)))
            }
            Action::Archive(id) => {
                self.store.get(id).await?;
                self.store.archive(id).await?;
                self.sessions.clear_if_target(caller.external_id(), id);
                Ok(Some("Chat archived.".into()))
            }
            Action::Finish(id) => {
                self.store.get(id).await?;
                self.store.archive(id).await?;
                self.sessions.clear(caller.external_id());
                self.show_admin_menu(caller, chat_id).await?;
                info!(admin_id = caller.external_id(), conversation_id = id, "conversation finished");
                Ok(Some("Conversation finished. Chat archived.".into()))
            }
            Action::ViewTicket(id) => self.show_conversation(id, 0, chat_id).await,
            Action::ViewChat { id, page } => self.show_conversation(id, page, chat_id).await,
            Action::DetailedHistory(id) => {
                self.send_history(id, chat_id).await?;
                Ok(Some("History sent.".into()))
            }
        }
    }

    fn require_owner(&self, caller: &Caller, conversation: &Conversation) -> Result<(), ParleyError> {
        if conversation.customer_id == caller.account.id {
            Ok(())
        } else {
            Err(ParleyError::PermissionDenied(format!(
                "{} does not own conversation #{}",
                caller.external_id(),
                conversation.id
            )))
        }
    }

    async fn begin_reply(&self, caller: &Caller, id: i64, chat_id: i64) -> Result<Notice, ParleyError> {
        let entry = self.store.get(id).await?;
        let conversation = entry.conversation;
        if conversation.is_terminal() {
            return Err(ParleyError::Conflict {
                message: format!(
                    "{} #{id} is already {}",
                    capitalized(conversation.variant.noun()),
                    conversation.status
                ),
                conversation_id: Some(id),
            });
        }
        self.sessions.begin_reply(caller.external_id(), id);
        self.send(render::reply_prompt(chat_id, &conversation)).await?;
        Ok(Some("Write your reply.".into()))
    }

    async fn show_conversation(&self, id: i64, page: u32, chat_id: i64) -> Result<Notice, ParleyError> {
        let mut entry = self.store.get(id).await?;
        if entry.conversation.variant == Variant::Threaded && entry.conversation.unread_count > 0 {
            self.store.mark_read(id).await?;
            entry.conversation.unread_count = 0;
        }
        let messages = self.store.page_messages(id, page).await?;
        self.send(render::conversation_view(chat_id, &entry, &messages))
            .await?;
        Ok(None)
    }

    async fn send_history(&self, id: i64, chat_id: i64) -> Result<(), ParleyError> {
        let entry = self.store.get(id).await?;
        let messages = self.store.history(id, self.history_limit).await?;
        let total = self.store.storage().count_messages(id).await?;
        self.send(render::history_header(chat_id, &entry)).await?;

        let mut authors: HashMap<i64, Option<Account>> = HashMap::new();
        authors.insert(entry.customer.id, Some(entry.customer.clone()));
        for message in &messages {
            if !authors.contains_key(&message.author_id) {
                let account = self.store.storage().get_account(message.author_id).await?;
                authors.insert(message.author_id, account);
            }
            let author = authors.get(&message.author_id).and_then(Option::as_ref);
            for out in render::history_message(chat_id, message, author) {
                self.send(out).await?;
            }
        }

        self.send(render::history_footer(
            chat_id,
            &entry.conversation,
            messages.len(),
            total,
        ))
        .await
    }

    async fn on_message(
        &self,
        caller: &Caller,
        text: Option<String>,
        caption: Option<String>,
        attachments: Vec<FileRef>,
        chat_id: i64,
    ) -> Result<(), ParleyError> {
        let content = text
            .filter(|t| !t.is_empty())
            .or_else(|| caption.clone().filter(|c| !c.is_empty()));

        if content.is_none() && attachments.is_empty() {
            debug!(external_id = caller.external_id(), "empty message ignored");
            return Ok(());
        }

        if caller.is_admin {
            let Some(target) = self.sessions.current_target(caller.external_id()) else {
                debug!(
                    admin_id = caller.external_id(),
                    "admin message without reply session ignored"
                );
                return Ok(());
            };
            let outcome = self
                .reply_as_admin(&caller.account, target, content, &attachments)
                .await?;
            return self
                .send(render::reply_sent(chat_id, &outcome.conversation))
                .await;
        }

        self.accept_customer_message(caller, content, caption, attachments, chat_id)
            .await
    }

    async fn accept_customer_message(
        &self,
        caller: &Caller,
        content: Option<String>,
        caption: Option<String>,
        attachments: Vec<FileRef>,
        chat_id: i64,
    ) -> Result<(), ParleyError> {
        let customer = &caller.account;
        let mut attempts = 0;
        let (conversation, created) = loop {
            attempts += 1;
            let (conversation, created) = self
                .store
                .create_or_get_active(customer.id, content.as_deref())
                .await?;
            match self
                .store
                .append_message(conversation.id, customer.id, content.clone(), true, &attachments)
                .await
            {
                Ok(_) => break (conversation, created),
                // Closed between lookup and append; the next lookup opens a fresh one.
                Err(ParleyError::Conflict { .. }) if attempts < 2 => continue,
                Err(e) => return Err(e),
            }
        };
        debug!(
            conversation_id = conversation.id,
            customer_id = customer.id,
            created,
            "customer message recorded"
        );

        let attention = self.store.attention_count().await?;
        self.notifier
            .alert_admins(
                customer,
                &conversation,
                content.as_deref(),
                caption.as_deref(),
                &attachments,
                attention,
            )
            .await;

        self.send(render::customer_ack(chat_id, &conversation, created))
            .await
    }

    /// Records an admin reply and delivers it to the customer.
    ///
    /// Used for transport replies and for replies posted through the HTTP
    /// API. A reply to a conversation that no longer accepts messages
    /// detaches the admin from it.
    pub async fn reply_as_admin(
        &self,
        admin: &Account,
        conversation_id: i64,
        content: Option<String>,
        files: &[FileRef],
    ) -> Result<ReplyOutcome, ParleyError> {
        let entry = match self.store.get(conversation_id).await {
            Ok(entry) => entry,
            Err(e) => {
                if matches!(e, ParleyError::NotFound { .. }) {
                    self.sessions.clear_if_target(admin.external_id, conversation_id);
                }
                return Err(e);
            }
        };

        let message = match self
            .store
            .append_message(conversation_id, admin.id, content.clone(), false, files)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                if matches!(e, ParleyError::Conflict { .. }) {
                    self.sessions.clear_if_target(admin.external_id, conversation_id);
                }
                return Err(e);
            }
        };

        let session = self
            .sessions
            .after_reply(admin.external_id, conversation_id, entry.conversation.variant);

        self.notifier
            .deliver_reply(&entry.customer, content.as_deref(), files)
            .await?;

        let conversation = self.store.get(conversation_id).await?.conversation;
        info!(
            admin_id = admin.external_id,
            conversation_id,
            status = %conversation.status,
            "admin reply delivered"
        );
        Ok(ReplyOutcome {
            message,
            conversation,
            session,
        })
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
