// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for Parley.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for private messages and button presses, inline keyboards,
//! and re-sending media by file handle.

pub mod handler;
pub mod media;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parley_config::model::TelegramConfig;
use parley_core::error::ParleyError;
use parley_core::traits::{ChannelAdapter, PluginAdapter};
use parley_core::types::{
    AdapterType, ChannelCapabilities, FileRef, HealthStatus, InboundEvent, MessageId,
    OutboundMessage,
};
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Button presses are held in `pending` until the router answers them;
/// the key handed out as `callback_id` is local to this adapter.
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    pending: Arc<DashMap<String, CallbackQuery>>,
    next_callback: Arc<AtomicU64>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, ParleyError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            ParleyError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(ParleyError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            pending: Arc::new(DashMap::new()),
            next_callback: Arc::new(AtomicU64::new(1)),
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, ParleyError> {
        let chunks = media::split_text(text, media::MAX_MESSAGE_CHARS);
        let last = chunks.len().checked_sub(1).ok_or_else(|| ParleyError::Channel {
            message: "refusing to send an empty message".into(),
            source: None,
        })?;

        let mut first_id = None;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let req = self.bot.send_message(chat, chunk);
            let sent = match (i == last, markup.clone()) {
                (true, Some(markup)) => req.reply_markup(markup).await,
                _ => req.await,
            }
            .map_err(|e| ParleyError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;
            first_id.get_or_insert(sent.id.0);
        }
        Ok(MessageId(first_id.unwrap_or_default().to_string()))
    }

    /// Sends a file with `text` as its caption when it fits; otherwise the
    /// text follows as its own message and carries the keyboard.
    async fn send_with_file(
        &self,
        chat: ChatId,
        file: &FileRef,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, ParleyError> {
        if media::fits_caption(file.kind, text) {
            let caption = (!text.is_empty()).then_some(text);
            let sent = media::send_file(&self.bot, chat, file, caption, markup).await?;
            return Ok(MessageId(sent.id.0.to_string()));
        }

        debug!(kind = %file.kind, "caption sent separately");
        let sent = media::send_file(&self.bot, chat, file, None, None).await?;
        self.send_text(chat, text, markup).await?;
        Ok(MessageId(sent.id.0.to_string()))
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_buttons: true,
            supports_media: true,
            max_message_length: media::MAX_MESSAGE_CHARS,
            max_caption_length: media::MAX_CAPTION_CHARS,
        }
    }

    async fn connect(&mut self) -> Result<(), ParleyError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();
        let pending = Arc::clone(&self.pending);
        let next_callback = Arc::clone(&self.next_callback);

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let on_message = move |msg: Message| {
                let tx = message_tx.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }
                    if let Some(event) = handler::message_to_event(&msg) {
                        if tx.send(event).await.is_err() {
                            warn!("inbound channel closed, dropping message");
                        }
                    }
                    respond(())
                }
            };

            let on_callback = move |bot: Bot, query: CallbackQuery| {
                let tx = callback_tx.clone();
                let pending = Arc::clone(&pending);
                let key = format!("tg-cb-{}", next_callback.fetch_add(1, Ordering::Relaxed));
                async move {
                    match handler::callback_to_event(&query, key.clone()) {
                        Some(event) => {
                            pending.insert(key.clone(), query);
                            if tx.send(event).await.is_err() {
                                pending.remove(&key);
                                warn!("inbound channel closed, dropping button press");
                            }
                        }
                        None => {
                            if let Err(e) = bot.answer_callback_query(query.id).await {
                                debug!(error = %e, "failed to dismiss malformed callback");
                            }
                        }
                    }
                    respond(())
                }
            };

            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(on_message))
                .branch(Update::filter_callback_query().endpoint(on_callback));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ParleyError> {
        let chat = ChatId(msg.chat_id);
        let markup = media::keyboard(&msg.buttons);
        match &msg.attachment {
            Some(file) => self.send_with_file(chat, file, &msg.text, markup).await,
            None => self.send_text(chat, &msg.text, markup).await,
        }
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ParleyError> {
        let Some((_, query)) = self.pending.remove(callback_id) else {
            debug!(callback_id, "callback already answered or unknown");
            return Ok(());
        };

        let mut req = self.bot.answer_callback_query(query.id);
        if let Some(text) = text {
            req = req.text(text);
        }
        req.await.map_err(|e| ParleyError::Channel {
            message: format!("failed to answer callback: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, ParleyError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| ParleyError::ChannelClosed("Telegram inbound queue".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            admin_ids: vec![1],
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(&config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        let err = TelegramChannel::new(&config(Some(""))).err().unwrap();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn new_accepts_valid_token() {
        let channel =
            TelegramChannel::new(&config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11")));
        assert!(channel.is_ok());
    }

    #[test]
    fn capabilities_match_bot_api_limits() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        let caps = channel.capabilities();
        assert!(caps.supports_buttons);
        assert!(caps.supports_media);
        assert_eq!(caps.max_message_length, 4096);
        assert_eq!(caps.max_caption_length, 1024);
    }

    #[tokio::test]
    async fn unknown_callback_answer_is_a_no_op() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        assert!(channel.answer_callback("tg-cb-404", Some("hi")).await.is_ok());
    }
}
