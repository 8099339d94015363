// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events,
//! captured outbound messages and callback answers, and per-recipient send
//! failures.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use parley_core::ParleyError;
use parley_core::traits::adapter::PluginAdapter;
use parley_core::traits::channel::ChannelAdapter;
use parley_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundEvent, MessageId, OutboundMessage,
};

/// A mock messaging channel for testing.
///
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured for `sent_messages()`
/// - **answers**: callback acknowledgements passed to `answer_callback()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    answers: Arc<Mutex<Vec<(String, Option<String>)>>>,
    failing: Arc<Mutex<HashSet<i64>>>,
    receive_errors: Arc<Mutex<VecDeque<ParleyError>>>,
    notify: Arc<Notify>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            answers: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            receive_errors: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// After the queue drains, `receive()` reports the channel as closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// The next `receive()` returns `error` before any queued event.
    pub async fn fail_next_receive(&self, error: ParleyError) {
        self.receive_errors.lock().await.push_back(error);
        self.notify.notify_one();
    }

    /// Every `send()` to `chat_id` fails from now on.
    pub async fn fail_sends_to(&self, chat_id: i64) {
        self.failing.lock().await.insert(chat_id);
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat, in send order.
    pub async fn sent_to(&self, chat_id: i64) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent messages and callback answers.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
        self.answers.lock().await.clear();
    }

    /// Callback answers as `(callback_id, notice)` pairs.
    pub async fn callback_answers(&self) -> Vec<(String, Option<String>)> {
        self.answers.lock().await.clone()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_buttons: true,
            supports_media: true,
            max_message_length: 4096,
            max_caption_length: 1024,
        }
    }

    async fn connect(&mut self) -> Result<(), ParleyError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ParleyError> {
        if self.failing.lock().await.contains(&msg.chat_id) {
            return Err(ParleyError::Channel {
                message: format!("send to {} failed", msg.chat_id),
                source: None,
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(msg);
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ParleyError> {
        self.answers
            .lock()
            .await
            .push((callback_id.to_string(), text.map(str::to_string)));
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, ParleyError> {
        loop {
            if let Some(error) = self.receive_errors.lock().await.pop_front() {
                return Err(error);
            }
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(ParleyError::ChannelClosed("mock channel".into()));
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use parley_core::types::Sender;

    fn command(name: &str) -> InboundEvent {
        InboundEvent::Command {
            name: name.into(),
            args: String::new(),
            sender: Sender {
                external_id: 1,
                username: None,
                first_name: "Test".into(),
                last_name: None,
            },
            chat_id: 1,
        }
    }

    #[tokio::test]
    async fn receive_returns_injected_events_in_order() {
        let channel = MockChannel::new();
        channel.inject(command("start")).await;
        channel.inject(command("help")).await;

        assert_eq!(channel.receive().await.unwrap(), command("start"));
        assert_eq!(channel.receive().await.unwrap(), command("help"));
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let id = channel
            .send(OutboundMessage::text(5, "hello"))
            .await
            .unwrap();
        assert!(id.0.starts_with("mock-msg-"));
        assert_eq!(channel.sent_to(5).await[0].text, "hello");
        assert!(channel.sent_to(6).await.is_empty());

        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn failing_recipient_is_rejected() {
        let channel = MockChannel::new();
        channel.fail_sends_to(9).await;
        assert!(channel.send(OutboundMessage::text(9, "x")).await.is_err());
        assert!(channel.send(OutboundMessage::text(8, "x")).await.is_ok());
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn closed_channel_reports_closed_after_draining() {
        let channel = MockChannel::new();
        channel.inject(command("start")).await;
        channel.close();

        assert!(channel.receive().await.is_ok());
        let err = channel.receive().await.unwrap_err();
        assert!(matches!(err, ParleyError::ChannelClosed(_)));
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = Arc::new(MockChannel::new());
        let injector = Arc::clone(&channel);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            injector.inject(command("delayed")).await;
        });

        let received = tokio::time::timeout(Duration::from_secs(2), channel.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        assert_eq!(received, command("delayed"));
    }
}
