// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for chat transports.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundEvent, MessageId, OutboundMessage};

/// Adapter for a bidirectional chat transport.
///
/// Adapters decode platform updates into [`InboundEvent`]s and deliver
/// [`OutboundMessage`]s, including inline buttons and media re-sends.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), ParleyError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ParleyError>;

    /// Acknowledges a button press, optionally with a short notice.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>)
    -> Result<(), ParleyError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundEvent, ParleyError>;
}
