// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Parley router.

mod action;
mod conversation;
mod event;
mod outbound;

pub use action::Action;
pub use conversation::{
    Account, Attachment, AttachmentKind, Conversation, ConversationEntry, ConversationStatus,
    FileRef, Message, NewMessage, Page, Variant,
};
pub use event::{InboundEvent, Sender};
pub use outbound::{Button, ChannelCapabilities, OutboundMessage};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Transport-assigned identifier of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}
