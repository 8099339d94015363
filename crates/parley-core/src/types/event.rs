// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound events produced by channel adapters.

use crate::types::{Action, FileRef};

/// Who sent an event, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub external_id: i64,
    /// Handle without the leading `@`.
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// One unit of inbound traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/name args`
    Command {
        name: String,
        args: String,
        sender: Sender,
        chat_id: i64,
    },
    /// Free text and/or media.
    PlainMessage {
        text: Option<String>,
        caption: Option<String>,
        attachments: Vec<FileRef>,
        sender: Sender,
        chat_id: i64,
    },
    /// A button press, already decoded.
    CallbackAction {
        callback_id: String,
        action: Action,
        sender: Sender,
        chat_id: i64,
        message_id: Option<i64>,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Command { sender, .. }
            | Self::PlainMessage { sender, .. }
            | Self::CallbackAction { sender, .. } => sender,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Command { chat_id, .. }
            | Self::PlainMessage { chat_id, .. }
            | Self::CallbackAction { chat_id, .. } => *chat_id,
        }
    }

    /// Short kind label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::PlainMessage { .. } => "message",
            Self::CallbackAction { .. } => "callback",
        }
    }
}
