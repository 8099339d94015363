// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messages handed to channel adapters.

use crate::types::{Action, FileRef};

/// An inline button that triggers an [`Action`] when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// A message to deliver to one chat.
///
/// When `attachment` is set, `text` is sent as its caption in the same message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub attachment: Option<FileRef>,
    /// Rows of inline buttons.
    pub buttons: Vec<Vec<Button>>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            attachment: None,
            buttons: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, file: FileRef) -> Self {
        self.attachment = Some(file);
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Vec<Button>>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Appends a single-button row.
    pub fn with_button(mut self, label: impl Into<String>, action: Action) -> Self {
        self.buttons.push(vec![Button::new(label, action)]);
        self
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCapabilities {
    pub supports_buttons: bool,
    pub supports_media: bool,
    /// Longest text the transport accepts in one message.
    pub max_message_length: usize,
    /// Longest caption the transport accepts on a media message.
    pub max_caption_length: usize,
}
