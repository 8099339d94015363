// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accounts, conversations, messages, and attachments.
//!
//! A conversation is one customer's support interaction. Its [`Variant`]
//! selects the status-transition table: ticketed conversations cycle between
//! `open` and `answered` until `closed`; threaded conversations stay `active`
//! with an unread counter until `archived`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Conversation flavour used by a deployment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Explicit answered/closed lifecycle, one reply per reply session.
    Ticketed,
    /// Unread counter with active/archived lifecycle, sticky reply session.
    #[default]
    Threaded,
}

impl Variant {
    /// Status a freshly created conversation starts in.
    pub fn initial_status(self) -> ConversationStatus {
        match self {
            Self::Ticketed => ConversationStatus::Open,
            Self::Threaded => ConversationStatus::Active,
        }
    }

    /// The single terminal status of this variant.
    pub fn terminal_status(self) -> ConversationStatus {
        match self {
            Self::Ticketed => ConversationStatus::Closed,
            Self::Threaded => ConversationStatus::Archived,
        }
    }

    /// Status after a message is appended to a non-terminal conversation.
    pub fn status_after_message(self, from_customer: bool) -> ConversationStatus {
        match self {
            Self::Ticketed if from_customer => ConversationStatus::Open,
            Self::Ticketed => ConversationStatus::Answered,
            Self::Threaded => ConversationStatus::Active,
        }
    }

    /// Whether an admin stays attached to the conversation after replying.
    pub fn keeps_session_after_reply(self) -> bool {
        matches!(self, Self::Threaded)
    }

    /// Every status this variant can be in, in menu order.
    pub fn statuses(self) -> &'static [ConversationStatus] {
        match self {
            Self::Ticketed => &[
                ConversationStatus::Open,
                ConversationStatus::Answered,
                ConversationStatus::Closed,
            ],
            Self::Threaded => &[ConversationStatus::Active, ConversationStatus::Archived],
        }
    }

    /// Human noun for one conversation ("ticket" or "chat").
    pub fn noun(self) -> &'static str {
        match self {
            Self::Ticketed => "ticket",
            Self::Threaded => "chat",
        }
    }
}

/// Lifecycle status of a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Open,
    Answered,
    Closed,
    Active,
    Archived,
}

impl ConversationStatus {
    /// Closed and archived conversations accept no further messages.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Archived)
    }

    /// The variant whose transition table contains this status.
    pub fn variant(self) -> Variant {
        match self {
            Self::Open | Self::Answered | Self::Closed => Variant::Ticketed,
            Self::Active | Self::Archived => Variant::Threaded,
        }
    }

    /// Display label with an emoji marker.
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "🟢 Open",
            Self::Answered => "🟡 Answered",
            Self::Closed => "🔴 Closed",
            Self::Active => "💬 Active",
            Self::Archived => "📁 Archived",
        }
    }
}

/// An identity known to the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub external_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    /// "First Last" with the handle appended when known.
    pub fn display_name(&self) -> String {
        let mut name = self.first_name.clone();
        if let Some(last) = self.last_name.as_deref().filter(|l| !l.is_empty()) {
            name.push(' ');
            name.push_str(last);
        }
        if let Some(username) = self.username.as_deref() {
            name.push_str(&format!(" ({username})"));
        }
        name
    }
}

/// One end-to-end support interaction for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub customer_id: i64,
    pub variant: Variant,
    pub status: ConversationStatus,
    /// Ticketed conversations only.
    pub subject: Option<String>,
    /// Threaded conversations only.
    pub unread_count: i64,
    pub created_at: String,
    pub updated_at: String,
    /// `None` until the first message arrives.
    pub last_message_at: Option<String>,
    /// Set once, when the conversation becomes terminal.
    pub closed_at: Option<String>,
}

impl Conversation {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True while an admin still owes the customer a reply.
    pub fn needs_attention(&self) -> bool {
        match self.variant {
            Variant::Ticketed => self.status == ConversationStatus::Open,
            Variant::Threaded => self.status == ConversationStatus::Active && self.unread_count > 0,
        }
    }
}

/// A conversation joined with its customer's account, for listings and views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub conversation: Conversation,
    pub customer: Account,
}

/// A persisted message and the files it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub author_id: i64,
    pub content: Option<String>,
    pub from_customer: bool,
    pub is_read: bool,
    pub created_at: String,
    pub attachments: Vec<Attachment>,
}

/// Input for appending a message to a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: i64,
    pub author_id: i64,
    pub content: Option<String>,
    pub from_customer: bool,
    /// Stored with the message in the same transaction.
    pub files: Vec<FileRef>,
}

/// Media type of an attachment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Video,
    Document,
    Voice,
    VideoNote,
}

impl AttachmentKind {
    /// File name used when the transport does not declare one.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Photo => "photo.jpg",
            Self::Video => "video.mp4",
            Self::Document => "document",
            Self::Voice => "voice.ogg",
            Self::VideoNote => "video_note.mp4",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Photo => "Photo",
            Self::Video => "Video",
            Self::Document => "Document",
            Self::Voice => "Voice message",
            Self::VideoNote => "Video note",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Photo => "📷",
            Self::Video => "🎥",
            Self::Document => "📄",
            Self::Voice => "🎤",
            Self::VideoNote => "📹",
        }
    }
}

/// A file as the transport knows it: a reusable handle plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub handle: String,
    pub name: String,
    pub kind: AttachmentKind,
    pub size: i64,
}

/// A stored file linked to the message it accompanied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub message_id: i64,
    pub file: FileRef,
    pub created_at: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    /// Offset of the first row on `page`.
    pub fn offset(page: u32, page_size: u32) -> u64 {
        u64::from(page) * u64::from(page_size)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        Self::offset(self.page, self.page_size) + (self.page_size as u64) < self.total
    }

    /// Number of pages needed to show `total` rows, at least one.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.page_size)).max(1)
    }
}
