// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Button callback actions.
//!
//! Buttons carry an underscore-delimited tag such as `view_chat_7_page_2`.
//! [`Action::parse`] is the only place that tag is taken apart; everything
//! downstream matches on the enum. [`std::fmt::Display`] produces the tag.

use std::fmt;

use crate::types::{ConversationStatus, Variant};

/// A decoded button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Customer asks how to open a ticket.
    CreateTicket,
    /// Customer lists their own conversations.
    MyTickets,
    /// Admin statistics screen.
    Stats,
    /// Admin main menu.
    AdminMenu,
    /// Admin keeps replying to the current conversation.
    ContinueChat,
    /// Admin list of conversations in one status.
    List {
        status: ConversationStatus,
        page: u32,
    },
    /// `reply_{id}`: admins start replying, customers are told to just write.
    Reply(i64),
    /// Close a conversation (owner or admin).
    Close(i64),
    /// Ticket view, first page.
    ViewTicket(i64),
    /// Chat view with message-history page.
    ViewChat { id: i64, page: u32 },
    /// Admin starts replying to a conversation.
    AdminReply(i64),
    /// Admin archives a conversation without a session change.
    Archive(i64),
    /// Admin archives the conversation they were replying to and detaches.
    Finish(i64),
    /// Full history as individual messages.
    DetailedHistory(i64),
}

impl Action {
    /// Decodes a callback payload. Malformed payloads yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split('_').collect();
        let action = match parts.as_slice() {
            ["create", "ticket"] => Self::CreateTicket,
            ["my", "tickets"] => Self::MyTickets,
            ["admin", "stats"] => Self::Stats,
            ["admin", "menu"] => Self::AdminMenu,
            ["continue", "chat"] => Self::ContinueChat,
            ["admin", status, "tickets" | "chats"] => Self::List {
                status: list_status(status, parts[2])?,
                page: 0,
            },
            [status, kind @ ("tickets" | "chats"), "page", n] => Self::List {
                status: list_status(status, kind)?,
                page: page(n)?,
            },
            ["reply", id] => Self::Reply(conversation_id(id)?),
            ["close", id] => Self::Close(conversation_id(id)?),
            ["view", "ticket", id] => Self::ViewTicket(conversation_id(id)?),
            ["view", "chat", id] => Self::ViewChat {
                id: conversation_id(id)?,
                page: 0,
            },
            ["view", "chat", id, "page", n] => Self::ViewChat {
                id: conversation_id(id)?,
                page: page(n)?,
            },
            ["admin", "reply", id] => Self::AdminReply(conversation_id(id)?),
            ["archive", "chat", id] => Self::Archive(conversation_id(id)?),
            ["finish", "conversation", id] => Self::Finish(conversation_id(id)?),
            ["detailed", "history", id] => Self::DetailedHistory(conversation_id(id)?),
            _ => return None,
        };
        Some(action)
    }

    /// The view action for a conversation of the given variant.
    pub fn view(variant: Variant, id: i64, page: u32) -> Self {
        match variant {
            Variant::Ticketed if page == 0 => Self::ViewTicket(id),
            _ => Self::ViewChat { id, page },
        }
    }

    /// Whether the action is restricted to admins.
    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            Self::CreateTicket | Self::MyTickets | Self::Reply(_) | Self::Close(_)
        )
    }
}

fn list_status(status: &str, kind: &str) -> Option<ConversationStatus> {
    match (status, kind) {
        ("open", "tickets") => Some(ConversationStatus::Open),
        ("answered", "tickets") => Some(ConversationStatus::Answered),
        ("closed", "tickets") => Some(ConversationStatus::Closed),
        ("active", "chats") => Some(ConversationStatus::Active),
        ("archived", "chats") => Some(ConversationStatus::Archived),
        _ => None,
    }
}

/// Row ids start at 1.
fn conversation_id(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().filter(|id| *id > 0)
}

fn page(s: &str) -> Option<u32> {
    s.parse::<u32>().ok()
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTicket => f.write_str("create_ticket"),
            Self::MyTickets => f.write_str("my_tickets"),
            Self::Stats => f.write_str("admin_stats"),
            Self::AdminMenu => f.write_str("admin_menu"),
            Self::ContinueChat => f.write_str("continue_chat"),
            Self::List { status, page } => {
                let kind = match status.variant() {
                    Variant::Ticketed => "tickets",
                    Variant::Threaded => "chats",
                };
                if *page == 0 {
                    write!(f, "admin_{status}_{kind}")
                } else {
                    write!(f, "{status}_{kind}_page_{page}")
                }
            }
            Self::Reply(id) => write!(f, "reply_{id}"),
            Self::Close(id) => write!(f, "close_{id}"),
            Self::ViewTicket(id) => write!(f, "view_ticket_{id}"),
            Self::ViewChat { id, page: 0 } => write!(f, "view_chat_{id}"),
            Self::ViewChat { id, page } => write!(f, "view_chat_{id}_page_{page}"),
            Self::AdminReply(id) => write!(f, "admin_reply_{id}"),
            Self::Archive(id) => write!(f, "archive_chat_{id}"),
            Self::Finish(id) => write!(f, "finish_conversation_{id}"),
            Self::DetailedHistory(id) => write!(f, "detailed_history_{id}"),
        }
    }
}
