// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text and button layout for every screen the desk sends.

use chrono::DateTime;
use parley_core::types::{
    Account, Action, Attachment, Button, Conversation, ConversationEntry, ConversationStatus,
    FileRef, Message, OutboundMessage, Page, Variant,
};

use crate::store::Stats;

const EXCERPT_CHARS: usize = 200;
const VIEW_MESSAGE_CHARS: usize = 300;
const LIST_SUBJECT_CHARS: usize = 30;

fn title(variant: Variant) -> &'static str {
    match variant {
        Variant::Ticketed => "Ticket",
        Variant::Threaded => "Chat",
    }
}

/// `DD.MM.YYYY HH:MM` for a stored timestamp; the raw text if it does not parse.
pub fn format_time(stored: &str) -> String {
    DateTime::parse_from_rfc3339(stored)
        .map(|t| t.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|_| stored.to_string())
}

fn format_time_precise(stored: &str) -> String {
    DateTime::parse_from_rfc3339(stored)
        .map(|t| t.format("%d.%m.%Y %H:%M:%S").to_string())
        .unwrap_or_else(|_| stored.to_string())
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

/// Short description of a message body for listings and alerts.
fn describe(content: Option<&str>, attachments: &[Attachment]) -> String {
    match content.filter(|c| !c.is_empty()) {
        Some(text) => text.to_string(),
        None => match attachments.first() {
            Some(a) => format!("[{} {}]", a.file.kind.emoji(), a.file.kind.label()),
            None => "[no text]".to_string(),
        },
    }
}

pub fn welcome(chat_id: i64, variant: Variant) -> OutboundMessage {
    let text = "🤖 Welcome to customer support!\n\n\
        Here you can:\n\
        • Ask questions about our service\n\
        • Report bugs or problems\n\
        • Attach screenshots or screen recordings\n\n\
        Just write your question and we will get back to you.";
    let (create, mine) = match variant {
        Variant::Ticketed => ("📝 Create ticket", "📋 My tickets"),
        Variant::Threaded => ("📝 Start a conversation", "📋 My chats"),
    };
    OutboundMessage::text(chat_id, text)
        .with_button(create, Action::CreateTicket)
        .with_button(mine, Action::MyTickets)
}

pub fn help(chat_id: i64, is_admin: bool) -> OutboundMessage {
    let mut text = String::from(
        "📖 Available commands:\n\n\
         /start - Start talking to support\n\
         /help - Show this help",
    );
    if is_admin {
        text.push_str(
            "\n\n👨‍💼 Admin commands:\n\
             /admin - Admin panel\n\
             /tickets - Conversations waiting for a reply\n\
             /cancel - Leave reply mode",
        );
    }
    text.push_str(
        "\n\nTo reach support just write your question. \
         You can attach screenshots or videos to explain the problem.",
    );
    OutboundMessage::text(chat_id, text)
}

pub fn unknown_command(chat_id: i64) -> OutboundMessage {
    OutboundMessage::text(chat_id, "Unknown command. Use /help for the list of commands.")
}

pub fn reply_cancelled(chat_id: i64) -> OutboundMessage {
    OutboundMessage::text(
        chat_id,
        "✅ Reply mode cancelled. Use /admin to open the admin panel.",
    )
}

pub fn admin_menu(chat_id: i64, variant: Variant, needs_attention: u64) -> OutboundMessage {
    let counter = match variant {
        Variant::Ticketed => format!("Open tickets: {needs_attention}"),
        Variant::Threaded => format!("Unread chats: {needs_attention}"),
    };
    let mut msg = OutboundMessage::text(
        chat_id,
        format!("👨‍💼 Admin panel\n\n{counter}\n\nChoose an action:"),
    );
    for status in variant.statuses() {
        msg = msg.with_button(
            format!("{} {}s", status.label(), variant.noun()),
            Action::List {
                status: *status,
                page: 0,
            },
        );
    }
    msg.with_button("📊 Statistics", Action::Stats)
}

fn list_heading(status: ConversationStatus) -> String {
    let noun = status.variant().noun();
    format!("{} {noun}s", status.label())
}

pub fn conversation_list(
    chat_id: i64,
    status: ConversationStatus,
    page: &Page<ConversationEntry>,
) -> OutboundMessage {
    let back = Button::new("🔙 Back to admin panel", Action::AdminMenu);
    let noun = status.variant().noun();
    if page.items.is_empty() {
        let text = if page.page == 0 {
            format!("No {} {noun}s.", status.to_string().replace('_', " "))
        } else {
            format!("No {noun}s on page {}.", page.page + 1)
        };
        return OutboundMessage::text(chat_id, format!("📭 {text}")).with_buttons(vec![vec![back]]);
    }

    let mut text = format!(
        "{} (page {} of {}):\n\n",
        list_heading(status),
        page.page + 1,
        page.page_count()
    );
    let mut rows = Vec::new();
    for entry in &page.items {
        let conv = &entry.conversation;
        let badge = if conv.unread_count > 0 {
            format!(" 🔴({})", conv.unread_count)
        } else {
            String::new()
        };
        text.push_str(&format!(
            "🔸 {} #{}{badge}\n👤 {}\n",
            title(conv.variant),
            conv.id,
            entry.customer.display_name()
        ));
        if let Some(subject) = &conv.subject {
            text.push_str(&format!("📝 {subject}\n"));
        }
        text.push_str(&format!("📅 {}\n\n", format_time(list_time(conv))));

        let label = match &conv.subject {
            Some(subject) => format!("🔸 #{}{badge} - {}", conv.id, excerpt(subject, LIST_SUBJECT_CHARS)),
            None => format!("🔸 #{}{badge} - {}", conv.id, entry.customer.first_name),
        };
        rows.push(vec![Button::new(label, Action::view(conv.variant, conv.id, 0))]);
    }

    let mut nav = Vec::new();
    if page.has_prev() {
        nav.push(Button::new(
            "⬅️ Previous",
            Action::List {
                status,
                page: page.page - 1,
            },
        ));
    }
    if page.has_next() {
        nav.push(Button::new(
            "Next ➡️",
            Action::List {
                status,
                page: page.page + 1,
            },
        ));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(vec![back]);

    OutboundMessage::text(chat_id, text).with_buttons(rows)
}

/// Timestamp that drives the list order for the conversation's status.
fn list_time(conv: &Conversation) -> &str {
    match conv.status {
        ConversationStatus::Open => &conv.created_at,
        ConversationStatus::Active => conv.last_message_at.as_deref().unwrap_or(&conv.created_at),
        ConversationStatus::Closed => conv.closed_at.as_deref().unwrap_or(&conv.updated_at),
        ConversationStatus::Answered | ConversationStatus::Archived => &conv.updated_at,
    }
}

pub fn conversation_view(
    chat_id: i64,
    entry: &ConversationEntry,
    messages: &Page<Message>,
) -> OutboundMessage {
    let conv = &entry.conversation;
    let mut text = format!(
        "🔸 {} #{}\n👤 Customer: {}\n",
        title(conv.variant),
        conv.id,
        entry.customer.display_name()
    );
    if let Some(subject) = &conv.subject {
        text.push_str(&format!("📝 Subject: {subject}\n"));
    }
    text.push_str(&format!("📅 Created: {}\n", format_time(&conv.created_at)));
    text.push_str(&format!("📊 Status: {}\n", conv.status.label()));
    text.push_str(&format!("💬 Messages: {}\n\n", messages.total));

    if messages.items.is_empty() {
        text.push_str("💬 No messages yet.\n");
    } else {
        text.push_str(&format!(
            "💬 Messages (page {} of {}):\n",
            messages.page + 1,
            messages.page_count()
        ));
        for message in &messages.items {
            let author = if message.from_customer {
                "👤 Customer"
            } else {
                "👨‍💼 Support"
            };
            let body = describe(message.content.as_deref(), &message.attachments);
            text.push_str(&format!(
                "{author}: {}\n📅 {}\n\n",
                excerpt(&body, VIEW_MESSAGE_CHARS),
                format_time(&message.created_at)
            ));
        }
    }

    let mut rows = Vec::new();
    let mut nav = Vec::new();
    if messages.has_prev() {
        nav.push(Button::new(
            "⬅️ Previous",
            Action::ViewChat {
                id: conv.id,
                page: messages.page - 1,
            },
        ));
    }
    if messages.has_next() {
        nav.push(Button::new(
            "Next ➡️",
            Action::ViewChat {
                id: conv.id,
                page: messages.page + 1,
            },
        ));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(vec![Button::new(
        "📋 Detailed history",
        Action::DetailedHistory(conv.id),
    )]);
    if !conv.is_terminal() {
        rows.push(vec![Button::new("💬 Reply", Action::AdminReply(conv.id))]);
        rows.push(vec![match conv.variant {
            Variant::Ticketed => Button::new("🔒 Close ticket", Action::Close(conv.id)),
            Variant::Threaded => Button::new("📁 Archive", Action::Archive(conv.id)),
        }]);
    }
    rows.push(vec![Button::new(
        format!("🔙 Back to {}s", conv.variant.noun()),
        Action::List {
            status: conv.status,
            page: 0,
        },
    )]);

    OutboundMessage::text(chat_id, excerpt_message(text)).with_buttons(rows)
}

/// Keeps a composed screen under the transport's usual text limit.
fn excerpt_message(text: String) -> String {
    const LIMIT: usize = 4000;
    if text.chars().count() > LIMIT {
        excerpt(&text, LIMIT)
    } else {
        text
    }
}

pub fn stats(chat_id: i64, stats: &Stats) -> OutboundMessage {
    let mut text = format!("📊 {} statistics:\n\n", title(stats.variant));
    for (status, count) in &stats.by_status {
        text.push_str(&format!("{}: {count}\n", status.label()));
    }
    match stats.variant {
        Variant::Ticketed => {}
        Variant::Threaded => text.push_str(&format!("🔴 Unread: {}\n", stats.needs_attention)),
    }
    text.push_str(&format!("📈 Total: {}\n", stats.total));
    OutboundMessage::text(chat_id, text).with_button("🔙 Back to admin panel", Action::AdminMenu)
}

/// The customer's own conversations, newest first.
pub fn customer_conversations(
    chat_id: i64,
    variant: Variant,
    conversations: &[Conversation],
) -> OutboundMessage {
    if conversations.is_empty() {
        return OutboundMessage::text(
            chat_id,
            format!("📭 You have no {}s yet. Just write to us to start one.", variant.noun()),
        );
    }
    let mut text = format!("📋 Your {}s:\n\n", variant.noun());
    let mut rows = Vec::new();
    for conv in conversations {
        text.push_str(&format!(
            "🔸 {} #{} - {}\n",
            title(conv.variant),
            conv.id,
            conv.status.label()
        ));
        if let Some(subject) = &conv.subject {
            text.push_str(&format!("📝 {subject}\n"));
        }
        text.push_str(&format!("📅 {}\n\n", format_time(&conv.created_at)));
        if !conv.is_terminal() {
            rows.push(vec![Button::new(
                format!("🔒 Close #{}", conv.id),
                Action::Close(conv.id),
            )]);
        }
    }
    OutboundMessage::text(chat_id, text).with_buttons(rows)
}

pub fn customer_ack(chat_id: i64, conversation: &Conversation, created: bool) -> OutboundMessage {
    let text = match conversation.variant {
        Variant::Ticketed if created => format!(
            "✅ Ticket #{} created! We received your message and will reply soon.",
            conversation.id
        ),
        Variant::Ticketed => format!("✅ Message added to ticket #{}.", conversation.id),
        Variant::Threaded => {
            "✅ Message sent! We received your message and will reply soon.".to_string()
        }
    };
    OutboundMessage::text(chat_id, text)
}

pub fn reply_prompt(chat_id: i64, conversation: &Conversation) -> OutboundMessage {
    OutboundMessage::text(
        chat_id,
        format!(
            "💬 Reply to {} #{}\n\nWrite your reply:",
            conversation.variant.noun(),
            conversation.id
        ),
    )
}

/// Shown to the admin after a reply went out.
pub fn reply_sent(chat_id: i64, conversation: &Conversation) -> OutboundMessage {
    match conversation.variant {
        Variant::Ticketed => OutboundMessage::text(
            chat_id,
            format!("✅ Reply sent to ticket #{}.", conversation.id),
        ),
        Variant::Threaded => OutboundMessage::text(
            chat_id,
            "✅ Reply sent to the customer!\n\nChoose an action:",
        )
        .with_button(
            "✅ Finish conversation",
            Action::Finish(conversation.id),
        )
        .with_button("💬 Continue chatting", Action::ContinueChat),
    }
}

pub fn continue_chat(chat_id: i64) -> OutboundMessage {
    OutboundMessage::text(
        chat_id,
        "💬 Keep going! Your messages are sent to the current chat.",
    )
}

/// Alert sent to each admin about new customer activity.
pub fn admin_alert(
    admin_chat: i64,
    customer: &Account,
    conversation: &Conversation,
    content: Option<&str>,
    files: &[FileRef],
    needs_attention: u64,
) -> OutboundMessage {
    let body = match content.filter(|c| !c.is_empty()) {
        Some(text) => excerpt(text, EXCERPT_CHARS),
        None => match files.first() {
            Some(file) => format!("[{} {}]", file.kind.emoji(), file.kind.label()),
            None => "[no text]".to_string(),
        },
    };
    let counter = match conversation.variant {
        Variant::Ticketed => format!("Open tickets: {needs_attention}"),
        Variant::Threaded => format!("Unread chats: {needs_attention}"),
    };
    OutboundMessage::text(
        admin_chat,
        format!(
            "🔔 New message!\n\n👤 From: {}\n💬 {} #{}\n📝 Message: {body}\n\n📊 {counter}",
            customer.display_name(),
            title(conversation.variant),
            conversation.id,
        ),
    )
    .with_button(
        format!("💬 Open {}", conversation.variant.noun()),
        Action::view(conversation.variant, conversation.id, 0),
    )
}

/// A customer's file re-sent to one admin.
pub fn media_forward(
    admin_chat: i64,
    customer: &Account,
    conversation: &Conversation,
    file: &FileRef,
    caption: Option<&str>,
) -> OutboundMessage {
    let mut text = format!(
        "{} {} from {} ({} #{})",
        file.kind.emoji(),
        file.kind.label(),
        customer.display_name(),
        title(conversation.variant),
        conversation.id
    );
    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        text.push_str("\n\n");
        text.push_str(caption);
    }
    OutboundMessage::text(admin_chat, text).with_attachment(file.clone())
}

/// The admin's reply as the customer sees it.
pub fn support_reply(
    customer_chat: i64,
    content: Option<&str>,
    attachment: Option<&FileRef>,
) -> OutboundMessage {
    let mut text = String::from("👨‍💼 Support reply:");
    if let Some(content) = content.filter(|c| !c.is_empty()) {
        text.push_str("\n\n");
        text.push_str(content);
    }
    let msg = OutboundMessage::text(customer_chat, text);
    match attachment {
        Some(file) => msg.with_attachment(file.clone()),
        None => msg,
    }
}

pub fn history_header(chat_id: i64, entry: &ConversationEntry) -> OutboundMessage {
    OutboundMessage::text(
        chat_id,
        format!(
            "📋 Detailed history of {} #{}\n👤 {}",
            entry.conversation.variant.noun(),
            entry.conversation.id,
            entry.customer.display_name()
        ),
    )
}

/// One message of a detailed history: a text message, then one message per file.
pub fn history_message(
    chat_id: i64,
    message: &Message,
    author: Option<&Account>,
) -> Vec<OutboundMessage> {
    let (icon, role) = if message.from_customer {
        ("👤", "CUSTOMER")
    } else {
        ("👨‍💼", "SUPPORT")
    };
    let who = match author {
        Some(account) => format!("{icon} {role} ({})", account.display_name()),
        None => format!("{icon} {role}"),
    };
    let at = format_time_precise(&message.created_at);

    let mut out = Vec::new();
    match message.content.as_deref().filter(|c| !c.is_empty()) {
        Some(content) => out.push(OutboundMessage::text(
            chat_id,
            format!("{who}:\n{content}\n📅 {at}"),
        )),
        None if message.attachments.is_empty() => out.push(OutboundMessage::text(
            chat_id,
            format!("{who}:\n[no text]\n📅 {at}"),
        )),
        None => {}
    }
    for attachment in &message.attachments {
        out.push(
            OutboundMessage::text(chat_id, format!("{who}\n📅 {at}"))
                .with_attachment(attachment.file.clone()),
        );
    }
    out
}

/// Closes a detailed history. `shown` below `total` means the newest
/// messages were cut off by the history limit.
pub fn history_footer(
    chat_id: i64,
    conversation: &Conversation,
    shown: usize,
    total: u64,
) -> OutboundMessage {
    let text = if (shown as u64) < total {
        format!(
            "📋 Showing the first {shown} of {total} messages. \
             The newest {} are not included, page through the {} to see them.",
            total - shown as u64,
            conversation.variant.noun()
        )
    } else {
        "📋 History sent above.".to_string()
    };
    OutboundMessage::text(chat_id, text).with_button(
        format!("🔙 Back to {}", conversation.variant.noun()),
        Action::view(conversation.variant, conversation.id, 0),
    )
}
