// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update decoding.
//!
//! Turns Telegram messages and callback queries into channel-agnostic
//! [`InboundEvent`]s. Callback payloads are decoded into an [`Action`]
//! here and nowhere else; a payload that does not decode drops the update.

use parley_core::types::{Action, InboundEvent, Sender};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, User};
use tracing::debug;

use crate::media;

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Splits `/name@bot args` into `("name", "args")`.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args.to_string()))
}

pub fn sender_from_user(user: &User) -> Sender {
    Sender {
        external_id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

/// Converts a private message into a command or plain-message event.
///
/// Returns `None` for messages without a sender and for messages that
/// carry neither text nor a supported file, such as stickers or locations.
pub fn message_to_event(msg: &Message) -> Option<InboundEvent> {
    let sender = sender_from_user(msg.from.as_ref()?);
    let chat_id = msg.chat.id.0;

    if let Some(text) = msg.text() {
        if let Some((name, args)) = parse_command(text) {
            return Some(InboundEvent::Command {
                name,
                args,
                sender,
                chat_id,
            });
        }
    }

    let attachments = media::files_of(msg);
    let text = msg.text().map(str::to_string);
    if text.is_none() && attachments.is_empty() {
        debug!(msg_id = msg.id.0, "ignoring unsupported message type");
        return None;
    }

    Some(InboundEvent::PlainMessage {
        text,
        caption: msg.caption().map(str::to_string),
        attachments,
        sender,
        chat_id,
    })
}

/// Converts a callback query into a decoded action event.
///
/// `callback_id` is the adapter's handle for answering the query later.
pub fn callback_to_event(query: &CallbackQuery, callback_id: String) -> Option<InboundEvent> {
    let data = query.data.as_deref()?;
    let Some(action) = Action::parse(data) else {
        debug!(data, "ignoring malformed callback payload");
        return None;
    };

    let sender = sender_from_user(&query.from);
    let (chat_id, message_id) = match query.message.as_ref() {
        Some(message) => (message.chat().id.0, Some(i64::from(message.id().0))),
        None => (sender.external_id, None),
    };

    Some(InboundEvent::CallbackAction {
        callback_id,
        action,
        sender,
        chat_id,
        message_id,
    })
}

#[cfg(test)]
mod tests {
    use parley_core::types::AttachmentKind;

    use super::*;

    fn user(id: u64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "is_bot": false,
            "first_name": "Test",
            "username": "tester",
        })
    }

    /// Build a private chat message from JSON, matching the Bot API structure.
    fn private_message(user_id: u64, body: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": user(user_id),
        });
        if let (Some(target), Some(extra)) = (json.as_object_mut(), body.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Test Group",
            },
            "from": user(user_id),
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    fn callback(data: &str) -> CallbackQuery {
        let json = serde_json::json!({
            "id": "4382bfdwdsb323b2d9",
            "from": user(555),
            "chat_instance": "-1234567890",
            "data": data,
        });
        serde_json::from_value(json).expect("failed to deserialize mock callback")
    }

    #[test]
    fn commands_are_split_from_arguments() {
        assert_eq!(
            parse_command("/start"),
            Some(("start".to_string(), String::new()))
        );
        assert_eq!(
            parse_command("/Help@parley_bot  please "),
            Some(("help".to_string(), "please".to_string()))
        );
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn only_private_chats_are_dms() {
        let dm = private_message(12345, serde_json::json!({ "text": "hi" }));
        assert!(is_dm(&dm));
        assert!(!is_dm(&group_message(12345, "hi")));
    }

    #[test]
    fn text_message_becomes_plain_message() {
        let msg = private_message(12345, serde_json::json!({ "text": "my internet is down" }));
        match message_to_event(&msg) {
            Some(InboundEvent::PlainMessage {
                text,
                attachments,
                sender,
                chat_id,
                ..
            }) => {
                assert_eq!(text.as_deref(), Some("my internet is down"));
                assert!(attachments.is_empty());
                assert_eq!(sender.external_id, 12345);
                assert_eq!(sender.username.as_deref(), Some("tester"));
                assert_eq!(chat_id, 12345);
            }
            other => panic!("expected PlainMessage, got {other:?}"),
        }
    }

    #[test]
    fn slash_text_becomes_command() {
        let msg = private_message(12345, serde_json::json!({ "text": "/admin" }));
        match message_to_event(&msg) {
            Some(InboundEvent::Command { name, .. }) => assert_eq!(name, "admin"),
            other => panic!("expected Command, got {other:?}"),
        }
    }

    #[test]
    fn photo_with_caption_keeps_largest_size() {
        let msg = private_message(
            12345,
            serde_json::json!({
                "caption": "screenshot",
                "photo": [
                    { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 1000 },
                    { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 720, "file_size": 90000 },
                ],
            }),
        );
        match message_to_event(&msg) {
            Some(InboundEvent::PlainMessage {
                text,
                caption,
                attachments,
                ..
            }) => {
                assert!(text.is_none());
                assert_eq!(caption.as_deref(), Some("screenshot"));
                assert_eq!(attachments.len(), 1);
                assert_eq!(attachments[0].handle, "large");
                assert_eq!(attachments[0].kind, AttachmentKind::Photo);
                assert_eq!(attachments[0].size, 90000);
            }
            other => panic!("expected PlainMessage, got {other:?}"),
        }
    }

    #[test]
    fn location_message_is_dropped() {
        let msg = private_message(
            12345,
            serde_json::json!({
                "location": { "latitude": 52.5, "longitude": 13.4 },
            }),
        );
        assert!(message_to_event(&msg).is_none());
    }

    #[test]
    fn callback_payload_is_decoded_once() {
        let event = callback_to_event(&callback("view_chat_7_page_2"), "k1".into());
        match event {
            Some(InboundEvent::CallbackAction {
                callback_id,
                action,
                chat_id,
                ..
            }) => {
                assert_eq!(callback_id, "k1");
                assert_eq!(action, Action::ViewChat { id: 7, page: 2 });
                assert_eq!(chat_id, 555);
            }
            other => panic!("expected CallbackAction, got {other:?}"),
        }
    }

    #[test]
    fn malformed_callback_payload_is_ignored() {
        assert!(callback_to_event(&callback("view_chat_x"), "k".into()).is_none());
        assert!(callback_to_event(&callback("reply_1_2"), "k".into()).is_none());
    }
}
