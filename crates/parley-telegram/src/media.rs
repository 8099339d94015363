// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File references and outbound message shaping for Telegram.
//!
//! Files are never downloaded. Inbound media is reduced to its reusable
//! `file_id` handle, and outbound media is re-sent by that handle.

use parley_core::ParleyError;
use parley_core::types::{AttachmentKind, Button, FileRef};
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{FileId, FileMeta, InlineKeyboardButton, InlineKeyboardMarkup, InputFile};

/// Telegram's limit for a text message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram's limit for a media caption.
pub const MAX_CAPTION_CHARS: usize = 1024;

fn file_ref(file: &FileMeta, name: Option<&str>, kind: AttachmentKind) -> FileRef {
    FileRef {
        handle: file.id.0.clone(),
        name: name.unwrap_or(kind.default_file_name()).to_string(),
        kind,
        size: i64::from(file.size),
    }
}

/// Collects the files carried by a message.
///
/// Photos arrive in several sizes; only the largest (last) one is kept.
pub fn files_of(msg: &Message) -> Vec<FileRef> {
    let mut files = Vec::new();
    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        files.push(file_ref(&largest.file, None, AttachmentKind::Photo));
    }
    if let Some(video) = msg.video() {
        files.push(file_ref(
            &video.file,
            video.file_name.as_deref(),
            AttachmentKind::Video,
        ));
    }
    if let Some(doc) = msg.document() {
        files.push(file_ref(
            &doc.file,
            doc.file_name.as_deref(),
            AttachmentKind::Document,
        ));
    }
    if let Some(voice) = msg.voice() {
        files.push(file_ref(&voice.file, None, AttachmentKind::Voice));
    }
    if let Some(note) = msg.video_note() {
        files.push(file_ref(&note.file, None, AttachmentKind::VideoNote));
    }
    files
}

/// Builds the inline keyboard. Each button carries its action tag as
/// callback data.
pub fn keyboard(rows: &[Vec<Button>]) -> Option<InlineKeyboardMarkup> {
    if rows.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(&button.label, button.action.to_string()))
            .collect::<Vec<_>>()
    })))
}

/// Whether `text` can travel as the caption of a file of `kind`.
///
/// Video notes take no caption at all.
pub fn fits_caption(kind: AttachmentKind, text: &str) -> bool {
    kind != AttachmentKind::VideoNote && text.chars().count() <= MAX_CAPTION_CHARS
}

/// Splits text into chunks of at most `max_chars` characters.
///
/// Prefers a paragraph break, then a line break, then a space; falls back
/// to a hard split. Empty input yields no chunks.
pub fn split_text(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let Some((limit, _)) = rest.char_indices().nth(max_chars) else {
            chunks.push(rest);
            break;
        };
        let window = &rest[..limit];
        let cut = window
            .rfind("\n\n")
            .or_else(|| window.rfind('\n'))
            .or_else(|| window.rfind(' '))
            .filter(|&at| at > 0)
            .unwrap_or(limit);
        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk);
        rest = tail.trim_start_matches(['\n', ' ']);
    }
    chunks
}

macro_rules! captioned {
    ($req:expr, $caption:expr) => {
        match $caption {
            Some(caption) => $req.caption(caption.to_string()),
            None => $req,
        }
    };
}

macro_rules! with_markup {
    ($req:expr, $markup:expr) => {
        match $markup {
            Some(markup) => $req.reply_markup(markup).await,
            None => $req.await,
        }
    };
}

/// Re-sends a file by handle, with an optional caption and keyboard.
pub async fn send_file(
    bot: &Bot,
    chat: ChatId,
    file: &FileRef,
    caption: Option<&str>,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<Message, ParleyError> {
    let input = InputFile::file_id(FileId(file.handle.clone()));
    let sent: Result<Message, RequestError> = match file.kind {
        AttachmentKind::Photo => {
            with_markup!(captioned!(bot.send_photo(chat, input), caption), markup)
        }
        AttachmentKind::Video => {
            with_markup!(captioned!(bot.send_video(chat, input), caption), markup)
        }
        AttachmentKind::Document => {
            with_markup!(captioned!(bot.send_document(chat, input), caption), markup)
        }
        AttachmentKind::Voice => {
            with_markup!(captioned!(bot.send_voice(chat, input), caption), markup)
        }
        AttachmentKind::VideoNote => with_markup!(bot.send_video_note(chat, input), markup),
    };
    sent.map_err(|e| ParleyError::Channel {
        message: format!("failed to send {}: {e}", file.kind),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use parley_core::types::Action;

    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("hello", 10), vec!["hello"]);
        assert!(split_text("", 10).is_empty());
    }

    #[test]
    fn split_prefers_paragraph_boundary() {
        let chunks = split_text("first part\n\nsecond part", 15);
        assert_eq!(chunks, vec!["first part", "second part"]);
    }

    #[test]
    fn split_falls_back_to_space_then_hard_cut() {
        assert_eq!(split_text("aaaa bbbb cccc", 9), vec!["aaaa", "bbbb cccc"]);
        assert_eq!(split_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn split_counts_characters_not_bytes() {
        let text = "ä".repeat(10);
        let chunks = split_text(&text, 4);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn long_chunks_stay_within_telegram_limit() {
        let text = "word ".repeat(2000);
        let chunks = split_text(&text, MAX_MESSAGE_CHARS);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
    }

    #[test]
    fn caption_limits() {
        assert!(fits_caption(AttachmentKind::Photo, "short"));
        assert!(!fits_caption(AttachmentKind::Photo, &"x".repeat(1025)));
        assert!(!fits_caption(AttachmentKind::VideoNote, "short"));
    }

    #[test]
    fn keyboard_carries_action_tags() {
        assert!(keyboard(&[]).is_none());
        let markup = keyboard(&[
            vec![Button::new("Reply", Action::AdminReply(7))],
            vec![Button::new("Back", Action::AdminMenu)],
        ])
        .unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "Reply");
    }
}
