// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message append with status transitions, attachments, and history paging.

use parley_core::ParleyError;
use parley_core::types::{Attachment, FileRef, Message, NewMessage, Variant};
use rusqlite::{Connection, Row, params};

use crate::database::{Database, QueryError, map_query_err, map_tr_err, parse_column};
use crate::queries::conversations::{mark_read_in, require_conversation};

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, author_id, content, from_customer, is_read, created_at";

const ATTACHMENT_COLUMNS: &str =
    "id, message_id, file_handle, file_name, kind, file_size, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        from_customer: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
        attachments: Vec::new(),
    })
}

fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        message_id: row.get(1)?,
        file: FileRef {
            handle: row.get(2)?,
            name: row.get(3)?,
            kind: parse_column(row, 4)?,
            size: row.get(5)?,
        },
        created_at: row.get(6)?,
    })
}

/// Append a message with its files and apply the conversation's status
/// transition in one transaction.
///
/// Customer messages re-open a ticket and bump a chat's unread counter.
/// Admin messages mark a ticket answered and clear a chat's unread state.
/// Terminal conversations reject the append.
pub async fn append_message(db: &Database, message: NewMessage) -> Result<Message, ParleyError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let conversation = require_conversation(&tx, message.conversation_id)?;
            if conversation.is_terminal() {
                return Err(QueryError::Terminal {
                    id: conversation.id,
                    status: conversation.status,
                });
            }

            let now = crate::database::now(&tx)?;
            let mut inserted = tx.query_row(
                &format!(
                    "INSERT INTO messages
                        (conversation_id, author_id, content, from_customer, is_read, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     RETURNING {MESSAGE_COLUMNS}"
                ),
                params![
                    message.conversation_id,
                    message.author_id,
                    message.content,
                    message.from_customer,
                    !message.from_customer,
                    now
                ],
                message_from_row,
            )?;
            inserted.attachments = insert_attachments(&tx, inserted.id, &message.files)?;

            let variant = conversation.variant;
            let unread = match variant {
                Variant::Threaded if message.from_customer => conversation.unread_count + 1,
                _ => 0,
            };
            tx.execute(
                "UPDATE conversations
                 SET status = ?2, unread_count = ?3, last_message_at = ?4, updated_at = ?4
                 WHERE id = ?1",
                params![
                    conversation.id,
                    variant.status_after_message(message.from_customer).to_string(),
                    unread,
                    now
                ],
            )?;
            if !message.from_customer {
                mark_read_in(&tx, conversation.id)?;
            }

            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_query_err)
}

fn insert_attachments(
    conn: &Connection,
    message_id: i64,
    files: &[FileRef],
) -> rusqlite::Result<Vec<Attachment>> {
    let mut attachments = Vec::with_capacity(files.len());
    if files.is_empty() {
        return Ok(attachments);
    }
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO attachments (message_id, file_handle, file_name, kind, file_size)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING {ATTACHMENT_COLUMNS}"
    ))?;
    for file in files {
        attachments.push(stmt.query_row(
            params![
                message_id,
                file.handle,
                file.name,
                file.kind.to_string(),
                file.size
            ],
            attachment_from_row,
        )?);
    }
    Ok(attachments)
}

fn load_attachments(conn: &Connection, messages: &mut [Message]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE message_id = ?1 ORDER BY id ASC"
    ))?;
    for message in messages.iter_mut() {
        let rows = stmt.query_map(params![message.id], attachment_from_row)?;
        message.attachments = rows.collect::<rusqlite::Result<_>>()?;
    }
    Ok(())
}

/// Messages of a conversation in creation order, with attachments.
pub async fn list_messages(
    db: &Database,
    conversation_id: i64,
    limit: u32,
    offset: u64,
) -> Result<Vec<Message>, ParleyError> {
    db.connection()
        .call(move |conn| {
            let mut messages = {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY created_at ASC, id ASC
                     LIMIT ?2 OFFSET ?3"
                ))?;
                let rows = stmt.query_map(
                    params![conversation_id, limit, offset as i64],
                    message_from_row,
                )?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };
            load_attachments(conn, &mut messages)?;
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of messages in a conversation.
pub async fn count_messages(db: &Database, conversation_id: i64) -> Result<u64, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}
