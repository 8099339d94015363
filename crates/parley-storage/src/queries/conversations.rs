// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation creation, listing, and terminal transitions.

use parley_core::ParleyError;
use parley_core::types::{Conversation, ConversationEntry, ConversationStatus, Variant};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

use crate::database::{Database, QueryError, map_query_err, map_tr_err, parse_column};
use crate::queries::accounts::{ACCOUNT_COLUMNS, account_from_row};

const CONVERSATION_COLUMNS: &str = "c.id, c.customer_id, c.variant, c.status, c.subject, \
     c.unread_count, c.created_at, c.updated_at, c.last_message_at, c.closed_at";

/// Number of columns in [`CONVERSATION_COLUMNS`].
const CONVERSATION_WIDTH: usize = 10;

const NON_TERMINAL: &str = "('open', 'answered', 'active')";

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        variant: parse_column(row, 2)?,
        status: parse_column(row, 3)?,
        subject: row.get(4)?,
        unread_count: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        last_message_at: row.get(8)?,
        closed_at: row.get(9)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationEntry> {
    Ok(ConversationEntry {
        conversation: conversation_from_row(row)?,
        customer: account_from_row(row, CONVERSATION_WIDTH)?,
    })
}

fn entry_select() -> String {
    let account_columns = ACCOUNT_COLUMNS
        .split(", ")
        .map(|c| format!("a.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {CONVERSATION_COLUMNS}, {account_columns}
         FROM conversations c JOIN accounts a ON a.id = c.customer_id"
    )
}

pub(crate) fn select_conversation(
    conn: &Connection,
    id: i64,
) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = ?1"),
        params![id],
        conversation_from_row,
    )
    .optional()
}

/// Loads a conversation or fails with `NotFound`.
pub(crate) fn require_conversation(conn: &Connection, id: i64) -> Result<Conversation, QueryError> {
    select_conversation(conn, id)?.ok_or(QueryError::NotFound {
        entity: "conversation",
        id,
    })
}

fn select_active(conn: &Connection, customer_id: i64) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c
             WHERE c.customer_id = ?1 AND c.status IN {NON_TERMINAL}"
        ),
        params![customer_id],
        conversation_from_row,
    )
    .optional()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

/// Returns the customer's non-terminal conversation, creating one if none exists.
///
/// The partial unique index on `customer_id` rejects a second non-terminal
/// row; when that happens the existing winner is returned instead.
pub async fn create_or_get_active(
    db: &Database,
    customer_id: i64,
    variant: Variant,
    subject: Option<String>,
) -> Result<(Conversation, bool), ParleyError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if let Some(existing) = select_active(&tx, customer_id)? {
                tx.commit()?;
                return Ok((existing, false));
            }

            let inserted = tx.execute(
                "INSERT INTO conversations (customer_id, variant, status, subject)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    customer_id,
                    variant.to_string(),
                    variant.initial_status().to_string(),
                    subject
                ],
            );

            let result = match inserted {
                Ok(_) => {
                    let id = tx.last_insert_rowid();
                    (require_conversation(&tx, id)?, true)
                }
                Err(err) if is_unique_violation(&err) => match select_active(&tx, customer_id)? {
                    Some(winner) => (winner, false),
                    None => return Err(QueryError::Sql(err)),
                },
                Err(err) => return Err(err.into()),
            };
            tx.commit()?;
            Ok(result)
        })
        .await
        .map_err(map_query_err)
}

/// Get a conversation by id.
pub async fn get_conversation(db: &Database, id: i64) -> Result<Option<Conversation>, ParleyError> {
    db.connection()
        .call(move |conn| select_conversation(conn, id))
        .await
        .map_err(map_tr_err)
}

/// Get a conversation together with its customer.
pub async fn get_conversation_entry(
    db: &Database,
    id: i64,
) -> Result<Option<ConversationEntry>, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{} WHERE c.id = ?1", entry_select()),
                params![id],
                entry_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The customer's non-terminal conversation, if any.
pub async fn find_active_conversation(
    db: &Database,
    customer_id: i64,
) -> Result<Option<Conversation>, ParleyError> {
    db.connection()
        .call(move |conn| select_active(conn, customer_id))
        .await
        .map_err(map_tr_err)
}

fn order_for(status: ConversationStatus) -> &'static str {
    match status {
        ConversationStatus::Open => "c.created_at ASC, c.id ASC",
        ConversationStatus::Answered | ConversationStatus::Closed => {
            "c.updated_at DESC, c.id DESC"
        }
        ConversationStatus::Active => "c.last_message_at DESC NULLS LAST, c.created_at DESC, c.id DESC",
        ConversationStatus::Archived => "c.updated_at DESC, c.id DESC",
    }
}

/// List conversations in one status, ordered for that status.
pub async fn list_conversations(
    db: &Database,
    status: ConversationStatus,
    limit: u32,
    offset: u64,
) -> Result<Vec<ConversationEntry>, ParleyError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE c.status = ?1 ORDER BY {} LIMIT ?2 OFFSET ?3",
                entry_select(),
                order_for(status)
            ))?;
            let rows = stmt.query_map(
                params![status.to_string(), limit, offset as i64],
                entry_from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// A customer's conversations, newest first.
pub async fn list_customer_conversations(
    db: &Database,
    customer_id: i64,
    limit: u32,
) -> Result<Vec<Conversation>, ParleyError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations c
                 WHERE c.customer_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![customer_id, limit], conversation_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Count conversations in one status.
pub async fn count_conversations(
    db: &Database,
    status: ConversationStatus,
) -> Result<u64, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM conversations WHERE status = ?1",
                params![status.to_string()],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}

/// Count active conversations with unread customer messages.
pub async fn count_unread_conversations(db: &Database) -> Result<u64, ParleyError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM conversations WHERE status = 'active' AND unread_count > 0",
                [],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}

/// Move a conversation to its terminal status, stamping the close time once.
pub async fn close_conversation(db: &Database, id: i64) -> Result<Conversation, ParleyError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let current = require_conversation(&tx, id)?;
            if current.is_terminal() {
                tx.commit()?;
                return Ok(current);
            }
            let now = crate::database::now(&tx)?;
            tx.execute(
                "UPDATE conversations SET status = ?2, closed_at = ?3, updated_at = ?3
                 WHERE id = ?1",
                params![id, current.variant.terminal_status().to_string(), now],
            )?;
            let closed = require_conversation(&tx, id)?;
            tx.commit()?;
            Ok(closed)
        })
        .await
        .map_err(map_query_err)
}

/// Zero the unread counter and mark customer messages read.
pub async fn mark_read(db: &Database, id: i64) -> Result<(), ParleyError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            require_conversation(&tx, id)?;
            mark_read_in(&tx, id)?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_query_err)
}

pub(crate) fn mark_read_in(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE conversations SET unread_count = 0 WHERE id = ?1",
        params![id],
    )?;
    conn.execute(
        "UPDATE messages SET is_read = 1
         WHERE conversation_id = ?1 AND from_customer = 1 AND is_read = 0",
        params![id],
    )?;
    Ok(())
}
