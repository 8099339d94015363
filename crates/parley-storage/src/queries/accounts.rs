// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account upsert, lookup, and admin promotion.

use parley_core::ParleyError;
use parley_core::types::{Account, Sender};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

pub(crate) const ACCOUNT_COLUMNS: &str =
    "id, external_id, username, first_name, last_name, is_admin, created_at, updated_at";

/// Reads an account starting at column `base`.
pub(crate) fn account_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(base)?,
        external_id: row.get(base + 1)?,
        username: row.get(base + 2)?,
        first_name: row.get(base + 3)?,
        last_name: row.get(base + 4)?,
        is_admin: row.get(base + 5)?,
        created_at: row.get(base + 6)?,
        updated_at: row.get(base + 7)?,
    })
}

/// Insert the account, or refresh the name fields of an existing one.
pub async fn upsert_account(db: &Database, sender: &Sender) -> Result<Account, ParleyError> {
    let sender = sender.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO accounts (external_id, username, first_name, last_name)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(external_id) DO UPDATE SET
                        username = excluded.username,
                        first_name = excluded.first_name,
                        last_name = excluded.last_name,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     RETURNING {ACCOUNT_COLUMNS}"
                ),
                params![
                    sender.external_id,
                    sender.username,
                    sender.first_name,
                    sender.last_name
                ],
                |row| account_from_row(row, 0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Get an account by internal id.
pub async fn get_account(db: &Database, id: i64) -> Result<Option<Account>, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                params![id],
                |row| account_from_row(row, 0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get an account by transport id.
pub async fn get_account_by_external_id(
    db: &Database,
    external_id: i64,
) -> Result<Option<Account>, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE external_id = ?1"),
                params![external_id],
                |row| account_from_row(row, 0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Flag the account as admin. There is no inverse operation.
pub async fn promote_admin(db: &Database, external_id: i64) -> Result<(), ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE accounts SET is_admin = 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE external_id = ?1 AND is_admin = 0",
                params![external_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
