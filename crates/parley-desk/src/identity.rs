// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps transport identities to accounts and classifies admins.

use std::collections::HashSet;
use std::sync::Arc;

use parley_core::types::{Account, Sender};
use parley_core::{ParleyError, StorageAdapter};
use tracing::info;

/// A resolved event sender.
#[derive(Debug, Clone)]
pub struct Caller {
    pub account: Account,
    /// Decided by the allow-list, not the stored flag.
    pub is_admin: bool,
}

impl Caller {
    pub fn external_id(&self) -> i64 {
        self.account.external_id
    }

    pub fn require_admin(&self, what: &str) -> Result<(), ParleyError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ParleyError::PermissionDenied(format!(
                "{} is not an admin ({what})",
                self.account.external_id
            )))
        }
    }
}

/// Resolves senders into accounts and reconciles the admin flag.
pub struct IdentityResolver {
    storage: Arc<dyn StorageAdapter>,
    admin_ids: HashSet<i64>,
}

impl IdentityResolver {
    pub fn new(storage: Arc<dyn StorageAdapter>, admin_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            storage,
            admin_ids: admin_ids.into_iter().collect(),
        }
    }

    /// Allow-list check. No I/O.
    pub fn is_admin(&self, external_id: i64) -> bool {
        self.admin_ids.contains(&external_id)
    }

    /// Creates or refreshes the sender's account.
    ///
    /// An allow-listed sender whose stored flag is still unset is promoted;
    /// the flag is never cleared here.
    pub async fn resolve(&self, sender: &Sender) -> Result<Caller, ParleyError> {
        let mut normalized = sender.clone();
        normalized.username = sender
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| {
                if u.starts_with('@') {
                    u.to_string()
                } else {
                    format!("@{u}")
                }
            });

        let mut account = self.storage.upsert_account(&normalized).await?;
        let is_admin = self.is_admin(sender.external_id);
        if is_admin && !account.is_admin {
            self.storage.promote_admin(sender.external_id).await?;
            account.is_admin = true;
            info!(external_id = sender.external_id, "promoted account to admin");
        }

        Ok(Caller { account, is_admin })
    }
}
