// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-admin reply sessions.
//!
//! A session records which conversation an admin's next plain message
//! belongs to. Sessions live in process memory only; a restart detaches
//! every admin.

use std::collections::HashMap;
use std::sync::RwLock;

use parley_core::types::Variant;
use tracing::debug;

/// Session state of one admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminSession {
    #[default]
    Idle,
    RepliesTo(i64),
}

/// Reply targets keyed by admin external id.
///
/// One lock guards the whole map. Every method is a single critical
/// section, so a read-modify-write on one admin never observes a partial
/// update and never touches another admin's entry.
#[derive(Debug, Default)]
pub struct SessionStore {
    targets: RwLock<HashMap<i64, i64>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, admin: i64) -> AdminSession {
        match self.current_target(admin) {
            Some(id) => AdminSession::RepliesTo(id),
            None => AdminSession::Idle,
        }
    }

    pub fn current_target(&self, admin: i64) -> Option<i64> {
        let targets = self.targets.read().unwrap_or_else(|e| e.into_inner());
        targets.get(&admin).copied()
    }

    /// `Idle -> RepliesTo(c)`, or retargets an existing session.
    pub fn begin_reply(&self, admin: i64, conversation_id: i64) {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        targets.insert(admin, conversation_id);
        debug!(admin_id = admin, conversation_id, "reply session started");
    }

    /// `RepliesTo(c) -> Idle`. Returns the previous target.
    pub fn clear(&self, admin: i64) -> Option<i64> {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        let previous = targets.remove(&admin);
        if let Some(conversation_id) = previous {
            debug!(admin_id = admin, conversation_id, "reply session cleared");
        }
        previous
    }

    /// Clears the session only while it still points at `conversation_id`.
    pub fn clear_if_target(&self, admin: i64, conversation_id: i64) -> bool {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        if targets.get(&admin) == Some(&conversation_id) {
            targets.remove(&admin);
            debug!(admin_id = admin, conversation_id, "reply session cleared");
            true
        } else {
            false
        }
    }

    /// Transition applied after one reply to `conversation_id` was sent.
    ///
    /// Ticketed sessions end; threaded sessions stay attached. A session
    /// that was retargeted meanwhile is left alone.
    pub fn after_reply(&self, admin: i64, conversation_id: i64, variant: Variant) -> AdminSession {
        if !variant.keeps_session_after_reply() {
            self.clear_if_target(admin, conversation_id);
        }
        self.state(admin)
    }

    /// Number of admins currently attached to a conversation.
    pub fn active_count(&self) -> usize {
        self.targets.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn sessions_start_idle() {
        let sessions = SessionStore::new();
        assert_eq!(sessions.state(1), AdminSession::Idle);
        assert_eq!(sessions.current_target(1), None);
    }

    #[test]
    fn admins_do_not_share_sessions() {
        let sessions = SessionStore::new();
        sessions.begin_reply(1, 5);
        assert_eq!(sessions.state(1), AdminSession::RepliesTo(5));
        assert_eq!(sessions.state(2), AdminSession::Idle);

        sessions.begin_reply(2, 9);
        assert_eq!(sessions.clear(1), Some(5));
        assert_eq!(sessions.state(1), AdminSession::Idle);
        assert_eq!(sessions.state(2), AdminSession::RepliesTo(9));
    }

    #[test]
    fn ticketed_reply_ends_the_session() {
        let sessions = SessionStore::new();
        sessions.begin_reply(1, 7);
        assert_eq!(
            sessions.after_reply(1, 7, Variant::Ticketed),
            AdminSession::Idle
        );
    }

    #[test]
    fn threaded_reply_keeps_the_session() {
        let sessions = SessionStore::new();
        sessions.begin_reply(1, 7);
        assert_eq!(
            sessions.after_reply(1, 7, Variant::Threaded),
            AdminSession::RepliesTo(7)
        );
    }

    #[test]
    fn retargeted_session_survives_stale_clear() {
        let sessions = SessionStore::new();
        sessions.begin_reply(1, 7);
        sessions.begin_reply(1, 8);
        assert!(!sessions.clear_if_target(1, 7));
        assert_eq!(sessions.state(1), AdminSession::RepliesTo(8));
        assert_eq!(
            sessions.after_reply(1, 7, Variant::Ticketed),
            AdminSession::RepliesTo(8)
        );
    }

    #[test]
    fn concurrent_admins_keep_their_own_targets() {
        let sessions = Arc::new(SessionStore::new());
        let handles: Vec<_> = (1..=16)
            .map(|admin| {
                let sessions = Arc::clone(&sessions);
                std::thread::spawn(move || {
                    for round in 0..100 {
                        sessions.begin_reply(admin, admin * 1000 + round);
                        assert_eq!(sessions.current_target(admin), Some(admin * 1000 + round));
                        if round % 3 == 1 {
                            sessions.clear(admin);
                            assert_eq!(sessions.current_target(admin), None);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sessions.active_count(), 16);
        assert_eq!(sessions.current_target(3), Some(3099));
    }
}
