// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley support router.

use thiserror::Error;

/// The primary error type used across all Parley adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A conversation, account, or message id that does not exist.
    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A non-admin attempted an admin-restricted action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The request collides with existing state, e.g. a second active conversation.
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        conversation_id: Option<i64>,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The inbound stream has ended; no further events will arrive.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for a missing conversation.
    pub fn conversation_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "conversation",
            id,
        }
    }

    /// Returns true for infrastructure failures (storage, transport, timeouts).
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::Channel { .. }
                | Self::ChannelClosed(_)
                | Self::Timeout { .. }
                | Self::Internal(_)
        )
    }

    /// Short text that is safe to show to an end user.
    ///
    /// Infrastructure failures collapse to a generic apology so that no
    /// internal detail leaks into the chat.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, id } => {
                let mut entity = entity.to_string();
                if let Some(first) = entity.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                format!("❌ {entity} #{id} not found.")
            }
            Self::PermissionDenied(_) => "⛔ You do not have permission for this action.".into(),
            Self::Conflict { message, .. } => format!("⚠️ {message}"),
            Self::Config(_)
            | Self::Storage { .. }
            | Self::Channel { .. }
            | Self::ChannelClosed(_)
            | Self::Timeout { .. }
            | Self::Internal(_) => "❌ Something went wrong, please try again later.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_user_message_names_the_entity() {
        let err = ParleyError::conversation_not_found(42);
        assert_eq!(err.user_message(), "❌ Conversation #42 not found.");
        assert_eq!(err.to_string(), "conversation #42 not found");
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let err = ParleyError::Storage {
            source: Box::new(std::io::Error::other("disk on fire")),
        };
        assert!(err.is_infrastructure());
        assert!(!err.user_message().contains("disk"));
    }

    #[test]
    fn closed_stream_has_its_own_variant() {
        let closed = ParleyError::ChannelClosed("telegram".into());
        assert!(matches!(closed, ParleyError::ChannelClosed(_)));
        assert!(closed.is_infrastructure());

        let send_failure = ParleyError::Channel {
            message: "peer closed connection".into(),
            source: None,
        };
        assert!(!matches!(send_failure, ParleyError::ChannelClosed(_)));
    }

    #[test]
    fn conflict_is_surfaced_verbatim() {
        let err = ParleyError::Conflict {
            message: "You already have ticket #3".into(),
            conversation_id: Some(3),
        };
        assert!(!err.is_infrastructure());
        assert_eq!(err.user_message(), "⚠️ You already have ticket #3");
    }
}
