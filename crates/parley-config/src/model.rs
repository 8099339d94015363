// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley support router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use parley_core::types::Variant;
use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram transport and admin allow-list.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Conversation behaviour and pagination.
    #[serde(default)]
    pub support: SupportConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Optional HTTP admin API.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl ParleyConfig {
    /// Whether `external_id` is on the static admin allow-list.
    pub fn is_admin(&self, external_id: i64) -> bool {
        self.telegram.admin_ids.contains(&external_id)
    }
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Name used in logs and the welcome message.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "parley".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user ids treated as admins.
    #[serde(default)]
    pub admin_ids: Vec<i64>,
}

/// Conversation behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupportConfig {
    /// `ticketed` or `threaded`.
    #[serde(default)]
    pub variant: Variant,

    /// Conversations per page in admin lists.
    #[serde(default = "default_conversations_per_page")]
    pub conversations_per_page: u32,

    /// Messages per page in a conversation view.
    #[serde(default = "default_messages_per_page")]
    pub messages_per_page: u32,

    /// Characters of the first message kept as a ticket subject.
    #[serde(default = "default_subject_max_chars")]
    pub subject_max_chars: usize,

    /// Upper bound on messages sent by a detailed-history request.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            conversations_per_page: default_conversations_per_page(),
            messages_per_page: default_messages_per_page(),
            subject_max_chars: default_subject_max_chars(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_conversations_per_page() -> u32 {
    5
}

fn default_messages_per_page() -> u32 {
    10
}

fn default_subject_max_chars() -> usize {
    50
}

fn default_history_limit() -> u32 {
    200
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "parley.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Serve the admin API alongside the bot.
    #[serde(default)]
    pub enabled: bool,

    /// Address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}
