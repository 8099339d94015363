// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.support.conversations_per_page == 0 {
        errors.push(ConfigError::validation(
            "support.conversations_per_page must be at least 1",
        ));
    }
    if config.support.messages_per_page == 0 {
        errors.push(ConfigError::validation(
            "support.messages_per_page must be at least 1",
        ));
    }
    if config.support.subject_max_chars == 0 {
        errors.push(ConfigError::validation(
            "support.subject_max_chars must be at least 1",
        ));
    }
    if config.support.history_limit == 0 {
        errors.push(ConfigError::validation(
            "support.history_limit must be at least 1",
        ));
    }

    let mut seen = HashSet::new();
    for id in &config.telegram.admin_ids {
        if *id <= 0 {
            errors.push(ConfigError::validation(format!(
                "telegram.admin_ids must contain positive user ids, got {id}"
            )));
        }
        if !seen.insert(id) {
            errors.push(ConfigError::validation(format!(
                "telegram.admin_ids lists {id} more than once"
            )));
        }
    }

    if config.gateway.enabled {
        let host = config.gateway.host.trim();
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
        if config.gateway.port == 0 {
            errors.push(ConfigError::validation("gateway.port must not be 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that only matter when the bot is about to connect.
pub fn validate_for_serve(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = match validate_config(config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    let token_present = config
        .telegram
        .bot_token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if !token_present {
        errors.push(ConfigError::MissingKey {
            key: "telegram.bot_token".to_string(),
        });
    }

    if config.telegram.admin_ids.is_empty() {
        errors.push(ConfigError::validation(
            "telegram.admin_ids must list at least one admin",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&ParleyConfig::default()).is_ok());
    }

    #[test]
    fn zero_page_sizes_fail_validation() {
        let mut config = ParleyConfig::default();
        config.support.conversations_per_page = 0;
        config.support.messages_per_page = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "conversations_per_page"));
        assert!(has_message(&errors, "messages_per_page"));
    }

    #[test]
    fn duplicate_and_negative_admin_ids_fail() {
        let mut config = ParleyConfig::default();
        config.telegram.admin_ids = vec![5, -1, 5];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "positive"));
        assert!(has_message(&errors, "more than once"));
    }

    #[test]
    fn gateway_host_checked_only_when_enabled() {
        let mut config = ParleyConfig::default();
        config.gateway.host = "not a host!".to_string();
        assert!(validate_config(&config).is_ok());

        config.gateway.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "gateway.host"));
    }

    #[test]
    fn serve_requires_token_and_admins() {
        let config = ParleyConfig::default();
        let errors = validate_for_serve(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "telegram.bot_token"))
        );
        assert!(has_message(&errors, "at least one admin"));

        let mut config = ParleyConfig::default();
        config.telegram.bot_token = Some("123:abc".into());
        config.telegram.admin_ids = vec![1];
        assert!(validate_for_serve(&config).is_ok());
    }
}
