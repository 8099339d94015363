// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley stats` command implementation.
//!
//! Reads conversation counts straight from the database, so it works
//! whether or not the bot is running.

use std::fmt::Write as _;
use std::sync::Arc;

use parley_config::model::ParleyConfig;
use parley_core::{ParleyError, StorageAdapter};
use parley_desk::{ConversationStore, Stats};
use parley_storage::SqliteStorage;

pub async fn run_stats(config: &ParleyConfig, json: bool) -> Result<(), ParleyError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let store = ConversationStore::new(
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        &config.support,
    );
    let stats = store.stats().await?;
    storage.close().await?;

    if json {
        println!("{}", stats_json(&stats));
    } else {
        print!("{}", stats_table(&stats));
    }
    Ok(())
}

fn stats_json(stats: &Stats) -> serde_json::Value {
    let by_status: serde_json::Map<String, serde_json::Value> = stats
        .by_status
        .iter()
        .map(|(status, count)| (status.to_string(), (*count).into()))
        .collect();
    serde_json::json!({
        "variant": stats.variant.to_string(),
        "by_status": by_status,
        "total": stats.total,
        "needs_attention": stats.needs_attention,
    })
}

fn stats_table(stats: &Stats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "variant          {}", stats.variant);
    for (status, count) in &stats.by_status {
        let _ = writeln!(out, "{:<16} {count}", status.to_string());
    }
    let _ = writeln!(out, "{:<16} {}", "total", stats.total);
    let _ = writeln!(out, "{:<16} {}", "needs attention", stats.needs_attention);
    out
}

#[cfg(test)]
mod tests {
    use parley_core::types::{ConversationStatus, Variant};

    use super::*;

    fn sample() -> Stats {
        Stats {
            variant: Variant::Ticketed,
            by_status: vec![
                (ConversationStatus::Open, 2),
                (ConversationStatus::Answered, 1),
                (ConversationStatus::Closed, 4),
            ],
            total: 7,
            needs_attention: 2,
        }
    }

    #[test]
    fn json_keys_use_status_names() {
        let value = stats_json(&sample());
        assert_eq!(value["variant"], "ticketed");
        assert_eq!(value["by_status"]["closed"], 4);
        assert_eq!(value["total"], 7);
    }

    #[test]
    fn table_lists_every_status() {
        let table = stats_table(&sample());
        assert!(table.contains("open"));
        assert!(table.contains("answered"));
        assert!(table.lines().any(|l| l.starts_with("total") && l.ends_with('7')));
    }

    #[tokio::test]
    async fn stats_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ParleyConfig::default();
        config.storage.database_path = dir.path().join("stats.db").to_string_lossy().into_owned();
        assert!(run_stats(&config, true).await.is_ok());
    }
}
