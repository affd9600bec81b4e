//! One-time import of the legacy `repositories.json` sidecar into the
//! SQLite store. Runs at most once per database: success renames the
//! legacy file to `.backup` so a later `open()` doesn't see it again;
//! failure leaves it in place untouched so the caller can retry.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::info;

use crate::error::MetadataError;

#[derive(Debug, Deserialize)]
struct LegacyRepository {
    id: String,
    url: String,
    local_path: String,
    #[serde(default = "default_priority")]
    priority: u8,
    license: Option<String>,
    #[serde(default)]
    skill_count: u64,
    last_updated: DateTime<Utc>,
    #[serde(default = "default_true")]
    auto_update: bool,
}

fn default_priority() -> u8 {
    50
}

fn default_true() -> bool {
    true
}

/// Imports `legacy_path` (a JSON array of [`LegacyRepository`]) into
/// `conn`'s `repositories` table inside a single transaction, then renames
/// the source file to `<name>.backup`. No-op if `legacy_path` doesn't exist
/// or the `repositories` table is already non-empty.
pub(crate) fn migrate_legacy_json(
    conn: &mut Connection,
    legacy_path: &Path,
) -> Result<usize, MetadataError> {
    if !legacy_path.exists() {
        return Ok(0);
    }

    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM repositories", [], |row| row.get(0))?;
    if existing > 0 {
        info!("metadata store already populated, skipping legacy JSON import");
        return Ok(0);
    }

    let raw = std::fs::read_to_string(legacy_path)?;
    let legacy: Vec<LegacyRepository> = serde_json::from_str(&raw)
        .map_err(|e| MetadataError::Corrupt(format!("legacy repositories.json: {e}")))?;

    let tx = conn.transaction()?;
    for repo in &legacy {
        tx.execute(
            "INSERT INTO repositories
                (id, url, local_path, priority, license, skill_count, last_updated, auto_update)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO NOTHING",
            rusqlite::params![
                repo.id,
                repo.url,
                repo.local_path,
                repo.priority,
                repo.license,
                repo.skill_count as i64,
                repo.last_updated.to_rfc3339(),
                repo.auto_update,
            ],
        )?;
    }
    tx.commit()?;

    let backup_path = legacy_path.with_extension("json.backup");
    std::fs::rename(legacy_path, &backup_path)?;
    info!(
        imported = legacy.len(),
        backup = %backup_path.display(),
        "migrated legacy repositories.json into metadata store"
    );

    Ok(legacy.len())
}
