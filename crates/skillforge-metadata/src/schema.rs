//! Logical schema: `repositories` is the single source of truth for sync
//! state; `skill_summaries` is reserved, foreign-key-cascading, and
//! optional per spec §6.3.

use rusqlite::Connection;

use crate::error::MetadataError;

pub(crate) const CURRENT_SCHEMA_VERSION: i64 = 1;

pub(crate) fn ensure_schema(conn: &Connection) -> Result<(), MetadataError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

        CREATE TABLE IF NOT EXISTS repositories (
            id TEXT PRIMARY KEY,
            url TEXT NOT NULL,
            local_path TEXT NOT NULL,
            priority INTEGER NOT NULL,
            license TEXT,
            skill_count INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL,
            auto_update INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS skill_summaries (
            skill_id TEXT PRIMARY KEY,
            repo_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            category TEXT NOT NULL
        );
        ",
    )?;

    let version: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    if version.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }

    Ok(())
}
