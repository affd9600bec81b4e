//! Embedded metadata store for repository sync state.
//!
//! Backed by a single SQLite connection behind a mutex — writers are
//! always serialized, so we reach for a plain connection rather than a
//! pool (per-process write volume here is low: one row touched per
//! repository sync, not per skill).

mod error;
mod migration;
mod schema;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use skillforge_core::{RepoId, Repository};
use tracing::instrument;

pub use error::MetadataError;

/// Embedded, transactional store for [`Repository`] records.
///
/// Cheap to clone: internally an `Arc<Mutex<Connection>>`, so handles can
/// be shared across async tasks without re-opening the database file.
#[derive(Clone)]
pub struct MetadataStore {
    conn: Arc<Mutex<Connection>>,
}

impl MetadataStore {
    /// Opens (creating if absent) the SQLite database at `db_path`.
    ///
    /// If `legacy_json_path` points at an existing `repositories.json`
    /// sidecar and the store is otherwise empty, its contents are imported
    /// once and the source file renamed to `.backup`.
    #[instrument(skip(legacy_json_path), fields(db_path = %db_path.display()))]
    pub fn open(db_path: &Path, legacy_json_path: Option<&Path>) -> Result<Self, MetadataError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(db_path)?;
        schema::ensure_schema(&conn)?;

        if let Some(legacy_path) = legacy_json_path {
            migration::migrate_legacy_json(&mut conn, legacy_path)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory store, useful for tests and ephemeral sessions.
    pub fn open_in_memory() -> Result<Self, MetadataError> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Inserts a new repository record. Fails with
    /// [`MetadataError::ConstraintViolation`] if `repo.id` already exists.
    #[instrument(skip(self, repo), fields(repo_id = %repo.id))]
    pub fn add_repo(&self, repo: &Repository) -> Result<(), MetadataError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO repositories
                (id, url, local_path, priority, license, skill_count, last_updated, auto_update)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                repo.id.as_str(),
                repo.url,
                repo.local_path.to_string_lossy(),
                repo.priority,
                repo.license,
                repo.skill_count as i64,
                repo.last_updated.to_rfc3339(),
                repo.auto_update,
            ],
        )?;
        Ok(())
    }

    /// Replaces an existing repository record in place. Fails with
    /// [`MetadataError::UnknownRepoId`] if no row matches.
    #[instrument(skip(self, repo), fields(repo_id = %repo.id))]
    pub fn update_repo(&self, repo: &Repository) -> Result<(), MetadataError> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE repositories SET
                url = ?2, local_path = ?3, priority = ?4, license = ?5,
                skill_count = ?6, last_updated = ?7, auto_update = ?8
             WHERE id = ?1",
            params![
                repo.id.as_str(),
                repo.url,
                repo.local_path.to_string_lossy(),
                repo.priority,
                repo.license,
                repo.skill_count as i64,
                repo.last_updated.to_rfc3339(),
                repo.auto_update,
            ],
        )?;
        if rows == 0 {
            return Err(MetadataError::UnknownRepoId(repo.id.to_string()));
        }
        Ok(())
    }

    /// Removes a repository record. Cascades to any rows in
    /// `skill_summaries` referencing it. No-op if the id is unknown.
    #[instrument(skip(self))]
    pub fn remove_repo(&self, id: &RepoId) -> Result<(), MetadataError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM repositories WHERE id = ?1", params![id.as_str()])?;
        Ok(())
    }

    /// Fetches a single repository record, or `None` if unknown.
    pub fn get_repo(&self, id: &RepoId) -> Result<Option<Repository>, MetadataError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, url, local_path, priority, license, skill_count, last_updated, auto_update
             FROM repositories WHERE id = ?1",
            params![id.as_str()],
            row_to_repository,
        )
        .optional()
        .map_err(MetadataError::from)
    }

    /// Lists all repositories, ordered by descending priority then id
    /// (matches the resolution-order semantics search and indexing use).
    pub fn list_repos(&self) -> Result<Vec<Repository>, MetadataError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, url, local_path, priority, license, skill_count, last_updated, auto_update
             FROM repositories ORDER BY priority DESC, id ASC",
        )?;
        let rows = stmt
            .query_map([], row_to_repository)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_repository(row: &rusqlite::Row<'_>) -> rusqlite::Result<Repository> {
    let id: String = row.get(0)?;
    let url: String = row.get(1)?;
    let local_path: String = row.get(2)?;
    let priority: u8 = row.get(3)?;
    let license: Option<String> = row.get(4)?;
    let skill_count: i64 = row.get(5)?;
    let skill_count = skill_count as u64;
    let last_updated: String = row.get(6)?;
    let auto_update: bool = row.get(7)?;

    let last_updated = DateTime::parse_from_rfc3339(&last_updated)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Repository {
        id: RepoId::from_raw(id),
        url,
        local_path: PathBuf::from(local_path),
        priority,
        license,
        skill_count,
        last_updated,
        auto_update,
    })
}
