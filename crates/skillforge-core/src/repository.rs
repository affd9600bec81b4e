//! The [`Repository`] entity: a cloned source of skills.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ids::RepoId;

/// A cloned remote source of skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoId,
    pub url: String,
    pub local_path: PathBuf,
    /// 0-100, default 50.
    pub priority: u8,
    pub license: Option<String>,
    pub skill_count: u64,
    pub last_updated: DateTime<Utc>,
    pub auto_update: bool,
}

impl Repository {
    pub const DEFAULT_PRIORITY: u8 = 50;

    pub fn new(id: RepoId, url: impl Into<String>, local_path: PathBuf) -> Self {
        Self {
            id,
            url: url.into(),
            local_path,
            priority: Self::DEFAULT_PRIORITY,
            license: None,
            skill_count: 0,
            last_updated: Utc::now(),
            auto_update: false,
        }
    }

    /// `now - last_updated > max_age`. Pure predicate; scheduling is owned
    /// by the surrounding server, not by this type.
    pub fn should_update(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_updated) > max_age
    }
}
