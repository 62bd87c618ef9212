//! On-disk cache of project names for shell completion.
//!
//! Written opportunistically whenever a full project listing is fetched.
//! Nothing here may fail a command: callers use [`CompletionCache::refresh_projects`],
//! which logs and swallows errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Project;

pub const CACHE_VERSION: u32 = 1;
const CACHE_FILE: &str = "completion.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedProject {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bookmarked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheContents {
    #[serde(default)]
    pub projects: Vec<CachedProject>,
    #[serde(default)]
    pub projects_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u32,
}

/// Completion cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct CompletionCache {
    dir: PathBuf,
}

impl CompletionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$BCQ_CACHE_DIR`, else the platform cache dir plus `bcq`.
    pub fn default_location() -> Option<Self> {
        if let Ok(dir) = std::env::var("BCQ_CACHE_DIR") {
            if !dir.is_empty() {
                return Some(Self::new(dir));
            }
        }
        dirs::cache_dir().map(|d| Self::new(d.join("bcq")))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Missing or corrupt files read as an empty cache.
    pub fn load(&self) -> CacheContents {
        std::fs::read_to_string(self.path())
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(CacheContents {
                version: CACHE_VERSION,
                ..Default::default()
            })
    }

    pub fn save_projects(&self, projects: &[Project]) -> Result<()> {
        let mut contents = self.load();
        contents.projects = projects
            .iter()
            .map(|p| CachedProject {
                id: p.id,
                name: p.name.clone(),
                purpose: p.purpose.clone(),
                bookmarked: p.bookmarked,
            })
            .collect();
        contents.projects_updated_at = Some(Utc::now());
        contents.version = CACHE_VERSION;

        std::fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a concurrent reader never sees a partial file.
        let tmp = self.dir.join(format!("{}.tmp", CACHE_FILE));
        std::fs::write(&tmp, serde_json::to_vec_pretty(&contents)?)?;
        std::fs::rename(&tmp, self.path())?;
        Ok(())
    }

    /// Best-effort refresh; failures are logged, never returned.
    pub fn refresh_projects(&self, projects: &[Project]) {
        if let Err(e) = self.save_projects(projects) {
            tracing::debug!(error = %e, path = %self.path().display(), "completion cache refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: i64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
            description: None,
            purpose: None,
            bookmarked: id == 1,
            dock: vec![],
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CompletionCache::new(dir.path());
        cache
            .save_projects(&[project(1, "HQ"), project(2, "Widgets")])
            .unwrap();

        let loaded = cache.load();
        assert_eq!(loaded.version, CACHE_VERSION);
        assert_eq!(loaded.projects.len(), 2);
        assert!(loaded.projects[0].bookmarked);
        assert!(loaded.projects_updated_at.is_some());
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CompletionCache::new(dir.path());
        std::fs::write(cache.path(), "{not json").unwrap();
        assert!(cache.load().projects.is_empty());
    }

    #[test]
    fn refresh_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // A regular file where the cache directory should be.
        let cache = CompletionCache::new(blocker.join("nested"));
        cache.refresh_projects(&[project(1, "HQ")]);
        assert!(!cache.path().exists());
    }

    #[test]
    fn env_override() {
        temp_env::with_var("BCQ_CACHE_DIR", Some("/tmp/bcq-cache-test"), || {
            let cache = CompletionCache::default_location().unwrap();
            assert_eq!(cache.dir(), Path::new("/tmp/bcq-cache-test"));
        });
    }
}
