//! Environment history store
//!
//! One JSON document holds every environment ever parsed:
//!
//! ```json
//! {"version": "1.0", "environments": [ ... ]}
//! ```
//!
//! The whole document is rewritten after every mutation. There is no
//! locking; concurrent writers race and the last one wins.

pub mod commands;
pub mod format;
pub mod record;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, RunnerError};
use crate::notify::EnvData;

pub use record::{EnvStatus, EnvironmentRecord};

/// Environment variable overriding the database location
pub const ENV_DB_VAR: &str = "MCE_ENV_DB";

/// File name under the home directory
pub const DEFAULT_DB_FILE: &str = ".mce-environments.json";

const DB_VERSION: &str = "1.0";

fn default_version() -> String {
    DB_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EnvDatabase {
    #[serde(default)]
    environments: Vec<EnvironmentRecord>,
    #[serde(default = "default_version")]
    version: String,
}

impl Default for EnvDatabase {
    fn default() -> Self {
        Self {
            environments: Vec::new(),
            version: default_version(),
        }
    }
}

/// Aggregate counts over the store
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStats<'a> {
    pub total: usize,
    pub by_platform: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    /// Five most recently accessed
    pub recent: Vec<&'a EnvironmentRecord>,
}

const RECENT_LIMIT: usize = 5;

/// File-backed environment store
#[derive(Debug)]
pub struct EnvStore {
    path: PathBuf,
    db: EnvDatabase,
}

impl EnvStore {
    /// `$MCE_ENV_DB`, else `~/.mce-environments.json`
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(ENV_DB_VAR).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_DB_FILE))
            .ok_or_else(|| RunnerError::config("Cannot determine home directory for environment store"))
    }

    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                RunnerError::store(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            debug!("No environment store at {}, starting empty", path.display());
            EnvDatabase::default()
        };
        Ok(Self { path, db })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in storage order
    pub fn environments(&self) -> &[EnvironmentRecord] {
        &self.db.environments
    }

    pub fn len(&self) -> usize {
        self.db.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.environments.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.db)?)?;
        debug!("Saved {} environments to {}", self.len(), self.path.display());
        Ok(())
    }

    fn position(&self, cluster_name: &str) -> Option<usize> {
        self.db
            .environments
            .iter()
            .position(|e| e.cluster_name == cluster_name)
    }

    /// Insert or replace the record for `data`'s hub cluster.
    ///
    /// A replaced record keeps its original `added_date`. Returns the key.
    pub fn add_environment(&mut self, data: EnvData, status: EnvStatus, notes: &str) -> Result<String> {
        let mut record = EnvironmentRecord::new(data, status, notes);
        let name = record.cluster_name.clone();
        match self.position(&name) {
            Some(idx) => {
                record.added_date = self.db.environments[idx].added_date;
                self.db.environments[idx] = record;
                info!("Updated environment {}", name);
            }
            None => {
                self.db.environments.push(record);
                info!("Added environment {}", name);
            }
        }
        self.save()?;
        Ok(name)
    }

    /// Look up by exact name, refreshing its last-accessed time
    pub fn get(&mut self, cluster_name: &str) -> Result<Option<EnvironmentRecord>> {
        let Some(idx) = self.position(cluster_name) else {
            return Ok(None);
        };
        self.db.environments[idx].touch();
        self.save()?;
        Ok(Some(self.db.environments[idx].clone()))
    }

    /// Set status and/or notes. Empty notes leave the old notes alone.
    ///
    /// Returns whether the environment exists.
    pub fn update(&mut self, cluster_name: &str, status: Option<EnvStatus>, notes: Option<&str>) -> Result<bool> {
        let Some(idx) = self.position(cluster_name) else {
            return Ok(false);
        };
        let record = &mut self.db.environments[idx];
        if let Some(status) = status {
            record.status = status;
        }
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            record.notes = notes.to_string();
        }
        record.touch();
        self.save()?;
        Ok(true)
    }

    /// Filtered listing, most recently accessed first
    pub fn list(&self, platform: Option<&str>, status: Option<EnvStatus>) -> Vec<&EnvironmentRecord> {
        let platform = platform.map(str::to_lowercase);
        let mut envs: Vec<_> = self
            .db
            .environments
            .iter()
            .filter(|e| match &platform {
                Some(p) => e.platform.to_lowercase().contains(p),
                None => true,
            })
            .filter(|e| status.is_none_or(|s| e.status == s))
            .collect();
        envs.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        envs
    }

    /// Case-insensitive search in storage order
    pub fn search(&self, query: &str) -> Vec<&EnvironmentRecord> {
        self.db
            .environments
            .iter()
            .filter(|e| e.matches(query))
            .collect()
    }

    /// Remove by exact name. Returns whether anything was removed.
    pub fn delete(&mut self, cluster_name: &str) -> Result<bool> {
        let before = self.len();
        self.db.environments.retain(|e| e.cluster_name != cluster_name);
        if self.len() == before {
            return Ok(false);
        }
        self.save()?;
        info!("Deleted environment {}", cluster_name);
        Ok(true)
    }

    pub fn stats(&self) -> EnvStats<'_> {
        let mut by_platform = BTreeMap::new();
        let mut by_status = BTreeMap::new();
        for env in &self.db.environments {
            *by_platform.entry(env.platform.clone()).or_insert(0) += 1;
            *by_status.entry(env.status.to_string()).or_insert(0) += 1;
        }
        let mut recent = self.list(None, None);
        recent.truncate(RECENT_LIMIT);
        EnvStats {
            total: self.len(),
            by_platform,
            by_status,
            recent,
        }
    }
}
