//! Suite definitions and the on-disk catalog
//!
//! A suite is `test-suites/<id>.json`:
//! ```json
//! {
//!   "name": "ROSA HCP Provision",
//!   "description": "Create a hosted control plane cluster",
//!   "tags": ["rosa-hcp", "provision"],
//!   "stopOnFailure": true,
//!   "playbooks": [
//!     { "name": "create", "file": "playbooks/create.yml", "timeout": 3600,
//!       "extra_vars": { "name_prefix": "ci" }, "test_case_id": "RHACM4K-1234" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, RunnerError};

fn unknown_name() -> String {
    "Unknown".to_string()
}

/// One playbook entry of a suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookSpec {
    pub name: String,

    /// Path relative to the base dir; the name is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra_vars: Map<String, Value>,

    /// Seconds before the process group is killed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<String>,
}

impl PlaybookSpec {
    /// Minimal spec, used by tests and programmatic callers
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            description: None,
            extra_vars: Map::new(),
            timeout: None,
            required: None,
            test_case_id: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_test_case_id(mut self, id: impl Into<String>) -> Self {
        self.test_case_id = Some(id.into());
        self
    }

    /// File path relative to the base dir
    pub fn file_path(&self) -> &str {
        self.file.as_deref().unwrap_or(&self.name)
    }

    /// Playbooks are required unless explicitly marked otherwise
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }

    /// Text shown in progress output: description, else name
    pub fn display_name(&self) -> &str {
        match self.description.as_deref() {
            Some(desc) if !desc.is_empty() => desc,
            _ => &self.name,
        }
    }
}

/// A loaded suite definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteDefinition {
    /// File stem; not part of the JSON document
    #[serde(skip)]
    pub id: String,

    #[serde(default = "unknown_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, rename = "stopOnFailure")]
    pub stop_on_failure: bool,

    #[serde(default)]
    pub playbooks: Vec<PlaybookSpec>,
}

impl SuiteDefinition {
    /// Parse a definition from JSON text
    pub fn from_json(id: impl Into<String>, json: &str) -> Result<Self> {
        let id = id.into();
        let mut suite: SuiteDefinition =
            serde_json::from_str(json).map_err(|e| RunnerError::InvalidSuite {
                id: id.clone(),
                reason: e.to_string(),
            })?;
        suite.id = id;
        Ok(suite)
    }

    /// True when any of `filter` is among this suite's tags.
    /// An empty filter matches everything.
    pub fn matches_tags(&self, filter: &[String]) -> bool {
        filter.is_empty() || filter.iter().any(|tag| self.tags.contains(tag))
    }
}

/// Listing entry for `--list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub playbook_count: usize,
}

impl From<&SuiteDefinition> for SuiteSummary {
    fn from(suite: &SuiteDefinition) -> Self {
        Self {
            id: suite.id.clone(),
            name: suite.name.clone(),
            description: suite.description.clone(),
            tags: suite.tags.clone(),
            playbook_count: suite.playbooks.len(),
        }
    }
}

/// Directory of suite definitions
#[derive(Debug, Clone)]
pub struct SuiteCatalog {
    dir: PathBuf,
}

impl SuiteCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the definition file for `id`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Load one suite by id
    pub fn load(&self, id: &str) -> Result<SuiteDefinition> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RunnerError::SuiteNotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        debug!("Loaded suite definition {}", path.display());
        SuiteDefinition::from_json(id, &content)
    }

    /// Every loadable suite, sorted by id. Unreadable or invalid files are
    /// logged and left out.
    pub fn load_all(&self) -> Result<Vec<SuiteDefinition>> {
        let mut ids = self.ids()?;
        ids.sort();

        let mut suites = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(&id) {
                Ok(suite) => suites.push(suite),
                Err(e) => warn!("Skipping suite {}: {}", id, e),
            }
        }
        Ok(suites)
    }

    /// Summaries of every loadable suite, sorted by id
    pub fn list(&self) -> Result<Vec<SuiteSummary>> {
        Ok(self.load_all()?.iter().map(SuiteSummary::from).collect())
    }

    fn ids(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        Ok(ids)
    }
}
