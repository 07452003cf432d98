//! Result records for playbook, suite and run level.
//!
//! `RunResult` doubles as the aggregator: the orchestrator receives it by
//! `&mut` and bumps its counters as playbooks finish. Counters never go down.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Local wall-clock timestamp, serialized ISO-8601 without offset
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Outcome of one playbook launch attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookResult {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub test_case_id: String,
    pub success: bool,
    /// Seconds
    pub duration: f64,
    /// Combined stdout/stderr as captured
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlaybookResult {
    /// Title used by reports: description, else name
    pub fn title(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }
}

/// Results of one suite, in execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    pub id: String,
    pub name: String,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub playbooks: Vec<PlaybookResult>,
    /// Declared playbooks never attempted because of an early stop
    #[serde(default)]
    pub skipped: usize,
}

impl SuiteResult {
    pub fn begin(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_time: now(),
            end_time: None,
            duration: 0.0,
            playbooks: Vec::new(),
            skipped: 0,
        }
    }

    pub fn push(&mut self, result: PlaybookResult) {
        self.playbooks.push(result);
    }

    pub fn finish(&mut self, duration: f64, skipped: usize) {
        self.end_time = Some(now());
        self.duration = duration.max(0.0);
        self.skipped = skipped;
    }

    pub fn passed(&self) -> usize {
        self.playbooks.iter().filter(|p| p.success).count()
    }

    pub fn failed(&self) -> usize {
        self.playbooks.iter().filter(|p| !p.success).count()
    }

    /// Zero failures among executed playbooks
    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

/// Aggregate of a whole invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub total_tests: usize,
    #[serde(default)]
    pub passed: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub suites: Vec<SuiteResult>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub interrupted: bool,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(now());
    }

    pub fn finish(&mut self, duration: f64) {
        self.end_time = Some(now());
        self.duration = duration.max(0.0);
    }

    /// A suite with `declared` playbooks is about to run
    pub fn add_declared(&mut self, declared: usize) {
        self.total_tests += declared;
    }

    /// Count one finished playbook
    pub fn record(&mut self, result: &PlaybookResult) {
        if result.success {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn add_skipped(&mut self, skipped: usize) {
        self.skipped += skipped;
    }

    /// Interruption counts as one failure so the run can never look green
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
        self.failed += 1;
    }

    pub fn push_suite(&mut self, suite: SuiteResult) {
        self.suites.push(suite);
    }

    /// `passed / max(total, 1) * 100`
    pub fn pass_percentage(&self) -> f64 {
        self.passed as f64 / self.total_tests.max(1) as f64 * 100.0
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
