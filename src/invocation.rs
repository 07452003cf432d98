//! Typed command-line contracts for external processes.
//!
//! Instead of assembling raw string vectors at call sites, each external
//! command is a struct implementing [`CommandArgs`]. The struct definition is
//! the contract; the executor only ever sees `program()` and `to_cli_args()`.

use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Highest verbosity passed to the playbook executable (`-vvvv`)
pub const MAX_VERBOSITY: u8 = 4;

/// Trait for typed process arguments.
///
/// # Contract
///
/// - `program()`: the executable, resolved through `PATH` by the OS.
/// - `to_cli_args()`: every argument after the program, in order.
pub trait CommandArgs {
    /// Executable name or path
    fn program(&self) -> &str;

    /// Arguments exactly as the process should receive them
    fn to_cli_args(&self) -> Vec<String>;

    /// Printable command line for logs and dry-run hints
    fn display_command(&self) -> String {
        let mut parts = vec![self.program().to_string()];
        parts.extend(self.to_cli_args());
        parts.join(" ")
    }
}

/// Ordered variable set with last-writer-wins semantics.
///
/// Insertion order is kept; overwriting a key keeps its original position,
/// so the generated `-e` list is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraVars {
    entries: Vec<(String, String)>,
}

impl ExtraVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Overlay `other` on top of `self`; `other` wins on collisions
    pub fn merge(&mut self, other: &ExtraVars) {
        for (key, value) in &other.entries {
            self.set(key.clone(), value.clone());
        }
    }

    /// Variables from a suite's `extra_vars` object. Strings are passed
    /// verbatim; numbers, booleans and nested values as their JSON text.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut vars = Self::new();
        for (key, value) in map {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            vars.set(key.clone(), rendered);
        }
        vars
    }

    /// Parse one `key=value` CLI argument. Only the first `=` splits.
    pub fn parse_assignment(raw: &str) -> Option<(String, String)> {
        let (key, value) = raw.split_once('=')?;
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtraVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (k, v) in iter {
            vars.set(k, v);
        }
        vars
    }
}

impl fmt::Display for ExtraVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// One `ansible-playbook` launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookInvocation {
    pub program: String,
    pub playbook: PathBuf,
    pub verbosity: u8,
    pub vars: ExtraVars,
}

impl PlaybookInvocation {
    /// Build the invocation from spec-level variables and caller overrides.
    ///
    /// Overrides win on key collision. Dry-run is signalled to the playbook
    /// as `dry_run=true`; the argv shape does not change.
    pub fn new(
        program: impl Into<String>,
        playbook: impl Into<PathBuf>,
        spec_vars: &ExtraVars,
        overrides: &ExtraVars,
        verbosity: u8,
        dry_run: bool,
    ) -> Self {
        let mut vars = spec_vars.clone();
        vars.merge(overrides);
        if dry_run {
            vars.set("dry_run", "true");
        }
        Self {
            program: program.into(),
            playbook: playbook.into(),
            verbosity,
            vars,
        }
    }

    /// `-v` flag for the configured verbosity, capped at `-vvvv`
    pub fn verbosity_flag(&self) -> Option<String> {
        if self.verbosity == 0 {
            return None;
        }
        let level = self.verbosity.min(MAX_VERBOSITY) as usize;
        Some(format!("-{}", "v".repeat(level)))
    }
}

impl CommandArgs for PlaybookInvocation {
    fn program(&self) -> &str {
        &self.program
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![self.playbook.display().to_string()];
        if let Some(flag) = self.verbosity_flag() {
            args.push(flag);
        }
        for (key, value) in self.vars.iter() {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args
    }
}
