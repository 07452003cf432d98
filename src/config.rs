//! Runner configuration
//!
//! Resolves the directory layout and the playbook executable from CLI flags
//! and environment overrides. Everything downstream receives these paths
//! explicitly; nothing reads the working directory on its own.

use std::path::{Path, PathBuf};

use crate::error::{Result, RunnerError};

/// Default executable used to run playbooks
pub const DEFAULT_PLAYBOOK_BIN: &str = "ansible-playbook";

/// Environment variable overriding the playbook executable
pub const PLAYBOOK_BIN_ENV: &str = "ANSIBLE_PLAYBOOK_BIN";

/// Directory (under the base dir) holding suite definitions
pub const SUITES_DIR_NAME: &str = "test-suites";

/// Directory (under the base dir) receiving run reports
pub const RESULTS_DIR_NAME: &str = "test-results";

/// Resolved runner configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Automation checkout; playbook paths are relative to it
    pub base_dir: PathBuf,
    /// Where `<id>.json` suite definitions live
    pub suites_dir: PathBuf,
    /// Where reports are written
    pub results_dir: PathBuf,
    /// Program launched once per playbook
    pub playbook_bin: String,
}

impl RunnerConfig {
    /// Build the standard layout under `base_dir`.
    ///
    /// The base dir is made absolute so `AUTOMATION_PATH` handed to playbooks
    /// does not depend on the child's working directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = absolute(base_dir.as_ref())?;
        Ok(Self {
            suites_dir: base_dir.join(SUITES_DIR_NAME),
            results_dir: base_dir.join(RESULTS_DIR_NAME),
            base_dir,
            playbook_bin: DEFAULT_PLAYBOOK_BIN.to_string(),
        })
    }

    /// Resolve from optional CLI values, then environment, then defaults.
    pub fn resolve(base_dir: Option<&Path>, playbook_bin: Option<&str>) -> Result<Self> {
        let base = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let mut config = Self::new(base)?;

        if let Some(bin) = playbook_bin {
            config = config.with_playbook_bin(bin)?;
        } else if let Ok(bin) = std::env::var(PLAYBOOK_BIN_ENV) {
            if !bin.trim().is_empty() {
                config = config.with_playbook_bin(bin)?;
            }
        }

        Ok(config)
    }

    /// Replace the playbook executable
    pub fn with_playbook_bin(mut self, bin: impl Into<String>) -> Result<Self> {
        let bin = bin.into();
        if bin.trim().is_empty() {
            return Err(RunnerError::config("playbook executable must not be empty"));
        }
        self.playbook_bin = bin;
        Ok(self)
    }

    /// Create the results directory if missing
    pub fn ensure_results_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_base_dir() {
        let config = RunnerConfig::new("/opt/automation").unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/opt/automation"));
        assert_eq!(
            config.suites_dir,
            PathBuf::from("/opt/automation/test-suites")
        );
        assert_eq!(
            config.results_dir,
            PathBuf::from("/opt/automation/test-results")
        );
        assert_eq!(config.playbook_bin, DEFAULT_PLAYBOOK_BIN);
    }

    #[test]
    fn test_relative_base_dir_is_made_absolute() {
        let config = RunnerConfig::new("relative/dir").unwrap();
        assert!(config.base_dir.is_absolute());
        assert!(config.base_dir.ends_with("relative/dir"));
    }

    #[test]
    fn test_explicit_playbook_bin_wins() {
        let config = RunnerConfig::resolve(Some(Path::new("/tmp")), Some("sh")).unwrap();
        assert_eq!(config.playbook_bin, "sh");
    }

    #[test]
    fn test_empty_playbook_bin_rejected() {
        let config = RunnerConfig::new("/tmp").unwrap();
        assert!(matches!(
            config.with_playbook_bin("  "),
            Err(RunnerError::Config(_))
        ));
    }
}
