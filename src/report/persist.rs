//! Where reports are written
//!
//! Layout under the results directory:
//!
//! ```text
//! test-results/
//!   2026-02-08/test-run-provision-20260208_145017.json
//!   latest-provision.json
//! ```

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{render, ReportFormat};
use crate::error::Result;
use crate::results::RunResult;

/// Keyword from a suite id: `20-rosa-hcp-provision` becomes `provision`
pub fn suite_label(suite_id: &str) -> String {
    let label = suite_id.trim_start_matches(|c: char| c.is_ascii_digit() || c == '-');

    const KEYWORDS: &[(&[&str], &str)] = &[
        (&["configure"], "configure"),
        (&["provision", "creation"], "provision"),
        (&["delete", "deletion"], "delete"),
        (&["lifecycle"], "lifecycle"),
        (&["verify"], "verify"),
        (&["enable", "disable"], "toggle"),
    ];
    for (needles, keyword) in KEYWORDS {
        if needles.iter().any(|n| label.contains(n)) {
            return keyword.to_string();
        }
    }

    label
        .split(|c: char| c == '-' || c.is_whitespace())
        .find(|word| !word.is_empty())
        .unwrap_or("test")
        .to_string()
}

/// Label for a multi-suite run: `tag-<tags>` when filtered, else `multi`
pub fn batch_label(tags: &[String]) -> String {
    if tags.is_empty() {
        return "multi".to_string();
    }
    let joined = tags.join("-");
    let safe: String = joined
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("tag-{safe}")
}

/// Writes rendered reports into the results directory
#[derive(Debug, Clone)]
pub struct ResultWriter {
    results_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Dated path for one concrete format
    pub fn dated_path(&self, format: ReportFormat, label: Option<&str>, at: NaiveDateTime) -> PathBuf {
        self.results_dir
            .join(at.format("%Y-%m-%d").to_string())
            .join(format!(
                "test-run{}-{}.{}",
                label_part(label),
                at.format("%Y%m%d_%H%M%S"),
                format.extension()
            ))
    }

    /// Stable `latest[-label].ext` path
    pub fn latest_path(&self, format: ReportFormat, label: Option<&str>) -> PathBuf {
        self.results_dir
            .join(format!("latest{}.{}", label_part(label), format.extension()))
    }

    /// Render and write `run` in `format` (expanding `All`).
    ///
    /// Returns the dated paths written; each is mirrored to its latest path.
    pub fn save(
        &self,
        run: &RunResult,
        format: ReportFormat,
        label: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for concrete in format.expand() {
            let content = render(run, concrete)?;
            let dated = self.dated_path(concrete, label, at);
            if let Some(parent) = dated.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dated, &content)?;
            let latest = self.latest_path(concrete, label);
            fs::write(&latest, &content)?;
            debug!("Mirrored {} to {}", dated.display(), latest.display());
            info!("Saved {} report to {}", concrete, dated.display());
            written.push(dated);
        }
        Ok(written)
    }
}

fn label_part(label: Option<&str>) -> String {
    match label {
        Some(l) if !l.is_empty() => format!("-{l}"),
        _ => String::new(),
    }
}
