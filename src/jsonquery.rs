//! Rewrites `json_query` filters in Ansible task files into native Jinja
//! attribute access and `selectattr` chains, so the tasks no longer need
//! jmespath on the controller.
//!
//! Only the fixed set of query shapes used by the task library is handled;
//! anything else is left for a human and reported as remaining.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::Result;

/// Marker searched for to decide whether a file still needs work
pub const JSON_QUERY: &str = "json_query";

const QUERY_PREFIX: &str = r#"[ \t]*\|\s*json_query\(['"]"#;
const QUERY_SUFFIX: &str = r#"['"]\)"#;
const DEFAULT_TAIL: &str = r"\s*\|\s*default\((.*?)\)";

struct Rule {
    pattern: Regex,
    replacement: String,
}

impl Rule {
    fn new(pattern: &str, replacement: impl Into<String>) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid json_query rewrite pattern"),
            replacement: replacement.into(),
        }
    }

    /// `| json_query('a.b') | default(x)` to `.a.b | default(x)`
    fn with_default(path: &str) -> Self {
        Self::new(
            &format!("{QUERY_PREFIX}{}{QUERY_SUFFIX}{DEFAULT_TAIL}", regex::escape(path)),
            format!(".{path} | default(${{1}})"),
        )
    }

    /// `| json_query('a.b')` to `.a.b`
    fn bare(path: &str) -> Self {
        Self::new(
            &format!("{QUERY_PREFIX}{}{QUERY_SUFFIX}", regex::escape(path)),
            format!(".{path}"),
        )
    }

    /// `status.conditions[?type==`T` && status==`True`]` to a selectattr chain
    fn true_condition(kind: &str) -> Self {
        Self::new(
            &format!(
                r"{QUERY_PREFIX}status\.conditions\[\?type==`{}`\s+&&\s+status==`True`\]{QUERY_SUFFIX}{DEFAULT_TAIL}",
                regex::escape(kind)
            ),
            format!(
                ".status.conditions | default(${{1}}) | selectattr('type', 'equalto', '{kind}') | selectattr('status', 'equalto', 'True') | list"
            ),
        )
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let mut rules = vec![
        Rule::with_default("metadata.name"),
        Rule::bare("metadata.name"),
        Rule::with_default("items"),
        Rule::bare("items"),
        Rule::with_default("status.subnets"),
        Rule::with_default("status.resources"),
        Rule::with_default("status.conditions"),
    ];
    for arn in ["installerRoleArn", "supportRoleArn", "workerRoleArn", "oidcProviderArn"] {
        rules.push(Rule::with_default(&format!("status.{arn}")));
    }
    rules.push(Rule::true_condition("Ready"));
    rules.push(Rule::true_condition("ROSANetworkReady"));
    rules
});

/// Apply every rewrite rule to `content`
pub fn rewrite(content: &str) -> String {
    RULES.iter().fold(content.to_string(), |text, rule| {
        rule.pattern
            .replace_all(&text, rule.replacement.as_str())
            .into_owned()
    })
}

/// What a pass over a tasks directory did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixReport {
    /// Files rewritten (or that would be, when checking)
    pub fixed: Vec<PathBuf>,
    /// Files that mention json_query but no rule applied to
    pub unchanged: Vec<PathBuf>,
    /// Files still mentioning json_query afterwards
    pub remaining: Vec<PathBuf>,
}

impl FixReport {
    pub fn is_clean(&self) -> bool {
        self.remaining.is_empty()
    }
}

fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "yml"))
        .collect();
    files.sort();
    Ok(files)
}

/// Rewrite every `*.yml` directly under `dir`.
///
/// With `check_only` nothing is written and `remaining` lists every file
/// that currently mentions json_query.
pub fn fix_dir(dir: &Path, check_only: bool) -> Result<FixReport> {
    let mut report = FixReport::default();
    for path in yaml_files(dir)? {
        let content = fs::read_to_string(&path)?;
        if !content.contains(JSON_QUERY) {
            debug!("No json_query in {}", path.display());
            continue;
        }
        let rewritten = rewrite(&content);
        if rewritten == content {
            report.unchanged.push(path.clone());
        } else {
            if !check_only {
                fs::write(&path, &rewritten)?;
                info!("Rewrote json_query usage in {}", path.display());
            }
            report.fixed.push(path.clone());
        }
        let left = if check_only { &content } else { &rewritten };
        if left.contains(JSON_QUERY) {
            report.remaining.push(path);
        }
    }
    Ok(report)
}
