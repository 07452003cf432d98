use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::report::ReportFormat;

/// Run ROSA HCP playbook test suites
#[derive(Parser, Debug)]
#[command(name = "run-test-suite")]
#[command(about = "Run Ansible playbook test suites and write JSON/HTML/JUnit reports")]
#[command(version)]
pub struct Cli {
    /// Suite id (file name under test-suites/ without .json)
    pub suite: Option<String>,

    /// Run every suite
    #[arg(long)]
    pub all: bool,

    /// Run suites carrying this tag (repeatable; any tag matches)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// List available suites and exit
    #[arg(long)]
    pub list: bool,

    /// Report format to save
    #[arg(long, value_enum, default_value_t = ReportFormat::All)]
    pub format: ReportFormat,

    /// Do not write reports
    #[arg(long)]
    pub no_save: bool,

    /// Extra variable for every playbook, `key=value` (repeatable)
    #[arg(short = 'e', long = "extra-vars", value_name = "KEY=VALUE")]
    pub extra_vars: Vec<String>,

    /// Ask playbooks to simulate (passes dry_run=true)
    #[arg(long)]
    pub dry_run: bool,

    /// Playbook verbosity; repeat for more (-vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Automation checkout containing test-suites/ (default: current dir)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Playbook executable (default: $ANSIBLE_PLAYBOOK_BIN or ansible-playbook)
    #[arg(long, value_name = "BIN")]
    pub playbook_bin: Option<String>,
}

impl Cli {
    /// Parse argv; usage errors exit 1 like every other failed run
    pub fn parse_args() -> Self {
        match <Self as clap::Parser>::try_parse() {
            Ok(cli) => cli,
            Err(e) => {
                let _ = e.print();
                std::process::exit(if e.use_stderr() { 1 } else { 0 });
            }
        }
    }

    /// Whether this invocation selects a batch rather than one suite
    pub fn is_batch(&self) -> bool {
        self.all || !self.tags.is_empty()
    }

    /// Whether there is anything to run or list
    pub fn has_target(&self) -> bool {
        self.list || self.suite.is_some() || self.is_batch()
    }
}

/// Track and reconnect to MCE test environments
#[derive(Parser, Debug)]
#[command(name = "mce-env")]
#[command(about = "MCE environment history: list, search, update and log in")]
#[command(version)]
pub struct EnvCli {
    /// Interactive selector (the default with no other flag)
    #[arg(short, long)]
    pub select: bool,

    /// List all environments
    #[arg(short, long)]
    pub list: bool,

    /// Show statistics
    #[arg(long)]
    pub stats: bool,

    /// Search by keyword
    #[arg(long, value_name = "QUERY")]
    pub search: Option<String>,

    /// Set the test status of an environment
    #[arg(long, num_args = 2, value_names = ["CLUSTER", "STATUS"])]
    pub update_status: Option<Vec<String>>,

    /// Delete an environment
    #[arg(long, value_name = "CLUSTER")]
    pub delete: Option<String>,

    /// Set notes on an environment
    #[arg(long, num_args = 2, value_names = ["CLUSTER", "NOTES"])]
    pub add_notes: Option<Vec<String>>,

    /// Database file (default: $MCE_ENV_DB or ~/.mce-environments.json)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

impl EnvCli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// The store command these flags stand for; `None` means interactive
    pub fn command_words(&self) -> Option<Vec<String>> {
        let words = |parts: &[&str]| -> Option<Vec<String>> { Some(parts.iter().map(|s| s.to_string()).collect()) };
        if self.select {
            return None;
        }
        if self.list {
            return words(&["list"]);
        }
        if self.stats {
            return words(&["stats"]);
        }
        if let Some(query) = &self.search {
            return words(&["search", query.as_str()]);
        }
        if let Some(args) = &self.update_status {
            let mut w = vec!["status".to_string()];
            w.extend(args.iter().cloned());
            return Some(w);
        }
        if let Some(cluster) = &self.delete {
            return words(&["delete", cluster.as_str()]);
        }
        if let Some(args) = &self.add_notes {
            let mut w = vec!["notes".to_string()];
            w.extend(args.iter().cloned());
            return Some(w);
        }
        None
    }
}

/// Turn test notifications and spreadsheet rows into connection info
#[derive(Parser, Debug)]
#[command(name = "parse-test-env")]
#[command(about = "Parse MCE test notifications and generate connection info")]
#[command(version)]
pub struct ParseCli {
    /// Notification message file
    #[arg(short, long, value_name = "FILE")]
    pub notification: Option<PathBuf>,

    /// Spreadsheet row (quoted)
    #[arg(short, long, value_name = "TEXT")]
    pub row: Option<String>,

    /// Load previously saved environment data instead of parsing
    #[arg(short, long, value_name = "FILE")]
    pub load: Option<PathBuf>,

    /// Save parsed environment data as JSON
    #[arg(short, long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Paste notification and row at prompts (the default with no input flag)
    #[arg(short, long)]
    pub interactive: bool,

    /// Run oc login once parsed
    #[arg(long)]
    pub login: bool,

    /// Do not record the environment in the history database
    #[arg(long)]
    pub no_history: bool,

    /// History database (default: $MCE_ENV_DB or ~/.mce-environments.json)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

impl ParseCli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive || (self.notification.is_none() && self.row.is_none() && self.load.is_none())
    }
}

/// Replace json_query filters in task files with native Jinja filters
#[derive(Parser, Debug)]
#[command(name = "fix-json-query")]
#[command(about = "Rewrite json_query filters in Ansible task files")]
#[command(version)]
pub struct FixCli {
    /// Directory of *.yml task files
    pub tasks_dir: PathBuf,

    /// Report what would change without writing
    #[arg(long)]
    pub check: bool,
}

impl FixCli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args_has_no_target() {
        let cli = Cli::try_parse_from(["run-test-suite"]).unwrap();
        assert!(!cli.has_target());
        assert_eq!(cli.format, ReportFormat::All);
    }

    #[test]
    fn test_cli_single_suite() {
        let cli = Cli::try_parse_from([
            "run-test-suite",
            "20-rosa-hcp-provision",
            "-e",
            "name_prefix=ci",
            "--extra-vars",
            "region=us-east-1",
            "-vvv",
            "--format",
            "junit",
        ])
        .unwrap();
        assert_eq!(cli.suite.as_deref(), Some("20-rosa-hcp-provision"));
        assert_eq!(cli.extra_vars, vec!["name_prefix=ci", "region=us-east-1"]);
        assert_eq!(cli.verbose, 3);
        assert_eq!(cli.format, ReportFormat::Junit);
        assert!(!cli.is_batch());
    }

    #[test]
    fn test_cli_repeatable_tags() {
        let cli = Cli::try_parse_from(["run-test-suite", "--tag", "smoke", "--tag", "capa"]).unwrap();
        assert_eq!(cli.tags, vec!["smoke", "capa"]);
        assert!(cli.is_batch());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["run-test-suite", "--all", "--format", "yaml"]).is_err());
    }

    #[test]
    fn test_env_cli_flags_map_to_commands() {
        let cli = EnvCli::try_parse_from(["mce-env", "--update-status", "hub-1", "pass"]).unwrap();
        assert_eq!(
            cli.command_words(),
            Some(vec!["status".to_string(), "hub-1".to_string(), "pass".to_string()])
        );

        let cli = EnvCli::try_parse_from(["mce-env", "--add-notes", "hub-1", "needs rerun"]).unwrap();
        assert_eq!(cli.command_words().unwrap()[2], "needs rerun");

        let cli = EnvCli::try_parse_from(["mce-env"]).unwrap();
        assert!(cli.command_words().is_none());
    }

    #[test]
    fn test_env_cli_update_status_needs_two_values() {
        assert!(EnvCli::try_parse_from(["mce-env", "--update-status", "hub-1"]).is_err());
    }

    #[test]
    fn test_parse_cli_defaults_to_interactive() {
        assert!(ParseCli::try_parse_from(["parse-test-env"]).unwrap().is_interactive());
        let cli = ParseCli::try_parse_from(["parse-test-env", "--row", "a\tb"]).unwrap();
        assert!(!cli.is_interactive());
    }

    #[test]
    fn test_fix_cli() {
        let cli = FixCli::try_parse_from(["fix-json-query", "tasks", "--check"]).unwrap();
        assert_eq!(cli.tasks_dir, PathBuf::from("tasks"));
        assert!(cli.check);
    }
}
