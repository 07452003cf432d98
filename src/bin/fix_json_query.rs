//! fix-json-query - replace json_query filters in Ansible task files

use anyhow::{bail, Context, Result};
use std::process::ExitCode;

use suite_runner::cli::FixCli;
use suite_runner::console;
use suite_runner::jsonquery::fix_dir;
use suite_runner::logging::init_logging;

fn main() -> ExitCode {
    init_logging();
    let cli = FixCli::parse_args();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            console::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &FixCli) -> Result<bool> {
    if !cli.tasks_dir.is_dir() {
        bail!("Not a directory: {}", cli.tasks_dir.display());
    }
    let report = fix_dir(&cli.tasks_dir, cli.check)
        .with_context(|| format!("Failed to process {}", cli.tasks_dir.display()))?;

    let verb = if cli.check { "Would fix" } else { "Fixed" };
    for path in &report.fixed {
        println!("  ✓ {verb} {}", path.display());
    }
    for path in &report.unchanged {
        println!("  - No rewrite rule applies to {}", path.display());
    }
    console::heading(&format!("\nSummary: {verb} {} files", report.fixed.len()));

    if report.is_clean() {
        console::info("\n✓ All json_query usage removed!");
        return Ok(true);
    }
    console::warning(&format!(
        "\n⚠️  Warning: {} files still have json_query:",
        report.remaining.len()
    ));
    for path in &report.remaining {
        println!("  - {}", path.display());
    }
    Ok(false)
}
