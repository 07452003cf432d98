//! run-test-suite - playbook test suite runner
//!
//! Runs one suite, a tag-filtered batch or every suite, prints a summary and
//! saves the reports. Exit status 0 means every playbook passed.

use anyhow::Result;
use clap::CommandFactory;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info, warn};

use suite_runner::cli::Cli;
use suite_runner::config::RunnerConfig;
use suite_runner::console;
use suite_runner::executor::PlaybookExecutor;
use suite_runner::invocation::ExtraVars;
use suite_runner::logging::init_logging;
use suite_runner::orchestrator::SuiteRunner;
use suite_runner::process_guard::{self, Interrupt};
use suite_runner::report::{batch_label, suite_label, ResultWriter};
use suite_runner::results::{self, RunResult};
use suite_runner::suite::SuiteCatalog;

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse_args();
    debug!("CLI arguments parsed: {:?}", cli);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            console::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

/// `key=value` entries; malformed ones are reported and skipped
fn parse_extra_vars(raw: &[String]) -> ExtraVars {
    let mut vars = ExtraVars::new();
    for entry in raw {
        match ExtraVars::parse_assignment(entry) {
            Some((key, value)) => vars.set(key, value),
            None => console::warning(&format!(
                "Warning: Invalid extra var format: {entry} (expected key=value)"
            )),
        }
    }
    vars
}

fn run(cli: Cli) -> Result<bool> {
    let config = RunnerConfig::resolve(cli.base_dir.as_deref(), cli.playbook_bin.as_deref())?;
    info!("Base directory: {}", config.base_dir.display());
    let catalog = SuiteCatalog::new(&config.suites_dir);

    if cli.list {
        console::suite_listing(&catalog.list()?);
        return Ok(true);
    }

    if !cli.has_target() {
        let _ = Cli::command().print_help();
        println!();
        console::error("Specify a suite ID, --all, or --tag");
        return Ok(false);
    }

    let interrupt = Interrupt::new();
    if let Err(e) = process_guard::init_signal_handlers(interrupt.clone()) {
        // Children still die with us through PDEATHSIG
        warn!("Failed to initialize signal handlers: {}", e);
    }

    let executor = PlaybookExecutor::new(&config)
        .with_overrides(&parse_extra_vars(&cli.extra_vars))
        .with_verbosity(cli.verbose)
        .with_dry_run(cli.dry_run);
    let mut runner = SuiteRunner::new(catalog, executor, interrupt.clone());

    let mut run = RunResult::new();
    run.start();
    let start = Instant::now();

    let (mut success, label) = match cli.suite.as_deref() {
        Some(id) if !cli.is_batch() => (runner.run_suite(id, &mut run), suite_label(id)),
        _ => {
            let outcome = runner.run_batch(&cli.tags, &mut run)?;
            (outcome.success(), batch_label(&cli.tags))
        }
    };

    if interrupt.is_triggered() {
        run.mark_interrupted();
        success = false;
        console::warning("\n⚠ Run interrupted; saving partial results");
    }
    run.finish(start.elapsed().as_secs_f64());
    console::final_summary(&run);

    if !cli.no_save {
        config.ensure_results_dir()?;
        let writer = ResultWriter::new(&config.results_dir);
        match writer.save(&run, cli.format, Some(&label), results::now()) {
            Ok(paths) => {
                for path in paths {
                    console::info(&format!("Results saved to: {}", path.display()));
                }
            }
            Err(e) => {
                console::error(&format!("Failed to save results: {e}"));
                success = false;
            }
        }
    }

    Ok(success && run.success())
}
