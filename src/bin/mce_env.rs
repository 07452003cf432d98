//! mce-env - browse and update the MCE environment history

use anyhow::{Context, Result};
use std::process::ExitCode;

use suite_runner::cli::EnvCli;
use suite_runner::console;
use suite_runner::envdb::commands::Session;
use suite_runner::envdb::EnvStore;
use suite_runner::logging::init_logging;

fn main() -> ExitCode {
    init_logging();
    let cli = EnvCli::parse_args();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            console::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &EnvCli) -> Result<ExitCode> {
    let path = match &cli.db {
        Some(path) => path.clone(),
        None => EnvStore::default_path()?,
    };
    let mut store = EnvStore::open(&path)
        .with_context(|| format!("Failed to open environment store {}", path.display()))?;
    let mut stdout = std::io::stdout();

    match cli.command_words() {
        Some(words) => {
            let mut session = Session::new(&mut store, &mut stdout);
            session.dispatch(&words)?;
            Ok(if session.misses() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None => {
            let mut stdin = std::io::stdin().lock();
            Session::new(&mut store, &mut stdout)
                .with_input(&mut stdin)
                .run_interactive()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
