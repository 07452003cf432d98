//! parse-test-env - turn a test notification and spreadsheet row into
//! connection info for the hub cluster

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tracing::{debug, warn};

use suite_runner::cli::ParseCli;
use suite_runner::console;
use suite_runner::envdb::{EnvStatus, EnvStore};
use suite_runner::executor::run_attached;
use suite_runner::logging::init_logging;
use suite_runner::notify::{self, connection_report, EnvData};
use suite_runner::results;

fn main() -> ExitCode {
    init_logging();
    let cli = ParseCli::parse_args();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            console::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn gather(cli: &ParseCli) -> Result<EnvData> {
    if let Some(path) = &cli.load {
        return EnvData::load_from_file(path);
    }
    if cli.is_interactive() {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut stdout = std::io::stdout();
        return notify::read_pasted(&mut input, &mut stdout).context("Failed to read pasted input");
    }

    let mut data = EnvData::default();
    if let Some(path) = &cli.notification {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read notification {}", path.display()))?;
        data.notification = Some(notify::parse_notification(&text));
    }
    if let Some(row) = &cli.row {
        data.cluster = notify::parse_spreadsheet_row(row);
        if data.cluster.is_none() {
            console::warning("⚠ Spreadsheet row needs at least 6 fields; ignored");
        }
    }
    Ok(data)
}

/// Record the environment in the history database; failures only warn
fn remember(cli: &ParseCli, data: &EnvData) {
    let path = match &cli.db {
        Some(path) => Ok(path.clone()),
        None => EnvStore::default_path(),
    };
    let saved = path
        .and_then(EnvStore::open)
        .and_then(|mut store| store.add_environment(data.clone(), EnvStatus::Unknown, ""));
    match saved {
        Ok(name) => console::info(&format!("✓ Saved {name} to environment history")),
        Err(e) => warn!("Could not update environment history: {}", e),
    }
}

/// Offer to write the parsed data next to the other saved configs
fn offer_save(data: &EnvData) -> Result<()> {
    let Some(cluster) = &data.cluster else {
        return Ok(());
    };
    print!("\nSave JSON file? (y/n): ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    if answer.trim().eq_ignore_ascii_case("y") {
        let stamp = results::now().format("%Y%m%d");
        let path = std::env::temp_dir().join(format!("mce-env-{}-{}.json", cluster.hub_cluster, stamp));
        data.save_to_file(&path)?;
        console::info(&format!("✓ Saved to: {}", path.display()));
    }
    Ok(())
}

fn run(cli: &ParseCli) -> Result<bool> {
    let data = gather(cli)?;
    debug!(
        "Parsed notification: {}, cluster: {}",
        data.notification.is_some(),
        data.cluster.is_some()
    );

    println!("{}", connection_report(&data));

    if let Some(path) = &cli.save {
        data.save_to_file(path)?;
        console::info(&format!("✓ Environment data saved to: {}", path.display()));
    } else if cli.is_interactive() && cli.load.is_none() {
        offer_save(&data)?;
    }

    if data.cluster.is_some() && cli.load.is_none() && !cli.no_history {
        remember(cli, &data);
    }

    let Some(cluster) = &data.cluster else {
        if cli.login {
            console::error("Cannot log in without spreadsheet row data");
        }
        return Ok(!cli.login);
    };
    if cli.login {
        console::heading(&format!("\nLogging into {}...", cluster.hub_cluster));
        let status = run_attached(&cluster.login_command()).context("Failed to run oc")?;
        if !status.success() {
            console::error("Login failed");
            return Ok(false);
        }
        console::info("✓ Successfully logged in!");
    }
    Ok(true)
}
