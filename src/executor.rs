//! Playbook execution
//!
//! This module is the only place that launches playbook processes. Every
//! launch goes through [`run_streaming`], which:
//!
//! - Spawns the child in a new process group registered for interrupt cleanup
//! - Points stdout and stderr at one pipe so output keeps its interleaving
//! - Echoes each line as it arrives (long silent runs trip CI watchdogs)
//!   while keeping a copy for the result
//! - Enforces the playbook timeout by killing the whole group
//!
//! Process-level failures never escape as errors: [`PlaybookExecutor::run`]
//! folds them into a failed [`PlaybookResult`].

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::console;
use crate::invocation::{CommandArgs, ExtraVars, PlaybookInvocation};
use crate::process_guard::{kill_group, CommandProcessGroup, RegisteredChild};
use crate::results::PlaybookResult;
use crate::suite::PlaybookSpec;

/// Variable every playbook receives unless overridden on the command line
pub const AUTOMATION_PATH_VAR: &str = "AUTOMATION_PATH";

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a killed process's last lines may take to reach the reader
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Seam between orchestration and process launching
pub trait PlaybookLauncher {
    /// Run one playbook to completion. Never fails; failures are results.
    fn launch(&mut self, spec: &PlaybookSpec) -> PlaybookResult;

    /// Whether playbooks are being told to simulate
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// How a streamed process ended
#[derive(Debug)]
pub enum StreamOutcome {
    Exited(ExitStatus),
    TimedOut,
}

/// Captured output plus outcome of [`run_streaming`]
#[derive(Debug)]
pub struct StreamedProcess {
    pub output: String,
    pub outcome: StreamOutcome,
}

/// Launch `args` in `cwd`, stream its combined output and wait for it.
///
/// Returns `Err` only when the process could not be started or its exit
/// status could not be collected.
pub fn run_streaming<T: CommandArgs>(
    args: &T,
    cwd: &Path,
    timeout: Option<Duration>,
) -> std::io::Result<StreamedProcess> {
    let (reader, writer) = std::io::pipe()?;
    let writer_err = writer.try_clone()?;

    debug!("Launching: {}", args.display_command());
    let mut command = Command::new(args.program());
    command
        .args(args.to_cli_args())
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_err)
        .in_new_process_group();

    let spawned = command.spawn();
    // Our copies of the write end must go, or the reader never sees EOF
    drop(command);
    let mut child = spawned?;
    let pid = child.id();
    let _registration = RegisteredChild::new(pid);

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed reading output of process {}: {}", pid, e);
                    break;
                }
            }
        }
    });

    let deadline = timeout.map(|t| Instant::now() + t);
    let mut output = String::new();

    loop {
        let received = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    Err(RecvTimeoutError::Timeout)
                } else {
                    rx.recv_timeout(remaining)
                }
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(line) => {
                console::stream_line(&line);
                output.push_str(&line);
            }
            Err(RecvTimeoutError::Timeout) => {
                info!("Process {} exceeded its timeout, killing group", pid);
                kill_group(pid);
                child.wait()?;
                drain_output(&rx, &mut output);
                return Ok(StreamedProcess {
                    output,
                    outcome: StreamOutcome::TimedOut,
                });
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Output closed; the process may still be running
    let status = match deadline {
        None => child.wait()?,
        Some(deadline) => loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                kill_group(pid);
                child.wait()?;
                return Ok(StreamedProcess {
                    output,
                    outcome: StreamOutcome::TimedOut,
                });
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        },
    };

    Ok(StreamedProcess {
        output,
        outcome: StreamOutcome::Exited(status),
    })
}

/// Collect lines the reader thread still holds after the process was killed
fn drain_output(rx: &mpsc::Receiver<String>, output: &mut String) {
    while let Ok(line) = rx.recv_timeout(DRAIN_GRACE) {
        console::stream_line(&line);
        output.push_str(&line);
    }
}

/// Run a command attached to the terminal (interactive tools like `oc login`)
pub fn run_attached<T: CommandArgs>(args: &T) -> std::io::Result<ExitStatus> {
    info!("Running attached: {}", args.display_command());
    Command::new(args.program()).args(args.to_cli_args()).status()
}

/// Launches `ansible-playbook` (or a configured stand-in) per playbook
#[derive(Debug, Clone)]
pub struct PlaybookExecutor {
    base_dir: PathBuf,
    program: String,
    overrides: ExtraVars,
    verbosity: u8,
    dry_run: bool,
}

impl PlaybookExecutor {
    /// Executor for `config`, with `AUTOMATION_PATH` preset to the base dir
    pub fn new(config: &RunnerConfig) -> Self {
        let mut overrides = ExtraVars::new();
        overrides.set(AUTOMATION_PATH_VAR, config.base_dir.display().to_string());
        Self {
            base_dir: config.base_dir.clone(),
            program: config.playbook_bin.clone(),
            overrides,
            verbosity: 0,
            dry_run: false,
        }
    }

    /// Layer caller variables over the defaults
    pub fn with_overrides(mut self, vars: &ExtraVars) -> Self {
        self.overrides.merge(vars);
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn overrides(&self) -> &ExtraVars {
        &self.overrides
    }

    /// Absolute path of the spec's playbook file
    pub fn playbook_path(&self, spec: &PlaybookSpec) -> PathBuf {
        self.base_dir.join(spec.file_path())
    }

    /// The exact command that `run` would launch for `spec`
    pub fn invocation(&self, spec: &PlaybookSpec) -> PlaybookInvocation {
        PlaybookInvocation::new(
            self.program.clone(),
            self.playbook_path(spec),
            &ExtraVars::from_json_map(&spec.extra_vars),
            &self.overrides,
            self.verbosity,
            self.dry_run,
        )
    }

    /// Run one playbook. Failures of any kind come back as a failed result.
    pub fn run(&self, spec: &PlaybookSpec) -> PlaybookResult {
        let path = self.playbook_path(spec);
        let result = |success: bool, duration: f64, output: String, error: Option<String>| {
            PlaybookResult {
                name: spec.name.clone(),
                description: spec.description.clone().unwrap_or_default(),
                test_case_id: spec.test_case_id.clone().unwrap_or_default(),
                success,
                duration,
                output,
                error,
            }
        };

        if !path.exists() {
            let message = format!("Playbook not found: {}", path.display());
            console::playbook_failed(&message);
            return result(false, 0.0, String::new(), Some(message));
        }

        console::playbook_start(spec, self.dry_run);
        let invocation = self.invocation(spec);
        let timeout = spec.timeout.map(Duration::from_secs);
        let start = Instant::now();

        match run_streaming(&invocation, &self.base_dir, timeout) {
            Ok(StreamedProcess {
                output,
                outcome: StreamOutcome::Exited(status),
            }) => {
                let duration = start.elapsed().as_secs_f64();
                if status.success() {
                    console::playbook_passed(duration);
                    info!("Playbook {} succeeded in {:.1}s", spec.name, duration);
                    result(true, duration, output, None)
                } else {
                    match status.code() {
                        Some(code) => console::playbook_failed(&format!("Failed with exit code {code}")),
                        None => console::playbook_failed("Terminated by signal"),
                    }
                    info!("Playbook {} failed ({:?})", spec.name, status.code());
                    let error = output.clone();
                    result(false, duration, output, Some(error))
                }
            }
            Ok(StreamedProcess {
                output,
                outcome: StreamOutcome::TimedOut,
            }) => {
                let duration = start.elapsed().as_secs_f64();
                console::playbook_failed(&format!(
                    "Timeout after {}",
                    console::format_duration(duration)
                ));
                let seconds = spec.timeout.unwrap_or_default();
                result(
                    false,
                    duration,
                    output,
                    Some(format!("Timeout after {seconds} seconds")),
                )
            }
            Err(e) => {
                let duration = start.elapsed().as_secs_f64();
                console::playbook_failed(&format!("Error: {e}"));
                warn!("Could not run playbook {}: {}", spec.name, e);
                result(false, duration, String::new(), Some(e.to_string()))
            }
        }
    }
}

impl PlaybookLauncher for PlaybookExecutor {
    fn launch(&mut self, spec: &PlaybookSpec) -> PlaybookResult {
        self.run(spec)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
