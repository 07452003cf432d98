// Integration tests for playbook execution
//
// `sh` stands in for ansible-playbook, so every "playbook" here is a small
// shell script that receives the same argv ansible-playbook would.

use std::fs;
use std::path::Path;
use std::time::Instant;

use tempfile::TempDir;

use suite_runner::executor::{run_streaming, StreamOutcome, AUTOMATION_PATH_VAR};
use suite_runner::invocation::{CommandArgs, ExtraVars};
use suite_runner::orchestrator::{BatchOutcome, SuiteRunner};
use suite_runner::process_guard::Interrupt;
use suite_runner::report::{ReportFormat, ResultWriter};
use suite_runner::results::{self, RunResult};
use suite_runner::suite::{PlaybookSpec, SuiteCatalog};
use suite_runner::{PlaybookExecutor, RunnerConfig};

fn workspace() -> (TempDir, RunnerConfig) {
    let dir = TempDir::new().unwrap();
    let config = RunnerConfig::new(dir.path()).unwrap().with_playbook_bin("sh").unwrap();
    fs::create_dir_all(&config.suites_dir).unwrap();
    (dir, config)
}

fn write_playbook(base: &Path, name: &str, body: &str) {
    let path = base.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

fn write_suite(config: &RunnerConfig, id: &str, json: &str) {
    fs::write(config.suites_dir.join(format!("{id}.json")), json).unwrap();
}

#[test]
fn test_successful_playbook_captures_output() {
    let (dir, config) = workspace();
    write_playbook(dir.path(), "ok.yml", "echo hello from playbook\n");

    let spec = PlaybookSpec::new("ok")
        .with_file("ok.yml")
        .with_description("Says hello")
        .with_test_case_id("RHACM4K-1");
    let result = PlaybookExecutor::new(&config).run(&spec);

    assert!(result.success);
    assert!(result.error.is_none());
    assert!(result.output.contains("hello from playbook"));
    assert_eq!(result.description, "Says hello");
    assert_eq!(result.test_case_id, "RHACM4K-1");
    assert!(result.duration >= 0.0);
}

#[test]
fn test_failure_keeps_stderr_in_error() {
    let (dir, config) = workspace();
    write_playbook(dir.path(), "bad.yml", "echo before\necho boom >&2\nexit 3\n");

    let result = PlaybookExecutor::new(&config).run(&PlaybookSpec::new("bad.yml"));

    assert!(!result.success);
    assert!(result.output.contains("before"));
    assert!(result.output.contains("boom"));
    assert!(result.error.as_deref().unwrap().contains("boom"));
}

#[test]
fn test_missing_playbook_is_a_failed_result() {
    let (_dir, config) = workspace();
    let result = PlaybookExecutor::new(&config).run(&PlaybookSpec::new("nope.yml"));

    assert!(!result.success);
    assert_eq!(result.duration, 0.0);
    assert!(result.error.unwrap().starts_with("Playbook not found"));
}

#[test]
fn test_timeout_kills_playbook() {
    let (dir, config) = workspace();
    write_playbook(dir.path(), "slow.yml", "echo started\nsleep 30\necho never\n");

    let spec = PlaybookSpec::new("slow.yml").with_timeout(1);
    let start = Instant::now();
    let result = PlaybookExecutor::new(&config).run(&spec);

    assert!(start.elapsed().as_secs() < 10);
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Timeout after 1 seconds"));
    assert!(result.output.contains("started"));
    assert!(!result.output.contains("never"));
}

#[test]
fn test_playbook_receives_vars_and_runs_in_base_dir() {
    let (dir, config) = workspace();
    write_playbook(dir.path(), "playbooks/args.yml", "echo \"ARGS: $*\"\necho \"CWD: $(pwd)\"\n");

    let overrides: ExtraVars = [("name_prefix", "cli")].into_iter().collect();
    let spec = PlaybookSpec::new("args")
        .with_file("playbooks/args.yml")
        .with_var("name_prefix", "suite")
        .with_var("region", "us-east-1");
    let result = PlaybookExecutor::new(&config)
        .with_overrides(&overrides)
        .with_dry_run(true)
        .run(&spec);

    assert!(result.success, "output: {}", result.output);
    let base = config.base_dir.display().to_string();
    assert!(result.output.contains("-e name_prefix=cli"));
    assert!(result.output.contains("-e region=us-east-1"));
    assert!(result.output.contains(&format!("-e {AUTOMATION_PATH_VAR}={base}")));
    assert!(result.output.contains("-e dry_run=true"));
    assert!(!result.output.contains("name_prefix=suite"));

    let canonical = fs::canonicalize(dir.path()).unwrap();
    assert!(result.output.contains(&format!("CWD: {}", canonical.display())));
}

struct Echo(Vec<String>);

impl CommandArgs for Echo {
    fn program(&self) -> &str {
        "sh"
    }

    fn to_cli_args(&self) -> Vec<String> {
        self.0.clone()
    }
}

#[test]
fn test_streaming_interleaves_stdout_and_stderr() {
    let dir = TempDir::new().unwrap();
    let script = "echo one; echo two >&2; echo three";
    let cmd = Echo(vec!["-c".to_string(), script.to_string()]);

    let streamed = run_streaming(&cmd, dir.path(), None).unwrap();

    assert!(matches!(streamed.outcome, StreamOutcome::Exited(status) if status.success()));
    assert_eq!(streamed.output, "one\ntwo\nthree\n");
}

#[test]
fn test_streaming_keeps_partial_last_line() {
    let dir = TempDir::new().unwrap();
    let cmd = Echo(vec!["-c".to_string(), "printf 'no newline'".to_string()]);

    let streamed = run_streaming(&cmd, dir.path(), None).unwrap();
    assert_eq!(streamed.output, "no newline");
}

#[test]
fn test_stop_on_failure_skips_rest_of_suite() {
    let (dir, config) = workspace();
    write_playbook(dir.path(), "a.yml", "echo a\n");
    write_playbook(dir.path(), "b.yml", "echo b failed\nexit 1\n");
    write_playbook(dir.path(), "c.yml", "touch c-ran\n");
    write_suite(
        &config,
        "10-rosa-hcp-provision",
        r#"{
            "name": "Provision",
            "tags": ["provision"],
            "stopOnFailure": true,
            "playbooks": [
                {"name": "A", "file": "a.yml"},
                {"name": "B", "file": "b.yml"},
                {"name": "C", "file": "c.yml"}
            ]
        }"#,
    );

    let catalog = SuiteCatalog::new(&config.suites_dir);
    let mut runner = SuiteRunner::new(catalog, PlaybookExecutor::new(&config), Interrupt::new());
    let mut run = RunResult::new();
    run.start();
    let success = runner.run_suite("10-rosa-hcp-provision", &mut run);
    run.finish(0.5);

    assert!(!success);
    assert!(!dir.path().join("c-ran").exists());
    assert_eq!(run.total_tests, 3);
    assert_eq!(run.passed, 1);
    assert_eq!(run.failed, 1);
    assert_eq!(run.skipped, 1);
    assert_eq!(run.suites.len(), 1);
    assert_eq!(run.suites[0].playbooks.len(), 2);

    let writer = ResultWriter::new(&config.results_dir);
    let paths = writer
        .save(&run, ReportFormat::Junit, Some("provision"), results::now())
        .unwrap();
    let xml = fs::read_to_string(&paths[0]).unwrap();
    assert!(xml.contains(r#"tests="3" failures="1" errors="0" skipped="1""#));
    assert!(xml.contains("b failed"));
}

#[test]
fn test_batch_runs_tagged_suites_only() {
    let (dir, config) = workspace();
    write_playbook(dir.path(), "ok.yml", "exit 0\n");
    write_suite(
        &config,
        "01-smoke",
        r#"{"name": "Smoke", "tags": ["smoke"], "playbooks": [{"name": "ok.yml"}]}"#,
    );
    write_suite(
        &config,
        "02-full",
        r#"{"name": "Full", "tags": ["full"], "playbooks": [{"name": "ok.yml"}, {"name": "ok.yml"}]}"#,
    );

    let catalog = SuiteCatalog::new(&config.suites_dir);
    let mut runner = SuiteRunner::new(catalog, PlaybookExecutor::new(&config), Interrupt::new());
    let mut run = RunResult::new();
    let outcome = runner.run_batch(&["smoke".to_string()], &mut run).unwrap();

    assert_eq!(outcome, BatchOutcome::Completed { success: true, suites: 1 });
    assert_eq!(run.total_tests, 1);
    assert_eq!(run.passed, 1);
    assert!(run.success());
}
