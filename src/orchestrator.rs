//! Suite and batch orchestration
//!
//! Strictly sequential: one playbook at a time, one suite at a time. The
//! run-wide counters are the `RunResult` handed in by the caller.

use std::time::Instant;
use tracing::{error, info, warn};

use crate::console;
use crate::error::Result;
use crate::executor::PlaybookLauncher;
use crate::process_guard::Interrupt;
use crate::results::{RunResult, SuiteResult};
use crate::suite::{SuiteCatalog, SuiteDefinition};

/// Outcome of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every selected suite was run (or the run was interrupted)
    Completed { success: bool, suites: usize },
    /// The filter matched nothing
    NoSuites,
}

impl BatchOutcome {
    pub fn success(&self) -> bool {
        matches!(self, BatchOutcome::Completed { success: true, .. })
    }
}

/// Drives suites through a [`PlaybookLauncher`]
pub struct SuiteRunner<L: PlaybookLauncher> {
    catalog: SuiteCatalog,
    launcher: L,
    interrupt: Interrupt,
}

impl<L: PlaybookLauncher> SuiteRunner<L> {
    pub fn new(catalog: SuiteCatalog, launcher: L, interrupt: Interrupt) -> Self {
        Self {
            catalog,
            launcher,
            interrupt,
        }
    }

    pub fn catalog(&self) -> &SuiteCatalog {
        &self.catalog
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Load and run one suite by id. A suite that cannot be loaded is
    /// reported and counts as failed; nothing is added to `run`.
    pub fn run_suite(&mut self, id: &str, run: &mut RunResult) -> bool {
        match self.catalog.load(id) {
            Ok(suite) => self.run_definition(&suite, run),
            Err(e) => {
                error!("Cannot run suite {}: {}", id, e);
                console::error(&e.to_string());
                false
            }
        }
    }

    /// Run an already loaded suite; true when none of its playbooks failed
    pub fn run_definition(&mut self, suite: &SuiteDefinition, run: &mut RunResult) -> bool {
        console::suite_header(suite, self.launcher.is_dry_run());
        info!("Starting suite {} ({} playbooks)", suite.id, suite.playbooks.len());

        let declared = suite.playbooks.len();
        run.add_declared(declared);

        let mut result = SuiteResult::begin(suite.id.clone(), suite.name.clone());
        let start = Instant::now();

        for (index, spec) in suite.playbooks.iter().enumerate() {
            if self.interrupt.is_triggered() {
                warn!("Interrupt requested, not starting {}", spec.name);
                break;
            }

            console::playbook_counter(index + 1, declared);
            let outcome = self.launcher.launch(spec);
            run.record(&outcome);
            let failed = !outcome.success;
            result.push(outcome);

            if failed && suite.stop_on_failure && spec.is_required() {
                console::stopping_suite();
                info!("Suite {} stopped at required playbook {}", suite.id, spec.name);
                break;
            }
        }

        let skipped = declared - result.playbooks.len();
        run.add_skipped(skipped);
        result.finish(start.elapsed().as_secs_f64(), skipped);
        console::suite_summary(&result);

        let success = result.success();
        run.push_suite(result);
        success
    }

    /// Run every suite whose tags intersect `tags` (all when empty), in id
    /// order. Success is the AND of the suite outcomes.
    pub fn run_batch(&mut self, tags: &[String], run: &mut RunResult) -> Result<BatchOutcome> {
        let suites: Vec<SuiteDefinition> = self
            .catalog
            .load_all()?
            .into_iter()
            .filter(|suite| suite.matches_tags(tags))
            .collect();

        if !tags.is_empty() {
            console::info(&format!("Running test suites with tag '{}'\n", tags.join(", ")));
        }

        if suites.is_empty() {
            console::warning("No test suites found");
            return Ok(BatchOutcome::NoSuites);
        }

        console::heading(&format!("Found {} test suite(s)\n", suites.len()));

        let mut all_passed = true;
        for suite in &suites {
            if self.interrupt.is_triggered() {
                warn!("Interrupt requested, not starting suite {}", suite.id);
                all_passed = false;
                break;
            }
            if !self.run_definition(suite, run) {
                all_passed = false;
            }
        }

        Ok(BatchOutcome::Completed {
            success: all_passed,
            suites: suites.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::PlaybookResult;
    use crate::suite::PlaybookSpec;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    /// Succeeds unless the playbook name is in `failing`; records call order
    #[derive(Default)]
    struct ScriptedLauncher {
        failing: HashSet<String>,
        calls: Vec<String>,
        interrupt_after: Option<(usize, Interrupt)>,
    }

    impl ScriptedLauncher {
        fn failing(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl PlaybookLauncher for ScriptedLauncher {
        fn launch(&mut self, spec: &PlaybookSpec) -> PlaybookResult {
            self.calls.push(spec.name.clone());
            if let Some((after, interrupt)) = &self.interrupt_after {
                if self.calls.len() >= *after {
                    interrupt.trigger();
                }
            }
            let success = !self.failing.contains(&spec.name);
            PlaybookResult {
                name: spec.name.clone(),
                description: spec.description.clone().unwrap_or_default(),
                test_case_id: spec.test_case_id.clone().unwrap_or_default(),
                success,
                duration: 0.1,
                output: format!("ran {}\n", spec.name),
                error: (!success).then(|| "exit 2".to_string()),
            }
        }
    }

    fn suite(id: &str, tags: &[&str], stop: bool, playbooks: Vec<PlaybookSpec>) -> SuiteDefinition {
        SuiteDefinition {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            stop_on_failure: stop,
            playbooks,
        }
    }

    fn runner(launcher: ScriptedLauncher) -> SuiteRunner<ScriptedLauncher> {
        SuiteRunner::new(SuiteCatalog::new("/nonexistent"), launcher, Interrupt::new())
    }

    #[test]
    fn test_without_stop_every_playbook_runs() {
        let mut runner = runner(ScriptedLauncher::failing(&["b", "d"]));
        let def = suite(
            "s",
            &[],
            false,
            ["a", "b", "c", "d"].iter().map(|n| PlaybookSpec::new(*n)).collect(),
        );
        let mut run = RunResult::new();

        let ok = runner.run_definition(&def, &mut run);

        assert!(!ok);
        assert_eq!(run.suites[0].playbooks.len(), 4);
        assert_eq!((run.passed, run.failed, run.skipped, run.total_tests), (2, 2, 0, 4));
    }

    #[test]
    fn test_required_failure_stops_suite() {
        let mut runner = runner(ScriptedLauncher::failing(&["B"]));
        let def = suite(
            "rosa",
            &["rosa-hcp"],
            true,
            vec![PlaybookSpec::new("A"), PlaybookSpec::new("B"), PlaybookSpec::new("C")],
        );
        let mut run = RunResult::new();

        let ok = runner.run_definition(&def, &mut run);

        assert!(!ok);
        assert_eq!(runner.launcher().calls, vec!["A", "B"]);
        let result = &run.suites[0];
        assert_eq!(result.playbooks.len(), 2);
        assert_eq!(result.skipped, 1);
        assert_eq!((run.passed, run.failed, run.skipped), (1, 1, 1));
    }

    #[test]
    fn test_optional_failure_does_not_stop() {
        let mut runner = runner(ScriptedLauncher::failing(&["B"]));
        let def = suite(
            "s",
            &[],
            true,
            vec![
                PlaybookSpec::new("A"),
                PlaybookSpec::new("B").with_required(false),
                PlaybookSpec::new("C"),
            ],
        );
        let mut run = RunResult::new();

        runner.run_definition(&def, &mut run);

        assert_eq!(runner.launcher().calls, vec!["A", "B", "C"]);
        assert_eq!(run.suites[0].playbooks.len(), 3);
    }

    #[test]
    fn test_suite_success_ignores_other_suites() {
        let mut runner = runner(ScriptedLauncher::failing(&["bad"]));
        let mut run = RunResult::new();

        assert!(!runner.run_definition(&suite("one", &[], false, vec![PlaybookSpec::new("bad")]), &mut run));
        assert!(runner.run_definition(&suite("two", &[], false, vec![PlaybookSpec::new("good")]), &mut run));
    }

    #[test]
    fn test_interrupt_stops_before_next_playbook() {
        let interrupt = Interrupt::new();
        let launcher = ScriptedLauncher {
            interrupt_after: Some((1, interrupt.clone())),
            ..Default::default()
        };
        let mut runner = SuiteRunner::new(SuiteCatalog::new("/nonexistent"), launcher, interrupt);
        let def = suite("s", &[], false, vec![PlaybookSpec::new("a"), PlaybookSpec::new("b")]);
        let mut run = RunResult::new();

        runner.run_definition(&def, &mut run);

        assert_eq!(runner.launcher().calls, vec!["a"]);
        assert_eq!(run.suites[0].skipped, 1);
    }

    #[test]
    fn test_missing_suite_counts_as_failure() {
        let mut runner = runner(ScriptedLauncher::default());
        let mut run = RunResult::new();
        assert!(!runner.run_suite("does-not-exist", &mut run));
        assert!(run.suites.is_empty());
    }

    fn write_suite(dir: &TempDir, id: &str, tags: &[&str], playbooks: &[&str]) {
        let json = serde_json::json!({
            "name": id,
            "tags": tags,
            "playbooks": playbooks.iter().map(|p| serde_json::json!({"name": p})).collect::<Vec<_>>(),
        });
        fs::write(dir.path().join(format!("{id}.json")), json.to_string()).unwrap();
    }

    #[test]
    fn test_batch_filters_by_tag_in_id_order() {
        let dir = TempDir::new().unwrap();
        write_suite(&dir, "30-delete", &["rosa-hcp", "delete"], &["d1"]);
        write_suite(&dir, "10-configure", &["mce"], &["c1"]);
        write_suite(&dir, "20-provision", &["rosa-hcp"], &["p1", "p2"]);

        let mut runner = SuiteRunner::new(
            SuiteCatalog::new(dir.path()),
            ScriptedLauncher::default(),
            Interrupt::new(),
        );
        let mut run = RunResult::new();
        let outcome = runner.run_batch(&["rosa-hcp".to_string()], &mut run).unwrap();

        assert_eq!(outcome, BatchOutcome::Completed { success: true, suites: 2 });
        let ids: Vec<&str> = run.suites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["20-provision", "30-delete"]);
        assert_eq!(runner.launcher().calls, vec!["p1", "p2", "d1"]);
    }

    #[test]
    fn test_batch_success_is_and_of_suites() {
        let dir = TempDir::new().unwrap();
        write_suite(&dir, "a", &[], &["ok"]);
        write_suite(&dir, "b", &[], &["bad"]);

        let mut runner = SuiteRunner::new(
            SuiteCatalog::new(dir.path()),
            ScriptedLauncher::failing(&["bad"]),
            Interrupt::new(),
        );
        let mut run = RunResult::new();
        let outcome = runner.run_batch(&[], &mut run).unwrap();
        assert_eq!(outcome, BatchOutcome::Completed { success: false, suites: 2 });
    }

    #[test]
    fn test_batch_without_matches() {
        let dir = TempDir::new().unwrap();
        write_suite(&dir, "a", &["mce"], &["ok"]);

        let mut runner = SuiteRunner::new(
            SuiteCatalog::new(dir.path()),
            ScriptedLauncher::default(),
            Interrupt::new(),
        );
        let mut run = RunResult::new();
        let outcome = runner.run_batch(&["nope".to_string()], &mut run).unwrap();
        assert_eq!(outcome, BatchOutcome::NoSuites);
        assert!(!outcome.success());
        assert!(run.suites.is_empty());
    }
}
