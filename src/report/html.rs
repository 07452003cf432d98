//! HTML report rendered through an askama template.
//!
//! The template auto-escapes, so captured playbook output is safe to embed.

use askama::Template;
use chrono::NaiveDateTime;

use super::env_info::EnvironmentInfo;
use crate::console::format_duration;
use crate::error::Result;
use crate::results::{PlaybookResult, RunResult, SuiteResult};

struct EnvRow {
    label: &'static str,
    value: String,
}

struct PlaybookView {
    status_class: &'static str,
    icon: &'static str,
    title: String,
    duration: String,
    has_error: bool,
    error: String,
}

struct SuiteView {
    name: String,
    duration: String,
    skipped: usize,
    playbooks: Vec<PlaybookView>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    generated: String,
    env_rows: Vec<EnvRow>,
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    pass_width: String,
    pass_label: String,
    duration: String,
    started: String,
    completed: String,
    interrupted: bool,
    suites: Vec<SuiteView>,
}

fn timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn presence(available: bool) -> String {
    if available {
        "✓ Available (MCE Enhancement)".to_string()
    } else {
        "ℹ Not yet available".to_string()
    }
}

fn env_rows(info: &EnvironmentInfo) -> Vec<EnvRow> {
    let mut rows = Vec::new();
    if let Some(url) = &info.ocp_api_url {
        rows.push(EnvRow { label: "OpenShift API", value: url.clone() });
    }
    if let Some(user) = &info.ocp_user {
        rows.push(EnvRow { label: "User", value: user.clone() });
    }
    if let Some(context) = &info.ocp_context {
        rows.push(EnvRow { label: "Context", value: context.clone() });
    }
    if info.capi_controller.is_some() {
        rows.push(EnvRow { label: "CAPI Controller", value: "✓ Deployed".to_string() });
    }
    if info.capa_controller.is_some() {
        rows.push(EnvRow { label: "CAPA Controller", value: "✓ Deployed".to_string() });
    }
    if let Some(available) = info.rosa_network {
        rows.push(EnvRow { label: "ROSANetwork CRD", value: presence(available) });
    }
    if let Some(available) = info.rosa_role_config {
        rows.push(EnvRow { label: "ROSARoleConfig", value: presence(available) });
    }
    rows
}

fn playbook_view(playbook: &PlaybookResult) -> PlaybookView {
    let error = if playbook.success {
        None
    } else {
        playbook.error.clone()
    };
    PlaybookView {
        status_class: if playbook.success { "success" } else { "failed" },
        icon: if playbook.success { "✓" } else { "✗" },
        title: playbook.title().to_string(),
        duration: format_duration(playbook.duration),
        has_error: error.is_some(),
        error: error.unwrap_or_default(),
    }
}

fn suite_view(suite: &SuiteResult) -> SuiteView {
    SuiteView {
        name: suite.name.clone(),
        duration: format_duration(suite.duration),
        skipped: suite.skipped,
        playbooks: suite.playbooks.iter().map(playbook_view).collect(),
    }
}

/// Render the HTML report for `run`
pub fn render(run: &RunResult) -> Result<String> {
    let pct = run.pass_percentage();
    let template = ReportTemplate {
        generated: run
            .end_time
            .or(run.start_time)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        env_rows: env_rows(&EnvironmentInfo::from_run(run)),
        total: run.total_tests,
        passed: run.passed,
        failed: run.failed,
        skipped: run.skipped,
        pass_width: format!("{}", pct),
        pass_label: format!("{:.1}", pct),
        duration: format_duration(run.duration),
        started: timestamp(run.start_time),
        completed: timestamp(run.end_time),
        interrupted: run.interrupted,
        suites: run.suites.iter().map(suite_view).collect(),
    };
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(playbooks: Vec<PlaybookResult>) -> RunResult {
        let mut run = RunResult::new();
        let mut suite = SuiteResult::begin("20-rosa-hcp-provision", "ROSA HCP Provision");
        run.add_declared(playbooks.len());
        for p in playbooks {
            run.record(&p);
            suite.push(p);
        }
        suite.finish(75.0, 0);
        run.push_suite(suite);
        run.finish(80.0);
        run
    }

    fn pb(name: &str, success: bool, output: &str) -> PlaybookResult {
        PlaybookResult {
            name: name.into(),
            description: format!("{name} description"),
            test_case_id: String::new(),
            success,
            duration: 12.0,
            output: output.into(),
            error: (!success).then(|| output.to_string()),
        }
    }

    #[test]
    fn test_summary_and_percentage() {
        let html = render(&run_with(vec![
            pb("create", true, "ok"),
            pb("verify", false, "fatal: boom"),
        ]))
        .unwrap();

        assert!(html.contains("ROSA HCP Provision"));
        assert!(html.contains("50.0% Passed"));
        assert!(html.contains("✓ create description"));
        assert!(html.contains("✗ verify description"));
        assert!(html.contains("fatal: boom"));
        assert!(html.contains("1m 15s"));
    }

    #[test]
    fn test_empty_run_renders_zero_percent() {
        let html = render(&RunResult::new()).unwrap();
        assert!(html.contains("0.0% Passed"));
        assert!(!html.contains("Environment Information"));
    }

    #[test]
    fn test_output_is_escaped() {
        let html = render(&run_with(vec![pb("x", false, "<script>alert(1)</script>")])).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_environment_section() {
        let html = render(&run_with(vec![pb(
            "login",
            true,
            "Successfully logged in - User: kube:admin | API: https://api.hub:6443 | Context: ctx\nNo RosaNetwork resources found",
        )]))
        .unwrap();
        assert!(html.contains("Environment Information"));
        assert!(html.contains("api.hub:6443"));
        assert!(html.contains("Not yet available"));
    }
}
