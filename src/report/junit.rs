//! JUnit XML for CI consumers


use crate::results::{PlaybookResult, RunResult, SuiteResult};

const ROOT_NAME: &str = "ROSA HCP Test Suite";

/// Escape text for use in XML attributes and content.
///
/// Control characters other than tab, newline and carriage return are not
/// legal in XML 1.0 and are dropped (playbook output carries ANSI escapes).
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// `<id>: <description>`, falling back to description then name
pub fn testcase_name(playbook: &PlaybookResult) -> String {
    let description = playbook.title();
    if playbook.test_case_id.is_empty() {
        description.to_string()
    } else {
        format!("{}: {}", playbook.test_case_id, description)
    }
}

fn failure_text(playbook: &PlaybookResult) -> String {
    let mut text = format!(
        "Playbook: {}\nError: {}\n",
        playbook.name,
        playbook.error.as_deref().unwrap_or("Unknown error")
    );
    if !playbook.output.is_empty() {
        text.push_str("\nOutput:\n");
        text.push_str(&playbook.output);
    }
    text
}

fn write_testcase(out: &mut String, suite: &SuiteResult, playbook: &PlaybookResult) {
    let name = testcase_name(playbook);
    out.push_str(&format!(
        "    <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\"",
        xml_escape(&name),
        xml_escape(&format!("{} {}", suite.name, name)),
        playbook.duration
    ));
    if playbook.success {
        out.push_str("/>\n");
        return;
    }
    out.push_str(&format!(
        ">\n      <failure type=\"TestFailure\" message=\"{}\">{}</failure>\n    </testcase>\n",
        xml_escape(playbook.error.as_deref().unwrap_or("Test failed")),
        xml_escape(&failure_text(playbook))
    ));
}

fn write_testsuite(out: &mut String, suite: &SuiteResult) {
    out.push_str(&format!(
        "  <testsuite name=\"{}\" timestamp=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"{}\" time=\"{:.3}\">\n",
        xml_escape(&suite.name),
        suite.start_time.format("%Y-%m-%dT%H:%M:%S%.6f"),
        suite.playbooks.len(),
        suite.failed(),
        suite.skipped,
        suite.duration
    ));
    for playbook in &suite.playbooks {
        write_testcase(out, suite, playbook);
    }
    out.push_str("  </testsuite>\n");
}

/// Render `run` as a JUnit document
pub fn render(run: &RunResult) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"{}\" time=\"{:.3}\">\n",
        ROOT_NAME, run.total_tests, run.failed, run.skipped, run.duration
    ));
    for suite in &run.suites {
        write_testsuite(&mut out, suite);
    }
    out.push_str("</testsuites>\n");
    out
}
