//! Colored console side channel.
//!
//! Everything here is cosmetic progress output on stdout. It is not part of
//! the result data; reports are produced from `RunResult` alone.

use crossterm::style::Stylize;
use std::io::Write;

use crate::results::{RunResult, SuiteResult};
use crate::suite::{PlaybookSpec, SuiteDefinition, SuiteSummary};

const RULE_WIDTH: usize = 80;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

/// Human-readable duration: `12.3s`, `4m 5s`, `1h 2m`
pub fn format_duration(seconds: f64) -> String {
    let seconds = if seconds > 0.0 { seconds } else { 0.0 };
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        let minutes = (seconds / 60.0) as u64;
        let secs = (seconds % 60.0) as u64;
        format!("{}m {}s", minutes, secs)
    } else {
        let hours = (seconds / 3600.0) as u64;
        let minutes = ((seconds % 3600.0) / 60.0) as u64;
        format!("{}h {}m", hours, minutes)
    }
}

/// Echo one line of child output and flush so CI watchdogs see activity
pub fn stream_line(line: &str) {
    let mut out = std::io::stdout().lock();
    let _ = out.write_all(line.as_bytes());
    if !line.ends_with('\n') {
        let _ = out.write_all(b"\n");
    }
    let _ = out.flush();
}

pub fn suite_header(suite: &SuiteDefinition, dry_run: bool) {
    println!("\n{}", rule('='));
    println!("{}", "ROSA HCP Test Suite Runner".bold().magenta());
    if dry_run {
        println!("{}", "🔍 DRY RUN MODE - No changes will be made".bold().yellow());
    }
    println!("{}", rule('='));
    println!("\n{} {}", "📋 Test Suite:".bold(), suite.name);
    println!("{} {}", "📝 Description:".bold(), suite.description);
    println!("{} {}", "🏷️  Tags:".bold(), suite.tags.join(", "));
    println!("{} {}", "📦 Playbooks:".bold(), suite.playbooks.len());
    println!(
        "{} {}",
        "⏰ Started:".bold(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("\n{}", rule('-'));
}

pub fn playbook_counter(index: usize, total: usize) {
    print!("\n{} ", format!("[{}/{}]", index, total).bold());
    let _ = std::io::stdout().flush();
}

pub fn playbook_start(spec: &PlaybookSpec, dry_run: bool) {
    if dry_run {
        println!("\n{}", format!("🔍 DRY RUN: {}", spec.display_name()).yellow());
    } else {
        println!("\n{}", format!("⏳ Running: {}", spec.display_name()).cyan());
    }
}

pub fn playbook_passed(duration: f64) {
    println!(
        "{}",
        format!("✓ Completed successfully ({})", format_duration(duration)).green()
    );
}

pub fn playbook_failed(message: &str) {
    println!("{}", format!("✗ {}", message).red());
}

pub fn stopping_suite() {
    println!("\n{}", "⚠ Stopping suite due to failure".yellow());
}

pub fn suite_summary(result: &SuiteResult) {
    println!("\n{}", rule('-'));
    println!("\n{}", "📊 SUITE SUMMARY:".bold());
    println!("   Total Playbooks: {}", result.playbooks.len());
    println!("   {}", format!("✓ Passed: {}", result.passed()).green());
    println!("   {}", format!("✗ Failed: {}", result.failed()).red());
    if result.skipped > 0 {
        println!("   {}", format!("⏭ Skipped: {}", result.skipped).yellow());
    }
    println!("   ⏱️  Duration: {}", format_duration(result.duration));
}

pub fn final_summary(run: &RunResult) {
    println!("\n{}", rule('='));
    println!("\n{}", "📊 FINAL RESULTS SUMMARY:".bold());
    println!("   Total Tests: {}", run.total_tests);
    println!("   {}", format!("✓ Passed: {}", run.passed).green());
    println!("   {}", format!("✗ Failed: {}", run.failed).red());
    if run.skipped > 0 {
        println!("   {}", format!("⏭ Skipped: {}", run.skipped).yellow());
    }
    println!("   ⏱️  Total Duration: {}", format_duration(run.duration));
    println!("\n{}\n", rule('='));
}

pub fn suite_listing(suites: &[SuiteSummary]) {
    println!("\n{}\n", "Available Test Suites:".bold());
    for suite in suites {
        println!("  {}", suite.id.as_str().cyan());
        println!("    Name: {}", suite.name);
        println!("    Description: {}", suite.description);
        println!("    Tags: {}", suite.tags.join(", "));
        println!("    Playbooks: {}\n", suite.playbook_count);
    }
}

pub fn info(message: &str) {
    println!("{}", message.cyan());
}

pub fn heading(message: &str) {
    println!("{}", message.bold());
}

pub fn warning(message: &str) {
    println!("{}", message.yellow());
}

pub fn error(message: &str) {
    println!("{}", format!("✗ {}", message).red());
}
