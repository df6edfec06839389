//! Human-readable report rendering to stderr; the report's JSON (the
//! wire contract `spec.md` §3/§6 pins) always goes to stdout so it stays
//! pipeable even when these lines are present.

use colored::Colorize;
use core::{DissonanceReport, Outcome};

pub fn header(title: &str) {
    eprintln!("{}", title.bold().underline());
}

pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn report_summary(report: &DissonanceReport) {
    header(&format!("{} — {} — {}", report.repo_id, report.mode, report.run_id));
    let outcome_line = match report.outcome {
        Outcome::Allow => "ALLOW".green().bold(),
        Outcome::Warn => "WARN".yellow().bold(),
        Outcome::Block => "BLOCK".red().bold(),
    };
    eprintln!("outcome: {outcome_line}");
    eprintln!(
        "findings: {} ({} suppressed as false positives)",
        report.findings.len(),
        report.suppressed_count
    );
    if !report.circuit_open_rule_ids.is_empty() {
        warn(&format!("circuit breaker open for: {}", report.circuit_open_rule_ids.join(", ")));
    }
    for finding in &report.findings {
        eprintln!("  [{}] {}: {}", finding.severity, finding.rule_id, finding.title);
    }
}
