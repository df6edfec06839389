//! Severity ladder: maps a surviving `Finding`'s severity onto the
//! `Outcome` contribution it makes to the report (`spec.md` §4.1 step 4).

use core::{Finding, Mode, Outcome, RuleDescriptor, Severity};

/// Whether strict mode applies to this rule: a rule's own `strict` override
/// wins over the mode default (`SPEC_FULL.md` Open Question 3).
#[must_use]
pub fn is_strict(mode: Mode, descriptor: Option<&RuleDescriptor>) -> bool {
    descriptor
        .and_then(|d| d.strict)
        .unwrap_or_else(|| mode.is_strict_by_default())
}

/// Maps one finding's severity to its ladder contribution. `low`/`medium`
/// are annotation-only and never escalate the gate.
#[must_use]
pub fn contribution(finding: &Finding, strict: bool) -> Outcome {
    match finding.severity {
        Severity::Block => Outcome::Block,
        Severity::Critical => {
            if strict {
                Outcome::Block
            } else {
                Outcome::Warn
            }
        }
        Severity::High | Severity::Warn => Outcome::Warn,
        Severity::Medium | Severity::Low | Severity::Allow => Outcome::Allow,
    }
}
