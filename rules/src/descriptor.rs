//! Immutable descriptors for the representative rules. A real deployment
//! would load these from a config file; they're hardcoded here since the
//! registration shape, not the source of truth, is what's under test.

use core::{FpTolerance, PromotionCriteria, RuleDescriptor, Severity, Tier};

fn id(s: &str) -> core::RuleId {
    core::RuleId::new(s).expect("rule id literal is always valid")
}

#[must_use]
pub fn md100() -> RuleDescriptor {
    RuleDescriptor {
        id: id("MD-100"),
        version: "1.0.0".to_string(),
        tier: Tier::A,
        severity: Severity::Medium,
        category: "workflow-integrity".to_string(),
        fp_tolerance: FpTolerance { ceiling: 0.05, window_size: 500 },
        promotion_criteria: PromotionCriteria {
            description: "30 days with no FP rate above ceiling across onboarded orgs".to_string(),
            min_clean_runs: 30,
        },
        adr_references: vec!["ADR-014".to_string()],
        required_license_feature: None,
        strict: None,
    }
}

#[must_use]
pub fn md101() -> RuleDescriptor {
    RuleDescriptor {
        id: id("MD-101"),
        version: "1.0.0".to_string(),
        tier: Tier::A,
        severity: Severity::High,
        category: "cross-repo-policy".to_string(),
        fp_tolerance: FpTolerance { ceiling: 0.02, window_size: 1000 },
        promotion_criteria: PromotionCriteria {
            description: "manual review of first 100 exemption-expiry findings".to_string(),
            min_clean_runs: 0,
        },
        adr_references: vec!["ADR-009".to_string()],
        required_license_feature: None,
        strict: None,
    }
}

#[must_use]
pub fn md102() -> RuleDescriptor {
    RuleDescriptor {
        id: id("MD-102"),
        version: "1.0.0".to_string(),
        tier: Tier::B,
        severity: Severity::Critical,
        category: "merge-queue-integrity".to_string(),
        fp_tolerance: FpTolerance { ceiling: 0.01, window_size: 1000 },
        promotion_criteria: PromotionCriteria {
            description: "zero false positives across pilot orgs for two release cycles".to_string(),
            min_clean_runs: 60,
        },
        adr_references: vec!["ADR-009".to_string(), "ADR-021".to_string()],
        required_license_feature: Some("merge-queue-trust-chain".to_string()),
        strict: Some(true),
    }
}
