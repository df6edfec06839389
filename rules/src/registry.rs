//! `RuleRegistry`: keys registered rules by id, rejects duplicate
//! registration, and exposes Tier-B license gating (`spec.md` §4.1 step 1).

use core::{Finding, RuleContext, RuleDescriptor};
use errors::RuleError;
use std::collections::HashMap;

/// A rule's evaluation logic, decoupled from its immutable metadata so the
/// same descriptor shape covers every rule regardless of what it inspects.
pub trait Rule: Send + Sync {
    fn evaluate(&self, ctx: &RuleContext) -> Result<Vec<Finding>, RuleError>;
}

struct RegisteredRule {
    descriptor: RuleDescriptor,
    rule: Box<dyn Rule>,
}

#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<String, RegisteredRule>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: HashMap::new() }
    }

    /// Fails if `descriptor.id` is already registered.
    pub fn register(&mut self, descriptor: RuleDescriptor, rule: Box<dyn Rule>) -> Result<(), RuleError> {
        let id = descriptor.id.to_string();
        if self.rules.contains_key(&id) {
            return Err(RuleError::Unexpected { rule_id: id, reason: "already registered".to_string() });
        }
        self.rules.insert(id, RegisteredRule { descriptor, rule });
        Ok(())
    }

    #[must_use]
    pub fn descriptor(&self, rule_id: &str) -> Option<&RuleDescriptor> {
        self.rules.get(rule_id).map(|r| &r.descriptor)
    }

    /// Sorted lexicographically so two runs over the same context evaluate
    /// rules in the same order, regardless of `HashMap`'s randomized
    /// iteration order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Evaluates one rule, enforcing Tier-B license gating first: a Tier B
    /// rule without the required license feature never runs its body.
    pub fn evaluate(&self, rule_id: &str, ctx: &RuleContext) -> Result<Vec<Finding>, RuleError> {
        let Some(registered) = self.rules.get(rule_id) else {
            return Err(RuleError::Unexpected {
                rule_id: rule_id.to_string(),
                reason: "no rule registered with this id".to_string(),
            });
        };
        if registered.descriptor.requires_license() {
            let feature = registered
                .descriptor
                .required_license_feature
                .as_deref()
                .unwrap_or("");
            if !ctx.license.has_feature(feature) {
                return Err(RuleError::LicenseRequired {
                    rule_id: rule_id.to_string(),
                    feature: feature.to_string(),
                });
            }
        }
        registered.rule.evaluate(ctx)
    }
}
