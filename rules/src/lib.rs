//! Rule registry and the representative rule implementations: MD-100
//! (semantic job drift), MD-101 (cross-repo protection gap), and
//! MD-102/MD-102-federated (merge queue trust chain break) — `spec.md`
//! §4.2.

pub mod descriptor;
pub mod lexicon;
pub mod md100;
pub mod md101;
pub mod md102;
pub mod registry;

pub use descriptor::{md100 as md100_descriptor, md101 as md101_descriptor, md102 as md102_descriptor};
pub use md100::SemanticJobDrift;
pub use md101::CrossRepoProtectionGap;
pub use md102::{evaluate_federated as md102_evaluate_federated, MergeQueueTrustChainBreak};
pub use registry::{Rule, RuleRegistry};

/// Registers the three representative rules under their stable ids.
pub fn register_builtin_rules(registry: &mut RuleRegistry) -> Result<(), errors::RuleError> {
    registry.register(descriptor::md100(), Box::new(SemanticJobDrift))?;
    registry.register(descriptor::md101(), Box::new(CrossRepoProtectionGap))?;
    registry.register(descriptor::md102(), Box::new(MergeQueueTrustChainBreak))?;
    Ok(())
}
