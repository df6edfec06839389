//! `OracleEngine::evaluate`: the 8-step evaluation algorithm of `spec.md`
//! §4.1, wired against the storage adapters and the rule registry.

use crate::ladder;
use chrono::{Duration, Utc};
use config::OracleConfig;
use core::{
    DissonanceReport, Finding, Mode, OrgContext, Outcome, RuleContext, Severity, ThresholdsSnapshot,
};
use errors::{RuleError, SecretError};
use rules::RuleRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use storage::{BlockCounter, FPStore, ObjectStore, SecretStore};

/// Rules whose must-hold guarantee turns a drift-mode regression into a
/// BLOCK rather than a WARN. Resolved here (`SPEC_FULL.md` Open Question):
/// a rule is must-hold when its registered severity already reaches
/// `critical`/`block` — MD-102 today.
fn is_must_hold(registry: &RuleRegistry, rule_id: &str) -> bool {
    registry
        .descriptor(rule_id)
        .is_some_and(|d| matches!(d.severity, Severity::Critical | Severity::Block))
}

/// Escalation rank for drift comparison, independent of `Severity`'s
/// declaration-order `Ord` (which only needs to hold for the three rules
/// this registry ships today). `warn`/`allow` rank alongside the ladder
/// rung they already collapse to.
fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Low | Severity::Allow => 0,
        Severity::Medium => 1,
        Severity::High | Severity::Warn => 2,
        Severity::Critical => 3,
        Severity::Block => 4,
    }
}

pub struct OracleEngine {
    registry: RuleRegistry,
    fp_store: Arc<dyn FPStore>,
    block_counter: Arc<dyn BlockCounter>,
    object_store: Arc<dyn ObjectStore>,
    secret_store: Arc<dyn SecretStore>,
    config: OracleConfig,
}

impl OracleEngine {
    /// Builds an engine with the three representative rules registered.
    pub fn new(
        fp_store: Arc<dyn FPStore>,
        block_counter: Arc<dyn BlockCounter>,
        object_store: Arc<dyn ObjectStore>,
        secret_store: Arc<dyn SecretStore>,
        config: OracleConfig,
    ) -> Result<Self, RuleError> {
        let mut registry = RuleRegistry::new();
        rules::register_builtin_rules(&mut registry)?;
        Ok(Self { registry, fp_store, block_counter, object_store, secret_store, config })
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Runs every registered rule against `ctx` and returns the signed
    /// report. Never returns an error: every failure mode named in
    /// `spec.md` §4.1/§7 is embedded in the returned report instead
    /// (a synthetic finding, a BLOCK outcome, or both).
    ///
    /// `evaluate` is a pure function of `ctx` plus whatever baseline is
    /// already on record: it never writes one as a side effect. Pass
    /// `persist_baseline: true` to additionally publish this run's
    /// contributions as the repo's new calibration/drift baseline, a
    /// separate, explicit step a caller opts into (typically a Schedule or
    /// Calibration run), not something every evaluation does implicitly.
    pub async fn evaluate(
        &self,
        ctx: &RuleContext,
        org_id: &str,
        repo_id: &str,
        dry_run: bool,
        persist_baseline: bool,
    ) -> DissonanceReport {
        let run_id = utils::generate_uuid();
        let mode = ctx.mode;

        // Steps 1-2: resolve the rule set (with Tier-B gating) and run each
        // rule independently. A rule's own error becomes a synthetic `warn`
        // finding; it never aborts the run.
        let mut findings = self.run_rules(ctx);
        if let Some(org) = &ctx.org_context {
            findings.extend(self.run_federated(ctx, org));
        }

        // Step 3: FP suppression.
        let mut suppressed_count = 0usize;
        let mut surviving = Vec::with_capacity(findings.len());
        for finding in findings {
            match self.fp_store.is_false_positive(&finding.rule_id, &finding.id).await {
                Ok(true) => suppressed_count += 1,
                Ok(false) => surviving.push(finding),
                Err(e) => {
                    tracing::warn!(rule_id = %finding.rule_id, error = %e, "FP store lookup failed, not suppressing");
                    surviving.push(finding);
                }
            }
        }

        // Step 4: severity ladder, per finding.
        let mut contributions: Vec<(Finding, Outcome)> = surviving
            .into_iter()
            .map(|f| {
                let rule_strict = ladder::is_strict(mode, self.registry.descriptor(&f.rule_id));
                let c = ladder::contribution(&f, rule_strict);
                (f, c)
            })
            .collect();

        // Drift mode recomputes contributions against the stored baseline
        // before folding into an outcome (step 5's drift branch).
        if mode == Mode::Drift {
            contributions = self.apply_drift(repo_id, contributions).await;
        }

        // Step 6: circuit breaker. Demote a rule's BLOCK contributions to
        // WARN once it has raised more alarms than `alarm_threshold` inside
        // the reset window, and record the fact on the report.
        let mut circuit_open_rule_ids = Vec::new();
        let reset_window = Duration::seconds(self.config.circuit_breaker.reset_window_seconds);
        let now = Utc::now();
        let mut seen_open = HashSet::new();
        for (finding, contribution) in &mut contributions {
            if *contribution != Outcome::Block {
                continue;
            }
            let state = match self.block_counter.record_alarm(org_id, &finding.rule_id, now, reset_window).await {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(rule_id = %finding.rule_id, error = %e, "block counter unavailable, not capping");
                    continue;
                }
            };
            if state.alarm_count > self.config.circuit_breaker.alarm_threshold {
                *contribution = Outcome::Warn;
                if seen_open.insert(finding.rule_id.clone()) {
                    circuit_open_rule_ids.push(finding.rule_id.clone());
                }
            }
        }

        // Step 5 (final fold): the per-mode outcome combinator.
        let outcome = self.fold_outcome(mode, &contributions);

        if persist_baseline {
            if mode == Mode::Calibration {
                self.store_calibration_baseline(repo_id, &contributions).await;
            } else if mode != Mode::Drift {
                self.store_drift_baseline(repo_id, &contributions).await;
            }
        }

        let mut findings: Vec<Finding> = contributions.into_iter().map(|(f, _)| f).collect();
        // Deterministic order regardless of the registry's HashMap iteration
        // order, so byte-identical input produces a byte-identical report
        // (`spec.md` §8).
        findings.sort_by(|a, b| (a.rule_id.as_str(), a.id.as_str()).cmp(&(b.rule_id.as_str(), b.id.as_str())));

        // Step 7: redaction tag, or fail closed if the secret store can't
        // deliver a valid nonce (unless this is a dry run).
        let (redaction_tag, fail_closed_finding) = self.redact(&findings).await;
        let outcome = match fail_closed_finding {
            Some(system_finding) if !dry_run => {
                findings.push(system_finding);
                Outcome::Block
            }
            Some(system_finding) => {
                findings.push(system_finding);
                outcome
            }
            None => outcome,
        };

        // Step 8: return the report.
        self.build_report(run_id, repo_id, mode, outcome, findings, redaction_tag, suppressed_count, circuit_open_rule_ids)
    }

    fn run_rules(&self, ctx: &RuleContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule_id in self.registry.all_ids() {
            match self.registry.evaluate(rule_id, ctx) {
                Ok(found) => findings.extend(found),
                Err(RuleError::LicenseRequired { rule_id, feature }) => {
                    if ctx.was_explicitly_requested(&rule_id) {
                        findings.push(Finding::synthetic(
                            Severity::High,
                            format!("{rule_id} was explicitly requested but its license feature is missing"),
                            format!("Requires license feature \"{feature}\", which this context does not have."),
                        ));
                    }
                }
                Err(e) => {
                    tracing::warn!(rule_id, error = %e, "rule errored, converting to a synthetic finding");
                    findings.push(Finding::synthetic(
                        Severity::Warn,
                        format!("rule {rule_id} failed to evaluate"),
                        e.to_string(),
                    ));
                }
            }
        }
        findings
    }

    /// `md102_evaluate_federated` runs outside `RuleRegistry::evaluate`
    /// (it takes an `OrgContext`, not a `RuleContext`), so Tier-B license
    /// gating has to be applied here by hand rather than falling out of the
    /// registry's own dispatch path.
    fn run_federated(&self, ctx: &RuleContext, org: &OrgContext) -> Vec<Finding> {
        const FEDERATED_RULE_ID: &str = "MD-102";
        let Some(descriptor) = self.registry.descriptor(FEDERATED_RULE_ID) else {
            return Vec::new();
        };
        if descriptor.requires_license() {
            let feature = descriptor.required_license_feature.as_deref().unwrap_or("");
            if !ctx.license.has_feature(feature) {
                if ctx.was_explicitly_requested(FEDERATED_RULE_ID) {
                    return vec![Finding::synthetic(
                        Severity::High,
                        format!("{FEDERATED_RULE_ID} was explicitly requested but its license feature is missing"),
                        format!("Requires license feature \"{feature}\", which this context does not have."),
                    )];
                }
                return Vec::new();
            }
        }
        rules::md102_evaluate_federated(org)
    }

    fn fold_outcome(&self, mode: Mode, contributions: &[(Finding, Outcome)]) -> Outcome {
        match mode {
            Mode::MergeGroup => {
                if contributions.iter().any(|(_, c)| *c != Outcome::Allow) {
                    Outcome::Block
                } else {
                    Outcome::Allow
                }
            }
            Mode::Calibration => Outcome::Allow,
            _ => contributions.iter().fold(Outcome::Allow, |acc, (_, c)| acc.worse_of(*c)),
        }
    }

    async fn apply_drift(&self, repo_id: &str, contributions: Vec<(Finding, Outcome)>) -> Vec<(Finding, Outcome)> {
        let baseline: Vec<Finding> = match self.object_store.get_baseline(repo_id).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(repo_id, error = %e, "drift baseline unavailable, treating as empty");
                Vec::new()
            }
        };

        contributions
            .into_iter()
            .map(|(finding, _)| {
                let prior = baseline.iter().find(|b| b.id == finding.id);
                let contribution = match prior {
                    Some(prior) if severity_rank(prior.severity) >= severity_rank(finding.severity) => Outcome::Allow,
                    _ => {
                        if is_must_hold(&self.registry, &finding.rule_id)
                            && matches!(finding.severity, Severity::Critical | Severity::Block)
                        {
                            Outcome::Block
                        } else {
                            Outcome::Warn
                        }
                    }
                };
                (finding, contribution)
            })
            .collect()
    }

    async fn store_calibration_baseline(&self, repo_id: &str, contributions: &[(Finding, Outcome)]) {
        self.store_drift_baseline(repo_id, contributions).await;
    }

    async fn store_drift_baseline(&self, repo_id: &str, contributions: &[(Finding, Outcome)]) {
        let findings: Vec<&Finding> = contributions.iter().map(|(f, _)| f).collect();
        if let Ok(value) = serde_json::to_value(&findings) {
            if let Err(e) = self.object_store.put_baseline(repo_id, value).await {
                tracing::warn!(repo_id, error = %e, "failed to persist baseline");
            }
        }
    }

    async fn redact(&self, findings: &[Finding]) -> (String, Option<Finding>) {
        let payload: Vec<serde_json::Value> = findings
            .iter()
            .map(|f| {
                serde_json::json!({
                    "ruleId": f.rule_id,
                    "title": f.title,
                    "evidence": f.evidence.iter().map(|e| e.path.clone()).collect::<Vec<_>>(),
                })
            })
            .collect();
        let value = serde_json::Value::Array(payload);

        match self.secret_store.get_nonce_config().await {
            Ok(nonce) => match trust::compute_tag(&value, &nonce.value) {
                Ok(tag) => (tag, None),
                Err(e) => (
                    String::new(),
                    Some(Finding::synthetic(Severity::Warn, "failed to compute redaction tag", e.to_string())),
                ),
            },
            Err(SecretError::SecretUnavailable | SecretError::MalformedSecret { .. } | SecretError::RotationFailed { .. }) => (
                String::new(),
                Some(Finding::synthetic(
                    Severity::Block,
                    "secret store could not deliver a valid nonce",
                    "The evaluation engine fails closed when redaction integrity cannot be established.",
                )),
            ),
            Err(e) => (
                String::new(),
                Some(Finding::synthetic(Severity::Warn, "secret store error", e.to_string())),
            ),
        }
    }

    fn build_report(
        &self,
        run_id: String,
        repo_id: &str,
        mode: Mode,
        outcome: Outcome,
        findings: Vec<Finding>,
        redaction_tag: String,
        suppressed_count: usize,
        circuit_open_rule_ids: Vec<String>,
    ) -> DissonanceReport {
        let thresholds_snapshot = ThresholdsSnapshot::from_serializable(&self.config)
            .unwrap_or_else(|_| ThresholdsSnapshot(serde_json::Value::Null));
        DissonanceReport {
            run_id,
            repo_id: repo_id.to_string(),
            mode,
            outcome,
            thresholds_snapshot,
            findings,
            redaction_tag,
            schema_version: DissonanceReport::schema_version().to_string(),
            created_at: Utc::now(),
            suppressed_count,
            circuit_open_rule_ids,
        }
    }
}
