//! MD-100 "Semantic Job Drift": a workflow job's name promises one thing
//! (`spec.md` §4.2) while its steps do another. Parses permissively —
//! malformed YAML drops that one file, not the whole run.

use crate::lexicon::{classify_job_name, infer_step_intent, is_checkout_only, JobIntent};
use crate::registry::Rule;
use core::{Evidence, Finding, RuleContext, Severity};
use errors::RuleError;
use serde_yaml::Value;

pub struct SemanticJobDrift;

impl Rule for SemanticJobDrift {
    fn evaluate(&self, ctx: &RuleContext) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();
        for (path, content) in &ctx.files {
            if !path.starts_with(".github/workflows/") {
                continue;
            }
            let Ok(doc) = serde_yaml::from_str::<Value>(content) else {
                tracing::debug!(path, "MD-100: skipping malformed workflow YAML");
                continue;
            };
            findings.extend(evaluate_workflow(path, &doc));
        }
        Ok(findings)
    }
}

fn evaluate_workflow(path: &str, doc: &Value) -> Vec<Finding> {
    let Some(jobs) = doc.get("jobs").and_then(Value::as_mapping) else {
        return Vec::new();
    };
    let mut findings = Vec::new();
    for (job_key, job_value) in jobs {
        let Some(job_name) = job_key.as_str() else { continue };
        let (commands, uses_steps) = extract_steps(job_value);
        if is_checkout_only(&commands, &uses_steps) {
            continue;
        }
        let Some(name_intent) = classify_job_name(job_name) else { continue };
        let Some(step_intent) = infer_step_intent(&commands) else { continue };
        if name_intent == step_intent {
            continue;
        }
        findings.push(drift_finding(path, job_name, name_intent, step_intent));
    }
    findings
}

fn extract_steps(job_value: &Value) -> (Vec<String>, Vec<String>) {
    let mut commands = Vec::new();
    let mut uses_steps = Vec::new();
    if let Some(steps) = job_value.get("steps").and_then(Value::as_sequence) {
        for step in steps {
            if let Some(run) = step.get("run").and_then(Value::as_str) {
                commands.push(run.to_string());
            }
            if let Some(uses) = step.get("uses").and_then(Value::as_str) {
                uses_steps.push(uses.to_string());
            }
        }
    }
    (commands, uses_steps)
}

fn drift_finding(path: &str, job_name: &str, name_intent: JobIntent, step_intent: JobIntent) -> Finding {
    let is_deploy_mismatch = matches!(
        (name_intent, step_intent),
        (JobIntent::DeployStaging, JobIntent::DeployProduction)
    );
    let severity = if is_deploy_mismatch { Severity::High } else { Severity::Warn };
    let title = if is_deploy_mismatch {
        format!("job \"{job_name}\" is named for staging but its steps deploy to production")
    } else {
        format!("job \"{job_name}\" is named for {} but its steps run {}", name_intent.label(), step_intent.label())
    };
    Finding {
        id: utils::compute_content_hash(&format!("MD-100|{path}|{job_name}|{title}")),
        rule_id: "MD-100".to_string(),
        rule_name: "Semantic Job Drift".to_string(),
        severity,
        title,
        description: format!(
            "Job name classifies as \"{}\" but its step commands indicate \"{}\".",
            name_intent.label(),
            step_intent.label()
        ),
        remediation: "Rename the job to match what it does, or fix the steps to match the name.".to_string(),
        evidence: vec![Evidence { path: path.to_string(), line: None, context: Default::default() }],
        adr_references: vec!["ADR-014".to_string()],
    }
}
