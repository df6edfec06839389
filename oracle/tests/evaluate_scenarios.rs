//! End-to-end `OracleEngine::evaluate` scenarios (`spec.md` §8): FP
//! suppression, mode-specific outcome folding, the circuit breaker, fail-
//! closed secret handling, and drift-mode baseline comparison.

use core::{
    CodeownersState, ExpectationCategory, FpEvent, LicenseInfo, LicenseTier, ManifestMergeQueue, Mode, NonceConfig,
    OrgContext, OrgPolicyManifest, Outcome, PermissionLevel, PolicyExpectation, RepoGovernanceState, RepoMeta,
    Requirement, RuleContext, Severity,
};
use config::OracleConfig;
use oracle::OracleEngine;
use std::collections::HashMap as StdHashMap;
use std::sync::Arc;
use storage::{
    BlockCounter, CloudFPStore, CloudObjectStore, FPStore, LocalSecretStore, ObjectStore, SecretStore,
    SharedBlockCounter,
};

fn nonce_hex() -> String {
    "ab".repeat(16)
}

async fn seeded_secret_store(dir: &std::path::Path) -> LocalSecretStore {
    let store = LocalSecretStore::new(dir.join("nonce.secrets"));
    store
        .put_nonce_config(NonceConfig { value: nonce_hex(), loaded_at: chrono::Utc::now(), source: "test".into(), version: 1 })
        .await
        .unwrap();
    store
}

struct Harness {
    engine: OracleEngine,
    fp_store: Arc<dyn FPStore>,
    block_counter: Arc<dyn BlockCounter>,
    object_store: Arc<dyn ObjectStore>,
}

fn build(config: OracleConfig, secret_store: Arc<dyn SecretStore>) -> Harness {
    let fp_store: Arc<dyn FPStore> = Arc::new(CloudFPStore::new());
    let block_counter: Arc<dyn BlockCounter> = Arc::new(SharedBlockCounter::new());
    let object_store: Arc<dyn ObjectStore> = Arc::new(CloudObjectStore::new("test-bucket"));
    let engine = OracleEngine::new(
        fp_store.clone(),
        block_counter.clone(),
        object_store.clone(),
        secret_store,
        config,
    )
    .unwrap();
    Harness { engine, fp_store, block_counter, object_store }
}

fn base_ctx(mode: Mode) -> RuleContext {
    RuleContext {
        license: LicenseInfo { tier: LicenseTier::Free, features: vec![], expires_at: None },
        files: StdHashMap::new(),
        repo_owner: "acme".into(),
        repo_name: "widgets".into(),
        mode,
        org_context: None,
        branch_protection: None,
        merge_queue_policy: None,
        workflow_jobs: None,
        requested_rule_ids: None,
    }
}

fn workflow_drift_ctx(mode: Mode) -> RuleContext {
    let mut ctx = base_ctx(mode);
    ctx.files.insert(
        ".github/workflows/deploy.yml".to_string(),
        r#"
jobs:
  deploy-staging:
    steps:
      - run: kubectl apply -f k8s/production/deployment.yaml
"#
        .to_string(),
    );
    ctx
}

fn repo(full_name: &str) -> RepoGovernanceState {
    RepoGovernanceState {
        full_name: full_name.into(),
        meta: RepoMeta {
            topics: vec![],
            language: None,
            visibility: "private".into(),
            archived: false,
            default_branch: "main".into(),
            tags: vec![],
        },
        branch_protection: None,
        workflows: vec![],
        default_permissions: PermissionLevel::Read,
        codeowners: CodeownersState { exists: false, covered_paths: vec![] },
        scanned_at: chrono::Utc::now(),
        merge_queue: None,
    }
}

/// A context whose MD-101 run always reports one `missing + critical` gap
/// (and therefore one `Severity::Block` finding) for `acme/api-gateway`.
fn missing_critical_ctx(mode: Mode) -> RuleContext {
    let manifest = OrgPolicyManifest {
        schema_version: "1.0.0".into(),
        org_id: "acme".into(),
        updated_at: chrono::Utc::now(),
        approved_by: "admin".into(),
        defaults: vec![PolicyExpectation {
            id: "bp-main".into(),
            name: "bp-main".into(),
            category: ExpectationCategory::BranchProtection,
            severity: Severity::Critical,
            requirement: Requirement::BranchProtection {
                required_approving_review_count: 2,
                require_code_owner_reviews: false,
                enforce_admins: true,
            },
        }],
        classifications: vec![],
        exemptions: vec![],
        merge_queue: None,
    };
    let org = OrgContext { manifest, repos: vec![repo("acme/api-gateway")] };
    let mut ctx = base_ctx(mode);
    ctx.org_context = Some(org);
    ctx
}

#[tokio::test]
async fn empty_context_allows_and_signs_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let secret_store: Arc<dyn SecretStore> = Arc::new(seeded_secret_store(dir.path()).await);
    let harness = build(OracleConfig::default(), secret_store);
    let report = harness.engine.evaluate(&base_ctx(Mode::PullRequest), "acme", "acme/widgets", false, false).await;
    assert_eq!(report.outcome, Outcome::Allow);
    assert!(!report.redaction_tag.is_empty());
    assert_eq!(report.suppressed_count, 0);
}

#[tokio::test]
async fn merge_group_mode_blocks_on_any_non_allow_finding() {
    let dir = tempfile::tempdir().unwrap();
    let secret_store: Arc<dyn SecretStore> = Arc::new(seeded_secret_store(dir.path()).await);
    let harness = build(OracleConfig::default(), secret_store);
    let report = harness.engine.evaluate(&workflow_drift_ctx(Mode::MergeGroup), "acme", "acme/widgets", false, false).await;
    assert_eq!(report.outcome, Outcome::Block);
}

#[tokio::test]
async fn fp_suppression_drops_a_previously_marked_finding() {
    let dir = tempfile::tempdir().unwrap();
    let secret_store: Arc<dyn SecretStore> = Arc::new(seeded_secret_store(dir.path()).await);
    let harness = build(OracleConfig::default(), secret_store);
    let ctx = workflow_drift_ctx(Mode::PullRequest);

    let first = harness.engine.evaluate(&ctx, "acme", "acme/widgets", false, false).await;
    let finding = first.findings.iter().find(|f| f.rule_id == "MD-100").unwrap();

    harness
        .fp_store
        .record(FpEvent {
            event_id: "evt-1".into(),
            rule_id: finding.rule_id.clone(),
            rule_version: "1.0.0".into(),
            finding_id: finding.id.clone(),
            outcome: Outcome::Warn,
            is_false_positive: false,
            reviewed_by: None,
            reviewed_at: None,
            suppression_ticket: None,
            timestamp: chrono::Utc::now(),
            context: StdHashMap::new(),
            org_id_hash: "hash".into(),
            consent_reference: "consent-1".into(),
        })
        .await
        .unwrap();
    harness.fp_store.mark_false_positive(&finding.rule_id, &finding.id, "reviewer", None).await.unwrap();

    let second = harness.engine.evaluate(&ctx, "acme", "acme/widgets", false, false).await;
    assert!(!second.findings.iter().any(|f| f.id == finding.id));
    assert_eq!(second.suppressed_count, 1);
}

#[tokio::test]
async fn circuit_breaker_demotes_block_to_warn_after_threshold_then_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let secret_store: Arc<dyn SecretStore> = Arc::new(seeded_secret_store(dir.path()).await);
    let mut config = OracleConfig::default();
    config.circuit_breaker.alarm_threshold = 2;
    let harness = build(config, secret_store);
    let ctx = missing_critical_ctx(Mode::Schedule);

    let mut last_outcome = Outcome::Allow;
    for _ in 0..3 {
        let report = harness.engine.evaluate(&ctx, "acme", "acme/api-gateway", false, false).await;
        last_outcome = report.outcome;
    }
    assert_eq!(last_outcome, Outcome::Warn);
    let final_report = harness.engine.evaluate(&ctx, "acme", "acme/api-gateway", false, false).await;
    assert!(final_report.circuit_open_rule_ids.contains(&"MD-101".to_string()));

    harness.block_counter.reset("acme", "MD-101").await.unwrap();
    let recovered = harness.engine.evaluate(&ctx, "acme", "acme/api-gateway", false, false).await;
    assert_eq!(recovered.outcome, Outcome::Block);
    assert!(recovered.circuit_open_rule_ids.is_empty());
}

#[tokio::test]
async fn secret_store_unavailable_fails_closed_unless_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let missing_store: Arc<dyn SecretStore> = Arc::new(LocalSecretStore::new(dir.path().join("missing.secrets")));
    let harness = build(OracleConfig::default(), missing_store);
    let ctx = base_ctx(Mode::PullRequest);

    let blocked = harness.engine.evaluate(&ctx, "acme", "acme/widgets", false, false).await;
    assert_eq!(blocked.outcome, Outcome::Block);
    assert!(blocked.findings.iter().any(|f| f.rule_id == "SYSTEM"));

    let dry = harness.engine.evaluate(&ctx, "acme", "acme/widgets", true, false).await;
    assert_eq!(dry.outcome, Outcome::Allow);
}

#[tokio::test]
async fn drift_mode_allows_a_finding_already_present_in_the_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let secret_store: Arc<dyn SecretStore> = Arc::new(seeded_secret_store(dir.path()).await);
    let harness = build(OracleConfig::default(), secret_store);

    // A non-drift run with persist_baseline explicitly set seeds the
    // baseline with today's findings. A plain evaluate() call (the default,
    // persist_baseline: false) would leave no trace.
    let unpersisted =
        harness.engine.evaluate(&workflow_drift_ctx(Mode::Schedule), "acme", "acme/widgets", false, false).await;
    assert!(unpersisted.findings.iter().any(|f| f.rule_id == "MD-100"));
    assert!(harness.object_store.get_baseline("acme/widgets").await.unwrap().is_none());

    let schedule_report =
        harness.engine.evaluate(&workflow_drift_ctx(Mode::Schedule), "acme", "acme/widgets", false, true).await;
    assert!(schedule_report.findings.iter().any(|f| f.rule_id == "MD-100"));
    assert!(harness.object_store.get_baseline("acme/widgets").await.unwrap().is_some());

    // Drift mode against the now-persisted baseline: nothing new.
    let drift_report =
        harness.engine.evaluate(&workflow_drift_ctx(Mode::Drift), "acme", "acme/widgets", false, false).await;
    assert_eq!(drift_report.outcome, Outcome::Allow);
}

#[tokio::test]
async fn drift_mode_blocks_on_a_must_hold_regression_with_no_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let secret_store: Arc<dyn SecretStore> = Arc::new(seeded_secret_store(dir.path()).await);
    let harness = build(OracleConfig::default(), secret_store);

    let org = OrgContext {
        manifest: OrgPolicyManifest {
            schema_version: "1.0.0".into(),
            org_id: "acme".into(),
            updated_at: chrono::Utc::now(),
            approved_by: "admin".into(),
            defaults: vec![],
            classifications: vec![],
            exemptions: vec![],
            merge_queue: Some(ManifestMergeQueue { required_for_default_branch: false }),
        },
        repos: vec![{
            let mut r = repo("acme/payments-core");
            r.meta.tags = vec!["critical".to_string()];
            r
        }],
    };
    let mut ctx = base_ctx(Mode::Drift);
    ctx.org_context = Some(org);

    let report = harness.engine.evaluate(&ctx, "acme", "acme/payments-core", false, false).await;
    assert_eq!(report.outcome, Outcome::Block);
    assert!(report.findings.iter().any(|f| f.rule_id == "MD-102"));
}
