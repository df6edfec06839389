//! Token lexicons and step-command regexes used by MD-100 to classify a
//! job's declared intent (from its name) against its inferred intent
//! (from its step commands).

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobIntent {
    Security,
    Test,
    Build,
    DeployStaging,
    DeployProduction,
    Lint,
}

impl JobIntent {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            JobIntent::Security => "security",
            JobIntent::Test => "test",
            JobIntent::Build => "build",
            JobIntent::DeployStaging => "deploy-staging",
            JobIntent::DeployProduction => "deploy-production",
            JobIntent::Lint => "lint",
        }
    }
}

/// Classifies a job name by token match against a fixed lexicon. Longest
/// (most specific) match wins so e.g. "deploy-production-canary" resolves
/// to `DeployProduction`, not a generic deploy bucket.
#[must_use]
pub fn classify_job_name(name: &str) -> Option<JobIntent> {
    let lowered = name.to_lowercase();
    let candidates: &[(&[&str], JobIntent)] = &[
        (&["deploy-production", "deploy_prod", "prod-deploy", "release-production"], JobIntent::DeployProduction),
        (&["deploy-staging", "deploy_stage", "stage-deploy", "release-staging"], JobIntent::DeployStaging),
        (&["security", "secscan", "sec-scan", "vuln"], JobIntent::Security),
        (&["lint", "format", "fmt"], JobIntent::Lint),
        (&["test", "unit", "integration", "spec"], JobIntent::Test),
        (&["build", "compile", "package"], JobIntent::Build),
    ];
    candidates
        .iter()
        .find(|(tokens, _)| tokens.iter().any(|t| lowered.contains(t)))
        .map(|(_, intent)| *intent)
}

static SECURITY_TOOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(trivy|snyk|codeql|bandit|semgrep|npm audit|cargo audit)\b").unwrap());
static TEST_TOOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(pytest|jest|go test|cargo test|pnpm test|npm test|mocha|rspec)\b").unwrap());
static LINT_TOOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(eslint|rubocop|pylint|clippy|flake8|prettier --check|\w+ run lint|\w+ lint)\b").unwrap()
});
static BUILD_TOOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(pnpm build|npm run build|cargo build|make|go build|docker build)\b").unwrap());
static DEPLOY_TOOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(kubectl apply|helm upgrade|terraform apply|aws deploy|gcloud deploy)\b").unwrap());
static PRODUCTION_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bprod(uction)?\b").unwrap());

/// Infers the intent a job's steps actually carry out, by regex over the
/// shell commands in its `run:` steps. Returns `None` for jobs whose
/// commands don't match any known tool (kept out of the name/step diff
/// entirely, rather than treated as an automatic mismatch).
#[must_use]
pub fn infer_step_intent(commands: &[String]) -> Option<JobIntent> {
    let joined = commands.join("\n");
    if DEPLOY_TOOLS.is_match(&joined) {
        return Some(if PRODUCTION_MARKER.is_match(&joined) {
            JobIntent::DeployProduction
        } else {
            JobIntent::DeployStaging
        });
    }
    if SECURITY_TOOLS.is_match(&joined) {
        return Some(JobIntent::Security);
    }
    if TEST_TOOLS.is_match(&joined) {
        return Some(JobIntent::Test);
    }
    if LINT_TOOLS.is_match(&joined) {
        return Some(JobIntent::Lint);
    }
    if BUILD_TOOLS.is_match(&joined) {
        return Some(JobIntent::Build);
    }
    None
}

/// True when every step is a plain repo checkout (nothing to classify).
#[must_use]
pub fn is_checkout_only(commands: &[String], uses_steps: &[String]) -> bool {
    commands.is_empty() && uses_steps.iter().all(|u| u.starts_with("actions/checkout"))
}
