//! `GovernanceStateProvider`: the governance-state aggregator's external
//! collaborator boundary (`spec.md` §6). `GithubGovernanceStateProvider` is
//! the real GitHub-backed realization; a fresh `octocrab::Octocrab` client
//! is built per call since each call carries its own token (`spec.md` §6:
//! "Accepts {org, token, defaultBranch?}").

use crate::dto::{BranchProtectionResponse, ContentItem, ContentType, RepoResponse};
use crate::mapping::{map_branch_protection, map_default_permission, map_repo_meta, parse_workflow_job_names};
use crate::rate_limit::RateLimiter;
use async_trait::async_trait;
use base64::Engine;
use core::{CodeownersState, RepoGovernanceState, WorkflowRef};
use errors::ProviderError;
use serde::Deserialize;

/// CODEOWNERS search order, first hit wins (`spec.md` §6).
const CODEOWNERS_PATHS: &[&str] = &[".github/CODEOWNERS", "CODEOWNERS", "docs/CODEOWNERS"];

#[async_trait]
pub trait GovernanceStateProvider: Send + Sync {
    async fn fetch_repo_state(
        &self,
        org: &str,
        repo: &str,
        token: &str,
        default_branch: Option<&str>,
    ) -> Result<RepoGovernanceState, ProviderError>;

    async fn fetch_org_state(
        &self,
        org: &str,
        repo_names: &[String],
        token: &str,
    ) -> Result<Vec<RepoGovernanceState>, ProviderError>;
}

pub struct GithubGovernanceStateProvider {
    rate_limiter: RateLimiter,
    base_uri: Option<String>,
}

impl GithubGovernanceStateProvider {
    #[must_use]
    pub fn new() -> Self {
        Self { rate_limiter: RateLimiter::github_default(), base_uri: None }
    }

    /// Points the client at a mock server instead of api.github.com.
    #[must_use]
    pub fn with_base_uri(base_uri: impl Into<String>) -> Self {
        Self { rate_limiter: RateLimiter::github_default(), base_uri: Some(base_uri.into()) }
    }

    fn client(&self, token: &str) -> Result<octocrab::Octocrab, ProviderError> {
        let mut builder = octocrab::Octocrab::builder().personal_token(token.to_string());
        if let Some(base_uri) = &self.base_uri {
            builder = builder
                .base_uri(base_uri.as_str())
                .map_err(|e| ProviderError::Provider { cause: e.to_string() })?;
        }
        builder.build().map_err(|e| ProviderError::Provider { cause: e.to_string() })
    }

    async fn fetch_codeowners(&self, client: &octocrab::Octocrab, org: &str, repo: &str) -> Result<CodeownersState, ProviderError> {
        for path in CODEOWNERS_PATHS {
            match get_content_file(client, org, repo, path).await {
                Ok(Some(content)) => {
                    let covered = content.lines().filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#')).count();
                    tracing::debug!(org, repo, path, covered, "found CODEOWNERS");
                    return Ok(CodeownersState { exists: true, covered_paths: covered_lines(&content) });
                }
                Ok(None) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(CodeownersState { exists: false, covered_paths: Vec::new() })
    }

    async fn fetch_workflows(&self, client: &octocrab::Octocrab, org: &str, repo: &str) -> Result<Vec<WorkflowRef>, ProviderError> {
        let route = format!("/repos/{org}/{repo}/contents/.github/workflows");
        let listing: Result<Vec<ContentItem>, octocrab::Error> = client.get(&route, None::<&()>).await;
        let entries = match listing {
            Ok(entries) => entries,
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(classify_error(e)),
        };

        let mut workflows = Vec::new();
        for entry in entries.into_iter().filter(|e| matches!(e.kind, ContentType::File)) {
            if let Some(content) = get_content_file(client, org, repo, &entry.path).await? {
                workflows.push(WorkflowRef { path: entry.path, job_names: parse_workflow_job_names(&content) });
            }
        }
        Ok(workflows)
    }
}

impl Default for GithubGovernanceStateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GovernanceStateProvider for GithubGovernanceStateProvider {
    async fn fetch_repo_state(
        &self,
        org: &str,
        repo: &str,
        token: &str,
        default_branch: Option<&str>,
    ) -> Result<RepoGovernanceState, ProviderError> {
        self.rate_limiter.acquire(org, chrono::Utc::now()).await?;
        let client = self.client(token)?;

        let repo_route = format!("/repos/{org}/{repo}");
        let repo_dto: RepoResponse = client.get(&repo_route, None::<&()>).await.map_err(classify_error)?;
        let branch = default_branch.map(str::to_string).unwrap_or_else(|| repo_dto.default_branch.clone());

        let org_route = format!("/orgs/{org}");
        let org_dto: OrgResponse = client.get(&org_route, None::<&()>).await.map_err(classify_error)?;

        let protection_route = format!("/repos/{org}/{repo}/branches/{branch}/protection");
        let protection: Result<BranchProtectionResponse, octocrab::Error> = client.get(&protection_route, None::<&()>).await;
        let branch_protection = match protection {
            Ok(dto) => Some(map_branch_protection(dto)),
            Err(e) if is_not_found(&e) => None,
            Err(e) => return Err(classify_error(e)),
        };

        let workflows = self.fetch_workflows(&client, org, repo).await?;
        let codeowners = self.fetch_codeowners(&client, org, repo).await?;

        Ok(RepoGovernanceState {
            full_name: format!("{org}/{repo}"),
            meta: map_repo_meta(repo_dto, Vec::new()),
            branch_protection,
            workflows,
            default_permissions: map_default_permission(org_dto.default_repository_permission.as_deref().unwrap_or("read")),
            codeowners,
            scanned_at: chrono::Utc::now(),
            merge_queue: None,
        })
    }

    async fn fetch_org_state(
        &self,
        org: &str,
        repo_names: &[String],
        token: &str,
    ) -> Result<Vec<RepoGovernanceState>, ProviderError> {
        let mut states = Vec::with_capacity(repo_names.len());
        for repo in repo_names {
            states.push(self.fetch_repo_state(org, repo, token, None).await?);
        }
        Ok(states)
    }
}

#[derive(Debug, Deserialize)]
struct OrgResponse {
    default_repository_permission: Option<String>,
}

async fn get_content_file(
    client: &octocrab::Octocrab,
    org: &str,
    repo: &str,
    path: &str,
) -> Result<Option<String>, ProviderError> {
    let route = format!("/repos/{org}/{repo}/contents/{path}");
    let result: Result<ContentItem, octocrab::Error> = client.get(&route, None::<&()>).await;
    match result {
        Ok(item) => {
            let Some(encoded) = item.content else { return Ok(None) };
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded.replace('\n', ""))
                .map_err(|e| ProviderError::Provider { cause: format!("malformed base64 content at {path}: {e}") })?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(classify_error(e)),
    }
}

fn covered_lines(codeowners_content: &str) -> Vec<String> {
    codeowners_content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            line.split_whitespace().next().map(str::to_string)
        })
        .collect()
}

fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.status_code == reqwest::StatusCode::NOT_FOUND)
}

fn classify_error(err: octocrab::Error) -> ProviderError {
    match &err {
        octocrab::Error::GitHub { source, .. } if source.status_code == reqwest::StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::RateLimited { reset_at: chrono::Utc::now() + chrono::Duration::minutes(1) }
        }
        _ => ProviderError::Provider { cause: err.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_branch_protection_maps_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "default_branch": "main", "topics": [], "language": "Rust", "visibility": "private", "archived": false
            })))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/orgs/acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"default_repository_permission": "read"})))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/branches/main/protection"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/contents/.github/workflows"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/contents/.github/CODEOWNERS"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/contents/CODEOWNERS"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server).await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/contents/docs/CODEOWNERS"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server).await;

        let provider = GithubGovernanceStateProvider::with_base_uri(server.uri());
        let state = provider.fetch_repo_state("acme", "widgets", "test-token", None).await.unwrap();
        assert!(state.branch_protection.is_none());
        assert!(!state.codeowners.exists);
        assert!(state.workflows.is_empty());
    }
}
