//! Minimal DTOs for the upstream REST shapes `spec.md` §6 names. Kept
//! narrow and hand-written rather than pulled from octocrab's general
//! models, same way the teacher's `okta.rs` defines its own `IdpUser`/
//! `IdpGroup` instead of reusing a third-party SDK's full model.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RepoResponse {
    pub default_branch: String,
    #[serde(default)]
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub visibility: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct RequiredPullRequestReviewsResponse {
    pub required_approving_review_count: u32,
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    #[serde(default)]
    pub require_code_owner_reviews: bool,
}

#[derive(Debug, Deserialize)]
pub struct RequiredStatusChecksResponse {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub contexts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnforceAdminsResponse {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct BranchProtectionResponse {
    pub required_pull_request_reviews: Option<RequiredPullRequestReviewsResponse>,
    #[serde(default)]
    pub enforce_admins: Option<EnforceAdminsResponse>,
    pub required_status_checks: Option<RequiredStatusChecksResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    File,
    Dir,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    /// Base64-encoded, present only when fetching a single file, not a
    /// directory listing.
    pub content: Option<String>,
}
