//! Governance-state aggregator: batch-fetches per-repository governance
//! state from the upstream provider and maps it onto the shared model in
//! `core` (`spec.md` §6). Rate-limited per provider via a token bucket;
//! errors surface as the typed `errors::ProviderError` the oracle engine
//! already knows how to render as a synthetic finding.

pub mod dto;
pub mod mapping;
pub mod provider;
pub mod rate_limit;

pub use provider::{GithubGovernanceStateProvider, GovernanceStateProvider};
pub use rate_limit::RateLimiter;
