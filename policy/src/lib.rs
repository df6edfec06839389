//! Cross-repository policy manifest resolution: validation, repo matching,
//! per-repo expectation resolution, and gap detection against observed
//! governance state (`spec.md` §4.3).

pub mod gaps;
pub mod matcher;
pub mod resolve;
pub mod validate;

pub use gaps::{detect_gaps, Gap};
pub use matcher::matches_repo;
pub use resolve::{resolve_for_repo, ResolvedPolicy};
pub use validate::{validate, ValidationReport};
