//! `MatchesRepo`: whether a classification's matcher accepts a repository.

use core::{ClassificationMatch, RepoMeta};

/// True if any of: explicit `repos[]` names it; a glob in `patterns[]`
/// matches the full name; a topic in `topics[]` overlaps; `visibility`
/// equals the repo's visibility.
#[must_use]
pub fn matches_repo(matcher: &ClassificationMatch, repo_name: &str, repo_meta: &RepoMeta) -> bool {
    if matcher.repos.iter().any(|r| r == repo_name) {
        return true;
    }
    if matcher.patterns.iter().any(|pattern| utils::glob_matches(pattern, repo_name)) {
        return true;
    }
    if matcher.topics.iter().any(|topic| repo_meta.topics.contains(topic)) {
        return true;
    }
    if let Some(visibility) = &matcher.visibility {
        if visibility == &repo_meta.visibility {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(topics: &[&str], visibility: &str) -> RepoMeta {
        RepoMeta {
            topics: topics.iter().map(|s| s.to_string()).collect(),
            language: None,
            visibility: visibility.to_string(),
            archived: false,
            default_branch: "main".into(),
            tags: vec![],
        }
    }

    #[test]
    fn explicit_repo_list_matches() {
        let matcher = ClassificationMatch {
            repos: vec!["acme/payments".into()],
            ..Default::default()
        };
        assert!(matches_repo(&matcher, "acme/payments", &meta(&[], "private")));
        assert!(!matches_repo(&matcher, "acme/other", &meta(&[], "private")));
    }

    #[test]
    fn glob_pattern_is_anchored_and_case_sensitive() {
        let matcher = ClassificationMatch {
            patterns: vec!["acme/payments-*".into()],
            ..Default::default()
        };
        assert!(matches_repo(&matcher, "acme/payments-service", &meta(&[], "private")));
        assert!(!matches_repo(&matcher, "acme/Payments-service", &meta(&[], "private")));
        assert!(!matches_repo(&matcher, "other/acme/payments-service", &meta(&[], "private")));
    }

    #[test]
    fn topic_overlap_matches() {
        let matcher = ClassificationMatch {
            topics: vec!["pci".into()],
            ..Default::default()
        };
        assert!(matches_repo(&matcher, "acme/x", &meta(&["pci", "billing"], "private")));
        assert!(!matches_repo(&matcher, "acme/x", &meta(&["billing"], "private")));
    }

    #[test]
    fn visibility_match() {
        let matcher = ClassificationMatch {
            visibility: Some("public".into()),
            ..Default::default()
        };
        assert!(matches_repo(&matcher, "acme/x", &meta(&[], "public")));
        assert!(!matches_repo(&matcher, "acme/x", &meta(&[], "private")));
    }
}
