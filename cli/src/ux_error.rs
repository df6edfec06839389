//! Human-facing error formatting for the thin CLI wrapper. The engine
//! itself never returns an error (`oracle::evaluate` is infallible); these
//! are for the handful of failures that happen before the engine ever runs
//! — a bad context file, a bad config, an unparseable mode.

use colored::Colorize;

#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self { what: what.into(), why: None, how_to_fix: Vec::new() }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), self.what.white().bold());
        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }
        if !self.how_to_fix.is_empty() {
            eprintln!();
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }
        eprintln!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn context_file_unreadable(path: &str, reason: &str) -> UxError {
    UxError::new(format!("could not read context file '{path}'"))
        .why(reason.to_string())
        .fix("Pass a --context path to a JSON-encoded RuleContext")
}

pub fn context_file_malformed(path: &str, reason: &str) -> UxError {
    UxError::new(format!("context file '{path}' is not a valid RuleContext"))
        .why(reason.to_string())
        .fix("Check the file against core::RuleContext's JSON shape")
}

pub fn config_file_invalid(path: &str, reason: &str) -> UxError {
    UxError::new(format!("config file '{path}' failed to load"))
        .why(reason.to_string())
        .fix("Check the file for unknown keys or out-of-range thresholds")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_collects_every_field() {
        let err = UxError::new("bad thing").why("because reasons").fix("try this").fix("or this");
        assert_eq!(err.what, "bad thing");
        assert_eq!(err.why, Some("because reasons".to_string()));
        assert_eq!(err.how_to_fix, vec!["try this".to_string(), "or this".to_string()]);
    }

    #[test]
    fn display_matches_what() {
        let err = UxError::new("bad thing");
        assert_eq!(format!("{err}"), "bad thing");
    }

    #[test]
    fn context_file_unreadable_names_the_path() {
        let err = context_file_unreadable("/tmp/ctx.json", "no such file");
        assert!(err.what.contains("/tmp/ctx.json"));
        assert_eq!(err.why, Some("no such file".to_string()));
    }
}
