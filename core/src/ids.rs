//! Validated newtype identifiers.
//!
//! Follows the same shape as the teacher's `TenantId`/`UserId`: a private
//! inner `String`, a validated constructor returning `Option<Self>`, and
//! `Display`/`FromStr` so the id round-trips through config files and wire
//! JSON without ceremony at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier. Rejects empty or overlong values.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Option<Self> {
                let id = id.into();
                if id.is_empty() || id.len() > 200 {
                    return None;
                }
                Some(Self(id))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::new(s).ok_or(concat!("invalid ", stringify!($name)))
            }
        }
    };
}

string_id!(OrgId, "Organization identifier, stable across manifests and reports.");
string_id!(RuleId, "Stable rule identifier, e.g. \"MD-101\".");
string_id!(RepoId, "Repository full name, e.g. \"owner/name\".");
string_id!(
    ExpectationId,
    "Identifier of one `PolicyExpectation` within a manifest."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(RuleId::new("").is_none());
    }

    #[test]
    fn round_trips_display_and_from_str() {
        let id = RuleId::new("MD-101").unwrap();
        let parsed: RuleId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
