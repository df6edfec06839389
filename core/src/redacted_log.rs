//! Structural secret redaction for logging.
//!
//! The Design Notes forbid cross-cutting logging of secret material: "the
//! logger interface takes structured records that explicitly exclude
//! `nonce`, `publicKey`, and `signature` fields; secrets are referenced by
//! `version` only." Rather than trust every call site to remember this,
//! `LogSafe` is the only way `trust`/`storage` types are turned into
//! loggable key-value pairs — there is no path from a `NonceBinding` to a
//! `tracing` field that isn't mediated by this trait.

use crate::identity::NonceBinding;
use crate::nonce_config::NonceConfig;
use std::collections::BTreeMap;

pub trait LogSafe {
    /// Structured fields safe to pass to `tracing`. Never contains the raw
    /// secret value — only identifiers and the `version` it was loaded as.
    fn log_fields(&self) -> BTreeMap<&'static str, String>;
}

impl LogSafe for NonceConfig {
    fn log_fields(&self) -> BTreeMap<&'static str, String> {
        let mut m = BTreeMap::new();
        m.insert("version", self.version.to_string());
        m.insert("source", self.source.clone());
        m
    }
}

impl LogSafe for NonceBinding {
    fn log_fields(&self) -> BTreeMap<&'static str, String> {
        let mut m = BTreeMap::new();
        m.insert("org_id", self.org_id.clone());
        m.insert("revoked", self.revoked.to_string());
        m.insert("generation", self.generation.to_string());
        m
    }
}
