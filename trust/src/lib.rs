//! Identity verification, nonce binding/rotation, and redaction-integrity
//! tagging (`spec.md` §4.5).

pub mod identity;
pub mod redaction;

pub use identity::{
    generate_and_bind_nonce, get_rotation_history, revoke_binding, rotate_nonce, verify_binding,
    VerificationOutcome,
};
pub use redaction::{compute_tag, verify_tag};
