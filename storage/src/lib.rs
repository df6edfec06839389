//! Storage adapters for the governance oracle's policy-enforcement and
//! trust subsystems. Each adapter is a small `async_trait` with a `Local`
//! (file- or in-process-backed) and a `Cloud` realization, mirroring the
//! teacher's `SecretProvider` pattern: call sites depend on the trait, never
//! on which realization is wired in.

pub mod block_counter;
pub mod consent_store;
pub mod fp_store;
pub mod identity_store;
pub mod object_store;
pub mod reputation_store;
pub mod secret_store;

pub use block_counter::{BlockCounter, CloudBlockCounter, CounterState, SharedBlockCounter};
pub use consent_store::{CloudConsentStore, ConsentStore, LocalConsentStore};
pub use fp_store::{CloudFPStore, FPStore, LocalFPStore};
pub use identity_store::{CloudIdentityStore, IdentityStore, LocalIdentityStore};
pub use object_store::{CloudObjectStore, LocalObjectStore, ObjectStore};
pub use reputation_store::{CloudReputationStore, LocalReputationStore, ReputationStore};
pub use secret_store::{CloudSecretStore, LocalSecretStore, SecretStore};
