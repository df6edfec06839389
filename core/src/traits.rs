//! Small, single-purpose traits every crate can depend on without pulling
//! in I/O. Mirrors the teacher's `HealthCheck` trait in `mk_core/src/traits.rs`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

pub trait HealthCheck: Send + Sync {
    fn health_check(&self) -> HealthStatus;
}
