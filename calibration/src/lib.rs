//! FP-rate calibration: reputation weighting, time-decayed consistency
//! scoring, and Byzantine-robust consensus aggregation (`spec.md` §4.4).

pub mod aggregate;
pub mod consistency;
pub mod filter;
pub mod reputation;

pub use aggregate::{aggregate_fps_by_rule, CalibrationResult, ConfidenceLevel};
pub use consistency::{compute_consistency, ConsistencyResult};
pub use filter::{run as run_byzantine_filter, DropReason, FilterOutcome, RawContribution, Survivor};
pub use reputation::{contribution_weight, stake_multiplier};
