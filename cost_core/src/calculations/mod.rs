//! # Foundation Calculations
//!
//! The two engineering steps between loads and cost:
//!
//! - [`foundation`] - raft volume from foundation loads
//! - [`schedule`] - days, crews and nominal cost per construction operation
//!
//! Like the rest of the crate, each step is a pure function taking its
//! inputs and a [`FoundationConfig`](crate::config::FoundationConfig) and
//! returning `Result<_, CalcError>`.

pub mod foundation;
pub mod schedule;

// Re-export commonly used types
pub use foundation::determine_foundation_size;
pub use schedule::{
    estimate_construction_time, max_time_construct_days, validate_throughput_join, OperationSchedule,
    ThroughputRecord,
};
