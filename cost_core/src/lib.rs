//! # cost_core - Wind Turbine Foundation Cost Engine
//!
//! `cost_core` estimates what it costs to build the foundations of a wind
//! plant. It turns turbine geometry, site weather, crew throughput and price
//! tables into a cost breakdown by type (labor, equipment, materials). All
//! inputs and outputs are JSON-serializable.
//!
//! ## Pipeline
//!
//! 1. [`loads`] - wind force, overturning moment and dead load
//! 2. [`calculations::foundation`] - raft volume from the loads
//! 3. [`materials`] - rebar and concrete quantities
//! 4. [`calculations::schedule`] - days, crews and nominal cost per operation
//! 5. [`weather`] - wind delay over the construction mission
//! 6. [`costs`] - weather multiplier, line items and totals
//!
//! [`manager`] runs the pipeline for one project or a batch of projects.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: the calculation stages are pure functions
//! - **JSON-First**: every input and result implements Serialize/Deserialize
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use cost_core::project::{Project, ProjectInput};
//!
//! let input = ProjectInput::new(20, 9.0, "normal").with_season("summer");
//! let project = Project::new("Prairie Ridge", input);
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("\"num_turbines\": 20"));
//! ```
//!
//! ## Modules
//!
//! - [`project`] - project container and inputs
//! - [`config`] - calibration constants
//! - [`errors`] - structured error types
//! - [`file_io`] - project files with atomic saves and locking
//! - [`tables`] - CSV readers for the input tables
//! - [`logging`] - tracing subscriber setup

pub mod calculations;
pub mod config;
pub mod costs;
pub mod errors;
pub mod file_io;
pub mod loads;
pub mod logging;
pub mod manager;
pub mod materials;
pub mod project;
pub mod tables;
pub mod weather;

// Re-export commonly used types at crate root for convenience
pub use config::FoundationConfig;
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_project, save_project, FileLock};
pub use manager::{
    run_batch, run_logged, run_project, BatchReport, FoundationCostReport, ProjectCostSummary, ProjectOutcome, ProjectRun,
};
pub use project::{Project, ProjectInput, ProjectMetadata};
