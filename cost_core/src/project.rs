//! # Project Data Structures
//!
//! A `Project` holds everything needed to price the foundations of one wind
//! plant. Projects serialize to `.gwp` (Groundwork project) files as
//! human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (schema version, id, name, timestamps)
//! ├── config: FoundationConfig (calibration overrides, optional)
//! └── input: ProjectInput
//!     ├── num_turbines, construct_duration_months
//!     ├── season_construct, time_construct
//!     ├── components, material_price, throughput, weather
//!     └── other_phase_costs (roads, substation, ... totals)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cost_core::project::{Project, ProjectInput};
//!
//! let input = ProjectInput::new(20, 9.0, "normal").with_season("summer");
//! let project = Project::new("Prairie Ridge", input);
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("Prairie Ridge"));
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::schedule::ThroughputRecord;
use crate::config::FoundationConfig;
use crate::costs::PhaseCost;
use crate::errors::{CalcError, CalcResult};
use crate::loads::ComponentRecord;
use crate::materials::MaterialPrice;
use crate::weather::WeatherRecord;

/// Current schema version for .gwp files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, id, name)
    pub meta: ProjectMetadata,

    /// Calibration overrides; anything omitted keeps the reference value
    #[serde(default)]
    pub config: FoundationConfig,

    /// Engineering, price and schedule inputs
    pub input: ProjectInput,
}

impl Project {
    /// Create a new project with the reference configuration.
    pub fn new(name: impl Into<String>, input: ProjectInput) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                name: name.into(),
                created: now,
                modified: now,
            },
            config: FoundationConfig::default(),
            input,
        }
    }

    /// Replace the calibration (builder pattern)
    pub fn with_config(mut self, config: FoundationConfig) -> Self {
        self.config = config;
        self
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Project name used in logs and reports
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Validate project-level inputs and calibration.
    ///
    /// Table contents are validated by the stage that consumes them.
    pub fn validate(&self) -> CalcResult<()> {
        if self.meta.name.trim().is_empty() {
            return Err(CalcError::missing_field("meta.name"));
        }
        self.config.validate()?;
        self.input.validate()
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Stable project identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Project name (e.g. "Prairie Ridge Phase II")
    pub name: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Inputs for one project's foundation cost run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInput {
    /// Number of turbines (one foundation each)
    pub num_turbines: u32,

    /// Total construction duration for the project (months)
    pub construct_duration_months: f64,

    /// Seasons in which construction takes place
    pub season_construct: BTreeSet<String>,

    /// Time-of-day window id (key into the operating hours table)
    pub time_construct: String,

    /// Tower, nacelle and rotor sub-components
    #[serde(default)]
    pub components: Vec<ComponentRecord>,

    /// Material unit prices
    #[serde(default)]
    pub material_price: Vec<MaterialPrice>,

    /// Crew and equipment throughput (RSMeans-style)
    #[serde(default)]
    pub throughput: Vec<ThroughputRecord>,

    /// Hourly site weather
    #[serde(default)]
    pub weather: Vec<WeatherRecord>,

    /// Totals from other balance-of-system phases, merged into the project total
    #[serde(default)]
    pub other_phase_costs: Vec<PhaseCost>,
}

impl ProjectInput {
    /// Create inputs with empty tables
    pub fn new(num_turbines: u32, construct_duration_months: f64, time_construct: impl Into<String>) -> Self {
        ProjectInput {
            num_turbines,
            construct_duration_months,
            season_construct: BTreeSet::new(),
            time_construct: time_construct.into(),
            components: Vec::new(),
            material_price: Vec::new(),
            throughput: Vec::new(),
            weather: Vec::new(),
            other_phase_costs: Vec::new(),
        }
    }

    /// Add a construction season (builder pattern)
    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season_construct.insert(season.into());
        self
    }

    /// Validate scalar inputs and the presence of required tables.
    pub fn validate(&self) -> CalcResult<()> {
        if self.num_turbines == 0 {
            return Err(CalcError::invalid_input(
                "num_turbines",
                self.num_turbines.to_string(),
                "At least one turbine is required",
            ));
        }
        if !self.construct_duration_months.is_finite() || self.construct_duration_months <= 0.0 {
            return Err(CalcError::invalid_input(
                "construct_duration_months",
                self.construct_duration_months.to_string(),
                "Construction duration must be finite and positive",
            ));
        }
        if self.season_construct.is_empty() {
            return Err(CalcError::missing_field("season_construct"));
        }
        if self.time_construct.trim().is_empty() {
            return Err(CalcError::missing_field("time_construct"));
        }
        if self.components.is_empty() {
            return Err(CalcError::missing_field("components"));
        }
        if self.throughput.is_empty() {
            return Err(CalcError::missing_field("throughput"));
        }
        if self.material_price.is_empty() {
            return Err(CalcError::missing_field("material_price"));
        }
        for (index, cost) in self.other_phase_costs.iter().enumerate() {
            if !cost.cost_usd.is_finite() {
                return Err(CalcError::invalid_input(
                    format!("other_phase_costs[{}].cost_usd", index),
                    cost.cost_usd.to_string(),
                    "Cost must be finite",
                ));
            }
        }
        Ok(())
    }
}
