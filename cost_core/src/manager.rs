//! # Project Manager
//!
//! Runs the foundation pipeline for a project and merges the result with
//! the totals of the other balance-of-system phases:
//!
//! ```text
//! components ─► loads ─► volume ─► material needs ─┬─► schedule ─┐
//!                                                  │             ├─► costs ─► totals
//! weather ─► project window ─► wind delay ◄────────┴─────────────┘
//! ```
//!
//! A batch runs projects one after another. A project that fails is
//! reported with its typed error and the batch carries on with the next one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cost_core::file_io::load_project;
//! use cost_core::manager::run_batch;
//! use std::path::Path;
//!
//! let project = load_project(Path::new("prairie_ridge.gwp"))?;
//! let report = run_batch(&[project]);
//! for run in &report.runs {
//!     println!("{}: {}", run.project_name, run.outcome.status());
//! }
//! # Ok::<(), cost_core::errors::CalcError>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::calculations::foundation::determine_foundation_size;
use crate::calculations::schedule::{estimate_construction_time, max_time_construct_days, OperationSchedule};
use crate::config::FoundationConfig;
use crate::costs::{
    aggregate_costs, labor_equipment_costs, material_costs, total_usd, wind_multiplier, CostLineItem, Phase,
    PhaseCost, TotalFoundationCost,
};
use crate::errors::{CalcError, CalcResult};
use crate::loads::{calculate_foundation_loads, FoundationLoads};
use crate::materials::{estimate_material_needs, MaterialQuantity};
use crate::project::{Project, ProjectInput};
use crate::weather::{calculate_wind_delay, required_hours, WeatherWindow, WindDelay};

/// Every intermediate result of one foundation cost run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationCostReport {
    pub loads: FoundationLoads,

    /// Volume of one foundation (m³)
    pub foundation_volume_m3: f64,

    /// Quantities for all turbines
    pub material_needs: Vec<MaterialQuantity>,

    pub operations: Vec<OperationSchedule>,
    pub wind_delay: WindDelay,
    pub wind_multiplier: f64,

    /// Labor and equipment items (with weather) followed by material items
    pub line_items: Vec<CostLineItem>,

    /// One row per cost type
    pub totals: Vec<TotalFoundationCost>,
}

impl FoundationCostReport {
    /// Total foundation cost (USD)
    pub fn total_usd(&self) -> f64 {
        total_usd(&self.totals)
    }
}

/// Weather hours available to the whole project: construction seasons and
/// time window, capped at the project's construction duration.
pub fn project_weather_window(input: &ProjectInput, config: &FoundationConfig) -> CalcResult<WeatherWindow> {
    let daily_hours = config.daily_operating_hours(&input.time_construct)?;
    let project_days = input.construct_duration_months * config.schedule.days_per_month;
    let max_hours = required_hours(project_days, daily_hours)?;

    let window = WeatherWindow::create(&input.weather, &input.season_construct, &input.time_construct)
        .truncated(max_hours);
    debug!(hours = window.len(), max_hours, "project weather window created");
    Ok(window)
}

/// Run the foundation pipeline on a prepared weather window.
///
/// # Errors
///
/// Any stage error: `InvalidInput`, `JoinMismatch`, `DivisionByZero` or
/// `InvalidSchedule`.
pub fn calculate_foundation_cost(
    input: &ProjectInput,
    window: &WeatherWindow,
    config: &FoundationConfig,
) -> CalcResult<FoundationCostReport> {
    let loads = calculate_foundation_loads(&input.components, config)?;
    let foundation_volume_m3 = determine_foundation_size(&loads, config)?;
    let material_needs = estimate_material_needs(foundation_volume_m3, input.num_turbines, config)?;
    let materials = material_costs(&material_needs, &input.material_price)?;

    let operations = estimate_construction_time(
        &input.throughput,
        &material_needs,
        input.construct_duration_months,
        config,
    )?;
    let mission_days = max_time_construct_days(&operations)
        .ok_or_else(|| CalcError::invalid_schedule("no construction operations scheduled"))?;

    let daily_hours = config.daily_operating_hours(&input.time_construct)?;
    let wind_delay = calculate_wind_delay(window, mission_days, daily_hours, &config.weather)?;
    let multiplier = wind_multiplier(wind_delay.total_delay_hours, &operations)?;

    let mut line_items = labor_equipment_costs(&operations, multiplier);
    line_items.extend(materials);
    let totals = aggregate_costs(&line_items, Phase::Foundations);

    Ok(FoundationCostReport {
        loads,
        foundation_volume_m3,
        material_needs,
        operations,
        wind_delay,
        wind_multiplier: multiplier,
        line_items,
        totals,
    })
}

/// Cost summary of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCostSummary {
    pub foundation: FoundationCostReport,

    /// Other phases' totals followed by the foundation totals
    pub phase_costs: Vec<PhaseCost>,

    pub foundation_cost_usd: f64,

    /// Grand total across all phases
    pub project_value_usd: f64,
}

/// Run one project end to end.
pub fn run_project(project: &Project) -> CalcResult<ProjectCostSummary> {
    project.validate()?;

    let config = &project.config;
    let window = project_weather_window(&project.input, config)?;

    debug!(project = project.name(), "begin foundation cost calculation");
    let foundation = calculate_foundation_cost(&project.input, &window, config)?;
    debug!(project = project.name(), "end foundation cost calculation");

    let mut phase_costs = project.input.other_phase_costs.clone();
    phase_costs.extend(foundation.totals.iter().cloned());

    let foundation_cost_usd = foundation.total_usd();
    let project_value_usd = total_usd(&phase_costs);

    Ok(ProjectCostSummary {
        foundation,
        phase_costs,
        foundation_cost_usd,
        project_value_usd,
    })
}

/// Result of one project within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result")]
pub enum ProjectOutcome {
    Completed(Box<ProjectCostSummary>),
    Failed(CalcError),
}

impl ProjectOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ProjectOutcome::Completed(_))
    }

    /// Status label; matches the `status` tag in JSON reports
    pub fn status(&self) -> &'static str {
        match self {
            ProjectOutcome::Completed(_) => "Completed",
            ProjectOutcome::Failed(_) => "Failed",
        }
    }
}

/// One project's run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRun {
    /// Absent when the project file could not be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    pub project_name: String,
    pub outcome: ProjectOutcome,
}

impl ProjectRun {
    /// Record a project that failed before it could be run, e.g. an
    /// unreadable or locked project file.
    pub fn failed(project_name: impl Into<String>, error: CalcError) -> Self {
        let project_name = project_name.into();
        error!(project = %project_name, code = error.error_code(), error = %error, "project failed");
        ProjectRun {
            project_id: None,
            project_name,
            outcome: ProjectOutcome::Failed(error),
        }
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub runs: Vec<ProjectRun>,
}

impl BatchReport {
    pub fn completed_count(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.is_completed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.runs.len() - self.completed_count()
    }

    pub fn all_completed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Find a run by project name
    pub fn get(&self, project_name: &str) -> Option<&ProjectRun> {
        self.runs.iter().find(|r| r.project_name == project_name)
    }
}

/// Run one project and record its outcome. Errors are logged, never propagated.
pub fn run_logged(project: &Project) -> ProjectRun {
    info!(project = project.name(), id = %project.meta.id, "running project");

    let outcome = match run_project(project) {
        Ok(summary) => {
            info!(
                project = project.name(),
                foundation_cost_usd = summary.foundation_cost_usd,
                project_value_usd = summary.project_value_usd,
                "project completed"
            );
            ProjectOutcome::Completed(Box::new(summary))
        }
        Err(e) => {
            error!(project = project.name(), code = e.error_code(), error = %e, "project failed");
            ProjectOutcome::Failed(e)
        }
    };

    ProjectRun {
        project_id: Some(project.meta.id),
        project_name: project.meta.name.clone(),
        outcome,
    }
}

/// Run every project in order. Failures are recorded, never propagated.
pub fn run_batch(projects: &[Project]) -> BatchReport {
    BatchReport {
        runs: projects.iter().map(run_logged).collect(),
    }
}
