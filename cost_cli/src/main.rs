//! # Groundwork CLI
//!
//! Runs foundation cost estimates for one or more `.gwp` project files.
//!
//! ```text
//! cost_cli [--weather site.csv] [--out results.json] [--user id] project.gwp...
//! ```
//!
//! Projects run in the order given. A failed project is reported and the
//! rest still run; the exit status is 1 if any project failed.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use cost_core::errors::CalcResult;
use cost_core::file_io::{load_project, write_json_atomic, FileLock};
use cost_core::manager::{run_logged, BatchReport, ProjectOutcome, ProjectRun};
use cost_core::project::Project;
use cost_core::weather::WeatherRecord;
use cost_core::{logging, tables};

const USAGE: &str = "usage: cost_cli [--weather <csv>] [--out <json>] [--user <id>] <project.gwp>...";

#[derive(Debug, Default)]
struct Args {
    projects: Vec<PathBuf>,
    weather: Option<PathBuf>,
    out: Option<PathBuf>,
    user: Option<String>,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut raw = raw.into_iter();

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--weather" => args.weather = Some(raw.next().context("--weather needs a CSV path")?.into()),
            "--out" => args.out = Some(raw.next().context("--out needs a JSON path")?.into()),
            "--user" => args.user = Some(raw.next().context("--user needs an id")?),
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            path => args.projects.push(PathBuf::from(path)),
        }
    }

    if args.projects.is_empty() {
        bail!("no project files given\n{}", USAGE);
    }
    Ok(args)
}

fn user_id(args: &Args) -> String {
    args.user
        .clone()
        .or_else(|| env::var("USER").ok())
        .or_else(|| env::var("USERNAME").ok())
        .unwrap_or_else(|| "cost_cli".to_string())
}

fn print_run(run: &ProjectRun) {
    println!("═══════════════════════════════════════════════════════");
    println!("  {} ({})", run.project_name, run.outcome.status());
    println!("═══════════════════════════════════════════════════════");

    match &run.outcome {
        ProjectOutcome::Completed(summary) => {
            let f = &summary.foundation;
            println!("  Foundation volume:  {:>14.1} m³ per turbine", f.foundation_volume_m3);
            for need in &f.material_needs {
                println!("  {:<20}{:>14.1} {}", need.material_id, need.quantity, need.unit);
            }
            println!(
                "  Wind delay:         {:>14.1} h (multiplier {:.3})",
                f.wind_delay.total_delay_hours, f.wind_multiplier
            );
            if f.wind_delay.truncated {
                println!("  [WARN] weather window shorter than the construction mission");
            }
            println!();
            println!("  {:<32}{:<12}{:>16}", "Phase", "Type", "Cost USD");
            for cost in &summary.phase_costs {
                println!(
                    "  {:<32}{:<12}{:>16.2}",
                    cost.phase.to_string(),
                    cost.cost_type.to_string(),
                    cost.cost_usd
                );
            }
            println!();
            println!("  Foundation total:   {:>16.2}", summary.foundation_cost_usd);
            println!("  Project total:      {:>16.2}", summary.project_value_usd);
        }
        ProjectOutcome::Failed(e) => {
            println!("  Error [{}]: {}", e.error_code(), e);
        }
    }
    println!();
}

/// Lock and load one project file. The lock is kept in `locks` until the
/// results are written.
fn open_project(
    path: &Path,
    user: &str,
    weather: Option<&[WeatherRecord]>,
    locks: &mut Vec<FileLock>,
) -> CalcResult<Project> {
    let lock = FileLock::acquire(path, user)?;
    let mut project = load_project(path)?;
    locks.push(lock);

    if let Some(weather) = weather {
        project.input.weather = weather.to_vec();
    }
    Ok(project)
}

fn run(args: Args) -> Result<BatchReport> {
    let user = user_id(&args);

    let weather = match &args.weather {
        Some(path) => Some(
            tables::read_weather(path).with_context(|| format!("reading weather from {}", path.display()))?,
        ),
        None => None,
    };

    let mut locks = Vec::with_capacity(args.projects.len());
    let mut seen = BTreeSet::new();
    let mut report = BatchReport::default();

    for path in &args.projects {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            warn!(path = %path.display(), "project listed more than once, skipped");
            continue;
        }

        let run = match open_project(path, &user, weather.as_deref(), &mut locks) {
            Ok(project) => run_logged(&project),
            Err(e) => ProjectRun::failed(path.display().to_string(), e),
        };
        report.runs.push(run);
    }

    for run in &report.runs {
        print_run(run);
    }

    if let Some(out) = &args.out {
        write_json_atomic(&report, out).with_context(|| format!("writing results to {}", out.display()))?;
        info!(path = %out.display(), "results written");
    }

    drop(locks);
    Ok(report)
}

fn main() -> Result<ExitCode> {
    logging::init();

    let args = parse_args(env::args().skip(1))?;
    let report = run(args)?;

    println!(
        "{} of {} project(s) completed",
        report.completed_count(),
        report.runs.len()
    );

    if report.all_completed() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(failed = report.failed_count(), "some projects failed");
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cost_core::calculations::schedule::ThroughputRecord;
    use cost_core::costs::CostType;
    use cost_core::file_io::save_project;
    use cost_core::loads::ComponentRecord;
    use cost_core::materials::MaterialPrice;
    use cost_core::project::ProjectInput;
    use tempfile::tempdir;

    fn write_project(dir: &Path, name: &str) -> PathBuf {
        let mut input = ProjectInput::new(2, 9.0, "normal").with_season("summer");
        input.components = vec![
            ComponentRecord::new(45.0, 180.0, 45.0, 120.0),
            ComponentRecord::new(90.0, 40.0, 90.0, 75.0),
        ];
        input.material_price = vec![
            MaterialPrice::new("Steel - rebar", 1200.0),
            MaterialPrice::new("Concrete 5000 psi", 125.0),
        ];
        input.throughput = vec![
            ThroughputRecord::new("Steel - rebar", "Place rebar", CostType::Labor, 2.0, 800.0),
            ThroughputRecord::new("Concrete 5000 psi", "Pour concrete", CostType::Labor, 100.0, 25.0),
        ];

        let path = dir.join(format!("{}.gwp", name));
        save_project(&Project::new(name, input), &path).unwrap();
        path
    }

    fn run_paths(dir: &Path, projects: Vec<PathBuf>) -> BatchReport {
        run(Args {
            projects,
            weather: None,
            out: Some(dir.join("results.json")),
            user: Some("tester".to_string()),
        })
        .unwrap()
    }

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_projects_and_options() {
        let parsed = args(&["a.gwp", "--weather", "site.csv", "b.gwp", "--out", "r.json"]).unwrap();
        assert_eq!(parsed.projects, vec![PathBuf::from("a.gwp"), PathBuf::from("b.gwp")]);
        assert_eq!(parsed.weather, Some(PathBuf::from("site.csv")));
        assert_eq!(parsed.out, Some(PathBuf::from("r.json")));
        assert!(parsed.user.is_none());
    }

    #[test]
    fn test_missing_projects_rejected() {
        assert!(args(&["--out", "r.json"]).is_err());
    }

    #[test]
    fn test_option_without_value_rejected() {
        assert!(args(&["a.gwp", "--weather"]).is_err());
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(args(&["--fast", "a.gwp"]).is_err());
    }

    #[test]
    fn test_explicit_user_wins() {
        let parsed = args(&["--user", "estimator", "a.gwp"]).unwrap();
        assert_eq!(user_id(&parsed), "estimator");
    }

    #[test]
    fn test_unreadable_project_does_not_stop_batch() {
        let dir = tempdir().unwrap();
        let good = write_project(dir.path(), "Good");
        let missing = dir.path().join("missing.gwp");

        let report = run_paths(dir.path(), vec![missing, good]);

        assert_eq!(report.runs.len(), 2);
        assert!(report.runs[0].project_name.ends_with("missing.gwp"));
        assert!(report.runs[0].project_id.is_none());
        match &report.runs[0].outcome {
            ProjectOutcome::Failed(e) => assert_eq!(e.error_code(), "FILE_ERROR"),
            other => panic!("expected failure, got {}", other.status()),
        }
        assert_eq!(report.runs[1].project_name, "Good");
        assert!(report.runs[1].outcome.is_completed());

        let written: BatchReport =
            serde_json::from_str(&fs::read_to_string(dir.path().join("results.json")).unwrap()).unwrap();
        let statuses: Vec<&str> = written.runs.iter().map(|r| r.outcome.status()).collect();
        assert_eq!(statuses, vec!["Failed", "Completed"]);
    }

    #[test]
    fn test_duplicate_path_runs_once() {
        let dir = tempdir().unwrap();
        let good = write_project(dir.path(), "Good");

        let report = run_paths(dir.path(), vec![good.clone(), good.clone()]);

        assert_eq!(report.runs.len(), 1);
        assert!(report.all_completed());
        assert!(!dir.path().join("Good.gwp.lock").exists());
    }

    #[test]
    fn test_locked_project_reported_and_others_run() {
        let dir = tempdir().unwrap();
        let held = write_project(dir.path(), "Held");
        let free = write_project(dir.path(), "Free");
        let _other_user = FileLock::acquire(&held, "someone-else").unwrap();

        let report = run_paths(dir.path(), vec![held, free]);

        match &report.runs[0].outcome {
            ProjectOutcome::Failed(e) => assert_eq!(e.error_code(), "FILE_LOCKED"),
            other => panic!("expected failure, got {}", other.status()),
        }
        assert_eq!(report.get("Free").map(|r| r.outcome.is_completed()), Some(true));
        assert_eq!(report.failed_count(), 1);
    }
}
