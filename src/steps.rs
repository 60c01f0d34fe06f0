use std::{fmt, str::FromStr};

use crate::{config::Settings, error::Error};

/// The steps of a run, declared in the order they always execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Sync,
    Rename,
    DeleteMonthlyAndGenre,
    Consolidate,
    UpdateCurrentYear,
    Descriptions,
    HealthCheck,
    InsightsReport,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Sync,
        Step::Rename,
        Step::DeleteMonthlyAndGenre,
        Step::Consolidate,
        Step::UpdateCurrentYear,
        Step::Descriptions,
        Step::HealthCheck,
        Step::InsightsReport,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Sync => "sync",
            Step::Rename => "rename",
            Step::DeleteMonthlyAndGenre => "delete_monthly_and_genre",
            Step::Consolidate => "consolidate",
            Step::UpdateCurrentYear => "update_current_year",
            Step::Descriptions => "descriptions",
            Step::HealthCheck => "health_check",
            Step::InsightsReport => "insights_report",
        }
    }

    /// Report steps only run when asked for or enabled in the settings.
    pub fn is_report(&self) -> bool {
        matches!(self, Step::HealthCheck | Step::InsightsReport)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Step::ALL
            .into_iter()
            .find(|step| step.name() == normalized)
            .ok_or_else(|| Error::Config(format!("unknown step '{}'", s.trim())))
    }
}

/// Parsed `--steps` value: known steps in canonical order, plus the names
/// that matched nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSelection {
    pub steps: Vec<Step>,
    pub unknown: Vec<String>,
}

/// Parses a comma separated list of step names. Order and repeats in the
/// input do not matter.
pub fn parse_steps(raw: &str) -> StepSelection {
    let mut selection = StepSelection::default();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match name.parse::<Step>() {
            Ok(step) => {
                if !selection.steps.contains(&step) {
                    selection.steps.push(step);
                }
            }
            Err(_) => selection.unknown.push(name.to_string()),
        }
    }
    selection.steps.sort();
    selection
}

/// Decides which steps a run executes.
///
/// An explicit `--steps` list wins over `skip_sync` / `sync_only`. Without
/// one, every non-report step runs, plus the reports enabled in `settings`.
pub fn select_steps(
    steps: Option<&str>,
    skip_sync: bool,
    sync_only: bool,
    settings: &Settings,
) -> StepSelection {
    if let Some(raw) = steps {
        return parse_steps(raw);
    }

    if sync_only {
        return StepSelection {
            steps: vec![Step::Sync],
            unknown: Vec::new(),
        };
    }

    let steps = Step::ALL
        .into_iter()
        .filter(|step| !(skip_sync && *step == Step::Sync))
        .filter(|step| match step {
            Step::HealthCheck => settings.enable_health_check,
            Step::InsightsReport => settings.enable_insights_report,
            _ => true,
        })
        .collect();

    StepSelection {
        steps,
        unknown: Vec::new(),
    }
}
