use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::Settings,
    error::Result,
    info,
    steps::{self, Step},
    success, warning, workflow,
};

/// Runs the selected steps against the live library.
///
/// `steps` is a comma separated list and takes precedence over `skip_sync`
/// and `sync_only`. Unknown step names are reported and ignored.
pub async fn run(
    settings: Settings,
    steps: Option<String>,
    skip_sync: bool,
    sync_only: bool,
    force: bool,
) -> Result<()> {
    let settings = Arc::new(settings);
    let selection = steps::select_steps(steps.as_deref(), skip_sync, sync_only, &settings);
    for name in &selection.unknown {
        warning!("Ignoring unknown step '{}'", name);
    }
    if selection.steps.is_empty() {
        warning!("No steps selected, nothing to do");
        return Ok(());
    }

    let names: Vec<&str> = selection.steps.iter().map(Step::name).collect();
    info!("Steps: {}", names.join(", "));
    if force {
        info!("Forced run, change markers are ignored");
    }

    let gateway = super::connect(&settings).await?;
    let report = workflow::run_steps(
        gateway,
        settings,
        &selection.steps,
        force,
        Utc::now().date_naive(),
    )
    .await?;

    let failed = report.failed();
    if failed > 0 {
        warning!("{} of {} steps failed", failed, report.outcomes.len());
    } else {
        success!("All {} steps completed", report.outcomes.len());
    }
    Ok(())
}
