use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
    config::Settings,
    error::{Error, Result},
    info,
    management::{
        BackupStore, ChangeMarkerCache, DESCRIPTION_MARKER_CACHE, SYNC_MARKER_CACHE,
        SnapshotStore,
    },
    playlists::{DescriptionSync, NameIndex, Reconciler},
    reports,
    spotify::SpotifyGateway,
    steps::Step,
    success,
    sync::LibrarySync,
    warning,
};

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: Step,
    pub succeeded: bool,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<StepOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }
}

/// Everything one run works with, created once and shared by the steps.
struct Run {
    settings: Arc<Settings>,
    store: SnapshotStore,
    sync: LibrarySync,
    reconciler: Reconciler,
    force: bool,
}

/// Executes `steps` in canonical order.
///
/// A failing step is reported and the run moves on to the next one, so a
/// broken sync still lets the playlist steps work on the data already
/// stored. Only [`Error::Interrupted`] ends the run early.
pub async fn run_steps(
    gateway: Arc<dyn SpotifyGateway>,
    settings: Arc<Settings>,
    steps: &[Step],
    force: bool,
    today: NaiveDate,
) -> Result<RunReport> {
    let mut ordered = steps.to_vec();
    ordered.sort();
    ordered.dedup();

    let mut run = Run::open(gateway, settings, force, today).await;
    let mut report = RunReport::default();

    for step in ordered {
        info!("Running step '{}'", step);
        match run.execute(step).await {
            Ok(summary) => {
                success!("{}: {}", step, summary);
                report.outcomes.push(StepOutcome {
                    step,
                    succeeded: true,
                    summary,
                });
            }
            Err(Error::Interrupted) => return Err(Error::Interrupted),
            Err(e) => {
                warning!("Step '{}' failed: {}", step, e);
                report.outcomes.push(StepOutcome {
                    step,
                    succeeded: false,
                    summary: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Wires a [`Reconciler`] to the stores under the configured data directory.
pub async fn open_reconciler(
    gateway: Arc<dyn SpotifyGateway>,
    settings: Arc<Settings>,
    force: bool,
    today: NaiveDate,
) -> Reconciler {
    let data_dir = settings.data_dir.clone();
    let description_path = data_dir.join(DESCRIPTION_MARKER_CACHE);
    // Forced runs start from an empty cache so every description is looked
    // at again; the fresh markers replace the old file.
    let description_markers = if force {
        ChangeMarkerCache::new(description_path)
    } else {
        ChangeMarkerCache::load(description_path).await
    };

    let descriptions = DescriptionSync::new(
        description_markers,
        settings.naming.clone(),
        NameIndex::for_today(&settings.naming, today),
        settings.max_description_length,
    );

    Reconciler::new(
        gateway,
        Arc::clone(&settings),
        SnapshotStore::new(&data_dir),
        BackupStore::in_data_dir(&data_dir),
        descriptions,
        today,
    )
}

impl Run {
    async fn open(
        gateway: Arc<dyn SpotifyGateway>,
        settings: Arc<Settings>,
        force: bool,
        today: NaiveDate,
    ) -> Self {
        let store = SnapshotStore::new(&settings.data_dir);
        let sync_markers =
            ChangeMarkerCache::load(settings.data_dir.join(SYNC_MARKER_CACHE)).await;
        let reconciler =
            open_reconciler(Arc::clone(&gateway), Arc::clone(&settings), force, today).await;

        Self {
            sync: LibrarySync::new(gateway, store.clone(), sync_markers),
            settings,
            store,
            reconciler,
            force,
        }
    }

    async fn execute(&mut self, step: Step) -> Result<String> {
        let keep = self.settings.keep_monthly_months;
        match step {
            Step::Sync => {
                let stats = self
                    .sync
                    .sync(
                        self.force,
                        self.settings.owned_only,
                        self.settings.include_liked_songs,
                    )
                    .await?;
                Ok(format!(
                    "{} playlists updated, {} unchanged, {} failed, {} new tracks ({} playlists, {} tracks, {} artists)",
                    stats.playlists_updated,
                    stats.playlists_skipped,
                    stats.playlists_failed,
                    stats.tracks_added,
                    stats.total_playlists,
                    stats.total_tracks,
                    stats.total_artists
                ))
            }
            Step::Rename => {
                let stats = self.reconciler.rename_playlists().await?;
                Ok(format!("{} playlists renamed", stats.renamed))
            }
            Step::DeleteMonthlyAndGenre => {
                let stats = self.reconciler.delete_monthly_and_genre(keep).await?;
                Ok(format!("{} deleted, {} kept", stats.deleted, stats.kept))
            }
            Step::Consolidate => {
                let monthly = self.reconciler.update_monthly_playlists(keep).await?;
                let stats = self.reconciler.consolidate_old_monthly_playlists(keep).await?;
                Ok(format!(
                    "{} monthly created, {} tracks added to monthly; {} years consolidated, {} yearly created, {} monthly deleted, {} kept",
                    monthly.created,
                    monthly.tracks_added,
                    stats.years.len(),
                    stats.yearly_created,
                    stats.deleted,
                    stats.kept
                ))
            }
            Step::UpdateCurrentYear => {
                let stats = self.reconciler.update_current_year_playlists().await?;
                Ok(format!(
                    "{} created, {} updated, {} tracks added",
                    stats.created, stats.updated, stats.tracks_added
                ))
            }
            Step::Descriptions => {
                let stats = self.reconciler.refresh_descriptions().await?;
                Ok(format!(
                    "{} changed, {} unchanged, {} failed",
                    stats.descriptions_changed, stats.unchanged, stats.failed
                ))
            }
            Step::HealthCheck => {
                let library = self.store.load_library().await?;
                let report = reports::health_check(&library);
                reports::print_health(&report);
                Ok(format!("{} playlists checked", report.len()))
            }
            Step::InsightsReport => {
                let library = self.store.load_library().await?;
                let history = self.store.load_history().await?;
                let insights = reports::insights(&library, &history, Utc::now());
                reports::print_insights(&insights);
                Ok("done".to_string())
            }
        }
    }
}
