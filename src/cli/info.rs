use chrono::Utc;

use crate::{
    config::Settings,
    error::Result,
    info,
    management::{SnapshotStore, Table},
    reports, utils, warning,
};

/// Prints the health check and/or insights computed from the local
/// snapshot. Without flags both are shown. Nothing is fetched remotely.
pub async fn info(settings: &Settings, health: bool, insights: bool) -> Result<()> {
    let (health, insights) = if !health && !insights {
        (true, true)
    } else {
        (health, insights)
    };

    let store = SnapshotStore::new(&settings.data_dir);
    let library = store.load_library().await?;
    if library.playlists.is_empty() {
        warning!("The snapshot is empty. Run `archivist run --sync-only` first.");
        return Ok(());
    }

    info!("Snapshot: {}", settings.data_dir.display());
    if let Some(updated) = std::fs::metadata(store.path(Table::Playlists))
        .ok()
        .and_then(|m| m.modified().ok())
    {
        let updated: chrono::DateTime<Utc> = updated.into();
        info!("Last sync: {}", utils::format_timestamp(&updated));
    }

    if health {
        reports::print_health(&reports::health_check(&library));
    }
    if insights {
        let history = store.load_history().await?;
        reports::print_insights(&reports::insights(&library, &history, Utc::now()));
    }
    Ok(())
}
