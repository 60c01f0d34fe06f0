use std::path::Path;

use crate::{
    config::Settings, error::Result, management::SnapshotStore, success, sync, utils, warning,
};

pub async fn import_history(settings: &Settings, dir: &Path) -> Result<()> {
    let store = SnapshotStore::new(&settings.data_dir);
    let pb = utils::spinner(&format!("Importing streaming history from {}...", dir.display()));
    let result = sync::import_streaming_history(&store, dir).await;
    pb.finish_and_clear();
    let stats = result?;

    if stats.files == 0 {
        warning!("No extended streaming history files found in {}", dir.display());
        return Ok(());
    }

    success!(
        "Imported {} plays from {} files ({} already known, {} without a track)",
        stats.imported,
        stats.files,
        stats.duplicates,
        stats.without_track
    );
    Ok(())
}
