use std::path::Path;

use tabled::Table;

use crate::{
    config::Settings,
    error::Result,
    info,
    management::BackupStore,
    spotify::paging,
    success,
    types::BackupTableRow,
    utils,
};

pub async fn list_backups(settings: &Settings) -> Result<()> {
    let store = BackupStore::in_data_dir(&settings.data_dir);
    let backups = store.list().await?;
    if backups.is_empty() {
        info!("No backups in {}", store.dir().display());
        return Ok(());
    }

    let rows: Vec<BackupTableRow> = backups
        .iter()
        .map(|(path, backup)| BackupTableRow {
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            playlist: backup.name.clone(),
            tracks: backup.tracks.len(),
            created: utils::format_timestamp(&backup.created_at),
        })
        .collect();

    println!("{}", Table::new(rows));
    info!("{} backups in {}", backups.len(), store.dir().display());
    Ok(())
}

/// Recreates a deleted playlist from its backup under the original name
/// (or `name`). The new playlist gets a new id.
pub async fn restore_backup(settings: &Settings, file: &Path, name: Option<String>) -> Result<()> {
    let store = BackupStore::in_data_dir(&settings.data_dir);
    let path = if file.is_file() {
        file.to_path_buf()
    } else {
        store.dir().join(file)
    };
    let backup = BackupStore::read(&path).await?;
    let name = name.unwrap_or_else(|| backup.name.clone());

    let gateway = super::connect(settings).await?;
    let user = gateway.current_user().await?;
    let description = format!(
        "Restored from backup of {}",
        utils::format_timestamp(&backup.created_at)
    );
    let playlist = gateway
        .create_playlist(&user.id, &name, &description, false)
        .await?;
    let added = paging::add_tracks_batched(gateway.as_ref(), &playlist.id, &backup.tracks).await?;

    success!("Restored '{}' with {} tracks", name, added);
    Ok(())
}
