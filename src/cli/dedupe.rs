use std::sync::Arc;

use chrono::Utc;

use crate::{config::Settings, error::Result, success, workflow};

/// Deletes owned playlists whose tracks duplicate another playlist.
pub async fn dedupe(settings: Settings) -> Result<()> {
    let settings = Arc::new(settings);
    let gateway = super::connect(&settings).await?;
    let mut reconciler =
        workflow::open_reconciler(gateway, settings, false, Utc::now().date_naive()).await;

    let stats = reconciler.dedupe_by_content().await?;
    success!(
        "{} duplicate playlists deleted, {} kept",
        stats.deleted,
        stats.kept
    );
    Ok(())
}
