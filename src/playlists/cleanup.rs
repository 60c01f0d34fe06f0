use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::Result,
    info,
    playlists::{
        Period, YearMonth,
        reconcile::{ExistingPlaylist, Reconciler},
        window_start,
    },
    types::LIKED_SONGS_PLAYLIST_ID,
    verbose, warning,
};

/// Suffixes left behind by the old genre-split playlists.
const GENRE_SLUGS: [&str; 5] = ["Hip Hop", "HipHop", "Dance", "Other", "Am"];

/// Upper bound of playlists compared by [`Reconciler::dedupe_by_content`].
pub const DEDUPE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupStats {
    pub deleted: usize,
    pub kept: usize,
    pub renamed: usize,
}

impl CleanupStats {
    fn merge(&mut self, other: CleanupStats) {
        self.deleted += other.deleted;
        self.kept += other.kept;
        self.renamed += other.renamed;
    }
}

/// Name without a trailing genre slug, if it had one.
pub fn strip_genre_suffix(name: &str) -> Option<&str> {
    GENRE_SLUGS.iter().find_map(|slug| {
        let stem = name.strip_suffix(slug)?;
        let stem = stem.trim_end_matches([' ', '-', '_']);
        (!stem.is_empty()).then_some(stem)
    })
}

impl Reconciler {
    /// Applies the configured rename map to owned playlists. A rename is
    /// skipped when the new name is already taken.
    pub async fn rename_playlists(&mut self) -> Result<CleanupStats> {
        let mut stats = CleanupStats::default();
        if self.settings.rename_map.is_empty() {
            verbose!("No renames configured");
            return Ok(stats);
        }

        let existing = self.existing_playlists().await?;
        for (from, to) in self.settings.rename_map.clone() {
            if existing.iter().any(|p| p.name == to) {
                warning!("Not renaming '{}': '{}' already exists", from, to);
                continue;
            }
            for playlist in existing
                .iter()
                .filter(|p| p.name == from && p.id != LIKED_SONGS_PLAYLIST_ID)
            {
                match self
                    .gateway
                    .change_details(&playlist.id, Some(&to), None)
                    .await
                {
                    Ok(()) => {
                        info!("Renamed '{}' to '{}'", from, to);
                        stats.renamed += 1;
                    }
                    Err(e) => warning!("Renaming '{}' failed: {}", from, e),
                }
            }
        }

        if stats.renamed > 0 {
            self.invalidate_existing();
        }
        Ok(stats)
    }

    /// Removes leftovers of earlier layouts: monthly playlists older than the
    /// keep window, genre-split playlists and same-name duplicates. Every
    /// deletion is verified against a successor that already exists.
    pub async fn delete_monthly_and_genre(&mut self, keep_last_n_months: u32) -> Result<CleanupStats> {
        let mut stats = CleanupStats::default();
        let cutoff = YearMonth::of(&window_start(self.today, keep_last_n_months));
        let existing = self.existing_playlists().await?;

        for playlist in existing.iter() {
            let (kind, period, genre) = if let Some(parsed) = self.names.parse(&playlist.name) {
                (parsed.0, parsed.1, false)
            } else if let Some(parsed) = strip_genre_suffix(&playlist.name)
                .and_then(|stem| self.names.parse(stem))
            {
                (parsed.0, parsed.1, true)
            } else {
                continue;
            };

            let legacy_monthly = matches!(period, Period::Month(month) if month < cutoff);
            if !genre && !legacy_monthly {
                continue;
            }

            let successor_name = self.settings.naming.yearly_name(kind, period.year());
            if successor_name == playlist.name {
                continue;
            }
            let Some(successor) = existing.iter().find(|p| p.name == successor_name) else {
                verbose!("Keeping '{}': no '{}' yet", playlist.name, successor_name);
                stats.kept += 1;
                continue;
            };

            stats.merge(self.delete_into(playlist, successor).await);
        }

        stats.merge(self.delete_duplicate_names().await?);
        Ok(stats)
    }

    /// Managed names that exist more than once: the copy with most tracks
    /// stays, the others go once verified against it.
    pub async fn delete_duplicate_names(&mut self) -> Result<CleanupStats> {
        let mut stats = CleanupStats::default();
        let existing = self.existing_playlists().await?;

        let mut by_name: BTreeMap<&str, Vec<&ExistingPlaylist>> = BTreeMap::new();
        for playlist in existing.iter().filter(|p| self.names.is_managed(&p.name)) {
            by_name.entry(playlist.name.as_str()).or_default().push(playlist);
        }

        for copies in by_name.into_values().filter(|c| c.len() > 1) {
            let mut keep = copies[0];
            for copy in &copies[1..] {
                if copy.track_count > keep.track_count {
                    keep = copy;
                }
            }
            for copy in copies.iter().filter(|c| c.id != keep.id) {
                stats.merge(self.delete_into(copy, keep).await);
            }
        }

        Ok(stats)
    }

    /// Deletes owned playlists whose track set equals another's, keeping the
    /// alphabetically first name of each group. Empty playlists are left
    /// alone.
    pub async fn dedupe_by_content(&mut self) -> Result<CleanupStats> {
        let mut stats = CleanupStats::default();
        let existing = self.existing_playlists().await?;
        if existing.len() > DEDUPE_LIMIT {
            warning!(
                "Only the first {} of {} playlists are compared",
                DEDUPE_LIMIT,
                existing.len()
            );
        }

        let mut groups: BTreeMap<BTreeSet<String>, Vec<ExistingPlaylist>> = BTreeMap::new();
        for playlist in existing.into_iter().take(DEDUPE_LIMIT) {
            if playlist.id == LIKED_SONGS_PLAYLIST_ID {
                continue;
            }
            let tracks: BTreeSet<String> =
                self.playlist_tracks(&playlist.id).await?.into_iter().collect();
            if tracks.is_empty() {
                continue;
            }
            groups.entry(tracks).or_default().push(playlist);
        }

        for mut group in groups.into_values().filter(|g| g.len() > 1) {
            group.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            let (keep, rest) = group.split_at(1);
            for duplicate in rest {
                stats.merge(self.delete_into(duplicate, &keep[0]).await);
            }
        }

        if stats.deleted == 0 {
            info!("No duplicate playlists found");
        }
        Ok(stats)
    }

    async fn delete_into(
        &mut self,
        playlist: &ExistingPlaylist,
        successor: &ExistingPlaylist,
    ) -> CleanupStats {
        let mut stats = CleanupStats::default();
        match self.delete_verified(playlist, &successor.id).await {
            Ok(outcome) if outcome.deleted => {
                info!("Deleted '{}' (kept in '{}')", playlist.name, successor.name);
                stats.deleted += 1;
            }
            Ok(_) => stats.kept += 1,
            Err(e) => {
                warning!("Keeping '{}': {}", playlist.name, e);
                stats.kept += 1;
            }
        }
        stats
    }
}
