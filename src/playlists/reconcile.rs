use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    path::PathBuf,
    sync::Arc,
};

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    config::Settings,
    error::Result,
    info,
    management::{BackupStore, PlaylistTrackCache, SnapshotStore},
    playlists::{
        DescriptionSync, NameIndex, Period, PlaylistKind, TrackSelector, YearMonth,
        protection::{DeletionOutcome, safe_delete_playlist},
        selectors::{self, SnapshotSelector, dedupe},
        last_n_months, window_start,
    },
    spotify::{SpotifyGateway, paging},
    types::HistoryEvent,
    verbose, warning,
};

/// An owned playlist as seen in the live listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingPlaylist {
    pub id: String,
    pub name: String,
    pub snapshot_id: String,
    pub track_count: u64,
}

/// What [`Reconciler::ensure_playlist`] did to one playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsureOutcome {
    pub id: String,
    pub name: String,
    pub created: bool,
    pub added: usize,
    pub description_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub tracks_added: usize,
    pub descriptions_changed: usize,
    pub failed: usize,
}

impl ReconcileStats {
    fn record(&mut self, outcome: &EnsureOutcome) {
        if outcome.created {
            self.created += 1;
        } else if outcome.added > 0 {
            self.updated += 1;
        } else {
            self.unchanged += 1;
        }
        self.tracks_added += outcome.added;
        if outcome.description_changed {
            self.descriptions_changed += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationStats {
    pub years: Vec<i32>,
    pub yearly_created: usize,
    pub tracks_added: usize,
    pub deleted: usize,
    pub kept: usize,
    pub failed: usize,
    pub backups: Vec<PathBuf>,
}

/// Tracks to append so that `existing` covers `desired`: `desired - existing`
/// in desired order, without repeats. Nothing in `existing` is ever removed.
pub fn additions_plan(existing: &[String], desired: &[String]) -> Vec<String> {
    let present: HashSet<&str> = existing.iter().map(String::as_str).collect();
    dedupe(
        desired
            .iter()
            .filter(|uri| !present.contains(uri.as_str()))
            .cloned(),
    )
}

type MonthlySources = BTreeMap<i32, BTreeMap<PlaylistKind, Vec<(YearMonth, ExistingPlaylist)>>>;

/// Converges the managed playlists towards the state derived from the
/// snapshot store.
///
/// All collaborators are injected; "today" is fixed at construction so a run
/// works against one consistent calendar window.
pub struct Reconciler {
    pub(super) gateway: Arc<dyn SpotifyGateway>,
    pub(super) settings: Arc<Settings>,
    pub(super) store: SnapshotStore,
    pub(super) backups: BackupStore,
    pub(super) descriptions: DescriptionSync,
    pub(super) tracks: PlaylistTrackCache,
    pub(super) names: NameIndex,
    pub(super) today: NaiveDate,
    user_id: Option<String>,
    existing: Option<Vec<ExistingPlaylist>>,
}

impl Reconciler {
    pub fn new(
        gateway: Arc<dyn SpotifyGateway>,
        settings: Arc<Settings>,
        store: SnapshotStore,
        backups: BackupStore,
        descriptions: DescriptionSync,
        today: NaiveDate,
    ) -> Self {
        let names = NameIndex::for_today(&settings.naming, today);
        Self {
            gateway,
            settings,
            store,
            backups,
            descriptions,
            tracks: PlaylistTrackCache::new(),
            names,
            today,
            user_id: None,
            existing: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn descriptions(&self) -> &DescriptionSync {
        &self.descriptions
    }

    pub(super) async fn user_id(&mut self) -> Result<String> {
        if let Some(id) = &self.user_id {
            return Ok(id.clone());
        }
        let user = self.gateway.current_user().await?;
        self.user_id = Some(user.id.clone());
        Ok(user.id)
    }

    /// Owned playlists in listing order, fetched once and reused until
    /// invalidated.
    pub(super) async fn existing_playlists(&mut self) -> Result<Vec<ExistingPlaylist>> {
        if let Some(existing) = &self.existing {
            return Ok(existing.clone());
        }

        let user_id = self.user_id().await?;
        let existing: Vec<ExistingPlaylist> = paging::fetch_all_playlists(self.gateway.as_ref())
            .await?
            .into_iter()
            .filter(|p| p.owner.id == user_id)
            .map(|p| ExistingPlaylist {
                id: p.id,
                name: p.name,
                snapshot_id: p.snapshot_id,
                track_count: p.tracks.total,
            })
            .collect();
        self.existing = Some(existing.clone());
        Ok(existing)
    }

    pub(super) async fn find_existing(&mut self, name: &str) -> Result<Option<ExistingPlaylist>> {
        Ok(self
            .existing_playlists()
            .await?
            .into_iter()
            .find(|p| p.name == name))
    }

    pub(super) fn invalidate_existing(&mut self) {
        self.existing = None;
    }

    pub(super) async fn playlist_tracks(&mut self, playlist_id: &str) -> Result<Vec<String>> {
        if let Some(uris) = self.tracks.get(playlist_id) {
            return Ok(uris.clone());
        }
        let uris = paging::fetch_playlist_track_uris(self.gateway.as_ref(), playlist_id).await?;
        self.tracks.insert(playlist_id, uris.clone());
        Ok(uris)
    }

    /// Backs up and deletes `playlist` once its tracks are verified in
    /// `successor_id`.
    pub(super) async fn delete_verified(
        &mut self,
        playlist: &ExistingPlaylist,
        successor_id: &str,
    ) -> Result<DeletionOutcome> {
        let outcome = safe_delete_playlist(
            self.gateway.as_ref(),
            &self.backups,
            &mut self.tracks,
            &playlist.id,
            &playlist.name,
            true,
            Some(successor_id),
        )
        .await?;
        if outcome.deleted {
            self.invalidate_existing();
        }
        Ok(outcome)
    }

    /// Creates the managed playlist for `(kind, period)` if needed and
    /// appends whatever of `desired` it does not contain yet.
    pub async fn ensure_playlist(
        &mut self,
        kind: PlaylistKind,
        period: Period,
        desired: &[String],
    ) -> Result<EnsureOutcome> {
        let name = self.settings.naming.name_for(kind, period);
        let desired = dedupe(desired.iter().cloned());

        let (id, created, added, known_marker) = match self.find_existing(&name).await? {
            Some(existing) => {
                let current = self.playlist_tracks(&existing.id).await?;
                let plan = additions_plan(&current, &desired);
                if plan.is_empty() {
                    verbose!("{}: up to date ({} tracks)", name, current.len());
                    (existing.id, false, 0, Some(existing.snapshot_id))
                } else {
                    paging::add_tracks_batched(self.gateway.as_ref(), &existing.id, &plan).await?;
                    self.tracks.invalidate(&existing.id);
                    self.invalidate_existing();
                    info!("{}: +{} tracks ({} total)", name, plan.len(), current.len() + plan.len());
                    (existing.id, false, plan.len(), None)
                }
            }
            None => {
                let user_id = self.user_id().await?;
                let description = self.settings.naming.description_for(kind, period);
                let playlist = self
                    .gateway
                    .create_playlist(&user_id, &name, &description, false)
                    .await?;
                paging::add_tracks_batched(self.gateway.as_ref(), &playlist.id, &desired).await?;
                self.invalidate_existing();
                info!("{}: created with {} tracks", name, desired.len());
                (playlist.id, true, desired.len(), None)
            }
        };

        let description_changed = match self
            .descriptions
            .update_description(
                self.gateway.as_ref(),
                &id,
                known_marker.as_deref(),
                Some(&desired),
            )
            .await
        {
            Ok(changed) => changed,
            Err(e) => {
                warning!("Description of '{}' not updated: {}", name, e);
                false
            }
        };

        Ok(EnsureOutcome {
            id,
            name,
            created,
            added,
            description_changed,
        })
    }

    /// Makes sure a "Finds" playlist exists for each of the last
    /// `keep_last_n_months` calendar months (the current one included, even
    /// when empty) and holds the liked songs added in that month.
    pub async fn update_monthly_playlists(&mut self, keep_last_n_months: u32) -> Result<ReconcileStats> {
        let mut stats = ReconcileStats::default();
        if !self.settings.enable_monthly {
            info!("Monthly playlists are disabled");
            return Ok(stats);
        }

        let library = self.store.load_library().await?;
        let liked = library.liked_additions();
        let history = self.store.load_history().await?;
        let months = last_n_months(self.today, keep_last_n_months);

        for month in months {
            let period = Period::Month(month);
            let desired = SnapshotSelector::new(&liked, &history, self.settings.history_track_limit)
                .select(period, PlaylistKind::Finds);
            match self.ensure_playlist(PlaylistKind::Finds, period, &desired).await {
                Ok(outcome) => stats.record(&outcome),
                Err(e) => {
                    warning!("Monthly playlist for {} failed: {}", month.label(), e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Merges monthly playlists that rolled out of the last
    /// `keep_last_n_months` months into one playlist per year and kind, then
    /// deletes each monthly once its tracks are verified in the yearly one.
    ///
    /// A year is processed when it has rolled-out monthly playlists, when its
    /// history-derived yearly playlists are missing, or when it has liked
    /// songs but no yearly "Finds" playlist.
    pub async fn consolidate_old_monthly_playlists(
        &mut self,
        keep_last_n_months: u32,
    ) -> Result<ConsolidationStats> {
        let mut stats = ConsolidationStats::default();
        let kinds = self.settings.enabled_kinds();
        if kinds.is_empty() {
            info!("All playlist types are disabled");
            return Ok(stats);
        }

        let cutoff = YearMonth::of(&window_start(self.today, keep_last_n_months));
        let existing = self.existing_playlists().await?;

        let mut monthly: MonthlySources = BTreeMap::new();
        for playlist in existing.iter() {
            if let Some((kind, Period::Month(month))) = self.names.parse(&playlist.name) {
                if month < cutoff {
                    monthly
                        .entry(month.year)
                        .or_default()
                        .entry(kind)
                        .or_default()
                        .push((month, playlist.clone()));
                }
            }
        }
        for kinds_of_year in monthly.values_mut() {
            for sources in kinds_of_year.values_mut() {
                sources.sort_by_key(|(month, _)| *month);
            }
        }

        let library = self.store.load_library().await?;
        let liked_by_year = rolled_out_by_year(&library.liked_additions(), cutoff);
        let history = self.store.load_history().await?;
        let history_years: BTreeSet<i32> = history
            .iter()
            .filter(|e| YearMonth::of(&e.timestamp) < cutoff)
            .map(|e| e.timestamp.year())
            .collect();

        let existing_names: HashSet<&str> = existing.iter().map(|p| p.name.as_str()).collect();
        let naming = &self.settings.naming;
        let mut years: BTreeSet<i32> = monthly.keys().copied().collect();
        if kinds.contains(&PlaylistKind::Finds) {
            years.extend(
                liked_by_year
                    .keys()
                    .filter(|y| !existing_names.contains(naming.yearly_name(PlaylistKind::Finds, **y).as_str())),
            );
        }
        years.extend(history_years.iter().filter(|y| {
            kinds
                .iter()
                .filter(|k| **k != PlaylistKind::Finds)
                .any(|k| !existing_names.contains(naming.yearly_name(*k, **y).as_str()))
        }));

        if years.is_empty() {
            info!("Nothing to consolidate");
            return Ok(stats);
        }

        for year in years {
            stats.years.push(year);
            for kind in kinds.iter().copied() {
                let sources = monthly
                    .get(&year)
                    .and_then(|m| m.get(&kind))
                    .cloned()
                    .unwrap_or_default();
                let liked = liked_by_year.get(&year).cloned().unwrap_or_default();
                if let Err(e) = self
                    .consolidate_year(year, kind, &sources, liked, &history, &mut stats)
                    .await
                {
                    warning!("Consolidating {} {} failed: {}", kind, year, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    async fn consolidate_year(
        &mut self,
        year: i32,
        kind: PlaylistKind,
        sources: &[(YearMonth, ExistingPlaylist)],
        liked: Vec<String>,
        history: &[HistoryEvent],
        stats: &mut ConsolidationStats,
    ) -> Result<()> {
        let period = Period::Year(year);
        let yearly_name = self.settings.naming.yearly_name(kind, year);
        let yearly_exists = self.find_existing(&yearly_name).await?.is_some();

        if sources.is_empty() && yearly_exists && kind != PlaylistKind::Finds {
            verbose!("{}: already consolidated", yearly_name);
            return Ok(());
        }

        let mut from_monthly = Vec::new();
        for (_, playlist) in sources {
            from_monthly.extend(self.playlist_tracks(&playlist.id).await?);
        }
        let from_monthly = dedupe(from_monthly);

        let limit = self.settings.history_track_limit;
        let tracks = if !from_monthly.is_empty() {
            match kind {
                PlaylistKind::Finds => dedupe(from_monthly.into_iter().chain(liked)),
                PlaylistKind::MostPlayed => selectors::rank_by_play_count(
                    from_monthly,
                    &selectors::play_counts(history, period),
                ),
                PlaylistKind::Discovery => from_monthly,
            }
        } else {
            match kind {
                PlaylistKind::Finds => liked,
                PlaylistKind::MostPlayed => selectors::most_played(history, period, limit),
                PlaylistKind::Discovery => selectors::discovery(history, period, limit),
            }
        };

        if tracks.is_empty() && !yearly_exists {
            verbose!("{}: no tracks, not created", yearly_name);
            return Ok(());
        }

        let outcome = self.ensure_playlist(kind, period, &tracks).await?;
        if outcome.created {
            stats.yearly_created += 1;
        }
        stats.tracks_added += outcome.added;

        for (_, playlist) in sources {
            match self.delete_verified(playlist, &outcome.id).await {
                Ok(deletion) if deletion.deleted => {
                    info!("{}: merged into {} and deleted", playlist.name, outcome.name);
                    stats.deleted += 1;
                    stats.backups.extend(deletion.backup);
                }
                Ok(deletion) => {
                    stats.kept += 1;
                    stats.backups.extend(deletion.backup);
                }
                Err(e) => {
                    warning!("Keeping '{}': {}", playlist.name, e);
                    stats.kept += 1;
                }
            }
        }

        Ok(())
    }

    /// Adds this year's liked songs, most played and discovered tracks to the
    /// current year's playlists, creating them when there is something to add.
    pub async fn update_current_year_playlists(&mut self) -> Result<ReconcileStats> {
        let mut stats = ReconcileStats::default();
        let period = Period::Year(self.today.year());

        let library = self.store.load_library().await?;
        let liked = library.liked_additions();
        let history = self.store.load_history().await?;

        for kind in self.settings.enabled_kinds() {
            let desired = SnapshotSelector::new(&liked, &history, self.settings.history_track_limit)
                .select(period, kind);
            let name = self.settings.naming.name_for(kind, period);
            if desired.is_empty() && self.find_existing(&name).await?.is_none() {
                verbose!("{}: nothing to add yet", name);
                continue;
            }
            match self.ensure_playlist(kind, period, &desired).await {
                Ok(outcome) => stats.record(&outcome),
                Err(e) => {
                    warning!("Updating '{}' failed: {}", name, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Runs the description synchronizer over every managed playlist.
    pub async fn refresh_descriptions(&mut self) -> Result<ReconcileStats> {
        let mut stats = ReconcileStats::default();
        let managed: Vec<ExistingPlaylist> = self
            .existing_playlists()
            .await?
            .into_iter()
            .filter(|p| self.names.is_managed(&p.name))
            .collect();

        for playlist in managed.iter() {
            match self
                .descriptions
                .update_description(
                    self.gateway.as_ref(),
                    &playlist.id,
                    Some(&playlist.snapshot_id),
                    None,
                )
                .await
            {
                Ok(true) => stats.descriptions_changed += 1,
                Ok(false) => stats.unchanged += 1,
                Err(e) => {
                    warning!("Description of '{}' not updated: {}", playlist.name, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// Liked additions from months before `cutoff`, grouped by year, in order of
/// addition without repeats.
fn rolled_out_by_year(
    liked: &[(DateTime<Utc>, String)],
    cutoff: YearMonth,
) -> BTreeMap<i32, Vec<String>> {
    let mut by_year: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    for (added_at, uri) in liked {
        if YearMonth::of(added_at) < cutoff {
            by_year.entry(added_at.year()).or_default().push(uri.clone());
        }
    }
    by_year
        .into_iter()
        .map(|(year, uris)| (year, dedupe(uris)))
        .collect()
}
