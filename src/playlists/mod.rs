//! Managed playlists: naming, track selection, reconciliation against the
//! live library, guarded deletion and description upkeep.

pub mod cleanup;
pub mod description;
pub mod naming;
pub mod protection;
pub mod reconcile;
pub mod selectors;

pub use cleanup::CleanupStats;
pub use description::DescriptionSync;
pub use naming::{NameIndex, Period, PlaylistKind, YearMonth, last_n_months, window_start};
pub use protection::{DeletionOutcome, safe_delete_playlist};
pub use reconcile::{
    ConsolidationStats, EnsureOutcome, ExistingPlaylist, ReconcileStats, Reconciler,
    additions_plan,
};
pub use selectors::{SnapshotSelector, TrackSelector};
