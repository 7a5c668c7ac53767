//! Public call surface for the presentation layer.
//!
//! Each method opens exactly one transaction on the owned store handle and
//! delegates to the transaction-bound operations in `playlist_store`,
//! `track_indexer` and `orphan_pruner`. Store faults are logged here and
//! returned as [`PlaylistError::StoreFailure`]; nothing panics.

use log::{debug, error};
use rusqlite::Transaction;

use crate::db_manager::DbManager;
use crate::error::{PlaylistError, Result};
use crate::media_resolver::MediaResolver;
use crate::migration::{self, MigrationReport};
use crate::orphan_pruner;
use crate::playlist_store;
use crate::protocol::{CoverInfo, PlaylistSummary, PlaylistTrack, TrackInfo};
use crate::track_indexer;

pub struct PlaylistManager<R: MediaResolver> {
    db: DbManager,
    resolver: R,
}

impl<R: MediaResolver> PlaylistManager<R> {
    /// Migrates `db` to the current layout and wraps it.
    ///
    /// `legacy` is the separate database holding the pre-consolidation
    /// playlist-name list; it is only needed for the migration and is
    /// released afterwards.
    pub fn initialize(
        mut db: DbManager,
        mut legacy: Option<DbManager>,
        resolver: R,
    ) -> Result<(Self, MigrationReport)> {
        let report = migration::migrate(&mut db, legacy.as_mut())?;
        debug!(
            "Playlist store ready at version {} ({} playlists migrated)",
            report.to_version, report.playlists_migrated
        );
        Ok((Self { db, resolver }, report))
    }

    fn run<T, F>(&mut self, operation: &str, body: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>, &dyn MediaResolver) -> Result<T>,
    {
        let resolver: &dyn MediaResolver = &self.resolver;
        self.db
            .transaction(|tx| body(tx, resolver))
            .map_err(|err| {
                match &err {
                    PlaylistError::Conflict(name) => {
                        debug!("{}: playlist {} already exists", operation, name)
                    }
                    _ => error!("{} failed: {}", operation, err),
                }
                err
            })
    }

    /// Fails with [`PlaylistError::Conflict`] when `name` already exists.
    pub fn create_playlist(&mut self, name: &str) -> Result<()> {
        self.run("create_playlist", |tx, _| {
            if playlist_store::create(tx, name)? {
                Ok(())
            } else {
                Err(PlaylistError::Conflict(name.to_string()))
            }
        })
    }

    /// Appends one track. `None` when the playlist does not exist.
    pub fn add_track(&mut self, playlist: &str, track: &TrackInfo) -> Result<Option<usize>> {
        self.run("add_track", |tx, _| {
            if !playlist_store::exists(tx, playlist)? {
                return Ok(None);
            }
            track_indexer::append(tx, playlist, track).map(Some)
        })
    }

    /// Appends all `tracks` atomically. Returns how many were added.
    pub fn add_tracks(&mut self, playlist: &str, tracks: &[TrackInfo]) -> Result<usize> {
        self.run("add_tracks", |tx, _| {
            if !playlist_store::exists(tx, playlist)? {
                return Ok(0);
            }
            track_indexer::append_batch(tx, playlist, tracks)
        })
    }

    pub fn list_playlists(&mut self) -> Result<Vec<PlaylistSummary>> {
        self.run("list_playlists", |tx, _| playlist_store::list(tx))
    }

    pub fn playlist_track_count(&mut self, playlist: &str) -> Result<usize> {
        self.run("playlist_track_count", |tx, _| {
            track_indexer::count(tx, playlist)
        })
    }

    /// Resolvable tracks of `playlist` in order.
    ///
    /// Slots whose media no longer resolves are deleted and the playlist is
    /// compacted; the read is then repeated once so returned indices match
    /// the stored ones.
    pub fn get_tracks(&mut self, playlist: &str) -> Result<Vec<PlaylistTrack>> {
        let first = self.run("get_tracks", |tx, resolver| {
            orphan_pruner::fetch_and_prune(tx, playlist, resolver)
        })?;
        if first.orphans.is_empty() {
            return Ok(first.tracks);
        }

        debug!(
            "Pruned {} tracks from {}, reading again",
            first.orphans.len(),
            playlist
        );
        let retry = self.run("get_tracks", |tx, resolver| {
            orphan_pruner::resolve_slots(tx, playlist, resolver)
        })?;
        Ok(retry.tracks)
    }

    pub fn get_covers(&mut self, playlist: &str, max: Option<usize>) -> Result<Vec<CoverInfo>> {
        self.run("get_covers", |tx, resolver| {
            orphan_pruner::covers(tx, playlist, max, resolver)
        })
    }

    /// `Ok(false)` when `from == to`; [`PlaylistError::Conflict`] when `to`
    /// already exists, with nothing changed.
    pub fn rename_playlist(&mut self, from: &str, to: &str) -> Result<bool> {
        self.run("rename_playlist", |tx, _| playlist_store::rename(tx, from, to))
    }

    pub fn remove_playlist(&mut self, name: &str) -> Result<bool> {
        self.run("remove_playlist", |tx, _| playlist_store::remove(tx, name))
    }

    pub fn remove_tracks(&mut self, playlist: &str, indexes: &[usize]) -> Result<usize> {
        self.run("remove_tracks", |tx, _| {
            track_indexer::remove_by_indexes(tx, playlist, indexes)
        })
    }

    /// Moves the track at `from` to position `to` of the list without it.
    pub fn move_track(&mut self, playlist: &str, from: usize, to: usize) -> Result<bool> {
        debug!("Move {} {} {}", playlist, from, to);
        self.run("move_track", |tx, _| {
            track_indexer::move_track(tx, playlist, from, to)
        })
    }

    /// Drops all playlist data. Call [`PlaylistManager::reinitialize`] before
    /// using the store again.
    pub fn reset_store(&mut self) -> Result<()> {
        self.run("reset_store", |tx, _| playlist_store::reset_all(tx))?;
        debug!("Playlists deleted!");
        Ok(())
    }

    /// Re-runs the migration, recreating the consolidated tables if absent.
    pub fn reinitialize(&mut self) -> Result<MigrationReport> {
        migration::migrate(&mut self.db, None)
    }
}
