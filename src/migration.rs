//! Forward-only upgrade of the playlist database to the consolidated layout.
//!
//! Version chain: `"1.0" | "1.1" -> "1.2"` drops the intermediate track table,
//! `"1.2" | "" -> "1.3"` folds the legacy name list (kept in its own database)
//! and the legacy auto-id track table into `playlist` + `track`.

use log::{debug, info, warn};
use rusqlite::{Connection, Transaction};

use crate::db_manager::DbManager;
use crate::error::{PlaylistError, Result};
use crate::playlist_store;
use crate::protocol::TrackInfo;
use crate::track_indexer;

pub const TARGET_VERSION: &str = "1.3";

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: String,
    pub to_version: String,
    pub playlists_migrated: usize,
    pub tracks_migrated: usize,
    pub tracks_skipped: usize,
}

/// Legacy rows grouped by playlist, in first-seen playlist order.
type LegacyPlaylists = Vec<(String, Vec<TrackInfo>)>;

/// Brings `db` to [`TARGET_VERSION`].
///
/// `legacy` is the separate database holding the old playlist-name list. A
/// missing handle or unreadable legacy data is treated as "no legacy data".
pub fn migrate(db: &mut DbManager, legacy: Option<&mut DbManager>) -> Result<MigrationReport> {
    let from_version = db.version()?;
    debug!("Playlist DB is version {:?}", from_version);
    let mut report = MigrationReport {
        from_version: from_version.clone(),
        ..MigrationReport::default()
    };

    let mut version = from_version;
    if version == "1.0" || version == "1.1" {
        db.change_version(&version, "1.2", |tx| {
            tx.execute("DROP TABLE IF EXISTS playlist", [])?;
            Ok(())
        })?;
        info!("Changed playlist db to 1.2 by dropping the old track table");
        version = "1.2".to_string();
    }

    let mut consolidated = false;
    if version == "1.2" || version.is_empty() {
        let legacy_names = match legacy.as_deref() {
            Some(legacy_db) => read_legacy_names(legacy_db.connection()).unwrap_or_else(|err| {
                warn!("{}; continuing without legacy playlists", err);
                Vec::new()
            }),
            None => Vec::new(),
        };
        debug!("Old playlists {:?}", legacy_names);

        db.change_version(&version, TARGET_VERSION, |tx| {
            let rows = read_legacy_tracks(tx).unwrap_or_else(|err| {
                warn!("{}; no legacy tracks to migrate", err);
                Vec::new()
            });
            info!("Changing playlist db to {}, migrating {} tracks", TARGET_VERSION, rows.len());

            let (playlists, skipped) = group_legacy_rows(rows, &legacy_names);
            tx.execute("DROP TABLE IF EXISTS playlist", [])?;
            playlist_store::ensure_schema(tx)?;

            for (name, tracks) in &playlists {
                debug!("Adding playlist {} ({} tracks)", name, tracks.len());
                playlist_store::create(tx, name)?;
                track_indexer::append_batch(tx, name, tracks)?;
                report.tracks_migrated += tracks.len();
            }
            report.playlists_migrated = playlists.len();
            report.tracks_skipped = skipped;
            Ok(())
        })?;
        consolidated = true;
    }

    // Fresh stores and repeated runs end up here too.
    db.transaction(playlist_store::ensure_schema)?;

    if consolidated {
        if let Some(legacy_db) = legacy {
            if let Err(err) = legacy_db.transaction(|tx| {
                tx.execute("DROP TABLE IF EXISTS playlists", [])?;
                Ok(())
            }) {
                warn!("Failed to drop legacy playlist list: {}", err);
            }
        }
    }

    report.to_version = db.version()?;
    Ok(report)
}

fn read_legacy_names(conn: &Connection) -> Result<Vec<String>> {
    let read = || -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT name FROM playlists")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    };
    read().map_err(|err| {
        PlaylistError::TransientUnreadable(format!("legacy playlist list: {}", err))
    })
}

struct LegacyRow {
    playlist: String,
    track: TrackInfo,
}

fn read_legacy_tracks(tx: &Transaction<'_>) -> Result<Vec<LegacyRow>> {
    let read = || -> rusqlite::Result<Vec<LegacyRow>> {
        let mut stmt = tx.prepare(
            "SELECT playlist, track, title, artist, album FROM playlist ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LegacyRow {
                playlist: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                track: TrackInfo {
                    filename: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    author: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    album: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                },
            })
        })?;
        rows.collect()
    };
    read().map_err(|err| PlaylistError::TransientUnreadable(format!("legacy tracks: {}", err)))
}

/// Groups rows by playlist keeping legacy-id order; rows of playlists missing
/// from `known` were deleted by the user and are dropped.
fn group_legacy_rows(rows: Vec<LegacyRow>, known: &[String]) -> (LegacyPlaylists, usize) {
    let mut playlists: LegacyPlaylists = Vec::new();
    let mut skipped = 0;
    for row in rows {
        if !known.contains(&row.playlist) {
            debug!("Skipping playlist {} as it was deleted", row.playlist);
            skipped += 1;
            continue;
        }
        match playlists.iter_mut().find(|(name, _)| *name == row.playlist) {
            Some((_, tracks)) => tracks.push(row.track),
            None => playlists.push((row.playlist, vec![row.track])),
        }
    }
    (playlists, skipped)
}
