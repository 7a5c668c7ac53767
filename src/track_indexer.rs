//! Dense ordering of track slots within a playlist.
//!
//! Every function here runs against an open transaction; callers own the
//! commit. After each function returns, the indices of the touched playlist
//! form the contiguous range `0..count`.

use log::debug;
use rusqlite::{params, OptionalExtension, Transaction};

use crate::error::Result;
use crate::protocol::{TrackInfo, TrackSlot};

/// Transient index that takes a slot out of the active ordering during a move.
const SENTINEL_INDEX: i64 = -1;

pub(crate) const TRACK_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS track (
    i INTEGER NOT NULL,
    playlist TEXT NOT NULL,
    filename TEXT,
    title TEXT,
    author TEXT,
    album TEXT,
    PRIMARY KEY (playlist, i),
    FOREIGN KEY (playlist) REFERENCES playlist(name)
)";

/// Row index for a caller-supplied position. Positions beyond `i64::MAX`
/// saturate, which no stored slot can hold.
fn row_index(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

fn max_index(tx: &Transaction<'_>, playlist: &str) -> Result<Option<i64>> {
    let max = tx.query_row(
        "SELECT MAX(i) FROM track WHERE playlist = ?1",
        params![playlist],
        |row| row.get::<_, Option<i64>>(0),
    )?;
    Ok(max)
}

/// Appends `track` after the current last slot and returns its index.
pub fn append(tx: &Transaction<'_>, playlist: &str, track: &TrackInfo) -> Result<usize> {
    let index = max_index(tx, playlist)?.map_or(0, |max| max + 1);
    tx.execute(
        "INSERT OR REPLACE INTO track (i, playlist, filename, title, author, album)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            index,
            playlist,
            track.filename,
            track.title,
            track.author,
            track.album
        ],
    )?;
    Ok(index as usize)
}

pub fn append_batch(tx: &Transaction<'_>, playlist: &str, tracks: &[TrackInfo]) -> Result<usize> {
    for track in tracks {
        append(tx, playlist, track)?;
        debug!("{} added to {}", track.filename, playlist);
    }
    Ok(tracks.len())
}

/// Reassigns indices by ascending rank over the non-sentinel slots.
///
/// Ranks never exceed the value being replaced, so walking upwards cannot
/// collide with a slot that has not been visited yet.
pub fn compact(tx: &Transaction<'_>, playlist: &str) -> Result<()> {
    let current: Vec<i64> = {
        let mut stmt = tx.prepare(
            "SELECT i FROM track WHERE i > ?1 AND playlist = ?2 ORDER BY i ASC",
        )?;
        let rows = stmt.query_map(params![SENTINEL_INDEX, playlist], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<i64>>>()?
    };

    let mut update = tx.prepare("UPDATE track SET i = ?1 WHERE i = ?2 AND playlist = ?3")?;
    for (rank, old) in current.into_iter().enumerate() {
        let rank = rank as i64;
        if rank != old {
            update.execute(params![rank, old, playlist])?;
        }
    }
    Ok(())
}

/// Deletes the slots at `indexes` (missing ones are ignored) and compacts.
pub fn remove_by_indexes(tx: &Transaction<'_>, playlist: &str, indexes: &[usize]) -> Result<usize> {
    let mut removed = 0;
    {
        let mut delete = tx.prepare("DELETE FROM track WHERE playlist = ?1 AND i = ?2")?;
        for &index in indexes {
            removed += delete.execute(params![playlist, row_index(index)])?;
        }
    }
    compact(tx, playlist)?;
    Ok(removed)
}

/// Moves the slot at `from` so that it ends up at `to` of the list with `from`
/// already removed.
///
/// Returns `false` when there is no slot at `from`; the playlist is still
/// compacted in that case.
pub fn move_track(tx: &Transaction<'_>, playlist: &str, from: usize, to: usize) -> Result<bool> {
    let hidden = tx.execute(
        "UPDATE track SET i = ?1 WHERE i = ?2 AND playlist = ?3",
        params![SENTINEL_INDEX, row_index(from), playlist],
    )?;
    compact(tx, playlist)?;
    if hidden == 0 {
        debug!("Move in {}: no track at index {}", playlist, from);
        return Ok(false);
    }

    let remaining = count(tx, playlist)? as i64 - 1;
    let to = row_index(to).min(remaining);

    // Open the gap top-down; an upward pass would hit (playlist, i) while
    // the next slot still holds it.
    if let Some(max) = max_index(tx, playlist)? {
        let mut shift = tx.prepare("UPDATE track SET i = i + 1 WHERE i = ?1 AND playlist = ?2")?;
        for index in (to..=max).rev() {
            shift.execute(params![index, playlist])?;
        }
    }

    tx.execute(
        "UPDATE track SET i = ?1 WHERE i = ?2 AND playlist = ?3",
        params![to, SENTINEL_INDEX, playlist],
    )?;
    Ok(true)
}

/// All slots of `playlist` in index order.
pub fn fetch(tx: &Transaction<'_>, playlist: &str) -> Result<Vec<TrackSlot>> {
    let mut stmt = tx.prepare(
        "SELECT i, filename, title, author, album FROM track WHERE playlist = ?1 ORDER BY i ASC",
    )?;
    let slots = stmt
        .query_map(params![playlist], |row| {
            Ok(TrackSlot {
                index: row.get::<_, i64>(0)? as usize,
                info: TrackInfo {
                    filename: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    author: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    album: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                },
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(slots)
}

pub fn count(tx: &Transaction<'_>, playlist: &str) -> Result<usize> {
    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM track WHERE playlist = ?1",
        params![playlist],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

pub fn slot_at(tx: &Transaction<'_>, playlist: &str, index: usize) -> Result<Option<TrackInfo>> {
    let info = tx
        .query_row(
            "SELECT filename, title, author, album FROM track WHERE playlist = ?1 AND i = ?2",
            params![playlist, row_index(index)],
            |row| {
                Ok(TrackInfo {
                    filename: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    author: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    album: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            },
        )
        .optional()?;
    Ok(info)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db_manager::DbManager;
    use crate::error::PlaylistError;
    use crate::playlist_store;

    pub(crate) fn indexed_db() -> DbManager {
        let mut db = DbManager::open_in_memory("indexer", "").expect("open");
        db.transaction(playlist_store::ensure_schema).expect("schema");
        db
    }

    /// Appends `tracks` to `playlist`, creating the playlist when missing.
    pub(crate) fn seed_tracks(db: &mut DbManager, playlist: &str, tracks: &[TrackInfo]) {
        db.transaction(|tx| {
            playlist_store::create(tx, playlist)?;
            append_batch(tx, playlist, tracks)
        })
        .expect("seed");
    }

    fn track(name: &str) -> TrackInfo {
        TrackInfo::new(format!("/music/{}.mp3", name), name, "Artist", "Album")
    }

    fn seed(db: &mut DbManager, playlist: &str, names: &[&str]) {
        let tracks: Vec<TrackInfo> = names.iter().map(|name| track(name)).collect();
        seed_tracks(db, playlist, &tracks);
    }

    fn titles(db: &mut DbManager, playlist: &str) -> Vec<String> {
        let slots = db.transaction(|tx| fetch(tx, playlist)).expect("fetch");
        for (expected, slot) in slots.iter().enumerate() {
            assert_eq!(slot.index, expected, "indices must stay dense");
        }
        slots.into_iter().map(|slot| slot.info.title).collect()
    }

    #[test]
    fn test_append_starts_at_zero_and_grows() {
        let mut db = indexed_db();
        seed(&mut db, "Road Trip", &[]);
        let first = db
            .transaction(|tx| append(tx, "Road Trip", &track("a")))
            .expect("append");
        let second = db
            .transaction(|tx| append(tx, "Road Trip", &track("b")))
            .expect("append");
        assert_eq!((first, second), (0, 1));
        assert_eq!(titles(&mut db, "Road Trip"), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_closes_gap_preserving_order() {
        let mut db = indexed_db();
        seed(&mut db, "Road Trip", &["t0", "t1", "t2", "t3"]);
        let removed = db
            .transaction(|tx| remove_by_indexes(tx, "Road Trip", &[1]))
            .expect("remove");
        assert_eq!(removed, 1);
        assert_eq!(titles(&mut db, "Road Trip"), vec!["t0", "t2", "t3"]);
    }

    #[test]
    fn test_remove_ignores_missing_indexes() {
        let mut db = indexed_db();
        seed(&mut db, "p", &["t0", "t1"]);
        let removed = db
            .transaction(|tx| remove_by_indexes(tx, "p", &[7, 0, 0]))
            .expect("remove");
        assert_eq!(removed, 1);
        assert_eq!(titles(&mut db, "p"), vec!["t1"]);
    }

    #[test]
    fn test_move_last_to_front() {
        let mut db = indexed_db();
        seed(&mut db, "Road Trip", &["t0", "t1", "t2", "t3"]);
        let moved = db
            .transaction(|tx| move_track(tx, "Road Trip", 3, 0))
            .expect("move");
        assert!(moved);
        assert_eq!(titles(&mut db, "Road Trip"), vec!["t3", "t0", "t1", "t2"]);
    }

    #[test]
    fn test_move_follows_remove_then_reinsert_law() {
        let names = ["t0", "t1", "t2", "t3", "t4"];
        for from in 0..names.len() {
            for to in 0..names.len() {
                let mut db = indexed_db();
                seed(&mut db, "p", &names);
                db.transaction(|tx| move_track(tx, "p", from, to))
                    .expect("move");

                let mut expected: Vec<String> = names.iter().map(|s| s.to_string()).collect();
                let taken = expected.remove(from);
                expected.insert(to.min(expected.len()), taken);
                assert_eq!(titles(&mut db, "p"), expected, "from={} to={}", from, to);
            }
        }
    }

    #[test]
    fn test_move_missing_source_leaves_order() {
        let mut db = indexed_db();
        seed(&mut db, "p", &["t0", "t1"]);
        let moved = db
            .transaction(|tx| move_track(tx, "p", 5, 0))
            .expect("move");
        assert!(!moved);
        assert_eq!(titles(&mut db, "p"), vec!["t0", "t1"]);
    }

    #[test]
    fn test_move_on_single_track_is_stable() {
        let mut db = indexed_db();
        seed(&mut db, "p", &["only"]);
        db.transaction(|tx| move_track(tx, "p", 0, 3))
            .expect("move");
        assert_eq!(titles(&mut db, "p"), vec!["only"]);
    }

    #[test]
    fn test_playlists_are_indexed_independently() {
        let mut db = indexed_db();
        seed(&mut db, "a", &["a0", "a1"]);
        seed(&mut db, "b", &["b0"]);
        db.transaction(|tx| remove_by_indexes(tx, "a", &[0]))
            .expect("remove");
        assert_eq!(titles(&mut db, "a"), vec!["a1"]);
        assert_eq!(titles(&mut db, "b"), vec!["b0"]);
    }

    #[test]
    fn test_duplicate_filenames_are_allowed() {
        let mut db = indexed_db();
        seed(&mut db, "p", &["same", "same"]);
        assert_eq!(db.transaction(|tx| count(tx, "p")).expect("count"), 2);
        let slot = db
            .transaction(|tx| slot_at(tx, "p", 1))
            .expect("slot")
            .expect("present");
        assert_eq!(slot.filename, "/music/same.mp3");
    }

    #[test]
    fn test_move_past_end_lands_last() {
        for to in [3, 40, usize::MAX] {
            let mut db = indexed_db();
            seed(&mut db, "p", &["t0", "t1", "t2"]);
            assert!(db.transaction(|tx| move_track(tx, "p", 0, to)).expect("move"));
            assert_eq!(titles(&mut db, "p"), vec!["t1", "t2", "t0"], "to={}", to);
        }
    }

    #[test]
    fn test_huge_positions_match_no_slot() {
        let mut db = indexed_db();
        seed(&mut db, "p", &["t0", "t1"]);
        assert!(!db
            .transaction(|tx| move_track(tx, "p", usize::MAX, 0))
            .expect("move"));
        assert_eq!(
            db.transaction(|tx| remove_by_indexes(tx, "p", &[usize::MAX]))
                .expect("remove"),
            0
        );
        assert_eq!(db.transaction(|tx| slot_at(tx, "p", usize::MAX)).expect("slot"), None);
        assert_eq!(titles(&mut db, "p"), vec!["t0", "t1"]);
    }

    #[test]
    fn test_failed_batch_leaves_no_slots() {
        let mut db = indexed_db();
        seed(&mut db, "p", &["t0"]);
        let batch: Vec<TrackInfo> = ["t1", "t2", "t3"].iter().map(|name| track(name)).collect();

        let result: crate::error::Result<()> = db.transaction(|tx| {
            assert_eq!(append_batch(tx, "p", &batch)?, 3);
            assert_eq!(count(tx, "p")?, 4);
            Err(PlaylistError::Conflict("p".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.transaction(|tx| count(tx, "p")).expect("count"), 1);
        assert_eq!(titles(&mut db, "p"), vec!["t0"]);

        // Rows the schema rejects leave the store untouched.
        let result = db.transaction(|tx| append_batch(tx, "unknown playlist", &batch));
        assert!(matches!(result, Err(PlaylistError::StoreFailure(_))));
        assert_eq!(
            db.transaction(|tx| count(tx, "unknown playlist")).expect("count"),
            0
        );
    }
}
