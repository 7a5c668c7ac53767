//! Playlist identities: create, rename, remove, enumerate.

use log::debug;
use rusqlite::{params, Transaction};

use crate::error::{PlaylistError, Result};
use crate::protocol::PlaylistSummary;
use crate::track_indexer::{self, TRACK_SCHEMA};

const PLAYLIST_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS playlist (
    name TEXT PRIMARY KEY
)";

/// Creates the consolidated tables when they are missing.
pub fn ensure_schema(tx: &Transaction<'_>) -> Result<()> {
    tx.execute(PLAYLIST_SCHEMA, [])?;
    tx.execute(TRACK_SCHEMA, [])?;
    Ok(())
}

/// Inserts a playlist identity. Returns `false` if `name` already exists.
pub fn create(tx: &Transaction<'_>, name: &str) -> Result<bool> {
    debug!("Add new playlist: {}", name);
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO playlist (name) VALUES (?1)",
        params![name],
    )?;
    Ok(inserted > 0)
}

/// Moves every slot of `from` to the new identity `to` and drops `from`.
///
/// Fails with [`PlaylistError::Conflict`] when `to` exists; the caller's
/// transaction must then be rolled back, which this guarantees by returning
/// before any write. Returns `false` when `from == to`.
pub fn rename(tx: &Transaction<'_>, from: &str, to: &str) -> Result<bool> {
    if from == to {
        return Ok(false);
    }
    if !create(tx, to)? {
        return Err(PlaylistError::Conflict(to.to_string()));
    }
    let moved = tx.execute(
        "UPDATE track SET playlist = ?1 WHERE playlist = ?2",
        params![to, from],
    )?;
    tx.execute("DELETE FROM playlist WHERE name = ?1", params![from])?;
    debug!("Renamed playlist {} -> {} ({} tracks)", from, to, moved);
    Ok(true)
}

/// Deletes `name` and all its slots. Returns whether the identity existed.
pub fn remove(tx: &Transaction<'_>, name: &str) -> Result<bool> {
    tx.execute("DELETE FROM track WHERE playlist = ?1", params![name])?;
    let deleted = tx.execute("DELETE FROM playlist WHERE name = ?1", params![name])?;
    Ok(deleted > 0)
}

/// All playlists ordered case-insensitively, with live track counts.
pub fn list(tx: &Transaction<'_>) -> Result<Vec<PlaylistSummary>> {
    let names: Vec<String> = {
        let mut stmt = tx.prepare("SELECT name FROM playlist ORDER BY name COLLATE NOCASE")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()?
    };

    let mut playlists = Vec::with_capacity(names.len());
    for name in names {
        let count = track_indexer::count(tx, &name)?;
        playlists.push(PlaylistSummary { name, count });
    }
    Ok(playlists)
}

pub fn exists(tx: &Transaction<'_>, name: &str) -> Result<bool> {
    let found: i64 = tx.query_row(
        "SELECT COUNT(*) FROM playlist WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(found > 0)
}

/// Drops both consolidated tables, slots first so no foreign key dangles.
pub fn reset_all(tx: &Transaction<'_>) -> Result<()> {
    tx.execute("DROP TABLE IF EXISTS track", [])?;
    tx.execute("DROP TABLE IF EXISTS playlist", [])?;
    Ok(())
}
