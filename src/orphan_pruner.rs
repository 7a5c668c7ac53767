//! Removal of slots whose media no longer resolves, and cover summaries.

use log::debug;
use rusqlite::Transaction;

use crate::error::Result;
use crate::media_resolver::{resolve_stored, MediaResolver};
use crate::protocol::{CoverInfo, PlaylistTrack};
use crate::track_indexer;

/// Slots of a playlist split by whether their media resolves.
#[derive(Debug, Default)]
pub struct ResolvedSlots {
    pub tracks: Vec<PlaylistTrack>,
    /// Indices of slots that failed to resolve.
    pub orphans: Vec<usize>,
}

pub fn resolve_slots(
    tx: &Transaction<'_>,
    playlist: &str,
    resolver: &dyn MediaResolver,
) -> Result<ResolvedSlots> {
    let mut resolved = ResolvedSlots::default();
    for slot in track_indexer::fetch(tx, playlist)? {
        match resolve_stored(resolver, &slot.info.filename) {
            Some(artifact) => resolved.tracks.push(PlaylistTrack {
                index: slot.index,
                info: slot.info,
                art: artifact.art,
            }),
            None => resolved.orphans.push(slot.index),
        }
    }
    Ok(resolved)
}

/// Reads `playlist` and deletes the slots that fail to resolve, compacting
/// afterwards. The returned tracks carry the indices from before compaction.
pub fn fetch_and_prune(
    tx: &Transaction<'_>,
    playlist: &str,
    resolver: &dyn MediaResolver,
) -> Result<ResolvedSlots> {
    let resolved = resolve_slots(tx, playlist, resolver)?;
    if !resolved.orphans.is_empty() {
        for index in &resolved.orphans {
            debug!("Remove {} from playlist {}", index, playlist);
        }
        track_indexer::remove_by_indexes(tx, playlist, &resolved.orphans)?;
    }
    Ok(resolved)
}

/// Deletes every slot of `playlist` that fails to resolve, then compacts.
/// Returns the number of slots removed.
pub fn prune_invalid(
    tx: &Transaction<'_>,
    playlist: &str,
    resolver: &dyn MediaResolver,
) -> Result<usize> {
    Ok(fetch_and_prune(tx, playlist, resolver)?.orphans.len())
}

/// Distinct `(author, album)` covers among the first `max` resolvable slots.
///
/// Unresolvable slots are skipped and do not count against `max`; `None` and
/// `Some(0)` examine the whole playlist.
pub fn covers(
    tx: &Transaction<'_>,
    playlist: &str,
    max: Option<usize>,
    resolver: &dyn MediaResolver,
) -> Result<Vec<CoverInfo>> {
    let slots = track_indexer::fetch(tx, playlist)?;
    let limit = match max {
        Some(0) | None => slots.len(),
        Some(max) => max,
    };

    let mut covers: Vec<CoverInfo> = Vec::new();
    let resolved = slots.into_iter().filter_map(|slot| {
        resolve_stored(resolver, &slot.info.filename).map(|artifact| (slot, artifact))
    });
    for (slot, artifact) in resolved.take(limit) {
        let seen = covers
            .iter()
            .any(|cover| cover.author == slot.info.author && cover.album == slot.info.album);
        if !seen {
            covers.push(CoverInfo {
                author: slot.info.author,
                album: slot.info.album,
                art: artifact.art,
            });
        }
    }
    Ok(covers)
}
