//! Ordered playlists persisted in SQLite.
//!
//! [`PlaylistManager`] is the entry point: construct a [`DbManager`], hand it
//! over together with a [`MediaResolver`], and the store is migrated to the
//! consolidated layout before the first call.

pub mod config;
pub mod db_manager;
pub mod error;
pub mod media_resolver;
pub mod migration;
pub mod orphan_pruner;
pub mod playlist_manager;
pub mod playlist_store;
pub mod protocol;
pub mod track_indexer;

pub use db_manager::{DbManager, StoreLocation};
pub use error::{PlaylistError, Result};
pub use media_resolver::{FsMediaResolver, MediaArtifact, MediaResolver};
pub use migration::MigrationReport;
pub use playlist_manager::PlaylistManager;
pub use protocol::{CoverInfo, PlaylistSummary, PlaylistTrack, TrackInfo, TrackSlot};
