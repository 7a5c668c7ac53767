//! Error taxonomy shared by the store, the migrator and the public call surface.

use thiserror::Error;

/// Failure kinds surfaced by playlist operations.
///
/// Operating on a playlist or index that does not exist is not an error: those
/// calls succeed with `false` or an empty collection.
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// A playlist with this name already exists.
    #[error("playlist already exists: {0}")]
    Conflict(String),
    /// Legacy data that could not be read during migration.
    #[error("legacy data unreadable: {0}")]
    TransientUnreadable(String),
    /// The underlying store reported an error.
    #[error("store failure: {0}")]
    StoreFailure(#[from] rusqlite::Error),
    /// The stored schema version does not match the one the caller expected.
    #[error("store version mismatch: expected {expected:?}, found {found:?}")]
    VersionMismatch { expected: String, found: String },
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl PlaylistError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, PlaylistError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, PlaylistError>;
