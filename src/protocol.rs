//! Value types exchanged between the playlist store and the presentation layer.

/// Track metadata as supplied by callers when adding to a playlist.
///
/// `filename` is the percent-encoded media identifier stored at rest; the other
/// fields are display metadata only.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct TrackInfo {
    pub filename: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub album: String,
}

impl TrackInfo {
    pub fn new(
        filename: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
            author: author.into(),
            album: album.into(),
        }
    }
}

/// One ordered slot of a playlist as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSlot {
    /// Dense position within the playlist, starting at 0.
    pub index: usize,
    pub info: TrackInfo,
}

/// A resolved playlist entry returned by track fetches.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PlaylistTrack {
    pub index: usize,
    pub info: TrackInfo,
    /// Cover art reference reported by the media resolver.
    pub art: Option<String>,
}

/// Playlist listing row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PlaylistSummary {
    pub name: String,
    pub count: usize,
}

/// Distinct cover for an `(author, album)` pair of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CoverInfo {
    pub author: String,
    pub album: String,
    pub art: Option<String>,
}
