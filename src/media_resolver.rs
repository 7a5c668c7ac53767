use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use log::debug;

pub const SUPPORTED_AUDIO_EXTENSIONS: [&str; 7] =
    ["mp3", "wav", "ogg", "flac", "aac", "m4a", "mp4"];

const COVER_ART_NAMES: [&str; 5] = ["cover", "front", "folder", "album", "art"];
const COVER_ART_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// What the resolver knows about a media file it recognizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaArtifact {
    pub art: Option<String>,
}

/// Read-only lookup of media by decoded filename.
pub trait MediaResolver {
    fn lookup(&self, decoded_filename: &str) -> Option<MediaArtifact>;
}

impl<R: MediaResolver + ?Sized> MediaResolver for &R {
    fn lookup(&self, decoded_filename: &str) -> Option<MediaArtifact> {
        (**self).lookup(decoded_filename)
    }
}

/// Percent-encodes a path for storage in a track slot.
pub fn encode_filename(path: &Path) -> String {
    urlencoding::encode(&path.to_string_lossy()).into_owned()
}

/// Reverses [`encode_filename`]. `None` when the stored value is not valid
/// percent-encoded UTF-8.
pub fn decode_filename(filename: &str) -> Option<String> {
    urlencoding::decode(filename).ok().map(Cow::into_owned)
}

/// Resolves through `resolver` after decoding the at-rest filename.
pub fn resolve_stored(resolver: &dyn MediaResolver, filename: &str) -> Option<MediaArtifact> {
    match decode_filename(filename) {
        Some(decoded) => resolver.lookup(&decoded),
        None => {
            debug!("Undecodable track filename {:?}", filename);
            None
        }
    }
}

pub fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Resolver backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsMediaResolver;

impl FsMediaResolver {
    pub fn new() -> Self {
        Self
    }

    fn find_cover_art(track_path: &Path) -> Option<PathBuf> {
        let parent = track_path.parent()?;
        let entries = match std::fs::read_dir(parent) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Failed to read directory {}: {}", parent.display(), err);
                return None;
            }
        };

        let mut found_files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                let stem_matches = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(|stem| COVER_ART_NAMES.iter().any(|name| stem.eq_ignore_ascii_case(name)))
                    .unwrap_or(false);
                let ext_matches = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| COVER_ART_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
                    .unwrap_or(false);
                stem_matches && ext_matches
            })
            .collect();
        // Deterministic pick when several candidates exist
        found_files.sort();
        found_files.into_iter().next()
    }
}

impl MediaResolver for FsMediaResolver {
    fn lookup(&self, decoded_filename: &str) -> Option<MediaArtifact> {
        let path = Path::new(
            decoded_filename
                .strip_prefix("file://")
                .unwrap_or(decoded_filename),
        );
        if !path.is_file() || !is_supported_audio_file(path) {
            return None;
        }
        Some(MediaArtifact {
            art: Self::find_cover_art(path).map(|art| art.to_string_lossy().into_owned()),
        })
    }
}
