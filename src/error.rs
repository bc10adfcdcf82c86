//! Error taxonomy for tag resolution
//!
//! Three kinds of failure can happen while resolving an album:
//!
//! - **Structural**: the input itself is unusable (no track count, no FILE
//!   declarations, undecodable track-list). Nothing can be resolved.
//! - **Per track**: one track or file could not be resolved (probe failure,
//!   missing title, a disc and track already taken). Every track is still attempted; all failures are
//!   collected into [`ResolveError::Tracks`].
//! - **Environment**: the input cannot be located unambiguously.
//!
//! None of these terminate the process; the binary decides the exit status.

use crate::probe::ProbeError;
use crate::tags::DiscKey;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is neither valid UTF-8 nor Windows-1252 text")]
    UndecodableTrackList(PathBuf),

    #[error("no tracks reported for {0}, no tags discoverable")]
    NoTrackCount(PathBuf),

    #[error("malformed track-list {0}: no lossless file specified")]
    NoSourceFiles(PathBuf),

    #[error("ambiguous track-lists, choose one explicitly: {}", display_paths(.0))]
    AmbiguousTrackList(Vec<PathBuf>),

    #[error("selected track-list {0} does not exist")]
    TrackListNotFound(PathBuf),

    #[error("no lossless files (flac, ape, wv) found in {0}")]
    NoLosslessFiles(PathBuf),

    #[error("album probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("{} track(s) could not be resolved", .0.len())]
    Tracks(Vec<TrackError>),
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Which track or file a [`TrackError`] belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOrigin {
    /// 1-based index in a track-list
    Index(u32),
    /// Loose lossless file in directory mode
    File(PathBuf),
}

impl fmt::Display for TrackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackOrigin::Index(n) => write!(f, "track {}", n),
            TrackOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Error)]
#[error("{origin}: {kind}")]
pub struct TrackError {
    pub origin: TrackOrigin,
    pub kind: TrackErrorKind,
}

impl TrackError {
    pub fn new(origin: TrackOrigin, kind: TrackErrorKind) -> Self {
        Self { origin, kind }
    }
}

#[derive(Debug, Error)]
pub enum TrackErrorKind {
    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("no value for {0}")]
    MissingField(&'static str),

    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Another file already holds this disc and track.
    #[error("disc {disc} track {track} is already claimed by {}", .first.display())]
    DuplicateTrack { disc: DiscKey, track: u32, first: PathBuf },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
