//! Metadata probes
//!
//! A probe is an external tool that prints human-readable metadata which the
//! resolvers scan line by line. Each capability is its own trait so tests can
//! swap in canned output and the CLI can point at whatever binaries exist.
//!
//! | Trait | Called | Output labels |
//! |-------|--------|---------------|
//! | [`AlbumSummaryProbe`] | once per album | `no. of tracks`, `performer`, `title`, `genre` |
//! | [`PerTrackProbe`] | once per track | `perfomer` (sic), `title`, `genre` |
//! | [`FileMetadataProbe`] | once per lossless file | `ARTIST`, `ALBUM`, `DATE`, `DISC`, `DISCTOTAL`, `title`, `GENRE`, `track` |
//!
//! Implementations must be `Send + Sync`: per-track and per-file probes are
//! issued from the rayon pool.

pub mod command;

pub use command::{CueprintProbe, FfmpegProbe};

use crate::encoding::{TextEncoding, TrackListText};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: PathBuf,
        status: String,
        stderr: String,
    },
}

/// Whole-album summary of a track-list.
pub trait AlbumSummaryProbe: Send + Sync {
    fn album_summary(&self, track_list: &TrackListText) -> Result<String, ProbeError>;
}

/// Details of one track (1-based) of a track-list.
pub trait PerTrackProbe: Send + Sync {
    fn track_info(&self, track_list: &TrackListText, track: u32) -> Result<String, ProbeError>;
}

/// Embedded tags of a single lossless file.
pub trait FileMetadataProbe: Send + Sync {
    fn file_metadata(&self, file: &Path, encoding: TextEncoding) -> Result<String, ProbeError>;
}

/// The probe set a resolver runs with.
pub struct Probes {
    pub album: Box<dyn AlbumSummaryProbe>,
    pub track: Box<dyn PerTrackProbe>,
    pub file: Box<dyn FileMetadataProbe>,
}

impl Probes {
    /// Probes backed by the `cueprint` and `ffmpeg` binaries.
    pub fn system(cueprint: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        let cueprint = CueprintProbe::new(cueprint);
        Self {
            album: Box::new(cueprint.clone()),
            track: Box::new(cueprint),
            file: Box::new(FfmpegProbe::new(ffmpeg)),
        }
    }
}

impl Default for Probes {
    fn default() -> Self {
        Self::system(command::CUEPRINT, command::FFMPEG)
    }
}

impl std::fmt::Debug for Probes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probes").finish_non_exhaustive()
    }
}
