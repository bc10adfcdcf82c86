//! Report generation for a resolved album
//!
//! Writes the [`AlbumTagSet`] handed to the conversion stages, so a run can be
//! checked before anything is encoded:
//!
//! - **JSON**: machine-readable, includes layout and summary
//! - **CSV**: one row per track, spreadsheet-compatible
//!
//! # Usage
//!
//! ```ignore
//! use albumtag::report;
//!
//! // Automatically picks format based on extension
//! report::generate("tags.json", &album)?;  // JSON
//! report::generate("tags.csv", &album)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use crate::tags::{AlbumTagSet, DiscKey, Layout};
use serde::Serialize;
use std::io;
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, album: &AlbumTagSet) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, album),
        _ => csv::write(&mut file, album),
    }
}

/// Summary statistics for a resolved album
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub discs: usize,
    pub tracks: usize,
    pub single_shared_source: bool,
    /// Tracks whose disc number is unknown (directory mode only)
    pub unspecified_disc: usize,
    /// Discs whose track numbers skip a value or do not start at 1
    pub discs_with_gaps: usize,
}

impl Summary {
    pub fn from_album(album: &AlbumTagSet) -> Self {
        let discs_with_gaps = album
            .discs()
            .filter(|(_, tracks)| !tracks.keys().copied().eq(1..=tracks.len() as u32))
            .count();

        Self {
            discs: album.disc_count(),
            tracks: album.track_count(),
            single_shared_source: album.single_shared_source(),
            unspecified_disc: album.disc(DiscKey::UNSPECIFIED).map(|t| t.len()).unwrap_or(0),
            discs_with_gaps,
        }
    }
}

/// A track flattened for reporting
#[derive(Debug, Clone, Serialize)]
pub struct TrackRow<'a> {
    pub disc: DiscKey,
    pub track: u32,
    #[serde(flatten)]
    pub tags: &'a crate::tags::TrackTags,
}

pub fn rows(album: &AlbumTagSet) -> Vec<TrackRow<'_>> {
    album
        .tracks()
        .map(|(disc, track, tags)| TrackRow { disc, track, tags })
        .collect()
}

pub(crate) fn layout_label(layout: &Layout) -> &'static str {
    match layout {
        Layout::SharedSource(_) => "shared_source",
        Layout::PerTrack => "per_track",
    }
}
