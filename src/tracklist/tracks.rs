//! Per-track resolution for track-list mode
//!
//! Each track is probed on its own and its fields resolved with
//! [`resolve_field`]: override, then the scanned value, then the album-level
//! value from [`AlbumSummary`]. Title has neither override nor fallback.
//!
//! Tracks are independent, so they are probed from the rayon pool. Results are
//! keyed by track number, never by completion order.

use super::AlbumSummary;
use crate::encoding::TrackListText;
use crate::error::{ResolveError, TrackError, TrackErrorKind, TrackOrigin};
use crate::probe::PerTrackProbe;
use crate::resolve::{required, resolve_field, Overrides};
use crate::scan::{capture, keep_first, pattern};
use crate::tags::{AlbumTagSet, DiscKey, ResolvedFields, TrackTags};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

// The per-track probe spells the label "perfomer". Matching it literally is
// required; "performer" lines here belong to the album.
static PERFOMER: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*perfomer:[ \t]*(.*)$"));
static TITLE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*title:[ \t]*(.*)$"));
static GENRE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*genre:[ \t]*(.*)$"));

/// A track-list describes one disc unless the user numbers it.
const DISC: u32 = 1;

/// Raw values from one per-track probe run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedTrack {
    pub performer: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
}

/// Scan per-track probe output. Overridden fields are not scanned.
pub fn scan_track(output: &str, overrides: &Overrides) -> ScannedTrack {
    let mut scanned = ScannedTrack::default();

    for line in output.lines() {
        if overrides.performer.is_none() {
            if let Some(v) = capture(&PERFOMER, line) {
                keep_first(&mut scanned.performer, Some(v));
                continue;
            }
        }
        if let Some(v) = capture(&TITLE, line) {
            keep_first(&mut scanned.title, Some(v));
            continue;
        }
        if overrides.genre.is_none() {
            if let Some(v) = capture(&GENRE, line) {
                keep_first(&mut scanned.genre, Some(v));
                continue;
            }
        }
    }
    scanned
}

/// Combine one track's scan with overrides and album defaults.
pub fn resolve_fields(
    scanned: &ScannedTrack,
    album: &AlbumSummary,
    overrides: &Overrides,
) -> Result<ResolvedFields, TrackErrorKind> {
    let artist = required(
        resolve_field(
            overrides.performer.as_deref(),
            scanned.performer.as_deref(),
            album.performer.as_deref(),
        ),
        "artist",
    )?;

    let genre = required(
        resolve_field(
            overrides.genre.as_deref(),
            scanned.genre.as_deref(),
            album.genre.as_deref(),
        ),
        "genre",
    )?;

    let title = required(scanned.title.as_deref(), "title")?;
    let album_title = required(album.album.as_deref(), "album")?;

    Ok(ResolvedFields {
        artist: artist.to_string(),
        album: album_title.to_string(),
        title: title.to_string(),
        genre: genre.to_string(),
        year: album.year.clone(),
        disc_total: Some(overrides.disc_total.unwrap_or(DISC)),
        comment: overrides.comment.clone(),
    })
}

fn resolve_track(
    track_list: &TrackListText,
    album: &AlbumSummary,
    probe: &dyn PerTrackProbe,
    overrides: &Overrides,
    track: u32,
) -> Result<TrackTags, TrackErrorKind> {
    let output = probe.track_info(track_list, track)?;
    let scanned = scan_track(&output, overrides);
    let fields = resolve_fields(&scanned, album, overrides)?;
    debug!(track, title = %fields.title, "resolved track");
    Ok(TrackTags::new(track, fields, album.track_source(track)))
}

/// Resolve every track `1..=track_count` into a single-disc [`AlbumTagSet`].
///
/// The disc is numbered 1 unless `overrides.disc` says otherwise.
///
/// All tracks are attempted; if any fail, every failure is returned together.
pub fn resolve_tracks(
    track_list: &TrackListText,
    album: &AlbumSummary,
    probe: &dyn PerTrackProbe,
    overrides: &Overrides,
) -> Result<AlbumTagSet, ResolveError> {
    let results: Vec<(u32, Result<TrackTags, TrackErrorKind>)> = (1..=album.track_count)
        .into_par_iter()
        .map(|track| (track, resolve_track(track_list, album, probe, overrides, track)))
        .collect();

    let disc = DiscKey::number(overrides.disc.unwrap_or(DISC));
    let mut set = AlbumTagSet::new(album.layout.clone());
    let mut failures = Vec::new();

    for (track, result) in results {
        match result {
            Ok(tags) => {
                set.insert(disc, track, tags);
            }
            Err(kind) => {
                warn!(track, error = %kind, "track could not be resolved");
                failures.push(TrackError::new(TrackOrigin::Index(track), kind));
            }
        }
    }

    if failures.is_empty() {
        Ok(set)
    } else {
        Err(ResolveError::Tracks(failures))
    }
}
