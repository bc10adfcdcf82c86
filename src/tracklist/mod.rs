//! Track-list (cue sheet) parsing
//!
//! Album-level facts come from two places:
//!
//! 1. The album summary probe: track count, performer, album title, genre.
//!    The first occurrence of each label wins.
//! 2. The raw track-list text: the release year (`[REM ]DATE <digits>`) and
//!    the lossless files it references (`FILE "<name>" [WAVE|FLAC|APE]`).
//!
//! The number of FILE declarations decides the [`Layout`]: a single file
//! shared by every track needs splitting, several mean one file per track.
//!
//! Per-track details are resolved afterwards by [`tracks`].

pub mod tracks;

use crate::encoding::TrackListText;
use crate::error::ResolveError;
use crate::probe::AlbumSummaryProbe;
use crate::resolve::Overrides;
use crate::scan::{capture, first_capture, keep_first, pattern};
use crate::tags::{Layout, TrackSource};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const TRACK_LIST_EXTENSION: &str = "cue";

static TRACK_COUNT: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*no\. of tracks:[ \t]*([0-9]+)[ \t]*$"));
static PERFORMER: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*performer:[ \t]*(.*)$"));
static TITLE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*title:[ \t]*(.*)$"));
static GENRE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*genre:[ \t]*(.*)$"));

static DATE_LINE: Lazy<Regex> = Lazy::new(|| pattern(r#"^[ \t]*(?:REM[ \t]+)?DATE[ \t]+"?([0-9]+)"?[ \t]*$"#));
static FILE_LINE: Lazy<Regex> =
    Lazy::new(|| pattern(r#"^[ \t]*FILE[ \t]+"(.*)"[ \t]*(?:WAVE|FLAC|APE)?[ \t]*$"#));
static TRACK_LINE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*TRACK[ \t]+([0-9]+)\b"));

/// A lossless file declared in the track-list, numbered in discovery order from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileReference {
    pub index: u32,
    pub path: PathBuf,
}

/// What the album summary probe reported, overrides already applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbedSummary {
    pub track_count: u32,
    pub performer: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
}

/// Everything known about the album before per-track probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSummary {
    pub track_count: u32,
    pub performer: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub sources: Vec<SourceFileReference>,
    pub layout: Layout,
    /// Track number → position in `sources` of the FILE in effect for it.
    track_files: BTreeMap<u32, usize>,
}

impl AlbumSummary {
    /// Where `track` gets its audio from.
    ///
    /// Tracks without a TRACK line of their own fall back to the file with
    /// the same discovery index, then to the last declared file.
    pub fn track_source(&self, track: u32) -> TrackSource {
        if let Layout::SharedSource(_) = self.layout {
            return TrackSource::Split;
        }
        let source = self
            .track_files
            .get(&track)
            .and_then(|&i| self.sources.get(i))
            .or_else(|| self.sources.iter().find(|s| s.index == track))
            .or_else(|| self.sources.last());
        match source {
            Some(s) => TrackSource::File(s.path.clone()),
            None => TrackSource::Split,
        }
    }
}

/// Scan album summary probe output.
///
/// Returns `None` when no track count, or a count of zero, is reported:
/// nothing about the album can be discovered. Fields with an override are
/// not scanned.
pub fn scan_album_summary(output: &str, overrides: &Overrides) -> Option<ProbedSummary> {
    let mut track_count = None;
    let mut performer = overrides.performer.clone();
    let mut album = overrides.album.clone();
    let mut genre = overrides.genre.clone();

    for line in output.lines() {
        if track_count.is_none() {
            if let Some(n) = capture(&TRACK_COUNT, line).and_then(|n| n.parse::<u32>().ok()) {
                track_count = Some(n);
                continue;
            }
        }
        if overrides.performer.is_none() {
            if let Some(v) = capture(&PERFORMER, line) {
                keep_first(&mut performer, Some(v));
                continue;
            }
        }
        if overrides.album.is_none() {
            if let Some(v) = capture(&TITLE, line) {
                keep_first(&mut album, Some(v));
                continue;
            }
        }
        if overrides.genre.is_none() {
            if let Some(v) = capture(&GENRE, line) {
                keep_first(&mut genre, Some(v));
                continue;
            }
        }
    }

    Some(ProbedSummary {
        track_count: track_count.filter(|&n| n > 0)?,
        performer,
        album,
        genre,
    })
}

/// First `DATE` year in the raw track-list text.
pub fn scan_year(raw: &str) -> Option<String> {
    first_capture(&DATE_LINE, raw)
}

/// FILE declarations in order of appearance, joined onto `base_dir` when relative.
pub fn scan_source_files(raw: &str, base_dir: &Path) -> Vec<SourceFileReference> {
    raw.lines()
        .filter_map(|line| capture(&FILE_LINE, line))
        .zip(1..)
        .map(|(name, index)| SourceFileReference {
            index,
            path: base_dir.join(name),
        })
        .collect()
}

/// Map each `TRACK nn` to the position of the FILE declared before it.
fn scan_track_files(raw: &str) -> BTreeMap<u32, usize> {
    let mut current = None;
    let mut files = 0;
    let mut map = BTreeMap::new();

    for line in raw.lines() {
        if capture(&FILE_LINE, line).is_some() {
            current = Some(files);
            files += 1;
        } else if let Some(n) = capture(&TRACK_LINE, line).and_then(|n| n.parse::<u32>().ok()) {
            if let Some(file) = current {
                map.entry(n).or_insert(file);
            }
        }
    }
    map
}

/// One FILE declaration → shared, several → per track, none → malformed.
///
/// Declarations are counted, not paths: a file named twice is still two.
pub fn classify_layout(
    track_list: &Path,
    sources: &[SourceFileReference],
) -> Result<Layout, ResolveError> {
    match sources {
        [] => Err(ResolveError::NoSourceFiles(track_list.to_path_buf())),
        [only] => Ok(Layout::SharedSource(only.path.clone())),
        _ => Ok(Layout::PerTrack),
    }
}

/// Parse the album-level part of a track-list.
///
/// `Ok(None)` means the probe reported no tracks.
pub fn parse(
    track_list: &TrackListText,
    probe: &dyn AlbumSummaryProbe,
    overrides: &Overrides,
) -> Result<Option<AlbumSummary>, ResolveError> {
    let output = probe.album_summary(track_list)?;
    let Some(probed) = scan_album_summary(&output, overrides) else {
        info!(path = %track_list.path().display(), "album probe reported no track count");
        return Ok(None);
    };

    let raw = track_list.text();
    let year = overrides.year.clone().or_else(|| scan_year(raw));
    let sources = scan_source_files(raw, track_list.base_dir());
    let layout = classify_layout(track_list.path(), &sources)?;

    debug!(
        tracks = probed.track_count,
        files = sources.len(),
        shared = matches!(layout, Layout::SharedSource(_)),
        "parsed track-list"
    );

    Ok(Some(AlbumSummary {
        track_count: probed.track_count,
        performer: probed.performer,
        album: probed.album,
        genre: probed.genre,
        year,
        track_files: scan_track_files(raw),
        sources,
        layout,
    }))
}

/// Where the album is described
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    TrackList(PathBuf),
    Directory(PathBuf),
}

/// Decide between track-list mode and directory mode.
///
/// An explicit track-list must exist. Otherwise `dir` is searched (not
/// recursively): one `.cue` is used, several are ambiguous, none means
/// directory mode.
pub fn select_input(dir: &Path, explicit: Option<&Path>) -> Result<Input, ResolveError> {
    if let Some(path) = explicit {
        let path = if path.is_relative() { dir.join(path) } else { path.to_path_buf() };
        return if path.is_file() {
            Ok(Input::TrackList(path))
        } else {
            Err(ResolveError::TrackListNotFound(path))
        };
    }

    let mut candidates: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(TRACK_LIST_EXTENSION))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => {
            info!(dir = %dir.display(), "no track-list present, probing loose files");
            Ok(Input::Directory(dir.to_path_buf()))
        }
        1 => {
            let found = candidates.remove(0);
            info!(path = %found.display(), "found track-list");
            Ok(Input::TrackList(found))
        }
        _ => Err(ResolveError::AmbiguousTrackList(candidates)),
    }
}
