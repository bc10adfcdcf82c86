//! Directory mode: loose lossless files without a track-list
//!
//! Every `.flac`, `.ape` and `.wv` file in the directory (not recursive) is
//! probed once for its embedded tags. Files are independent and probed in
//! parallel; tracks are grouped by the disc and track numbers the files
//! report.
//!
//! Nothing here guarantees contiguous track numbers. A file without a disc
//! number lands under [`DiscKey::UNSPECIFIED`]; a second file claiming the
//! same disc and track is reported alongside every other failed file.

use crate::encoding::TextEncoding;
use crate::error::{ResolveError, TrackError, TrackErrorKind, TrackOrigin};
use crate::probe::FileMetadataProbe;
use crate::resolve::{required, resolve_field, Overrides};
use crate::scan::{capture, keep_first, pattern};
use crate::tags::{AlbumTagSet, DiscKey, Layout, ResolvedFields, TrackSource, TrackTags};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const LOSSLESS_EXTENSIONS: [&str; 3] = ["flac", "ape", "wv"];

static ARTIST: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+ARTIST[ \t]*:[ \t]*(.*)$"));
static ALBUM: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+ALBUM[ \t]*:[ \t]*(.*)$"));
static DATE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+DATE[ \t]*:[ \t]*([0-9]{4})"));
static DISC: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+DISC[ \t]*:[ \t]*(.*)$"));
static DISC_TOTAL: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+DISCTOTAL[ \t]*:[ \t]*(.*)$"));
static TITLE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+TITLE[ \t]*:[ \t]*(.*)$"));
static GENRE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+GENRE[ \t]*:[ \t]*(.*)$"));
static TRACK: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+TRACK[ \t]*:[ \t]*(.*)$"));

/// Raw values from one file's metadata dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedFile {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub disc: Option<String>,
    pub disc_total: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub track: Option<String>,
}

/// Scan a metadata dump. Overridden fields are not scanned; the first
/// occurrence of every label wins.
pub fn scan_file(output: &str, overrides: &Overrides) -> ScannedFile {
    let mut s = ScannedFile::default();

    for line in output.lines() {
        if overrides.performer.is_none() && take(&ARTIST, line, &mut s.artist) {
            continue;
        }
        if overrides.album.is_none() && take(&ALBUM, line, &mut s.album) {
            continue;
        }
        if overrides.year.is_none() && take(&DATE, line, &mut s.year) {
            continue;
        }
        if (overrides.disc.is_none() && take(&DISC, line, &mut s.disc))
            || (overrides.disc_total.is_none() && take(&DISC_TOTAL, line, &mut s.disc_total))
            || take(&TITLE, line, &mut s.title)
            || (overrides.genre.is_none() && take(&GENRE, line, &mut s.genre))
        {
            continue;
        }
        take(&TRACK, line, &mut s.track);
    }
    s
}

fn take(re: &Regex, line: &str, slot: &mut Option<String>) -> bool {
    match capture(re, line) {
        Some(v) => {
            keep_first(slot, Some(v));
            true
        }
        None => false,
    }
}

/// Parse `3` or `3/12` as 3.
fn parse_number(field: &'static str, value: &str) -> Result<u32, TrackErrorKind> {
    let head = value.split('/').next().unwrap_or("").trim();
    head.parse().map_err(|_| TrackErrorKind::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn optional_number(field: &'static str, value: Option<&str>) -> Result<Option<u32>, TrackErrorKind> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_number(field, v))
        .transpose()
}

/// A resolved file: where it goes and its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub disc: DiscKey,
    pub track: u32,
    pub tags: TrackTags,
}

/// Combine one file's scan with overrides. There is no album-level fallback
/// in this mode, so a blank artist, album, genre or title fails the file.
pub fn resolve_file(path: &Path, scanned: &ScannedFile, overrides: &Overrides) -> Result<ResolvedFile, TrackErrorKind> {
    let field = |override_value: &Option<String>, value: &Option<String>, name| {
        required(resolve_field(override_value.as_deref(), value.as_deref(), None), name).map(str::to_string)
    };

    let artist = field(&overrides.performer, &scanned.artist, "artist")?;
    let album = field(&overrides.album, &scanned.album, "album")?;
    let genre = field(&overrides.genre, &scanned.genre, "genre")?;
    let title = required(scanned.title.as_deref(), "title")?.to_string();
    let year = resolve_field(overrides.year.as_deref(), scanned.year.as_deref(), None).map(str::to_string);

    let track = optional_number("track", scanned.track.as_deref())?.ok_or(TrackErrorKind::MissingField("track"))?;
    let disc = match overrides.disc {
        Some(n) => DiscKey::number(n),
        None => DiscKey(optional_number("disc", scanned.disc.as_deref())?),
    };
    let disc_total = match overrides.disc_total {
        Some(n) => Some(n),
        None => optional_number("disctotal", scanned.disc_total.as_deref())?,
    };

    let fields = ResolvedFields {
        artist,
        album,
        title,
        genre,
        year,
        disc_total,
        comment: overrides.comment.clone(),
    };

    Ok(ResolvedFile {
        disc,
        track,
        tags: TrackTags::new(track, fields, TrackSource::File(path.to_path_buf())),
    })
}

/// Lossless files directly inside `dir`, sorted by path.
pub fn lossless_files(dir: &Path) -> Result<Vec<PathBuf>, ResolveError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ResolveError::io(path, e.into())
        })?;
        let is_lossless = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| LOSSLESS_EXTENSIONS.iter().any(|l| ext.eq_ignore_ascii_case(l)))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_lossless {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Probe every lossless file in `dir` and group the results by disc and track.
///
/// Files are placed in path order, so of two files claiming one slot the
/// later path is the one reported.
pub fn resolve_directory(
    dir: &Path,
    probe: &dyn FileMetadataProbe,
    overrides: &Overrides,
    on_probed: &(dyn Fn(&Path) + Send + Sync),
) -> Result<AlbumTagSet, ResolveError> {
    let files = lossless_files(dir)?;
    if files.is_empty() {
        return Err(ResolveError::NoLosslessFiles(dir.to_path_buf()));
    }
    info!(dir = %dir.display(), files = files.len(), "probing loose lossless files");

    let results: Vec<(&PathBuf, Result<ResolvedFile, TrackErrorKind>)> = files
        .par_iter()
        .map(|path| {
            let result = probe
                .file_metadata(path, TextEncoding::Utf8)
                .map_err(TrackErrorKind::from)
                .and_then(|output| resolve_file(path, &scan_file(&output, overrides), overrides));
            on_probed(path);
            (path, result)
        })
        .collect();

    let mut set = AlbumTagSet::new(Layout::PerTrack);
    let mut failures = Vec::new();

    for (path, result) in results {
        match result {
            Ok(file) => {
                if let Some(first) = set.track(file.disc, file.track) {
                    let kind = TrackErrorKind::DuplicateTrack {
                        disc: file.disc,
                        track: file.track,
                        first: first.source_locator.clone().unwrap_or_default(),
                    };
                    warn!(path = %path.display(), error = %kind, "file could not be placed");
                    failures.push(TrackError::new(TrackOrigin::File(path.clone()), kind));
                    continue;
                }
                debug!(path = %path.display(), disc = %file.disc, track = file.track, "resolved file");
                set.insert(file.disc, file.track, file.tags);
            }
            Err(kind) => {
                warn!(path = %path.display(), error = %kind, "file could not be resolved");
                failures.push(TrackError::new(TrackOrigin::File(path.clone()), kind));
            }
        }
    }

    if failures.is_empty() {
        Ok(set)
    } else {
        Err(ResolveError::Tracks(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ==========================================================================
    // CANNED METADATA
    // ==========================================================================
    //
    // Mirrors the "Metadata:" block ffmpeg prints for an input file.
    // ==========================================================================

    fn dump(disc: Option<u32>, track: &str, title: &str) -> String {
        let mut out = String::from("Input #0, flac, from 'x.flac':\n  Metadata:\n");
        out.push_str("    ARTIST          : bill evans\n");
        out.push_str("    ALBUM           : sunday at the village vanguard\n");
        out.push_str("    DATE            : 1961-06-25\n");
        if let Some(d) = disc {
            out.push_str(&format!("    disc            : {}\n", d));
            out.push_str("    DISCTOTAL       : 2\n");
        }
        out.push_str(&format!("    title           : {}\n", title));
        out.push_str("    GENRE           : jazz\n");
        out.push_str(&format!("    track           : {}\n", track));
        out.push_str("  Duration: 00:08:46.00, start: 0.000000, bitrate: 912 kb/s\n");
        out
    }

    struct Canned(HashMap<String, String>);

    impl FileMetadataProbe for Canned {
        fn file_metadata(&self, file: &Path, _: TextEncoding) -> Result<String, ProbeError> {
            let name = file.file_name().unwrap().to_string_lossy().to_string();
            self.0.get(&name).cloned().ok_or_else(|| ProbeError::Failed {
                program: PathBuf::from("ffmpeg"),
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            })
        }
    }

    fn album_dir(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(dir.path().join(f), b"").unwrap();
        }
        dir
    }

    fn canned(entries: &[(&str, String)]) -> Canned {
        Canned(entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    fn no_progress(_: &Path) {}

    // ==========================================================================
    // SCANNING
    // ==========================================================================

    #[test]
    fn test_scan_dump() {
        let s = scan_file(&dump(Some(1), "3/12", "gloria's step"), &Overrides::default());
        assert_eq!(s.artist.as_deref(), Some("bill evans"));
        assert_eq!(s.album.as_deref(), Some("sunday at the village vanguard"));
        assert_eq!(s.year.as_deref(), Some("1961"));
        assert_eq!(s.disc.as_deref(), Some("1"));
        assert_eq!(s.disc_total.as_deref(), Some("2"));
        assert_eq!(s.title.as_deref(), Some("gloria's step"));
        assert_eq!(s.genre.as_deref(), Some("jazz"));
        assert_eq!(s.track.as_deref(), Some("3/12"));
    }

    #[test]
    fn test_scan_ignores_album_artist() {
        let s = scan_file("    album_artist    : Nobody\n    ARTIST : Somebody\n", &Overrides::default());
        assert_eq!(s.artist.as_deref(), Some("Somebody"));
        assert_eq!(s.album, None);
    }

    #[test]
    fn test_scan_requires_indent() {
        let s = scan_file("title: not metadata\n", &Overrides::default());
        assert_eq!(s.title, None);
    }

    // ==========================================================================
    // PER-FILE RESOLUTION
    // ==========================================================================

    #[test]
    fn test_resolve_file_with_overrides() {
        let overrides = Overrides::new()
            .with_performer("scott lafaro")
            .with_album("live")
            .with_genre("bebop")
            .with_year("1999");
        let s = scan_file(&dump(None, "2", "alice in wonderland"), &overrides);
        let f = resolve_file(Path::new("/a/02.flac"), &s, &overrides).unwrap();

        assert_eq!(f.disc, DiscKey::UNSPECIFIED);
        assert_eq!(f.track, 2);
        assert_eq!(f.tags.artist, "Scott Lafaro");
        assert_eq!(f.tags.album, "Live");
        assert_eq!(f.tags.genre, "Bebop");
        assert_eq!(f.tags.year.as_deref(), Some("1999"));
        assert_eq!(f.tags.output_filename, "02 alice-in-wonderland.m4a");
        assert_eq!(f.tags.intermediate_filename, PathBuf::from("/a/02.wav"));
    }

    #[test]
    fn test_resolve_file_missing_artist() {
        let s = ScannedFile {
            title: Some("x".into()),
            album: Some("a".into()),
            genre: Some("g".into()),
            track: Some("1".into()),
            ..Default::default()
        };
        let err = resolve_file(Path::new("x.flac"), &s, &Overrides::default()).unwrap_err();
        assert!(matches!(err, TrackErrorKind::MissingField("artist")));
    }

    #[test]
    fn test_resolve_file_blank_artist_is_missing() {
        let dump = dump(None, "1", "x").replace("bill evans", "");
        let s = scan_file(&dump, &Overrides::default());
        assert_eq!(s.artist.as_deref(), Some(""));
        let err = resolve_file(Path::new("x.flac"), &s, &Overrides::default()).unwrap_err();
        assert!(matches!(err, TrackErrorKind::MissingField("artist")));
    }

    #[test]
    fn test_resolve_file_blank_album_and_genre_are_missing() {
        let s = scan_file(&dump(None, "1", "x").replace("sunday at the village vanguard", ""), &Overrides::default());
        let err = resolve_file(Path::new("x.flac"), &s, &Overrides::default()).unwrap_err();
        assert!(matches!(err, TrackErrorKind::MissingField("album")));

        let s = scan_file(&dump(None, "1", "x").replace(": jazz", ": "), &Overrides::default());
        let err = resolve_file(Path::new("x.flac"), &s, &Overrides::default()).unwrap_err();
        assert!(matches!(err, TrackErrorKind::MissingField("genre")));
    }

    #[test]
    fn test_resolve_file_bad_track_number() {
        let s = scan_file(&dump(Some(1), "side A", "x"), &Overrides::default());
        let err = resolve_file(Path::new("x.flac"), &s, &Overrides::default()).unwrap_err();
        assert!(matches!(err, TrackErrorKind::InvalidNumber { field: "track", .. }));
    }

    // ==========================================================================
    // DIRECTORY GROUPING
    // ==========================================================================

    #[test]
    fn test_lists_only_lossless_files() {
        let dir = album_dir(&["01.flac", "02.APE", "03.wv", "cover.jpg", "notes.txt", "04.mp3"]);
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("05.flac"), b"").unwrap();

        let names: Vec<String> = lossless_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01.flac", "02.APE", "03.wv"]);
    }

    #[test]
    fn test_groups_by_disc_with_unspecified_disc_apart() {
        let dir = album_dir(&["a.flac", "b.flac", "c.flac", "d.flac"]);
        let probe = canned(&[
            ("a.flac", dump(Some(1), "1", "one")),
            ("b.flac", dump(Some(1), "2", "two")),
            ("c.flac", dump(Some(1), "3", "three")),
            ("d.flac", dump(None, "1", "bonus")),
        ]);
        let probed = AtomicUsize::new(0);
        let count = |_: &Path| {
            probed.fetch_add(1, Ordering::SeqCst);
        };

        let set = resolve_directory(dir.path(), &probe, &Overrides::default(), &count).unwrap();

        assert_eq!(probed.load(Ordering::SeqCst), 4);
        assert!(!set.single_shared_source());
        assert_eq!(set.disc(DiscKey::number(1)).unwrap().len(), 3);
        assert_eq!(set.disc(DiscKey::UNSPECIFIED).unwrap().len(), 1);
        assert_eq!(set.track(DiscKey::UNSPECIFIED, 1).unwrap().title, "Bonus");
        assert_eq!(set.track(DiscKey::number(1), 3).unwrap().disc_total, Some(2));
    }

    #[test]
    fn test_gaps_are_allowed() {
        let dir = album_dir(&["a.flac", "b.flac"]);
        let probe = canned(&[("a.flac", dump(Some(2), "1", "x")), ("b.flac", dump(Some(2), "7", "y"))]);
        let set = resolve_directory(dir.path(), &probe, &Overrides::default(), &no_progress).unwrap();
        let numbers: Vec<u32> = set.disc(DiscKey::number(2)).unwrap().keys().copied().collect();
        assert_eq!(numbers, vec![1, 7]);
    }

    #[test]
    fn test_duplicate_slot_reported_with_other_failures() {
        let dir = album_dir(&["a.flac", "b.flac", "c.flac"]);
        let probe = canned(&[("a.flac", dump(Some(1), "4", "x")), ("b.flac", dump(Some(1), "4/9", "y"))]);
        let err = resolve_directory(dir.path(), &probe, &Overrides::default(), &no_progress).unwrap_err();
        match err {
            ResolveError::Tracks(failures) => {
                assert_eq!(failures.len(), 2);
                match (&failures[0].origin, &failures[0].kind) {
                    (TrackOrigin::File(second), TrackErrorKind::DuplicateTrack { disc, track, first }) => {
                        assert_eq!((*disc, *track), (DiscKey::number(1), 4));
                        assert!(first.ends_with("a.flac") && second.ends_with("b.flac"));
                    }
                    other => panic!("unexpected {:?}", other),
                }
                assert_eq!(failures[1].origin, TrackOrigin::File(dir.path().join("c.flac")));
                assert!(matches!(failures[1].kind, TrackErrorKind::Probe(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_disc_overrides_regroup_files() {
        let dir = album_dir(&["a.flac", "b.flac"]);
        let probe = canned(&[("a.flac", dump(Some(1), "1", "x")), ("b.flac", dump(None, "2", "y"))]);
        let overrides = Overrides::new().with_disc(3).with_disc_total(4).with_comment("box set");
        let set = resolve_directory(dir.path(), &probe, &overrides, &no_progress).unwrap();

        assert_eq!(set.disc_count(), 1);
        assert_eq!(set.disc(DiscKey::number(3)).unwrap().len(), 2);
        assert!(set.tracks().all(|(_, _, t)| t.disc_total == Some(4) && t.comment == "box set"));
    }

    #[test]
    fn test_failures_are_isolated_and_collected() {
        let dir = album_dir(&["a.flac", "broken.flac", "c.flac"]);
        let probe = canned(&[("a.flac", dump(Some(1), "1", "x")), ("c.flac", dump(Some(1), "2", ""))]);
        let err = resolve_directory(dir.path(), &probe, &Overrides::default(), &no_progress).unwrap_err();
        match err {
            ResolveError::Tracks(failures) => {
                assert_eq!(failures.len(), 2);
                assert!(matches!(failures[0].kind, TrackErrorKind::Probe(_)));
                assert!(matches!(failures[1].kind, TrackErrorKind::MissingField("title")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_directory() {
        let dir = album_dir(&["cover.jpg"]);
        let err = resolve_directory(dir.path(), &canned(&[]), &Overrides::default(), &no_progress).unwrap_err();
        assert!(matches!(err, ResolveError::NoLosslessFiles(_)));
    }
}
