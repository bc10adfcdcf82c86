//! The resolved album: discs → tracks → tags
//!
//! An [`AlbumTagSet`] is built once by the resolver and handed to the
//! decode/encode/tag stages read-only. It carries its own [`Layout`], so no
//! later stage needs to know how the input was parsed.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Extension of the encoded output files.
pub const LOSSY_EXTENSION: &str = "m4a";

/// Extension of decoded intermediate files.
pub const INTERMEDIATE_EXTENSION: &str = "wav";

/// Written into every track's comment tag.
pub const COMMENT_MARKER: &str = "Generated by albumtag";

/// Disc number of a track. Directory mode may not know it, which sorts
/// before every known disc and never collides with disc 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DiscKey(pub Option<u32>);

impl DiscKey {
    pub const UNSPECIFIED: DiscKey = DiscKey(None);

    pub fn number(n: u32) -> Self {
        DiscKey(Some(n))
    }
}

impl fmt::Display for DiscKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "?"),
        }
    }
}

/// How the album's lossless audio is stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "source", rename_all = "snake_case")]
pub enum Layout {
    /// One lossless file holds every track and must be split first.
    SharedSource(PathBuf),
    /// Each track has its own lossless file.
    PerTrack,
}

/// Where a single track's audio comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// A slice of the album's shared source, produced by the split step.
    Split,
    /// A lossless file of its own.
    File(PathBuf),
}

/// Field values as resolved, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub genre: String,
    pub year: Option<String>,
    pub disc_total: Option<u32>,
    /// Replaces [`COMMENT_MARKER`] when set.
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackTags {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub genre: String,
    pub year: Option<String>,
    pub comment: String,
    pub disc_total: Option<u32>,
    /// Absent in split mode: the source is the album's shared file.
    pub source_locator: Option<PathBuf>,
    pub intermediate_filename: PathBuf,
    pub output_filename: String,
}

impl TrackTags {
    pub fn new(track: u32, fields: ResolvedFields, source: TrackSource) -> Self {
        let (source_locator, intermediate_filename) = match source {
            TrackSource::Split => (None, PathBuf::from(split_intermediate_name(track))),
            TrackSource::File(path) => {
                let intermediate = path.with_extension(INTERMEDIATE_EXTENSION);
                (Some(path), intermediate)
            }
        };

        Self {
            output_filename: output_filename(track, &fields.title),
            artist: title_case(&fields.artist),
            album: title_case(&fields.album),
            title: title_case(&fields.title),
            genre: title_case(&fields.genre),
            year: fields.year,
            comment: fields.comment.unwrap_or_else(|| COMMENT_MARKER.to_string()),
            disc_total: fields.disc_total,
            source_locator,
            intermediate_filename,
        }
    }
}

/// File the split step writes for `track` of a shared source.
pub fn split_intermediate_name(track: u32) -> String {
    format!("split-track{:02}.{}", track, INTERMEDIATE_EXTENSION)
}

/// `NN slugified-title.m4a`
pub fn output_filename(track: u32, title: &str) -> String {
    format!("{:02} {}.{}", track, slugify(title), LOSSY_EXTENSION)
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// Words are runs of letters, digits and apostrophes, so "don't" stays one word.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = c.is_numeric() || (in_word && (c == '\'' || c == '\u{2019}'));
        }
    }
    out
}

/// Lowercase ASCII token joined by single hyphens.
///
/// Accents are stripped via NFKD, other punctuation is dropped, runs of
/// whitespace, hyphens and underscores collapse to one hyphen. A title with
/// nothing left becomes `track`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_ascii_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        "track".to_string()
    } else {
        slug
    }
}

/// Every resolved track, keyed by disc then track number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumTagSet {
    layout: Layout,
    cover: Option<PathBuf>,
    discs: BTreeMap<DiscKey, BTreeMap<u32, TrackTags>>,
}

impl AlbumTagSet {
    pub(crate) fn new(layout: Layout) -> Self {
        Self {
            layout,
            cover: None,
            discs: BTreeMap::new(),
        }
    }

    pub(crate) fn with_cover(mut self, cover: Option<PathBuf>) -> Self {
        self.cover = cover;
        self
    }

    /// Insert a track, handing back whatever already occupied the slot.
    pub(crate) fn insert(&mut self, disc: DiscKey, track: u32, tags: TrackTags) -> Option<TrackTags> {
        self.discs.entry(disc).or_default().insert(track, tags)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Artwork embedded by the tag stage. Only set when the file exists.
    pub fn cover(&self) -> Option<&Path> {
        self.cover.as_deref()
    }

    pub fn single_shared_source(&self) -> bool {
        matches!(self.layout, Layout::SharedSource(_))
    }

    /// Path of the shared lossless file in split mode.
    pub fn shared_source(&self) -> Option<&Path> {
        match &self.layout {
            Layout::SharedSource(path) => Some(path),
            Layout::PerTrack => None,
        }
    }

    pub fn disc(&self, disc: DiscKey) -> Option<&BTreeMap<u32, TrackTags>> {
        self.discs.get(&disc)
    }

    pub fn track(&self, disc: DiscKey, track: u32) -> Option<&TrackTags> {
        self.discs.get(&disc).and_then(|tracks| tracks.get(&track))
    }

    pub fn discs(&self) -> impl Iterator<Item = (DiscKey, &BTreeMap<u32, TrackTags>)> {
        self.discs.iter().map(|(k, v)| (*k, v))
    }

    /// All tracks in disc, then track order.
    pub fn tracks(&self) -> impl Iterator<Item = (DiscKey, u32, &TrackTags)> {
        self.discs
            .iter()
            .flat_map(|(disc, tracks)| tracks.iter().map(move |(n, tags)| (*disc, *n, tags)))
    }

    pub fn disc_count(&self) -> usize {
        self.discs.len()
    }

    pub fn track_count(&self) -> usize {
        self.discs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.discs.is_empty()
    }
}
