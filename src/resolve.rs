//! Per-field resolution chain
//!
//! Every tag field is resolved the same way: an explicit user override wins,
//! then the value scanned from probe output, then the album-level fallback.

use crate::error::TrackErrorKind;
use serde::Serialize;

/// User-supplied values that replace whatever the probes report.
///
/// `comment`, `disc` and `disc_total` have no probe counterpart in
/// track-list mode; there they replace the generated marker and the fixed
/// single-disc numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overrides {
    pub performer: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub comment: Option<String>,
    pub disc: Option<u32>,
    pub disc_total: Option<u32>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_performer(mut self, performer: impl Into<String>) -> Self {
        self.performer = Some(performer.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_disc(mut self, disc: u32) -> Self {
        self.disc = Some(disc);
        self
    }

    pub fn with_disc_total(mut self, disc_total: u32) -> Self {
        self.disc_total = Some(disc_total);
        self
    }
}

/// Resolve one field: `override` → non-blank `scanned` → `fallback` → blank `scanned`.
///
/// A blank scanned value only survives when there is nothing to inherit.
pub fn resolve_field<'a>(
    override_value: Option<&'a str>,
    scanned: Option<&'a str>,
    fallback: Option<&'a str>,
) -> Option<&'a str> {
    override_value
        .or_else(|| scanned.filter(|s| !s.trim().is_empty()))
        .or(fallback)
        .or(scanned)
}

/// A resolved value that must be present and non-blank.
pub(crate) fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, TrackErrorKind> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(TrackErrorKind::MissingField(field))
}
