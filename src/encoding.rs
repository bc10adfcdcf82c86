//! Track-list text encoding detection
//!
//! Track-lists in the wild are either UTF-8 or legacy Windows-1252. The file is
//! decoded in full as UTF-8 first; any failure anywhere forces a second full
//! pass as Windows-1252. The choice is made once and carried by
//! [`TrackListText`] so the album-level parse and every per-track probe decode
//! with the same encoding.

use crate::error::ResolveError;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bytes left undefined by the Windows-1252 code page.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
}

impl TextEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Windows1252 => WINDOWS_1252,
        }
    }

    /// Strict decode: `None` if any byte sequence is invalid for this encoding.
    pub fn decode_strict(self, bytes: &[u8]) -> Option<String> {
        if self == TextEncoding::Windows1252 && bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
            return None;
        }
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(Cow::into_owned)
    }

    /// Lenient decode used for probe output: invalid sequences become U+FFFD.
    pub fn decode_lossy(self, bytes: &[u8]) -> String {
        let (text, had_errors) = self.encoding().decode_without_bom_handling(bytes);
        if had_errors {
            debug!(encoding = ?self, "replaced undecodable bytes in probe output");
        }
        text.into_owned()
    }

    /// Pick the encoding for a whole file's bytes.
    ///
    /// Returns the decoded text alongside the choice so the caller never has to
    /// decode twice.
    pub fn detect(bytes: &[u8]) -> Option<(TextEncoding, String)> {
        if let Some(text) = TextEncoding::Utf8.decode_strict(bytes) {
            return Some((TextEncoding::Utf8, text));
        }
        TextEncoding::Windows1252
            .decode_strict(bytes)
            .map(|text| (TextEncoding::Windows1252, text))
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "UTF-8"),
            TextEncoding::Windows1252 => write!(f, "Windows-1252"),
        }
    }
}

/// A track-list file read once, with its detected encoding cached.
#[derive(Debug, Clone)]
pub struct TrackListText {
    path: PathBuf,
    encoding: TextEncoding,
    text: String,
}

impl TrackListText {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| ResolveError::io(path, e))?;
        Self::from_bytes(path, &bytes)
    }

    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, ResolveError> {
        let path = path.into();
        let (encoding, text) =
            TextEncoding::detect(bytes).ok_or_else(|| ResolveError::UndecodableTrackList(path.clone()))?;

        if encoding == TextEncoding::Windows1252 {
            warn!(path = %path.display(), "track-list is not UTF-8, decoding as Windows-1252");
        } else {
            debug!(path = %path.display(), "track-list decoded as UTF-8");
        }

        Ok(Self { path, encoding, text })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Directory relative FILE declarations are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}
