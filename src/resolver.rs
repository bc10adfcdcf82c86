//! Top-level album resolution
//!
//! [`AlbumResolver`] picks track-list or directory mode and returns a
//! complete [`AlbumTagSet`] or an error. It never returns a partial set.

use crate::directory;
use crate::encoding::TrackListText;
use crate::error::ResolveError;
use crate::probe::Probes;
use crate::resolve::Overrides;
use crate::tags::AlbumTagSet;
use crate::tracklist::{self, tracks, Input};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type ProgressFn = dyn Fn(&Path) + Send + Sync;

pub struct AlbumResolver {
    probes: Probes,
    overrides: Overrides,
    track_list: Option<PathBuf>,
    cover: Option<PathBuf>,
    progress: Option<Box<ProgressFn>>,
}

impl AlbumResolver {
    pub fn new(probes: Probes) -> Self {
        Self {
            probes,
            overrides: Overrides::default(),
            track_list: None,
            cover: None,
            progress: None,
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Use this track-list instead of searching the directory for one.
    pub fn with_track_list(mut self, track_list: Option<PathBuf>) -> Self {
        self.track_list = track_list;
        self
    }

    /// Artwork for the tag stage. A path that is not an existing file is
    /// dropped with a warning when resolving.
    pub fn with_cover(mut self, cover: Option<PathBuf>) -> Self {
        self.cover = cover;
        self
    }

    /// Called after each lossless file is probed in directory mode.
    pub fn with_progress(mut self, progress: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Decide which mode `dir` is resolved in.
    pub fn select(&self, dir: &Path) -> Result<Input, ResolveError> {
        tracklist::select_input(dir, self.track_list.as_deref())
    }

    /// Resolve the album in `dir`.
    pub fn resolve(&self, dir: &Path) -> Result<AlbumTagSet, ResolveError> {
        match self.select(dir)? {
            Input::TrackList(path) => self.resolve_track_list(&path),
            Input::Directory(dir) => self.resolve_directory(&dir),
        }
    }

    pub fn resolve_track_list(&self, path: &Path) -> Result<AlbumTagSet, ResolveError> {
        let text = TrackListText::load(path)?;
        info!(path = %path.display(), encoding = %text.encoding(), "resolving from track-list");

        let album = tracklist::parse(&text, self.probes.album.as_ref(), &self.overrides)?
            .ok_or_else(|| ResolveError::NoTrackCount(path.to_path_buf()))?;
        let set = tracks::resolve_tracks(&text, &album, self.probes.track.as_ref(), &self.overrides)?;
        Ok(set.with_cover(self.checked_cover()))
    }

    pub fn resolve_directory(&self, dir: &Path) -> Result<AlbumTagSet, ResolveError> {
        let noop = |_: &Path| {};
        let progress: &ProgressFn = match &self.progress {
            Some(f) => &**f,
            None => &noop,
        };
        let set = directory::resolve_directory(dir, self.probes.file.as_ref(), &self.overrides, progress)?;
        Ok(set.with_cover(self.checked_cover()))
    }

    fn checked_cover(&self) -> Option<PathBuf> {
        let cover = self.cover.as_ref()?;
        if cover.is_file() {
            Some(cover.clone())
        } else {
            warn!(path = %cover.display(), "cover file does not exist or is not a file, ignoring it");
            None
        }
    }
}

impl std::fmt::Debug for AlbumResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlbumResolver")
            .field("overrides", &self.overrides)
            .field("track_list", &self.track_list)
            .field("cover", &self.cover)
            .finish_non_exhaustive()
    }
}
