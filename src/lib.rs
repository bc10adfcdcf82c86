//! albumtag - Resolve tags for converting a lossless album to lossy files
//!
//! Before an album of lossless audio can be encoded and tagged, every track
//! needs a complete, consistent tag set and the tool needs to know how the
//! audio is laid out on disk. albumtag works this out from a directory.
//!
//! # Overview
//!
//! Information comes from three sources that can each be missing or wrong:
//!
//! 1. **Track-list text** (a cue sheet): release year and the lossless files
//!    it references.
//! 2. **Probes**: external tools that print album, track or file metadata as
//!    `label: value` lines.
//! 3. **Overrides**: values the user supplies, which always win.
//!
//! # Modes
//!
//! - **Track-list mode**: one `.cue` file in the directory (or given
//!   explicitly). Its text encoding is detected once (UTF-8, else
//!   Windows-1252) and reused for every read. A single referenced file means
//!   the album must be split first; several mean one file per track.
//! - **Directory mode**: no track-list. Every `.flac`, `.ape` and `.wv` file is
//!   probed for embedded tags and grouped by disc and track number.
//!
//! # Quick Start
//!
//! ```no_run
//! use albumtag::{AlbumResolver, Overrides, Probes};
//! use std::path::Path;
//!
//! let resolver = AlbumResolver::new(Probes::default())
//!     .with_overrides(Overrides::new().with_genre("Jazz"));
//!
//! match resolver.resolve(Path::new("/music/blue-train")) {
//!     Ok(album) => {
//!         for (disc, track, tags) in album.tracks() {
//!             println!("{}-{:02} {}", disc, track, tags.output_filename);
//!         }
//!     }
//!     Err(e) => eprintln!("cannot resolve album: {}", e),
//! }
//! ```
//!
//! # Modules
//!
//! - [`tracklist`]: cue sheet parsing and per-track resolution
//! - [`directory`]: loose-file resolution
//! - [`probe`]: probe capabilities and their subprocess implementations
//! - [`tags`]: the resolved [`AlbumTagSet`]
//! - [`report`]: output formatters (JSON, CSV)

pub mod directory;
pub mod encoding;
pub mod error;
pub mod probe;
pub mod report;
pub mod resolve;
pub mod resolver;
pub mod scan;
pub mod tags;
pub mod tracklist;

pub use encoding::{TextEncoding, TrackListText};
pub use error::{ResolveError, TrackError, TrackErrorKind, TrackOrigin};
pub use probe::{AlbumSummaryProbe, FileMetadataProbe, PerTrackProbe, ProbeError, Probes};
pub use resolve::{resolve_field, Overrides};
pub use resolver::AlbumResolver;
pub use tags::{AlbumTagSet, DiscKey, Layout, TrackTags};
pub use tracklist::Input;
