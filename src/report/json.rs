//! JSON report output

use super::{layout_label, rows, Summary, TrackRow};
use crate::tags::AlbumTagSet;
use chrono::Local;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Serialize)]
struct AlbumReport<'a> {
    generated: String,
    layout: &'static str,
    shared_source: Option<&'a Path>,
    cover: Option<&'a Path>,
    summary: Summary,
    tracks: Vec<TrackRow<'a>>,
}

pub fn write<W: Write>(writer: &mut W, album: &AlbumTagSet) -> io::Result<()> {
    let report = AlbumReport {
        generated: Local::now().to_rfc3339(),
        layout: layout_label(album.layout()),
        shared_source: album.shared_source(),
        cover: album.cover(),
        summary: Summary::from_album(album),
        tracks: rows(album),
    };

    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)
}
