//! CSV report output

use super::rows;
use crate::tags::AlbumTagSet;
use std::io::{self, Write};

const HEADER: &str = "disc,track,artist,album,title,genre,year,disc_total,source,intermediate,output";

pub fn write<W: Write>(writer: &mut W, album: &AlbumTagSet) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;

    for row in rows(album) {
        let t = row.tags;
        let fields = [
            row.disc.0.map(|d| d.to_string()).unwrap_or_default(),
            row.track.to_string(),
            t.artist.clone(),
            t.album.clone(),
            t.title.clone(),
            t.genre.clone(),
            t.year.clone().unwrap_or_default(),
            t.disc_total.map(|d| d.to_string()).unwrap_or_default(),
            t.source_locator
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            t.intermediate_filename.display().to_string(),
            t.output_filename.clone(),
        ];
        let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        writeln!(writer, "{}", line.join(","))?;
    }

    Ok(())
}

/// Quote a field if it contains a delimiter, quote or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::split_album;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a, b"), "\"a, b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_one_row_per_track() {
        let album = split_album(&["chilly winds don't blow", "trouble in mind, blues"]);
        let mut out = Vec::new();
        write(&mut out, &album).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "1,1,Nina Simone,Pastel Blues,Chilly Winds Don't Blow,Soul,1965,1,,split-track01.wav,01 chilly-winds-dont-blow.m4a"
        );
        assert!(lines[2].contains("\"Trouble In Mind, Blues\""));
    }
}
