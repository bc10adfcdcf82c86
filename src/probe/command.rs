//! Subprocess-backed probes

use super::{AlbumSummaryProbe, FileMetadataProbe, PerTrackProbe, ProbeError};
use crate::encoding::{TextEncoding, TrackListText};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::debug;

pub const CUEPRINT: &str = "cueprint";
pub const FFMPEG: &str = "ffmpeg";

fn run(program: &Path, command: &mut Command) -> Result<Output, ProbeError> {
    debug!(command = ?command, "running probe");
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ProbeError::Spawn {
            program: program.to_path_buf(),
            source,
        })
}

fn require_success(program: &Path, output: &Output) -> Result<(), ProbeError> {
    if output.status.success() {
        return Ok(());
    }
    Err(ProbeError::Failed {
        program: program.to_path_buf(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// `cueprint` from cuetools, used for both the album summary and per-track
/// details. Its stdout is in the track-list's own encoding.
#[derive(Debug, Clone)]
pub struct CueprintProbe {
    program: PathBuf,
}

impl CueprintProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl AlbumSummaryProbe for CueprintProbe {
    fn album_summary(&self, track_list: &TrackListText) -> Result<String, ProbeError> {
        let output = run(&self.program, Command::new(&self.program).arg(track_list.path()))?;
        require_success(&self.program, &output)?;
        Ok(track_list.encoding().decode_lossy(&output.stdout))
    }
}

impl PerTrackProbe for CueprintProbe {
    fn track_info(&self, track_list: &TrackListText, track: u32) -> Result<String, ProbeError> {
        let output = run(
            &self.program,
            Command::new(&self.program)
                .arg("-n")
                .arg(track.to_string())
                .arg(track_list.path()),
        )?;
        require_success(&self.program, &output)?;
        Ok(track_list.encoding().decode_lossy(&output.stdout))
    }
}

/// `ffmpeg` reading a file's tags. The metadata dump lands on stderr; the
/// ffmetadata output on stdout is discarded.
#[derive(Debug, Clone)]
pub struct FfmpegProbe {
    program: PathBuf,
}

impl FfmpegProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FileMetadataProbe for FfmpegProbe {
    fn file_metadata(&self, file: &Path, encoding: TextEncoding) -> Result<String, ProbeError> {
        let output = run(
            &self.program,
            Command::new(&self.program)
                .args(["-hide_banner", "-nostdin", "-i"])
                .arg(file)
                .args(["-f", "ffmetadata", "-"]),
        )?;
        require_success(&self.program, &output)?;
        Ok(encoding.decode_lossy(&output.stderr))
    }
}
