//! Wrappers around the external binaries the adapters delegate to.
//!
//! Each capability sits behind a small trait so adapters can be exercised
//! without ffmpeg or yt-dlp installed.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::config::VideoCompressionParams;
use crate::error::ToolError;

/// Transcodes a video file into a compressed H.264 MP4.
pub trait VideoEncoder: Send + Sync {
    fn encode(
        &self,
        input: &Path,
        output: &Path,
        params: &VideoCompressionParams,
    ) -> Result<(), ToolError>;
}

/// Converts a downloaded audio file to WAV, returning the new path.
pub trait AudioConverter: Send + Sync {
    fn to_wav(&self, input: &Path) -> Result<PathBuf, ToolError>;
}

/// Which stream a fetcher should pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSelection {
    /// Progressive (audio+video) MP4 at `height`, falling back to the best
    /// progressive MP4 and then to anything available.
    ProgressiveMp4 { height: u32 },
    BestAudio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub path: PathBuf,
    pub title: String,
}

/// Downloads one media item from a video platform.
pub trait MediaFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        selection: StreamSelection,
    ) -> Result<FetchedMedia, ToolError>;
}

fn tool_name(binary: &Path) -> String {
    binary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary.display().to_string())
}

/// Run a prepared command and fail on a non-zero exit.
fn run(binary: &Path, args: Vec<OsString>) -> Result<Output, ToolError> {
    let tool = tool_name(binary);
    let mut cmd = Command::new(binary);
    cmd.args(&args);

    log::debug!("Executing: {} {:?}", tool, args);

    let output = cmd.output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ToolError::NotInstalled(tool.clone())
        } else {
            ToolError::Spawn {
                tool: tool.clone(),
                source: e,
            }
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        log::error!("{} failed: {}", tool, stderr);
        return Err(ToolError::Failed {
            tool,
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(output)
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: PathBuf,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

fn encode_args(input: &Path, output: &Path, params: &VideoCompressionParams) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(
        [
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            params.preset.as_str().to_string(),
            "-b:v".to_string(),
            format!("{}k", params.bitrate_kbps),
            "-c:a".to_string(),
            "aac".to_string(),
            "-threads".to_string(),
            params.threads.to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]
        .map(OsString::from),
    );
    args.push(output.into());
    args
}

fn wav_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    // 160 kbit/s, stereo, 44.1 kHz, drop any video stream
    args.extend(["-ab", "160k", "-ac", "2", "-ar", "44100", "-vn"].map(OsString::from));
    args.push(output.into());
    args
}

impl VideoEncoder for Ffmpeg {
    fn encode(
        &self,
        input: &Path,
        output: &Path,
        params: &VideoCompressionParams,
    ) -> Result<(), ToolError> {
        run(&self.binary, encode_args(input, output, params))?;
        Ok(())
    }
}

impl AudioConverter for Ffmpeg {
    fn to_wav(&self, input: &Path) -> Result<PathBuf, ToolError> {
        let output = input.with_extension("wav");
        run(&self.binary, wav_args(input, &output))?;
        Ok(output)
    }
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

fn format_selector(selection: StreamSelection) -> String {
    match selection {
        StreamSelection::ProgressiveMp4 { height } => {
            format!("best[ext=mp4][height={height}]/best[ext=mp4]/best")
        }
        StreamSelection::BestAudio => "bestaudio/best".to_string(),
    }
}

fn fetch_args(url: &str, output_dir: &Path, selection: StreamSelection) -> Vec<OsString> {
    let template = output_dir.join("%(title)s.%(ext)s");
    let mut args: Vec<OsString> = [
        "--no-playlist",
        "--no-progress",
        "--no-simulate",
        "--print",
        "title",
        "--print",
        "after_move:filepath",
        "-f",
    ]
    .map(OsString::from)
    .to_vec();
    args.push(format_selector(selection).into());
    args.push("-o".into());
    args.push(template.into());
    args.push(url.into());
    args
}

/// First printed line is the title, last one the final file path.
fn parse_fetch_output(stdout: &str) -> Result<FetchedMedia, ToolError> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [title, .., path] => Ok(FetchedMedia {
            path: PathBuf::from(path),
            title: title.to_string(),
        }),
        _ => Err(ToolError::UnexpectedOutput {
            tool: "yt-dlp".to_string(),
            detail: format!("expected title and file path, got {:?}", stdout.trim()),
        }),
    }
}

impl MediaFetcher for YtDlp {
    fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        selection: StreamSelection,
    ) -> Result<FetchedMedia, ToolError> {
        let output = run(&self.binary, fetch_args(url, output_dir, selection))?;
        let fetched = parse_fetch_output(&String::from_utf8_lossy(&output.stdout))?;
        log::debug!("Fetched '{}' to {}", fetched.title, fetched.path.display());
        Ok(fetched)
    }
}
