use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Re-encoding quality, 1-100 (lower = smaller file, worse quality).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if (1..=100).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::QualityOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// x264 speed/compression trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoPreset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    #[default]
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl VideoPreset {
    pub const ALL: [VideoPreset; 9] = [
        Self::Ultrafast,
        Self::Superfast,
        Self::Veryfast,
        Self::Faster,
        Self::Fast,
        Self::Medium,
        Self::Slow,
        Self::Slower,
        Self::Veryslow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Superfast => "superfast",
            Self::Veryfast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::Veryslow => "veryslow",
        }
    }
}

impl fmt::Display for VideoPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoPreset {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| ConfigError::UnknownVariant {
                kind: "preset",
                value: s.to_string(),
            })
    }
}

/// Target resolution for video downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VideoResolution {
    P144,
    P240,
    P360,
    P480,
    #[default]
    P720,
    P1080,
}

impl VideoResolution {
    pub const ALL: [VideoResolution; 6] = [
        Self::P144,
        Self::P240,
        Self::P360,
        Self::P480,
        Self::P720,
        Self::P1080,
    ];

    pub fn height(&self) -> u32 {
        match self {
            Self::P144 => 144,
            Self::P240 => 240,
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
        }
    }
}

impl fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

impl FromStr for VideoResolution {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches(['p', 'P']);
        Self::ALL
            .into_iter()
            .find(|r| r.height().to_string() == digits)
            .ok_or_else(|| ConfigError::UnknownVariant {
                kind: "video quality",
                value: s.to_string(),
            })
    }
}

/// What to keep after an audio download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    /// Keep the container the platform served.
    #[default]
    Native,
    Wav,
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Wav => write!(f, "wav"),
        }
    }
}

impl FromStr for AudioFormat {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "wav" => Ok(Self::Wav),
            _ => Err(ConfigError::UnknownVariant {
                kind: "audio format",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCompressionParams {
    /// Image files or folders to compress
    pub inputs: Vec<PathBuf>,
    /// Folder receiving the compressed copies
    pub output_folder: PathBuf,
    pub quality: Quality,
}

impl ImageCompressionParams {
    pub fn new(
        inputs: Vec<PathBuf>,
        output_folder: impl Into<PathBuf>,
        quality: Quality,
    ) -> Result<Self, ConfigError> {
        if inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }
        Ok(Self {
            inputs,
            output_folder: output_folder.into(),
            quality,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCompressionParams {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    /// Target video bitrate in kbps
    pub bitrate_kbps: u32,
    pub preset: VideoPreset,
    /// Encoder thread count
    pub threads: u32,
}

impl VideoCompressionParams {
    pub const DEFAULT_BITRATE_KBPS: u32 = 1000;
    pub const DEFAULT_THREADS: u32 = 4;

    pub fn new(input_file: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            output_dir: output_dir.into(),
            bitrate_kbps: Self::DEFAULT_BITRATE_KBPS,
            preset: VideoPreset::default(),
            threads: Self::DEFAULT_THREADS,
        }
    }

    pub fn with_bitrate(mut self, bitrate_kbps: u32) -> Result<Self, ConfigError> {
        if bitrate_kbps == 0 {
            return Err(ConfigError::InvalidBitrate);
        }
        self.bitrate_kbps = bitrate_kbps;
        Ok(self)
    }

    pub fn with_preset(mut self, preset: VideoPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        self.threads = threads;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadQuality {
    Video(VideoResolution),
    Audio(AudioFormat),
}

impl fmt::Display for DownloadQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(res) => write!(f, "video {res}"),
            Self::Audio(format) => write!(f, "audio {format}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadParams {
    pub url: String,
    /// Directory the media is saved into
    pub output_path: PathBuf,
    pub quality: DownloadQuality,
}

impl DownloadParams {
    pub fn new(
        url: impl Into<String>,
        output_path: impl Into<PathBuf>,
        quality: DownloadQuality,
    ) -> Result<Self, ConfigError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        Ok(Self {
            url,
            output_path: output_path.into(),
            quality,
        })
    }
}

/// Parameters accepted by local-file processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessParams {
    CompressImages(ImageCompressionParams),
    CompressVideo(VideoCompressionParams),
}

/// A fully parsed invocation, ready to hand to an `Operation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Process(ProcessParams),
    Download(DownloadParams),
}

impl Request {
    /// Human-readable input (paths or URL) for reporting.
    pub fn input_label(&self) -> String {
        match self {
            Request::Process(ProcessParams::CompressImages(p)) => p
                .inputs
                .iter()
                .map(|i| i.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            Request::Process(ProcessParams::CompressVideo(p)) => {
                p.input_file.display().to_string()
            }
            Request::Download(p) => p.url.clone(),
        }
    }
}

/// Locations of the external binaries the adapters delegate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub yt_dlp: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            yt_dlp: PathBuf::from("yt-dlp"),
        }
    }
}
