use std::path::PathBuf;
use thiserror::Error;

/// Failures raised inside an adapter. They never leave `process`/`download`;
/// the adapter turns them into a failed `ProcessingResult`.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("input path not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("quantization failed: {0}")]
    Quantize(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("optimization failed: {0}")]
    Optimize(String),

    #[error("output {dest} is already written from {owner}")]
    OutputCollision { dest: PathBuf, owner: PathBuf },

    #[error("directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Failures of an external binary (ffmpeg, yt-dlp).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} not found - install it or pass its path explicitly")]
    NotInstalled(String),

    #[error("failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from {tool}: {detail}")]
    UnexpectedOutput { tool: String, detail: String },
}

/// Rejected parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("quality must be between 1 and 100, got {0}")]
    QualityOutOfRange(u8),

    #[error("bitrate must be greater than 0 kbps")]
    InvalidBitrate,

    #[error("thread count must be greater than 0")]
    InvalidThreads,

    #[error("at least one input path is required")]
    NoInputs,

    #[error("url must not be empty")]
    EmptyUrl,

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
