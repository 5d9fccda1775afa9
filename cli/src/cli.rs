use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mediabench_core::config::{
    AudioFormat, DownloadParams, DownloadQuality, ImageCompressionParams, ProcessParams, Quality,
    Request, ToolPaths, VideoCompressionParams, VideoPreset, VideoResolution,
};
use mediabench_core::error::ConfigError;
use mediabench_core::registry::{COMPRESS_IMAGES, COMPRESS_VIDEO, YOUTUBE_AUDIO, YOUTUBE_VIDEO};

/// MediaBench - unified media processing toolkit
#[derive(Debug, Parser)]
#[command(name = "mediabench", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ffmpeg binary used for video compression and WAV conversion
    #[arg(long, global = true, value_name = "PATH", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// yt-dlp binary used for YouTube downloads
    #[arg(long = "yt-dlp", global = true, value_name = "PATH", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compress JPEG, PNG and WebP images from files or folders
    CompressImages {
        /// Input image files or folders
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Output folder for compressed images
        #[arg(short, long)]
        output: PathBuf,

        /// Quality level of the compressed images (1-100)
        #[arg(short, long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },

    /// Compress a video file to H.264 at a target bitrate
    CompressVideo {
        /// Input video file (mp4, avi, mov)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Video bitrate in kbps
        #[arg(short, long, default_value_t = VideoCompressionParams::DEFAULT_BITRATE_KBPS, value_parser = clap::value_parser!(u32).range(1..))]
        bitrate: u32,

        /// Encoder preset (ultrafast ... veryslow)
        #[arg(short, long, default_value_t = VideoPreset::Medium)]
        preset: VideoPreset,

        /// Number of encoder threads
        #[arg(short, long, default_value_t = VideoCompressionParams::DEFAULT_THREADS, value_parser = clap::value_parser!(u32).range(1..))]
        threads: u32,
    },

    /// Download a video from YouTube
    YoutubeVideo {
        /// YouTube video URL
        #[arg(short, long)]
        url: String,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Video quality (144p, 240p, 360p, 480p, 720p, 1080p)
        #[arg(short, long, default_value_t = VideoResolution::P720)]
        quality: VideoResolution,
    },

    /// Download audio from YouTube
    YoutubeAudio {
        /// YouTube video URL
        #[arg(short, long)]
        url: String,

        /// Output directory
        #[arg(short, long, default_value = "audio")]
        output: PathBuf,

        /// Convert to WAV after download
        #[arg(long)]
        wav: bool,
    },
}

impl Command {
    /// Registry key this subcommand dispatches to.
    pub fn key(&self) -> &'static str {
        match self {
            Command::CompressImages { .. } => COMPRESS_IMAGES,
            Command::CompressVideo { .. } => COMPRESS_VIDEO,
            Command::YoutubeVideo { .. } => YOUTUBE_VIDEO,
            Command::YoutubeAudio { .. } => YOUTUBE_AUDIO,
        }
    }

    /// Turn parsed flags into validated operation parameters.
    pub fn to_request(&self) -> Result<Request, ConfigError> {
        let request = match self {
            Command::CompressImages {
                input,
                output,
                quality,
            } => Request::Process(ProcessParams::CompressImages(ImageCompressionParams::new(
                input.clone(),
                output,
                Quality::new(*quality)?,
            )?)),
            Command::CompressVideo {
                input,
                output,
                bitrate,
                preset,
                threads,
            } => Request::Process(ProcessParams::CompressVideo(
                VideoCompressionParams::new(input, output)
                    .with_bitrate(*bitrate)?
                    .with_preset(*preset)
                    .with_threads(*threads)?,
            )),
            Command::YoutubeVideo {
                url,
                output,
                quality,
            } => Request::Download(DownloadParams::new(
                url.as_str(),
                output,
                DownloadQuality::Video(*quality),
            )?),
            Command::YoutubeAudio { url, output, wav } => {
                let format = if *wav { AudioFormat::Wav } else { AudioFormat::Native };
                Request::Download(DownloadParams::new(
                    url.as_str(),
                    output,
                    DownloadQuality::Audio(format),
                )?)
            }
        };
        Ok(request)
    }
}

impl Cli {
    pub fn tool_paths(&self) -> ToolPaths {
        ToolPaths {
            ffmpeg: self.ffmpeg.clone(),
            yt_dlp: self.yt_dlp.clone(),
        }
    }
}
