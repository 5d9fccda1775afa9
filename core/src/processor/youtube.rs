use crate::config::{AudioFormat, DownloadParams, DownloadQuality};
use crate::error::ProcessingError;
use crate::io::{ensure_dir, file_size};
use crate::processor::Downloader;
use crate::result::ProcessingResult;
use crate::tools::{AudioConverter, Ffmpeg, MediaFetcher, StreamSelection, YtDlp};

const SOURCE: &str = "YouTube";

/// Downloads a progressive MP4 from YouTube.
pub struct YouTubeVideoDownloader {
    fetcher: Box<dyn MediaFetcher>,
}

impl YouTubeVideoDownloader {
    pub fn new() -> Self {
        Self::with_fetcher(Box::new(YtDlp::default()))
    }

    pub fn with_fetcher(fetcher: Box<dyn MediaFetcher>) -> Self {
        Self { fetcher }
    }

    fn fetch(&self, params: &DownloadParams) -> Result<ProcessingResult, ProcessingError> {
        let DownloadQuality::Video(resolution) = params.quality else {
            return Err(ProcessingError::UnsupportedFormat(format!(
                "video download needs a resolution, got {}",
                params.quality
            )));
        };

        ensure_dir(&params.output_path)?;
        let selection = StreamSelection::ProgressiveMp4 {
            height: resolution.height(),
        };
        let media = self.fetcher.fetch(&params.url, &params.output_path, selection)?;
        let size = file_size(&media.path)?;

        Ok(ProcessingResult::completed(
            params.url.as_str(),
            media.path,
            format!("Video downloaded successfully: {}", media.title),
        )
        .with_sizes(None, Some(size)))
    }
}

impl Default for YouTubeVideoDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for YouTubeVideoDownloader {
    fn name(&self) -> &'static str {
        "YouTube Video Downloader"
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn download(&self, params: &DownloadParams) -> ProcessingResult {
        self.fetch(params).unwrap_or_else(|e| {
            log::error!("Video download failed: {}", e);
            ProcessingResult::failed(params.url.as_str(), format!("Error downloading video: {e}"))
        })
    }
}

/// Downloads the best audio-only stream, optionally converting it to WAV.
pub struct YouTubeAudioDownloader {
    fetcher: Box<dyn MediaFetcher>,
    converter: Box<dyn AudioConverter>,
}

impl YouTubeAudioDownloader {
    pub fn new() -> Self {
        Self::with_tools(Box::new(YtDlp::default()), Box::new(Ffmpeg::default()))
    }

    pub fn with_tools(fetcher: Box<dyn MediaFetcher>, converter: Box<dyn AudioConverter>) -> Self {
        Self { fetcher, converter }
    }

    fn fetch(&self, params: &DownloadParams) -> Result<ProcessingResult, ProcessingError> {
        let DownloadQuality::Audio(format) = params.quality else {
            return Err(ProcessingError::UnsupportedFormat(format!(
                "audio download needs an audio format, got {}",
                params.quality
            )));
        };

        ensure_dir(&params.output_path)?;
        let media = self
            .fetcher
            .fetch(&params.url, &params.output_path, StreamSelection::BestAudio)?;

        let (path, message) = match format {
            AudioFormat::Native => (
                media.path,
                format!("Audio downloaded successfully: {}", media.title),
            ),
            AudioFormat::Wav => (
                self.converter.to_wav(&media.path)?,
                format!("Audio downloaded and converted: {}", media.title),
            ),
        };
        let size = file_size(&path)?;

        Ok(ProcessingResult::completed(params.url.as_str(), path, message)
            .with_sizes(None, Some(size)))
    }
}

impl Default for YouTubeAudioDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for YouTubeAudioDownloader {
    fn name(&self) -> &'static str {
        "YouTube Audio Downloader"
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn download(&self, params: &DownloadParams) -> ProcessingResult {
        self.fetch(params).unwrap_or_else(|e| {
            log::error!("Audio download failed: {}", e);
            ProcessingResult::failed(params.url.as_str(), format!("Error downloading audio: {e}"))
        })
    }
}
