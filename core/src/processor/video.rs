use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::config::{ProcessParams, VideoCompressionParams};
use crate::error::ProcessingError;
use crate::format::{is_mp4, is_video, MediaType, VIDEO_EXTENSIONS};
use crate::io::{ensure_dir, file_size};
use crate::processor::Processor;
use crate::result::ProcessingResult;
use crate::tools::{Ffmpeg, VideoEncoder};

/// Re-encodes a single video to H.264 at a target bitrate.
pub struct VideoCompressor {
    encoder: Box<dyn VideoEncoder>,
}

impl VideoCompressor {
    pub fn new() -> Self {
        Self::with_encoder(Box::new(Ffmpeg::default()))
    }

    pub fn with_encoder(encoder: Box<dyn VideoEncoder>) -> Self {
        Self { encoder }
    }

    fn compress(&self, params: &VideoCompressionParams) -> Result<ProcessingResult, ProcessingError> {
        let input = &params.input_file;
        if !input.exists() {
            return Err(ProcessingError::NotFound(input.clone()));
        }
        if !is_video(input) {
            return Err(ProcessingError::UnsupportedFormat(format!(
                "{} (supported: {})",
                input.display(),
                VIDEO_EXTENSIONS.join(", ")
            )));
        }

        ensure_dir(&params.output_dir)?;
        let original_size = file_size(input)?;

        if is_mp4(input) {
            log_mp4_header(input);
        }

        let output = output_path(input, &params.output_dir);
        log::debug!(
            "Compressing {} -> {} at {} kbps ({} preset, {} threads)",
            input.display(),
            output.display(),
            params.bitrate_kbps,
            params.preset,
            params.threads
        );

        self.encoder.encode(input, &output, params)?;
        let final_size = file_size(&output)?;

        Ok(ProcessingResult::completed(
            input.display().to_string(),
            output,
            "Video compression completed successfully.",
        )
        .with_sizes(Some(original_size), Some(final_size)))
    }
}

impl Default for VideoCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for VideoCompressor {
    fn name(&self) -> &'static str {
        "Video Compressor"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Video
    }

    fn process(&self, params: &ProcessParams) -> ProcessingResult {
        let ProcessParams::CompressVideo(params) = params else {
            return ProcessingResult::failed("", "Video Compressor expects video compression parameters");
        };

        self.compress(params).unwrap_or_else(|e| {
            log::error!("Video compression failed: {}", e);
            ProcessingResult::failed(
                params.input_file.display().to_string(),
                format!("Error compressing video: {e}"),
            )
        })
    }
}

/// `<output_dir>/<stem>_compressed.mp4`
fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    output_dir.join(format!("{stem}_compressed.mp4"))
}

fn log_mp4_header(path: &Path) {
    let header = File::open(path).ok().and_then(|f| {
        let size = f.metadata().ok()?.len();
        mp4::Mp4Reader::read_header(BufReader::new(f), size).ok()
    });

    match header {
        Some(mp4) => log::debug!(
            "Processing MP4: {} tracks, {:.2}s duration",
            mp4.tracks().len(),
            mp4.duration().as_secs_f64()
        ),
        None => log::debug!("Could not read MP4 header of {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use std::sync::{Arc, Mutex};

    /// Writes a fixed payload instead of running ffmpeg.
    struct FakeEncoder {
        payload: usize,
        calls: Arc<Mutex<Vec<(PathBuf, u32)>>>,
    }

    impl VideoEncoder for FakeEncoder {
        fn encode(
            &self,
            _input: &Path,
            output: &Path,
            params: &VideoCompressionParams,
        ) -> Result<(), ToolError> {
            std::fs::write(output, vec![b'1'; self.payload]).unwrap();
            self.calls
                .lock()
                .unwrap()
                .push((output.to_path_buf(), params.bitrate_kbps));
            Ok(())
        }
    }

    struct BrokenEncoder;

    impl VideoEncoder for BrokenEncoder {
        fn encode(&self, _: &Path, _: &Path, _: &VideoCompressionParams) -> Result<(), ToolError> {
            Err(ToolError::Failed {
                tool: "ffmpeg".into(),
                status: "exit status: 1".into(),
                stderr: "Invalid data found when processing input".into(),
            })
        }
    }

    fn fake() -> (VideoCompressor, Arc<Mutex<Vec<(PathBuf, u32)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let encoder = FakeEncoder {
            payload: 512,
            calls: calls.clone(),
        };
        (VideoCompressor::with_encoder(Box::new(encoder)), calls)
    }

    fn params(input: &Path, output: &Path) -> ProcessParams {
        ProcessParams::CompressVideo(
            VideoCompressionParams::new(input, output).with_bitrate(500).unwrap(),
        )
    }

    #[test]
    fn test_rejects_missing_input_file() {
        let (compressor, calls) = fake();
        let result = compressor.process(&params(Path::new("/nope.mp4"), Path::new("/tmp")));
        assert!(!result.success());
        assert!(result.error_message().unwrap().contains("not found"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("video.txt");
        std::fs::write(&path, b"x").unwrap();

        let (compressor, calls) = fake();
        let result = compressor.process(&params(&path, tmp.path()));
        assert!(!result.success());
        assert!(result.error_message().unwrap().contains("unsupported file format"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_compress_success_with_fake_encoder() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("video.mp4");
        std::fs::write(&input, vec![b'0'; 1024]).unwrap();
        let out_dir = tmp.path().join("out");

        let (compressor, calls) = fake();
        let result = compressor.process(&params(&input, &out_dir));

        assert!(result.success(), "{:?}", result.error_message());
        let output = result.output_path().unwrap();
        assert_eq!(output, out_dir.join("video_compressed.mp4"));
        assert!(output.exists());
        assert_eq!(result.original_size(), Some(1024));
        assert_eq!(result.final_size(), Some(512));
        assert_eq!(result.size_reduction(), Some(512));
        assert_eq!(*calls.lock().unwrap(), vec![(out_dir.join("video_compressed.mp4"), 500)]);
    }

    #[test]
    fn test_encoder_failure_becomes_failed_result() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("clip.mov");
        std::fs::write(&input, b"not really a movie").unwrap();

        let compressor = VideoCompressor::with_encoder(Box::new(BrokenEncoder));
        let result = compressor.process(&params(&input, tmp.path()));
        assert!(!result.success());
        assert!(result.output_path().is_none());
        assert!(result.error_message().unwrap().contains("Invalid data"));

        let again = compressor.process(&params(&input, tmp.path()));
        assert_eq!(again.success(), result.success());
    }

    #[test]
    fn test_output_path_naming() {
        assert_eq!(
            output_path(Path::new("/media/holiday.AVI"), Path::new("/out")),
            PathBuf::from("/out/holiday_compressed.mp4")
        );
    }
}
