use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::config::{ImageCompressionParams, ProcessParams, Quality};
use crate::error::ProcessingError;
use crate::format::{ImageFormat, MediaType};
use crate::io::{
    canonicalize, collect_files, copy_file, ensure_dir, file_size, path_size, read_file, write_file,
};
use crate::processor::Processor;
use crate::result::{BatchSummary, ProcessingResult};

/// imagequant speed, 1 (slowest/best) to 10 (fastest/worst)
const QUANTIZE_SPEED: i32 = 3;

/// Re-encodes every JPEG, PNG and WebP image found in the inputs into an
/// output folder.
pub struct ImageCompressor;

enum Action {
    Compress(ImageFormat),
    Copy,
    /// Destination already claimed by the given source
    Collides(PathBuf),
}

struct Job {
    source: PathBuf,
    dest: PathBuf,
    action: Action,
}

enum FileOutcome {
    Compressed,
    Skipped,
    Copied,
}

impl Processor for ImageCompressor {
    fn name(&self) -> &'static str {
        "Image Compressor"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Image
    }

    fn process(&self, params: &ProcessParams) -> ProcessingResult {
        let ProcessParams::CompressImages(params) = params else {
            return ProcessingResult::failed("", "Image Compressor expects image compression parameters");
        };

        let input = params
            .inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        match compress_all(params, &input) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Image compression failed: {}", e);
                ProcessingResult::failed(input, format!("Error during compression: {e}"))
            }
        }
    }
}

fn compress_all(
    params: &ImageCompressionParams,
    input: &str,
) -> Result<ProcessingResult, ProcessingError> {
    if let Some(missing) = params.inputs.iter().find(|p| !p.exists()) {
        return Err(ProcessingError::NotFound(missing.clone()));
    }

    ensure_dir(&params.output_folder)?;
    let output_root = canonicalize(&params.output_folder)?;

    let jobs = plan_jobs(params, &output_root)?;
    let original_size = jobs
        .iter()
        .try_fold(0u64, |acc, job| Ok::<_, ProcessingError>(acc + file_size(&job.source)?))?;
    let batch = run_jobs(&jobs, params.quality);

    let images = batch.processed + batch.skipped + batch.failed;
    if batch.failed > 0 && batch.failed == images {
        return Ok(ProcessingResult::failed(
            input,
            format!("all {} image(s) failed to compress", batch.failed),
        )
        .with_batch(batch));
    }

    let final_size = path_size(&params.output_folder)?;

    Ok(ProcessingResult::completed(
        input,
        &params.output_folder,
        "Image compression completed successfully.",
    )
    .with_sizes(Some(original_size), Some(final_size))
    .with_batch(batch))
}

/// Work out destination and action for every input file, each source once.
/// Files under `output_root` are left alone so nested output folders are
/// not fed back in. A destination is written by at most one job; later
/// sources mapping onto it are planned as collisions.
fn plan_jobs(
    params: &ImageCompressionParams,
    output_root: &Path,
) -> Result<Vec<Job>, ProcessingError> {
    let mut seen = HashSet::new();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut jobs = Vec::new();

    let mut push = |source: PathBuf, dest: PathBuf, action: Action| {
        let action = match claimed.get(&dest) {
            Some(owner) => Action::Collides(owner.clone()),
            None => {
                claimed.insert(dest.clone(), source.clone());
                action
            }
        };
        jobs.push(Job {
            source,
            dest,
            action,
        });
    };

    for input in &params.inputs {
        if input.is_file() {
            let Some(format) = ImageFormat::from_path(input) else {
                log::warn!("{} is not a supported image, ignoring", input.display());
                continue;
            };
            let Some(file_name) = input.file_name() else {
                continue;
            };
            if seen.insert(input.clone()) {
                push(
                    input.clone(),
                    params.output_folder.join(file_name),
                    Action::Compress(format),
                );
            }
            continue;
        }

        let excluded = nested_output(input, output_root)?;

        for file in collect_files(input)? {
            if excluded.as_ref().is_some_and(|dir| file.starts_with(dir)) {
                continue;
            }
            if !seen.insert(file.clone()) {
                continue;
            }
            let relative = file.strip_prefix(input).unwrap_or(&file).to_path_buf();
            let action = match ImageFormat::from_path(&file) {
                Some(format) => Action::Compress(format),
                None => {
                    log::debug!("{} is not an image file, copying", file.display());
                    Action::Copy
                }
            };
            push(file, params.output_folder.join(relative), action);
        }
    }

    Ok(jobs)
}

/// The output folder as seen from inside `input_dir`, if it lives there.
fn nested_output(input_dir: &Path, output_root: &Path) -> Result<Option<PathBuf>, ProcessingError> {
    let input_root = canonicalize(input_dir)?;
    Ok(match output_root.strip_prefix(&input_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => {
            log::debug!("Skipping output folder {} inside input", output_root.display());
            Some(input_dir.join(rel))
        }
        _ => None,
    })
}

fn run_jobs(jobs: &[Job], quality: Quality) -> BatchSummary {
    let pb = ProgressBar::new(jobs.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }

    let outcomes: Vec<(&Job, Result<FileOutcome, ProcessingError>)> = jobs
        .par_iter()
        .map(|job| {
            let outcome = run_job(job, quality);
            pb.set_message(
                job.source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            pb.inc(1);
            (job, outcome)
        })
        .collect();

    pb.finish_with_message("Done!");

    let mut batch = BatchSummary::default();
    for (job, outcome) in outcomes {
        match outcome {
            Ok(FileOutcome::Compressed) => batch.processed += 1,
            Ok(FileOutcome::Skipped) => batch.skipped += 1,
            Ok(FileOutcome::Copied) => batch.copied += 1,
            Err(e) => {
                log::error!("Error processing {}: {}", job.source.display(), e);
                batch.failed += 1;
                batch.errors.push((job.source.clone(), e.to_string()));
            }
        }
    }
    batch
}

fn run_job(job: &Job, quality: Quality) -> Result<FileOutcome, ProcessingError> {
    let format = match job.action {
        Action::Copy => {
            copy_file(&job.source, &job.dest)?;
            return Ok(FileOutcome::Copied);
        }
        Action::Compress(format) => format,
        Action::Collides(ref owner) => {
            return Err(ProcessingError::OutputCollision {
                dest: job.dest.clone(),
                owner: owner.clone(),
            });
        }
    };

    let data = read_file(&job.source)?;
    let compressed = compress_image(&data, format, quality)?;

    // Keep the original when re-encoding does not help
    if compressed.len() >= data.len() {
        log::debug!(
            "Keeping {} - compressed ({}) >= original ({})",
            job.source.display(),
            compressed.len(),
            data.len()
        );
        write_file(&job.dest, &data)?;
        return Ok(FileOutcome::Skipped);
    }

    write_file(&job.dest, &compressed)?;
    Ok(FileOutcome::Compressed)
}

/// Re-encode one image at `quality`.
pub fn compress_image(
    input: &[u8],
    format: ImageFormat,
    quality: Quality,
) -> Result<Vec<u8>, ProcessingError> {
    let img = image::load_from_memory(input)
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;

    log::debug!(
        "Compressing {} image: {}x{} pixels at quality {}",
        format.as_str(),
        img.width(),
        img.height(),
        quality
    );

    match format {
        ImageFormat::Jpeg => encode_jpeg(&img, quality),
        ImageFormat::Png if quality == Quality::MAX => optimize_png(&encode_png(&img)?),
        ImageFormat::Png => optimize_png(&quantize_png(&img, quality)?),
        ImageFormat::Webp => Ok(encode_webp(&img, quality)),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, ProcessingError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.get());

    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| ProcessingError::Encode(format!("Failed to encode JPEG: {e}")))?;

    Ok(output)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ProcessingError> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| ProcessingError::Encode(format!("Failed to encode PNG: {e}")))?;
    Ok(output)
}

/// RGBA pixels → imagequant palette → indexed PNG via lodepng
fn quantize_png(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, ProcessingError> {
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();
    let pixels: Vec<imagequant::RGBA> = rgba
        .as_raw()
        .chunks_exact(4)
        .map(|p| imagequant::RGBA::new(p[0], p[1], p[2], p[3]))
        .collect();

    let mut attr = imagequant::new();
    attr.set_quality(0, quality.get())
        .map_err(|e| ProcessingError::Quantize(e.to_string()))?;
    attr.set_speed(QUANTIZE_SPEED)
        .map_err(|e| ProcessingError::Quantize(e.to_string()))?;

    let mut image = attr
        .new_image_borrowed(&pixels, width as usize, height as usize, 0.0)
        .map_err(|e| ProcessingError::Quantize(e.to_string()))?;

    let mut quantization = attr
        .quantize(&mut image)
        .map_err(|e| ProcessingError::Quantize(e.to_string()))?;

    let (palette, indices) = quantization
        .remapped(&mut image)
        .map_err(|e| ProcessingError::Quantize(e.to_string()))?;

    let lodepng_palette: Vec<lodepng::RGBA> = palette
        .iter()
        .map(|c| lodepng::RGBA {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        })
        .collect();

    let mut encoder = lodepng::Encoder::new();
    encoder.set_auto_convert(false);
    encoder
        .set_palette(&lodepng_palette)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;

    {
        let raw = encoder.info_raw_mut();
        raw.set_colortype(lodepng::ColorType::PALETTE);
        raw.set_bitdepth(8);
        raw.palette_clear();
        for &color in &lodepng_palette {
            raw.palette_add(color)
                .map_err(|e| ProcessingError::Encode(e.to_string()))?;
        }
    }

    encoder
        .encode(&indices, width as usize, height as usize)
        .map_err(|e| ProcessingError::Encode(e.to_string()))
}

/// Lossless DEFLATE re-compression, keeping only rendering-relevant chunks
fn optimize_png(png_data: &[u8]) -> Result<Vec<u8>, ProcessingError> {
    let mut opts = oxipng::Options::from_preset(4);
    opts.strip = oxipng::StripChunks::Safe;

    oxipng::optimize_from_memory(png_data, &opts)
        .map_err(|e| ProcessingError::Optimize(e.to_string()))
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Vec<u8> {
    let rgba = img.to_rgba8();
    let (width, height) = img.dimensions();
    webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        .encode(quality.get() as f32)
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient_jpeg(path: &Path) {
        sized_jpeg(path, 64);
    }

    fn sized_jpeg(path: &Path, side: u32) {
        let img = RgbImage::from_fn(side, side, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        img.save(path).unwrap();
    }

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    fn gradient_png(path: &Path) {
        let img = RgbaImage::from_fn(48, 48, |x, y| Rgba([(x * 5) as u8, (y * 5) as u8, 200, 255]));
        img.save(path).unwrap();
    }

    fn params(inputs: Vec<PathBuf>, output: &Path, quality: u8) -> ProcessParams {
        ProcessParams::CompressImages(
            ImageCompressionParams::new(inputs, output, Quality::new(quality).unwrap()).unwrap(),
        )
    }

    #[test]
    fn test_compress_images_in_folder_success() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        gradient_jpeg(&input_dir.path().join("test.jpg"));

        let result = ImageCompressor.process(&params(
            vec![input_dir.path().to_path_buf()],
            output_dir.path(),
            50,
        ));

        assert!(result.success(), "{:?}", result.error_message());
        assert_eq!(result.output_path(), Some(output_dir.path()));
        assert!(output_dir.path().join("test.jpg").exists());
        assert!(result.original_size().is_some());
        assert!(result.final_size().is_some());

        let batch = result.batch().unwrap();
        assert_eq!(batch.processed + batch.skipped, 1);
        assert_eq!(batch.failed, 0);
    }

    #[test]
    fn test_compress_images_missing_input_folder() {
        let output_dir = tempfile::tempdir().unwrap();
        let result = ImageCompressor.process(&params(
            vec![PathBuf::from("/path/does/not/exist")],
            output_dir.path(),
            80,
        ));
        assert!(!result.success());
        assert!(result.output_path().is_none());
        assert!(result.error_message().unwrap().contains("not found"));
    }

    #[test]
    fn test_non_images_copied_and_structure_mirrored() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_file(&input_dir.path().join("notes.txt"), b"keep me").unwrap();
        std::fs::create_dir_all(input_dir.path().join("sub")).unwrap();
        gradient_png(&input_dir.path().join("sub/a.png"));

        let result = ImageCompressor.process(&params(
            vec![input_dir.path().to_path_buf()],
            output_dir.path(),
            60,
        ));

        assert!(result.success(), "{:?}", result.error_message());
        assert_eq!(read_file(&output_dir.path().join("notes.txt")).unwrap(), b"keep me");

        let png = output_dir.path().join("sub/a.png");
        let decoded = image::open(&png).unwrap();
        assert_eq!(decoded.dimensions(), (48, 48));

        let batch = result.batch().unwrap();
        assert_eq!(batch.copied, 1);
        assert_eq!(batch.total(), 2);
    }

    #[test]
    fn test_each_file_processed_once() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let file = input_dir.path().join("test.jpg");
        gradient_jpeg(&file);

        let result = ImageCompressor.process(&params(
            vec![input_dir.path().to_path_buf(), file],
            output_dir.path(),
            70,
        ));

        assert!(result.success());
        assert_eq!(result.batch().unwrap().total(), 1);
    }

    #[test]
    fn test_direct_file_input_lands_in_output_root() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let file = input_dir.path().join("photo.jpeg");
        gradient_jpeg(&file);

        let result = ImageCompressor.process(&params(vec![file], output_dir.path(), 40));
        assert!(result.success());
        assert!(output_dir.path().join("photo.jpeg").exists());
    }

    #[test]
    fn test_corrupt_images_fail_batch() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_file(&input_dir.path().join("bad.jpg"), b"definitely not a jpeg").unwrap();

        let result = ImageCompressor.process(&params(
            vec![input_dir.path().to_path_buf()],
            output_dir.path(),
            80,
        ));

        assert!(!result.success());
        assert!(result.output_path().is_none());
        let batch = result.batch().unwrap();
        assert_eq!(batch.failed, 1);
        assert!(batch.errors[0].0.ends_with("bad.jpg"));
    }

    #[test]
    fn test_repeat_calls_agree_on_success() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        gradient_jpeg(&input_dir.path().join("test.jpg"));
        let p = params(vec![input_dir.path().to_path_buf()], output_dir.path(), 50);

        let first = ImageCompressor.process(&p);
        let second = ImageCompressor.process(&p);
        assert_eq!(first.success(), second.success());
    }

    #[test]
    fn test_rejects_video_params() {
        let p = ProcessParams::CompressVideo(crate::config::VideoCompressionParams::new("a.mp4", "out"));
        let result = ImageCompressor.process(&p);
        assert!(!result.success());
    }

    #[test]
    fn test_compress_image_webp_roundtrip_dimensions() {
        let img = RgbaImage::from_fn(16, 8, |x, _| Rgba([(x * 10) as u8, 0, 0, 255]));
        let png = png_bytes(DynamicImage::ImageRgba8(img));

        let webp = compress_image(&png, ImageFormat::Webp, Quality::new(75).unwrap()).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn test_same_name_in_two_folders_written_once() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        sized_jpeg(&first.path().join("x.jpg"), 64);
        sized_jpeg(&second.path().join("x.jpg"), 300);

        let result = ImageCompressor.process(&params(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            output_dir.path(),
            60,
        ));

        assert!(result.success(), "{:?}", result.error_message());
        let batch = result.batch().unwrap();
        assert_eq!(batch.processed + batch.skipped, 1);
        assert_eq!(batch.failed, 1);
        assert!(batch.errors[0].0.starts_with(second.path()));
        assert!(batch.errors[0].1.contains("already written from"));

        let written = collect_files(output_dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        let decoded = image::open(output_dir.path().join("x.jpg")).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn test_direct_files_with_same_name_collide() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let a = first.path().join("x.jpg");
        let b = second.path().join("x.jpg");
        sized_jpeg(&a, 32);
        sized_jpeg(&b, 96);

        let result = ImageCompressor.process(&params(vec![a, b.clone()], output_dir.path(), 60));

        let batch = result.batch().unwrap();
        assert_eq!(batch.total(), 2);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.errors[0].0, b);
        assert_eq!(image::open(output_dir.path().join("x.jpg")).unwrap().dimensions(), (32, 32));
    }

    #[test]
    fn test_original_kept_when_not_smaller() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();

        // Already optimized: another lossless pass cannot shrink it
        let dot = png_bytes(DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([0]))));
        let optimized = compress_image(&dot, ImageFormat::Png, Quality::MAX).unwrap();
        write_file(&input_dir.path().join("dot.png"), &optimized).unwrap();

        let result = ImageCompressor.process(&params(
            vec![input_dir.path().to_path_buf()],
            output_dir.path(),
            100,
        ));

        assert!(result.success(), "{:?}", result.error_message());
        let batch = result.batch().unwrap();
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.processed, 0);
        assert_eq!(read_file(&output_dir.path().join("dot.png")).unwrap(), optimized);
        assert_eq!(result.size_reduction(), Some(0));
    }

    #[test]
    fn test_max_quality_png_is_lossless() {
        let img = RgbaImage::from_fn(40, 24, |x, y| Rgba([(x * 6) as u8, (y * 9) as u8, 77, 255]));
        let png = png_bytes(DynamicImage::ImageRgba8(img.clone()));

        let out = compress_image(&png, ImageFormat::Png, Quality::MAX).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_direct_non_image_file_ignored() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let notes = input_dir.path().join("notes.txt");
        let photo = input_dir.path().join("photo.jpg");
        write_file(&notes, b"not an image").unwrap();
        gradient_jpeg(&photo);

        let result = ImageCompressor.process(&params(vec![notes, photo], output_dir.path(), 70));

        assert!(result.success(), "{:?}", result.error_message());
        let batch = result.batch().unwrap();
        assert_eq!(batch.total(), 1);
        assert_eq!(batch.copied, 0);
        assert!(!output_dir.path().join("notes.txt").exists());
        assert!(output_dir.path().join("photo.jpg").exists());
    }

    #[test]
    fn test_output_folder_inside_input_not_reprocessed() {
        let input_dir = tempfile::tempdir().unwrap();
        let output = input_dir.path().join("out");
        gradient_jpeg(&input_dir.path().join("x.jpg"));
        let p = params(vec![input_dir.path().to_path_buf()], &output, 50);

        for _ in 0..3 {
            let result = ImageCompressor.process(&p);
            assert!(result.success(), "{:?}", result.error_message());
            assert_eq!(result.batch().unwrap().total(), 1);
        }

        assert!(output.join("x.jpg").exists());
        assert!(!output.join("out").exists());
    }
}
