pub mod images;
pub mod video;
pub mod youtube;

use std::fmt;

use crate::config::{DownloadParams, ProcessParams, Request};
use crate::format::MediaType;
use crate::result::ProcessingResult;

pub use self::images::ImageCompressor;
pub use self::video::VideoCompressor;
pub use self::youtube::{YouTubeAudioDownloader, YouTubeVideoDownloader};

/// Transforms files that already exist locally.
///
/// Expected failures (missing input, unsupported format, tool errors) come
/// back as a failed [`ProcessingResult`], never as a panic.
pub trait Processor: Send {
    fn name(&self) -> &'static str;
    fn media_type(&self) -> MediaType;
    fn process(&self, params: &ProcessParams) -> ProcessingResult;
}

/// Fetches media from a remote source. Same failure contract as
/// [`Processor`].
pub trait Downloader: Send {
    fn name(&self) -> &'static str;
    /// Platform the downloader talks to
    fn source(&self) -> &'static str;
    fn download(&self, params: &DownloadParams) -> ProcessingResult;
}

/// A resolved registry entry, ready for one invocation.
pub enum Operation {
    Processor(Box<dyn Processor>),
    Downloader(Box<dyn Downloader>),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Processor(p) => p.name(),
            Operation::Downloader(d) => d.name(),
        }
    }

    /// Route `request` to the matching capability.
    pub fn execute(&self, request: &Request) -> ProcessingResult {
        match (self, request) {
            (Operation::Processor(p), Request::Process(params)) => p.process(params),
            (Operation::Downloader(d), Request::Download(params)) => d.download(params),
            (op, req) => ProcessingResult::failed(
                req.input_label(),
                format!("{} cannot handle a {} request", op.name(), request_kind(req)),
            ),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Processor(p) => f.debug_tuple("Processor").field(&p.name()).finish(),
            Operation::Downloader(d) => f.debug_tuple("Downloader").field(&d.name()).finish(),
        }
    }
}

fn request_kind(request: &Request) -> &'static str {
    match request {
        Request::Process(_) => "process",
        Request::Download(_) => "download",
    }
}
