use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use crate::config::ToolPaths;
use crate::processor::{
    Downloader, ImageCompressor, Operation, Processor, VideoCompressor, YouTubeAudioDownloader,
    YouTubeVideoDownloader,
};
use crate::tools::{Ffmpeg, YtDlp};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown command '{key}'. Available: {}", .available.join(", "))]
    UnknownKey { key: String, available: Vec<String> },

    #[error("command '{0}' is already registered")]
    DuplicateKey(String),
}

type Factory = Box<dyn Fn() -> Operation + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Processor,
    Downloader,
}

/// What a registered command does, for help output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    pub key: String,
    pub name: String,
    pub kind: OperationKind,
    /// Media type for processors, source platform for downloaders
    pub detail: String,
}

impl fmt::Display for OperationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperationKind::Processor => write!(f, "{}: {} ({})", self.key, self.name, self.detail),
            OperationKind::Downloader => {
                write!(f, "{}: {} (source: {})", self.key, self.name, self.detail)
            }
        }
    }
}

/// Maps command keys to factories producing a fresh [`Operation`] per
/// lookup. Registering a key twice is rejected.
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_processor<P, F>(
        &mut self,
        key: impl Into<String>,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        P: Processor + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.insert(
            key.into(),
            Box::new(move || Operation::Processor(Box::new(factory()))),
        )
    }

    pub fn register_downloader<D, F>(
        &mut self,
        key: impl Into<String>,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        D: Downloader + 'static,
        F: Fn() -> D + Send + Sync + 'static,
    {
        self.insert(
            key.into(),
            Box::new(move || Operation::Downloader(Box::new(factory()))),
        )
    }

    fn insert(&mut self, key: String, factory: Factory) -> Result<(), RegistryError> {
        if self.factories.contains_key(&key) {
            return Err(RegistryError::DuplicateKey(key));
        }
        log::debug!("Registered command '{}'", key);
        self.factories.insert(key, factory);
        Ok(())
    }

    /// Build a new instance for `key`.
    pub fn resolve(&self, key: &str) -> Result<Operation, RegistryError> {
        self.factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownKey {
                key: key.to_string(),
                available: self.factories.keys().cloned().collect(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn list_keys(&self) -> BTreeSet<String> {
        self.factories.keys().cloned().collect()
    }

    /// Describe every registered command, sorted by key.
    pub fn describe(&self) -> Vec<OperationInfo> {
        self.factories
            .iter()
            .map(|(key, factory)| {
                let (name, kind, detail) = match factory() {
                    Operation::Processor(p) => {
                        (p.name(), OperationKind::Processor, p.media_type().to_string())
                    }
                    Operation::Downloader(d) => {
                        (d.name(), OperationKind::Downloader, d.source().to_string())
                    }
                };
                OperationInfo {
                    key: key.clone(),
                    name: name.to_string(),
                    kind,
                    detail,
                }
            })
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub const COMPRESS_IMAGES: &str = "compress-images";
pub const COMPRESS_VIDEO: &str = "compress-video";
pub const YOUTUBE_VIDEO: &str = "youtube-video";
pub const YOUTUBE_AUDIO: &str = "youtube-audio";

/// Registry with every built-in operation, using the given tool binaries.
pub fn create_default_registry(tools: &ToolPaths) -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();

    registry.register_processor(COMPRESS_IMAGES, || ImageCompressor)?;

    let ffmpeg = tools.ffmpeg.clone();
    registry.register_processor(COMPRESS_VIDEO, move || {
        VideoCompressor::with_encoder(Box::new(Ffmpeg::new(ffmpeg.clone())))
    })?;

    let yt_dlp = tools.yt_dlp.clone();
    registry.register_downloader(YOUTUBE_VIDEO, move || {
        YouTubeVideoDownloader::with_fetcher(Box::new(YtDlp::new(yt_dlp.clone())))
    })?;

    let (yt_dlp, ffmpeg) = (tools.yt_dlp.clone(), tools.ffmpeg.clone());
    registry.register_downloader(YOUTUBE_AUDIO, move || {
        YouTubeAudioDownloader::with_tools(
            Box::new(YtDlp::new(yt_dlp.clone())),
            Box::new(Ffmpeg::new(ffmpeg.clone())),
        )
    })?;

    Ok(registry)
}
