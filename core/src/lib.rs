//! Processor registry and media adapters behind the `mediabench` CLI.

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod processor;
pub mod registry;
pub mod result;
pub mod tools;

pub use config::{DownloadParams, ProcessParams, Request, ToolPaths};
pub use processor::{Downloader, Operation, Processor};
pub use registry::{create_default_registry, Registry, RegistryError};
pub use result::{BatchSummary, ProcessingResult};
