use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ProcessingError;

/// Collect every regular file below `root`, recursively. Symlinks are
/// followed; entries that cannot be read (broken links, loops) are skipped
/// with a warning.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>, ProcessingError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    if !root.is_dir() {
        return Err(ProcessingError::NotFound(root.to_path_buf()));
    }

    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(e) if e.depth() > 0 => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                log::warn!("Skipping {}: {}", path, e);
                None
            }
            Err(e) => Some(Err(ProcessingError::from(e))),
        })
        .collect()
}

/// Size of a file, or the summed size of all files below a directory.
pub fn path_size(path: &Path) -> Result<u64, ProcessingError> {
    if path.is_file() {
        return file_size(path);
    }
    collect_files(path)?
        .iter()
        .try_fold(0u64, |acc, f| Ok(acc + file_size(f)?))
}

pub fn file_size(path: &Path) -> Result<u64, ProcessingError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| ProcessingError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })
}

pub fn canonicalize(path: &Path) -> Result<PathBuf, ProcessingError> {
    fs::canonicalize(path).map_err(|e| ProcessingError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<(), ProcessingError> {
    fs::create_dir_all(dir).map_err(|e| ProcessingError::WriteFile {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Read file contents.
pub fn read_file(path: &Path) -> Result<Vec<u8>, ProcessingError> {
    fs::read(path).map_err(|e| ProcessingError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write file contents, creating parent directories as needed.
pub fn write_file(path: &Path, data: &[u8]) -> Result<(), ProcessingError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, data).map_err(|e| ProcessingError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copy a file unchanged, creating parent directories as needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64, ProcessingError> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(from, to).map_err(|e| ProcessingError::WriteFile {
        path: to.to_path_buf(),
        source: e,
    })
}
