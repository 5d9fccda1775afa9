use std::path::{Path, PathBuf};

const MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Completed { output_path: PathBuf },
    Failed { error: String },
}

/// Per-file counters for operations that handle many files at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    /// Re-encoded output was not smaller, original bytes kept
    pub skipped: usize,
    /// Non-image files copied through unchanged
    pub copied: usize,
    pub failed: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.copied + self.failed
    }
}

/// Outcome of one `process`/`download` call.
///
/// Built through [`ProcessingResult::completed`] or
/// [`ProcessingResult::failed`], so exactly one of output path and error
/// message is ever present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    outcome: Outcome,
    message: String,
    input: String,
    original_size: Option<u64>,
    final_size: Option<u64>,
    batch: Option<BatchSummary>,
}

impl ProcessingResult {
    pub fn completed(
        input: impl Into<String>,
        output_path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            outcome: Outcome::Completed {
                output_path: output_path.into(),
            },
            message: message.into(),
            input: input.into(),
            original_size: None,
            final_size: None,
            batch: None,
        }
    }

    pub fn failed(input: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            message: error.clone(),
            outcome: Outcome::Failed { error },
            input: input.into(),
            original_size: None,
            final_size: None,
            batch: None,
        }
    }

    pub fn with_sizes(mut self, original: Option<u64>, final_size: Option<u64>) -> Self {
        self.original_size = original;
        self.final_size = final_size;
        self
    }

    pub fn with_batch(mut self, batch: BatchSummary) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { .. })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output_path(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Completed { output_path } => Some(output_path),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Completed { .. } => None,
            Outcome::Failed { error } => Some(error),
        }
    }

    pub fn original_size(&self) -> Option<u64> {
        self.original_size
    }

    pub fn final_size(&self) -> Option<u64> {
        self.final_size
    }

    pub fn batch(&self) -> Option<&BatchSummary> {
        self.batch.as_ref()
    }

    /// Bytes saved; negative when the output grew.
    pub fn size_reduction(&self) -> Option<i64> {
        match (self.original_size, self.final_size) {
            (Some(orig), Some(fin)) => Some(orig as i64 - fin as i64),
            _ => None,
        }
    }

    pub fn size_reduction_mb(&self) -> Option<f64> {
        self.size_reduction().map(|b| b as f64 / MB)
    }

    pub fn savings_pct(&self) -> Option<f64> {
        match (self.original_size, self.final_size) {
            (Some(orig), Some(fin)) if orig > 0 => {
                Some((1.0 - fin as f64 / orig as f64) * 100.0)
            }
            _ => None,
        }
    }
}
