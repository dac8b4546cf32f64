use std::path::PathBuf;

use url::Url;

use super::options::RangeOptions;
use super::status::FormatStatus;

/// Immutable input to one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingRequest {
    pub text: String,
    /// Filesystem path, absent for untitled or virtual documents
    pub file_path: Option<PathBuf>,
    pub language_id: String,
    pub uri: Url,
    pub range: Option<RangeOptions>,
}

impl FormattingRequest {
    /// Build a request for `uri`, deriving the file path from `file:` URIs.
    pub fn new(uri: Url, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        let file_path = if uri.scheme() == "file" {
            uri.to_file_path().ok()
        } else {
            None
        };
        Self {
            text: text.into(),
            file_path,
            language_id: language_id.into(),
            uri,
            range: None,
        }
    }

    pub fn with_range(mut self, range: RangeOptions) -> Self {
        self.range = Some(range);
        self
    }
}

/// Result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattingOutcome {
    /// The backend produced text different from the input
    Formatted(String),
    /// The backend succeeded and the text was already formatted
    Unchanged(String),
    /// Formatting was skipped on purpose (disabled language, ignored file,
    /// missing required config)
    Ignored,
    /// Formatting failed. Carries the original text when the failure happened
    /// inside the backend, `None` when the pipeline stopped before running it.
    Error(Option<String>),
}

impl FormattingOutcome {
    /// Text handed back to the caller, `None` meaning "defer to another formatter".
    pub fn into_text(self) -> Option<String> {
        match self {
            FormattingOutcome::Formatted(text) | FormattingOutcome::Unchanged(text) => Some(text),
            FormattingOutcome::Error(original) => original,
            FormattingOutcome::Ignored => None,
        }
    }

    pub fn status(&self) -> FormatStatus {
        match self {
            FormattingOutcome::Formatted(_) | FormattingOutcome::Unchanged(_) => {
                FormatStatus::Success
            }
            FormattingOutcome::Ignored => FormatStatus::Ignore,
            FormattingOutcome::Error(_) => FormatStatus::Error,
        }
    }
}
