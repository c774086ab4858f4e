// None of these are fatal: each is shown as an alert or an inline status
// and the action can be retried.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between picking a file and saving a result.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The chosen file's extension is not one the service accepts.
    #[error("Unsupported file type '{name}'. Please upload an image or PDF.")]
    UnsupportedFileType { name: String },

    /// The target format equals the input's extension.
    #[error("Source and target formats are the same.")]
    SameSourceAndTarget,

    /// No endpoint converts between these two categories (pdf → pdf).
    #[error("Unsupported conversion combo: {from} → {to}.")]
    UnsupportedConversionPair { from: String, to: String },

    /// The service answered with a non-2xx status, or the request never
    /// reached it. `detail` is the server's message when it sent one.
    #[error("Error: {detail}")]
    RequestFailed { detail: String },

    /// Reading an input file or writing a converted result failed.
    #[error("Could not access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `--server` is not an http(s) URL.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

impl ConvertError {
    pub fn request_failed(detail: impl Into<String>) -> Self {
        ConvertError::RequestFailed {
            detail: detail.into(),
        }
    }

    /// Whether this error is shown as a blocking alert rather than inline.
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedFileType { .. } | ConvertError::Io { .. }
        )
    }
}
