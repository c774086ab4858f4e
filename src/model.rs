use crate::error::ConvertError;
use crate::format::{extension_of, FileFormat};
use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::Arc;

/// The file the user picked or dropped. Replaced wholesale, never mutated.
#[derive(Clone, Debug)]
pub struct SelectedFile {
    /// File name as shown to the user and sent to the service
    pub name: String,
    /// Raw file content
    pub bytes: Arc<[u8]>,
    /// Format derived from the name's extension
    pub format: FileFormat,
}

impl SelectedFile {
    /// Validates the name, then wraps already-loaded content.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, ConvertError> {
        let name = name.into();
        let format = FileFormat::from_file_name(&name)
            .ok_or_else(|| ConvertError::UnsupportedFileType { name: name.clone() })?;
        Ok(Self {
            name,
            bytes: bytes.into(),
            format,
        })
    }

    /// Validates the extension before touching the disk, then reads the file.
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if FileFormat::from_file_name(&name).is_none() {
            return Err(ConvertError::UnsupportedFileType { name });
        }
        let bytes = std::fs::read(path).map_err(|source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(name, bytes)
    }

    /// Lower-cased extension exactly as it appears in the name.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}

/// How the inline status line is styled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    Error,
}

/// The inline status line under the convert button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Loading,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }
}

/// One successful conversion in the current session.
#[derive(Clone, Debug)]
pub struct ConversionRecord {
    /// Name of the uploaded file
    pub filename: String,
    /// Extension of the uploaded file
    pub source_format: String,
    /// Format the service produced
    pub target_format: FileFormat,
    /// Size of the converted output in bytes
    pub file_size: usize,
    /// When the result arrived
    pub timestamp: DateTime<Local>,
}

/// Size in megabytes with two decimals plus the upper-cased format label.
pub fn format_details(size_bytes: usize, format: FileFormat) -> String {
    let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
    format!("{:.2} MB • {}", size_mb, format.label())
}
