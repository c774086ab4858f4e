use crate::error::ConvertError;
use std::fmt;

/// A file extension the converter understands, as input or as target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Jpg,
    Jpeg,
    Png,
    Webp,
    Bmp,
    Gif,
    Tiff,
    Pdf,
}

/// Which side of the service a format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCategory {
    Image,
    Pdf,
}

impl FileFormat {
    /// Every extension accepted as input.
    pub const ALL: [FileFormat; 8] = [
        FileFormat::Jpg,
        FileFormat::Jpeg,
        FileFormat::Png,
        FileFormat::Webp,
        FileFormat::Bmp,
        FileFormat::Gif,
        FileFormat::Tiff,
        FileFormat::Pdf,
    ];

    /// The format buttons, in display order.
    pub const TARGETS: [FileFormat; 7] = [
        FileFormat::Jpg,
        FileFormat::Png,
        FileFormat::Webp,
        FileFormat::Bmp,
        FileFormat::Gif,
        FileFormat::Tiff,
        FileFormat::Pdf,
    ];

    pub fn from_extension(ext: &str) -> Option<FileFormat> {
        let ext = ext.to_ascii_lowercase();
        FileFormat::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Format of a file name, judged purely by its extension.
    pub fn from_file_name(name: &str) -> Option<FileFormat> {
        FileFormat::from_extension(&extension_of(name))
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Jpg => "jpg",
            FileFormat::Jpeg => "jpeg",
            FileFormat::Png => "png",
            FileFormat::Webp => "webp",
            FileFormat::Bmp => "bmp",
            FileFormat::Gif => "gif",
            FileFormat::Tiff => "tiff",
            FileFormat::Pdf => "pdf",
        }
    }

    /// Upper-case label used on buttons and in the result details.
    pub fn label(self) -> String {
        self.extension().to_ascii_uppercase()
    }

    pub fn category(self) -> FormatCategory {
        match self {
            FileFormat::Pdf => FormatCategory::Pdf,
            _ => FormatCategory::Image,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            FileFormat::Jpg | FileFormat::Jpeg => "image/jpeg",
            FileFormat::Png => "image/png",
            FileFormat::Webp => "image/webp",
            FileFormat::Bmp => "image/bmp",
            FileFormat::Gif => "image/gif",
            FileFormat::Tiff => "image/tiff",
            FileFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Lower-cased text after the last `.`; a name without a dot is returned whole.
pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

/// One of the three conversion endpoints exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ConvertImage,
    ImageToPdf,
    PdfToImage,
}

impl Operation {
    /// Picks the endpoint for a source/target pair. pdf → pdf has none.
    pub fn route(source: FileFormat, target: FileFormat) -> Result<Operation, ConvertError> {
        match (source.category(), target.category()) {
            (FormatCategory::Image, FormatCategory::Image) => Ok(Operation::ConvertImage),
            (FormatCategory::Image, FormatCategory::Pdf) => Ok(Operation::ImageToPdf),
            (FormatCategory::Pdf, FormatCategory::Image) => Ok(Operation::PdfToImage),
            (FormatCategory::Pdf, FormatCategory::Pdf) => {
                Err(ConvertError::UnsupportedConversionPair {
                    from: source.to_string(),
                    to: target.to_string(),
                })
            }
        }
    }

    /// Path segment of the endpoint, relative to the server base URL.
    pub fn path(self) -> &'static str {
        match self {
            Operation::ConvertImage => "convert-image",
            Operation::ImageToPdf => "image-to-pdf",
            Operation::PdfToImage => "pdf-to-image",
        }
    }

    pub fn endpoint(self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.path())
    }
}
