use eframe::egui::ColorImage;
use rust_embed::RustEmbed;

use crate::format::FileFormat;

#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Asset;

/// Largest edge of a preview texture, in pixels.
const MAX_PREVIEW_EDGE: u32 = 1024;

/// What to draw for a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// Static icon; PDFs are not rendered inline
    PdfIcon,
    /// The content itself, decoded
    Image,
}

impl PreviewKind {
    pub fn for_format(format: FileFormat) -> Self {
        match format {
            FileFormat::Pdf => PreviewKind::PdfIcon,
            _ => PreviewKind::Image,
        }
    }
}

/// Decodes image bytes into an egui image, shrinking anything oversized.
pub fn decode_image(bytes: &[u8]) -> Option<ColorImage> {
    let img = image::load_from_memory(bytes).ok()?;
    let img = if img.width() > MAX_PREVIEW_EDGE || img.height() > MAX_PREVIEW_EDGE {
        img.thumbnail(MAX_PREVIEW_EDGE, MAX_PREVIEW_EDGE)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, &rgba))
}

/// The embedded PDF placeholder icon.
pub fn pdf_icon() -> Option<ColorImage> {
    let file = Asset::get("pdf_icon.png")?;
    decode_image(&file.data)
}

/// Preview for content of `format`: the PDF icon or the decoded image.
pub fn render(format: FileFormat, bytes: &[u8]) -> Option<ColorImage> {
    match PreviewKind::for_format(format) {
        PreviewKind::PdfIcon => pdf_icon(),
        PreviewKind::Image => decode_image(bytes),
    }
}
