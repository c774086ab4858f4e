// Input, target format, result handle and status line for the converter.
// Nothing here touches egui; the app routes every user action through it.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::blob::{BlobRegistry, ResultHandle};
use crate::error::ConvertError;
use crate::format::{FileFormat, Operation};
use crate::model::{format_details, ConversionRecord, SelectedFile, StatusKind, StatusMessage};
use crate::save;

/// Whether the convert action may run, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convertibility {
    NoInput,
    InputNoFormat,
    SameFormat,
    Ready,
}

/// Everything the HTTP client needs to run one conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Input generation the request was built for
    pub generation: u64,
    pub operation: Operation,
    pub file: SelectedFile,
    pub target: FileFormat,
}

/// What came back for a [`ConversionRequest`].
#[derive(Debug)]
pub struct ConversionOutcome {
    pub generation: u64,
    pub target: FileFormat,
    pub result: Result<Vec<u8>, ConvertError>,
}

#[derive(Default)]
pub struct WidgetState {
    input: Option<SelectedFile>,
    target: Option<FileFormat>,
    result: Option<ResultHandle>,
    blobs: BlobRegistry,
    status: Option<StatusMessage>,
    in_flight: bool,
    /// Bumped whenever the input is replaced or cleared
    generation: u64,
    history: Vec<ConversionRecord>,
    saved_to: Option<PathBuf>,
}

impl WidgetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and selects a file from disk. On error nothing changes.
    pub fn load_path(&mut self, path: &Path) -> Result<(), ConvertError> {
        let file = SelectedFile::from_path(path).inspect_err(|e| warn!("Rejected {}: {}", path.display(), e))?;
        self.select_file(file);
        Ok(())
    }

    /// Selects in-memory content (e.g. a drop that carried bytes but no path).
    pub fn load_bytes(&mut self, name: &str, bytes: impl Into<std::sync::Arc<[u8]>>) -> Result<(), ConvertError> {
        let file = SelectedFile::new(name, bytes).inspect_err(|e| warn!("Rejected {}: {}", name, e))?;
        self.select_file(file);
        Ok(())
    }

    /// Replaces the input. The output is stale from here on; the target
    /// format is kept.
    pub fn select_file(&mut self, file: SelectedFile) {
        info!("Selected {} ({} bytes)", file.name, file.bytes.len());
        self.input = Some(file);
        self.generation += 1;
        self.reset_output();
        self.check_convertibility();
    }

    /// Clears input and output entirely.
    pub fn clear_input(&mut self) {
        debug!("Clearing input");
        self.input = None;
        self.target = None;
        self.status = None;
        self.generation += 1;
        self.reset_output();
    }

    fn reset_output(&mut self) {
        if let Some(handle) = self.result.take() {
            self.blobs.revoke(handle);
        }
        self.saved_to = None;
    }

    pub fn select_format(&mut self, format: FileFormat) {
        debug!("Target format {}", format);
        self.target = Some(format);
        self.check_convertibility();
    }

    pub fn convertibility(&self) -> Convertibility {
        match (&self.input, self.target) {
            (None, _) => Convertibility::NoInput,
            (Some(_), None) => Convertibility::InputNoFormat,
            (Some(file), Some(target)) if file.extension() == target.extension() => {
                Convertibility::SameFormat
            }
            (Some(_), Some(_)) => Convertibility::Ready,
        }
    }

    fn check_convertibility(&mut self) {
        match self.convertibility() {
            Convertibility::SameFormat => {
                let err = ConvertError::SameSourceAndTarget;
                self.status = Some(StatusMessage::error(err.to_string()));
            }
            // Keep "Converting..." visible until the request settles.
            Convertibility::Ready if self.in_flight => {}
            Convertibility::Ready => self.status = None,
            Convertibility::NoInput | Convertibility::InputNoFormat => {}
        }
    }

    /// Convert is enabled only when ready and nothing else is running.
    pub fn can_convert(&self) -> bool {
        !self.in_flight && self.convertibility() == Convertibility::Ready
    }

    /// Builds the request for the current input and target, or sets the
    /// status and returns `None` when no request should be sent.
    pub fn begin_conversion(&mut self) -> Option<ConversionRequest> {
        if self.in_flight {
            return None;
        }
        let (file, target) = match (&self.input, self.target) {
            (Some(file), Some(target)) => (file.clone(), target),
            _ => return None,
        };
        let operation = match Operation::route(file.format, target) {
            Ok(op) => op,
            Err(e) => {
                warn!("{} → {}: {}", file.format, target, e);
                self.status = Some(StatusMessage::error(e.to_string()));
                return None;
            }
        };
        if self.convertibility() != Convertibility::Ready {
            return None;
        }

        info!("Converting {} → {} via {}", file.name, target, operation.path());
        self.in_flight = true;
        self.status = Some(StatusMessage::loading("Converting..."));
        Some(ConversionRequest {
            generation: self.generation,
            operation,
            file,
            target,
        })
    }

    /// Applies the result of a request started by [`Self::begin_conversion`].
    pub fn finish_conversion(&mut self, outcome: ConversionOutcome) {
        self.in_flight = false;

        if outcome.generation != self.generation {
            debug!("Discarding result for a replaced input");
            if matches!(self.status, Some(StatusMessage { kind: StatusKind::Loading, .. })) {
                self.status = None;
            }
            self.check_convertibility();
            return;
        }

        match outcome.result {
            Ok(bytes) => {
                if let Some(previous) = self.result.take() {
                    self.blobs.revoke(previous);
                }
                let handle = self.blobs.create(bytes, outcome.target);
                info!("Conversion finished: {} bytes of {}", handle.size, handle.format);

                if let Some(file) = &self.input {
                    self.history.push(ConversionRecord {
                        filename: file.name.clone(),
                        source_format: file.extension(),
                        target_format: outcome.target,
                        file_size: handle.size,
                        timestamp: chrono::Local::now(),
                    });
                }
                self.result = Some(handle);
                self.saved_to = None;
                self.status = None;
                self.check_convertibility();
            }
            Err(e) => {
                warn!("Conversion failed: {}", e);
                self.status = Some(StatusMessage::error(e.to_string()));
            }
        }
    }

    /// Writes the current result to `path`.
    pub fn save_result(&mut self, path: &Path) -> Result<(), ConvertError> {
        let Some(bytes) = self.result.as_ref().and_then(|h| self.blobs.get(h)) else {
            return Ok(());
        };
        match save::write_result(path, &bytes) {
            Ok(()) => {
                info!("Saved result to {}", path.display());
                self.saved_to = Some(path.to_path_buf());
                Ok(())
            }
            Err(e) => {
                self.status = Some(StatusMessage::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// "0.42 MB • PNG" for the current result.
    pub fn details(&self) -> Option<String> {
        self.result.as_ref().map(|h| format_details(h.size, h.format))
    }

    pub fn result(&self) -> Option<&ResultHandle> {
        self.result.as_ref()
    }

    pub fn result_bytes(&self) -> Option<std::sync::Arc<[u8]>> {
        self.result.as_ref().and_then(|h| self.blobs.get(h))
    }

    pub fn can_download(&self) -> bool {
        self.result.is_some()
    }

    pub fn input(&self) -> Option<&SelectedFile> {
        self.input.as_ref()
    }

    pub fn target(&self) -> Option<FileFormat> {
        self.target
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Changes whenever the input is replaced or cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_converting(&self) -> bool {
        self.in_flight
    }

    pub fn history(&self) -> &[ConversionRecord] {
        &self.history
    }

    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    #[cfg(test)]
    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, vec![0u8; 16]).unwrap()
    }

    fn ok(req: &ConversionRequest, bytes: Vec<u8>) -> ConversionOutcome {
        ConversionOutcome {
            generation: req.generation,
            target: req.target,
            result: Ok(bytes),
        }
    }

    fn ready(name: &str, target: FileFormat) -> WidgetState {
        let mut w = WidgetState::new();
        w.select_file(file(name));
        w.select_format(target);
        w
    }

    #[test]
    fn starts_with_nothing_selected() {
        let w = WidgetState::new();
        assert_eq!(w.convertibility(), Convertibility::NoInput);
        assert!(!w.can_convert());
        assert!(!w.can_download());
        assert!(w.status().is_none());
    }

    #[test]
    fn unsupported_file_changes_nothing() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let err = w.load_bytes("notes.txt", vec![1u8]).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFileType { .. }));
        assert_eq!(w.input().unwrap().name, "photo.png");
        assert_eq!(w.target(), Some(FileFormat::Jpg));
        assert_eq!(w.convertibility(), Convertibility::Ready);
    }

    #[test]
    fn convert_enabled_only_when_formats_differ() {
        let mut w = WidgetState::new();
        w.select_format(FileFormat::Png);
        assert_eq!(w.convertibility(), Convertibility::NoInput);
        assert!(!w.can_convert());

        let mut w = WidgetState::new();
        w.select_file(file("photo.png"));
        assert_eq!(w.convertibility(), Convertibility::InputNoFormat);
        assert!(!w.can_convert());

        w.select_format(FileFormat::Jpg);
        assert!(w.can_convert());
    }

    #[test]
    fn same_format_sets_inline_error() {
        for f in FileFormat::TARGETS {
            let mut w = ready(&format!("input.{}", f.extension()), f);
            assert_eq!(w.convertibility(), Convertibility::SameFormat);
            assert!(!w.can_convert());
            let status = w.status().unwrap();
            assert_eq!(status.kind, StatusKind::Error);
            assert_eq!(status.text, "Source and target formats are the same.");
            assert!(w.begin_conversion().is_none());
        }
    }

    #[test]
    fn becoming_ready_clears_the_error() {
        let mut w = ready("photo.png", FileFormat::Png);
        assert!(w.status().is_some());
        w.select_format(FileFormat::Gif);
        assert!(w.status().is_none());
        assert!(w.can_convert());
    }

    #[test]
    fn jpeg_to_jpg_is_a_real_conversion() {
        let w = ready("photo.jpeg", FileFormat::Jpg);
        assert_eq!(w.convertibility(), Convertibility::Ready);
    }

    #[test]
    fn png_to_jpg_uses_convert_image_and_shows_details() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        assert_eq!(req.operation, Operation::ConvertImage);
        assert_eq!(req.target, FileFormat::Jpg);
        assert!(w.is_converting());
        assert!(!w.can_convert());
        assert_eq!(w.status().unwrap().kind, StatusKind::Loading);

        w.finish_conversion(ok(&req, vec![0u8; 524_288]));
        assert!(!w.is_converting());
        assert!(w.can_convert());
        assert!(w.status().is_none());
        assert_eq!(w.details().as_deref(), Some("0.50 MB • JPG"));
        assert!(w.can_download());
        assert_eq!(w.result().unwrap().download_name(), "converted.jpg");
    }

    #[test]
    fn pdf_to_png_uses_pdf_to_image() {
        let mut w = ready("doc.pdf", FileFormat::Png);
        let req = w.begin_conversion().unwrap();
        assert_eq!(req.operation, Operation::PdfToImage);
    }

    #[test]
    fn png_to_pdf_uses_image_to_pdf() {
        let mut w = ready("photo.png", FileFormat::Pdf);
        let req = w.begin_conversion().unwrap();
        assert_eq!(req.operation, Operation::ImageToPdf);
        w.finish_conversion(ok(&req, b"%PDF-1.4".to_vec()));
        assert_eq!(w.result().unwrap().format, FileFormat::Pdf);
    }

    #[test]
    fn pdf_to_pdf_is_rejected_without_a_request() {
        let mut w = ready("doc.pdf", FileFormat::Pdf);
        assert!(w.begin_conversion().is_none());
        assert!(!w.is_converting());
        let status = w.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Unsupported conversion combo: pdf → pdf.");
    }

    #[test]
    fn only_one_request_in_flight() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        assert!(w.begin_conversion().is_some());
        assert!(w.begin_conversion().is_none());
        w.select_format(FileFormat::Webp);
        assert!(!w.can_convert());
        assert_eq!(w.status().unwrap().kind, StatusKind::Loading);
    }

    #[test]
    fn failure_shows_detail_and_reenables() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ConversionOutcome {
            generation: req.generation,
            target: req.target,
            result: Err(ConvertError::request_failed("cannot identify image file")),
        });
        let status = w.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Error: cannot identify image file");
        assert!(w.can_convert());
        assert!(!w.can_download());
    }

    #[test]
    fn successful_conversion_releases_exactly_one_previous_handle() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ok(&req, vec![1u8; 10]));
        assert_eq!(w.blobs().revoked(), 0);
        assert_eq!(w.blobs().live(), 1);

        w.select_format(FileFormat::Webp);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ok(&req, vec![2u8; 20]));
        assert_eq!(w.blobs().revoked(), 1);
        assert_eq!(w.blobs().created(), 2);
        assert_eq!(w.blobs().live(), 1);
        assert_eq!(w.result().unwrap().format, FileFormat::Webp);
        assert_eq!(w.history().len(), 2);
    }

    #[test]
    fn same_format_picked_mid_flight_survives_success() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.select_format(FileFormat::Png);

        w.finish_conversion(ok(&req, vec![1u8; 10]));
        assert!(w.can_download());
        assert_eq!(w.convertibility(), Convertibility::SameFormat);
        assert!(!w.can_convert());
        let status = w.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Source and target formats are the same.");
    }

    #[test]
    fn same_format_picked_mid_flight_survives_stale_result() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.select_file(file("second.gif"));
        w.select_format(FileFormat::Gif);

        w.finish_conversion(ok(&req, vec![1u8; 10]));
        assert!(w.result().is_none());
        let status = w.status().unwrap();
        assert_eq!(status.text, "Source and target formats are the same.");
    }

    #[test]
    fn failed_conversion_keeps_previous_result() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ok(&req, vec![1u8; 10]));

        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ConversionOutcome {
            generation: req.generation,
            target: req.target,
            result: Err(ConvertError::request_failed("Conversion failed")),
        });
        assert_eq!(w.blobs().revoked(), 0);
        assert!(w.can_download());
    }

    #[test]
    fn new_file_resets_only_output() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ok(&req, vec![1u8; 10]));

        w.select_file(file("other.gif"));
        assert!(w.result().is_none());
        assert!(!w.can_download());
        assert_eq!(w.blobs().live(), 0);
        assert_eq!(w.target(), Some(FileFormat::Jpg));
        assert!(w.can_convert());
    }

    #[test]
    fn clear_resets_everything() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ok(&req, vec![1u8; 10]));

        w.clear_input();
        assert!(w.input().is_none());
        assert!(w.target().is_none());
        assert!(w.status().is_none());
        assert!(!w.can_convert());
        assert!(!w.can_download());
        assert_eq!(w.blobs().live(), 0);
        assert_eq!(w.blobs().revoked(), 1);
    }

    #[test]
    fn late_result_for_replaced_input_is_dropped() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.select_file(file("second.bmp"));
        assert!(!w.can_convert(), "still waiting on the first request");

        w.finish_conversion(ok(&req, vec![1u8; 10]));
        assert!(w.result().is_none());
        assert_eq!(w.blobs().created(), 0);
        assert!(w.status().is_none());
        assert!(w.can_convert());
        assert!(w.history().is_empty());
    }

    #[test]
    fn save_writes_result_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ok(&req, b"jpegbytes".to_vec()));

        let path = dir.path().join(w.result().unwrap().download_name());
        w.save_result(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"jpegbytes");
        assert_eq!(w.saved_to(), Some(path.as_path()));
    }

    #[test]
    fn save_failure_sets_status() {
        let mut w = ready("photo.png", FileFormat::Jpg);
        let req = w.begin_conversion().unwrap();
        w.finish_conversion(ok(&req, b"jpegbytes".to_vec()));

        let err = w.save_result(Path::new("/nonexistent/dir/converted.jpg")).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
        assert_eq!(w.status().unwrap().kind, StatusKind::Error);
        assert!(w.saved_to().is_none());
    }
}
