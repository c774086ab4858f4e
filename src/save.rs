use std::path::{Path, PathBuf};

use rfd::FileDialog;

use crate::blob::ResultHandle;
use crate::error::ConvertError;

/// Writes converted bytes to `path`, replacing any existing file.
pub fn write_result(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    std::fs::write(path, bytes).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Native save dialog proposing `converted.<fmt>`. `None` if cancelled.
pub fn prompt_save_path(handle: &ResultHandle) -> Option<PathBuf> {
    let ext = handle.format.extension();
    FileDialog::new()
        .set_file_name(&handle.download_name())
        .add_filter(&handle.format.label(), &[ext])
        .save_file()
}

/// Opens the folder containing `path` in the platform file manager.
pub fn reveal_in_file_manager(path: &Path) {
    let folder = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";

        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            tracing::warn!("Could not open {}: {}", folder.display(), e);
        }
    });
}
