//! Request-scoped temporary files.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A uniquely named file in the service's temp directory, deleted when the
/// guard is dropped.
pub struct ScopedTempFile {
    file: Option<NamedTempFile>,
}

impl ScopedTempFile {
    /// Create an empty file ending in `extension` (e.g. `.pptx`) under `dir`.
    pub fn create(dir: &Path, extension: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(extension)
            .tempfile_in(dir)?;
        Ok(Self { file: Some(file) })
    }

    /// Create the file and write `contents` to it.
    pub fn with_contents(dir: &Path, extension: &str, contents: &[u8]) -> io::Result<Self> {
        let mut scoped = Self::create(dir, extension)?;
        if let Some(file) = scoped.file.as_mut() {
            file.write_all(contents)?;
            file.flush()?;
            log::info!("Saved uploaded file to {}", file.path().display());
        }
        Ok(scoped)
    }

    pub fn path(&self) -> &Path {
        match self.file {
            Some(ref file) => file.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for ScopedTempFile {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            match file.close() {
                Ok(()) => log::info!("Cleaned up file: {}", path.display()),
                Err(e) => log::error!("Failed to cleanup file {}: {}", path.display(), e),
            }
        }
    }
}

/// Extension of an uploaded file name, lowercase with its dot, or `""`.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}
