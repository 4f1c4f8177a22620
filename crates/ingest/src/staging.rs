use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Request-scoped directory for byte-content documents.
///
/// Everything staged here is removed when the area is closed or dropped,
/// so early returns and errors never leave files behind.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a staging area under the system temp directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("medcompare-")
            .tempdir()
            .context("Failed to create staging directory")?;
        Ok(Self { dir })
    }

    /// Create a staging area under `root`.
    pub fn new_in(root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("medcompare-")
            .tempdir_in(root)
            .context(format!("Failed to create staging directory in {:?}", root))?;
        Ok(Self { dir })
    }

    /// Write `bytes` to a fresh file with the given extension and return its path.
    pub fn stage(&self, bytes: &[u8], extension: &str) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("doc-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(self.dir.path())
            .context("Failed to create staged file")?;

        file.write_all(bytes).context("Failed to write staged file")?;
        file.flush()?;

        // The directory owns cleanup from here on.
        let path = file
            .into_temp_path()
            .keep()
            .context("Failed to persist staged file")?;
        Ok(path)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the staging directory and report any cleanup failure.
    pub fn close(self) -> Result<()> {
        self.dir.close().context("Failed to remove staging directory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_files_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let staged = {
            let area = StagingArea::new_in(root.path()).unwrap();
            let path = area.stage(b"hello", "txt").unwrap();
            assert!(path.exists());
            assert_eq!(path.extension().unwrap(), "txt");
            path
        };

        assert!(!staged.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_close_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new_in(root.path()).unwrap();
        let dir = area.path().to_path_buf();
        area.stage(b"%PDF-1.4", "pdf").unwrap();

        area.close().unwrap();
        assert!(!dir.exists());
    }
}
