//! Filesystem boundary.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::debug;
use uuid::Uuid;

use crate::error::ProvisionError;

/// Filesystem operations used by the provisioning steps.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> Result<(), ProvisionError>;

    /// Replace the file at `path` with `content`. Readers never observe a
    /// partially written file.
    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<(), ProvisionError>;

    /// Recursively copy `src` into `dst`, creating `dst` if needed.
    fn copy_dir_all(&self, src: &Path, dst: &Path) -> Result<(), ProvisionError>;

    /// Extract a zip archive into `dest`.
    fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<(), ProvisionError>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), ProvisionError> {
        fs::create_dir_all(path).map_err(|e| ProvisionError::filesystem(path, e))
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<(), ProvisionError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ProvisionError::filesystem(parent, e))?;
            }
        }

        // Random suffix plus create_new so a pre-created temp file is never reused
        let temp_name = format!(
            ".{}.{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy(),
            Uuid::new_v4().simple()
        );
        let temp_path = path.with_file_name(temp_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(|e| ProvisionError::filesystem(&temp_path, e))?;

        file.write_all(content)
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                let _ = fs::remove_file(&temp_path);
                ProvisionError::filesystem(&temp_path, e)
            })?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            ProvisionError::filesystem(path, e)
        })?;

        debug!(path = %path.display(), bytes = content.len(), "File written");
        Ok(())
    }

    fn copy_dir_all(&self, src: &Path, dst: &Path) -> Result<(), ProvisionError> {
        fs::create_dir_all(dst).map_err(|e| ProvisionError::filesystem(dst, e))?;

        let entries = fs::read_dir(src).map_err(|e| ProvisionError::filesystem(src, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ProvisionError::filesystem(src, e))?;
            let from = entry.path();
            let to = dst.join(entry.file_name());
            let file_type = entry
                .file_type()
                .map_err(|e| ProvisionError::filesystem(&from, e))?;

            if file_type.is_dir() {
                self.copy_dir_all(&from, &to)?;
            } else {
                fs::copy(&from, &to).map_err(|e| ProvisionError::filesystem(&to, e))?;
            }
        }

        Ok(())
    }

    fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<(), ProvisionError> {
        let file = File::open(archive).map_err(|e| ProvisionError::filesystem(archive, e))?;
        let mut zip =
            zip::ZipArchive::new(file).map_err(|e| ProvisionError::filesystem(archive, e))?;

        fs::create_dir_all(dest).map_err(|e| ProvisionError::filesystem(dest, e))?;
        zip.extract(dest)
            .map_err(|e| ProvisionError::filesystem(dest, e))?;

        debug!(
            archive = %archive.display(),
            dest = %dest.display(),
            entries = zip.len(),
            "Archive extracted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".env");

        LocalFilesystem.write_atomic(&path, b"PORT=5000\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "PORT=5000\n");

        LocalFilesystem.write_atomic(&path, b"PORT=6000\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "PORT=6000\n");

        // No temp files left behind
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_copy_dir_all() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("nssm.exe"), b"binary").unwrap();
        fs::write(src.join("sub").join("readme.txt"), b"docs").unwrap();

        let dst = dir.path().join("dst");
        LocalFilesystem.copy_dir_all(&src, &dst).unwrap();

        assert_eq!(fs::read(dst.join("nssm.exe")).unwrap(), b"binary");
        assert_eq!(fs::read(dst.join("sub").join("readme.txt")).unwrap(), b"docs");
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("nssm.zip");

        let file = File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::<()>::default()
            .compression_method(zip::CompressionMethod::Deflated);
        writer
            .start_file("nssm-2.24/win64/nssm.exe", options)
            .unwrap();
        writer.write_all(b"MZ").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("extract");
        LocalFilesystem.extract_zip(&archive_path, &dest).unwrap();

        assert!(LocalFilesystem.exists(&dest.join("nssm-2.24/win64/nssm.exe")));
    }

    #[test]
    fn test_extract_zip_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("broken.zip");
        fs::write(&archive_path, b"not a zip").unwrap();

        let result = LocalFilesystem.extract_zip(&archive_path, &dir.path().join("out"));
        assert!(matches!(result, Err(ProvisionError::Filesystem { .. })));
    }
}
