//! Archive file helpers shared by the partition and merge steps

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;
use zip::{DateTime, ZipArchive, ZipWriter};

use crate::error::{Result, SigningError};

/// Reader over an archive on disk
pub type ArchiveReader = ZipArchive<BufReader<File>>;

/// Writer producing an archive on disk
pub type ArchiveWriter = ZipWriter<BufWriter<File>>;

/// A fully read archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry path; directories end with `/`
    pub path: String,
    /// Whether this is a directory marker
    pub is_dir: bool,
    /// Last modification time, if recorded
    pub last_modified: Option<DateTime>,
    /// Uncompressed content (empty for directories)
    pub content: Vec<u8>,
}

/// Open an archive for reading
pub fn open(path: &Path) -> Result<ArchiveReader> {
    let file = File::open(path)?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| SigningError::archive(path, e))
}

/// Create an archive for writing, creating parent directories as needed
pub fn create(path: &Path) -> Result<ArchiveWriter> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    Ok(ZipWriter::new(BufWriter::new(file)))
}

/// Write the central directory and flush the archive to disk
pub fn finish(writer: ArchiveWriter, path: &Path) -> Result<()> {
    let mut inner = writer
        .finish()
        .map_err(|e| SigningError::archive(path, e))?;
    inner.flush()?;
    Ok(())
}

/// Read every entry of an archive in archive order
pub fn read_entries(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut archive = open(path)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| SigningError::archive(path, e))?;
        let mut content = Vec::new();
        if !file.is_dir() {
            file.read_to_end(&mut content)?;
        }
        entries.push(ArchiveEntry {
            path: file.name().to_string(),
            is_dir: file.is_dir(),
            last_modified: file.last_modified(),
            content,
        });
    }

    Ok(entries)
}

/// Move a file, falling back to copy and delete across filesystems
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "rename failed, copying instead"
            );
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}

/// SHA-256 of a file, hex encoded
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_entries_keeps_order_and_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.jar");
        write_archive(
            &path,
            &[("com/", b""), ("com/A.class", b"cafebabe"), ("README", b"hi")],
        );

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_dir);
        assert_eq!(entries[0].path, "com/");
        assert_eq!(entries[1].content, b"cafebabe");
        assert_eq!(entries[2].last_modified, Some(fixed_time()));
    }

    #[test]
    fn test_open_rejects_non_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.jar");
        fs::write(&path, b"not a zip").unwrap();

        assert!(matches!(open(&path), Err(SigningError::Archive { .. })));
    }

    #[test]
    fn test_move_file() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.jar");
        let to = temp.path().join("tmp").join("a.jar.original");
        fs::write(&from, b"data").unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"data");
    }

    #[test]
    fn test_sha256_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        fs::write(&path, b"").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
