//! Keystore materialization
//!
//! Inline keystores arrive as base64 text (typically from a CI secret) and
//! are written to a temporary file for the lifetime of one signing run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jarsign_core::config::TEMP_KEYSTORE_NAME;
use jarsign_core::KeystoreSource;
use tracing::debug;

use crate::error::Result;

/// A keystore available on disk
///
/// Temporary keystores are deleted by [`MaterializedKeystore::cleanup`] or
/// when the value is dropped, whichever comes first.
#[derive(Debug)]
pub struct MaterializedKeystore {
    path: PathBuf,
    temporary: bool,
}

impl MaterializedKeystore {
    /// Path to the keystore file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file was written by [`materialize`]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Delete the keystore if it is temporary; failures are ignored
    pub fn cleanup(&mut self) {
        if !self.temporary {
            return;
        }
        self.temporary = false;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "deleted temporary keystore"),
            Err(e) => debug!(
                path = %self.path.display(),
                error = %e,
                "failed to delete temporary keystore"
            ),
        }
    }
}

impl Drop for MaterializedKeystore {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Make `source` available as a file
///
/// A file source is returned as is. Inline data is decoded and written to
/// `temp_dir/keystore`, replacing any earlier file of that name.
pub fn materialize(source: &KeystoreSource, temp_dir: &Path) -> Result<MaterializedKeystore> {
    match source {
        KeystoreSource::File(path) => Ok(MaterializedKeystore {
            path: path.clone(),
            temporary: false,
        }),
        KeystoreSource::Data(data) => {
            let bytes = STANDARD.decode(data.trim())?;
            fs::create_dir_all(temp_dir)?;
            let path = temp_dir.join(TEMP_KEYSTORE_NAME);
            write_private(&path, &bytes)?;
            debug!(path = %path.display(), size = bytes.len(), "materialized keystore");

            Ok(MaterializedKeystore {
                path,
                temporary: true,
            })
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)
}
