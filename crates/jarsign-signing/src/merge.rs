//! Recombining a signed archive with the entries kept out of signing

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use zip::write::SimpleFileOptions;

use crate::archive;
use crate::error::{Result, SigningError};
use crate::partition::PreservedEntries;

/// Write `output` as every entry of `signed` followed by the preserved entries
///
/// Signed entries are copied raw. Preserved entries are appended sorted by
/// path with their original content and timestamp; a preserved entry whose
/// path the signer already wrote (such as a regenerated manifest) is dropped.
/// The archive is assembled next to `output` and only renamed into place
/// once complete.
#[instrument(skip_all, fields(signed = %signed.display(), output = %output.display()))]
pub fn merge(signed: &Path, output: &Path, preserved: &PreservedEntries) -> Result<()> {
    let partial = partial_path(output);

    if let Err(e) = write_merged(signed, &partial, preserved) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, output)?;
    debug!(preserved = preserved.len(), "merged preserved entries");
    Ok(())
}

fn write_merged(signed: &Path, output: &Path, preserved: &PreservedEntries) -> Result<()> {
    let mut reader = archive::open(signed)?;
    let mut writer = archive::create(output)?;
    let mut written = HashSet::with_capacity(reader.len());

    for i in 0..reader.len() {
        let entry = reader
            .by_index(i)
            .map_err(|e| SigningError::archive(signed, e))?;
        written.insert(entry.name().to_string());
        writer
            .raw_copy_file(entry)
            .map_err(|e| SigningError::archive(output, e))?;
    }

    let mut names: Vec<&String> = preserved.keys().collect();
    names.sort();

    for name in names {
        if written.contains(name.as_str()) {
            warn!(entry = %name, "signed archive already contains preserved entry, keeping signed copy");
            continue;
        }

        let entry = &preserved[name];
        let mut options = SimpleFileOptions::default();
        if let Some(time) = entry.last_modified {
            options = options.last_modified_time(time);
        }

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| SigningError::archive(output, e))?;
        writer.write_all(&entry.content)?;
    }

    archive::finish(writer, output)
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}
