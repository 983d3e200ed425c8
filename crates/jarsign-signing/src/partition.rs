//! Splitting an archive into a signable subset and preserved entries

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use jarsign_core::patterns::PatternMatcher;
use tracing::{debug, instrument, trace};
use zip::DateTime;

use crate::archive;
use crate::error::{Result, SigningError};

/// An entry kept out of signing, restored unchanged after signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedEntry {
    /// Uncompressed content
    pub content: Vec<u8>,
    /// Original modification time
    pub last_modified: Option<DateTime>,
}

/// Preserved entries keyed by entry path
pub type PreservedEntries = HashMap<String, PreservedEntry>;

/// Upper bound on the buffer reserved up front for one preserved entry
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Initial buffer size for an entry declaring `size` uncompressed bytes;
/// the declared size is untrusted, so larger entries grow while reading
fn preallocation(size: u64) -> usize {
    size.min(MAX_PREALLOCATION) as usize
}

/// Copy the entries of `input` selected by `patterns` into `output`
///
/// Directory entries and matching files are copied raw (same bytes,
/// compression and timestamp). Every other file is read into memory and
/// returned so it can be merged back after signing.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn partition(input: &Path, output: &Path, patterns: &PatternMatcher) -> Result<PreservedEntries> {
    let mut reader = archive::open(input)?;
    let mut writer = archive::create(output)?;
    let mut preserved = PreservedEntries::new();
    let mut copied = 0usize;

    for i in 0..reader.len() {
        let mut entry = reader
            .by_index(i)
            .map_err(|e| SigningError::archive(input, e))?;
        let name = entry.name().to_string();

        if entry.is_dir() || patterns.is_match(&name) {
            trace!(entry = %name, "to sign");
            writer
                .raw_copy_file(entry)
                .map_err(|e| SigningError::archive(output, e))?;
            copied += 1;
        } else {
            trace!(entry = %name, "preserved");
            let mut content = Vec::with_capacity(preallocation(entry.size()));
            entry.read_to_end(&mut content)?;
            let last_modified = entry.last_modified();
            preserved.insert(
                name,
                PreservedEntry {
                    content,
                    last_modified,
                },
            );
        }
    }

    archive::finish(writer, output)?;
    debug!(copied, preserved = preserved.len(), "partitioned archive");
    Ok(preserved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::*;
    use crate::archive::{read_entries, ArchiveEntry};
    use jarsign_core::PatternSet;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn matcher(includes: &[&str], excludes: &[&str]) -> PatternMatcher {
        let mut patterns = PatternSet::new();
        patterns
            .include(includes.iter().copied())
            .exclude(excludes.iter().copied());
        patterns.compile().unwrap()
    }

    fn sample(path: &Path) {
        write_archive(
            path,
            &[
                ("META-INF/", b""),
                ("META-INF/NOTICE", b"notice text"),
                ("META-INF/services/a.B", b"impl"),
                ("A.class", b"class A"),
                ("com/", b""),
                ("com/B.class", b"class B"),
                ("logo.png", b"png"),
            ],
        );
    }

    #[test]
    fn test_excluded_entries_are_preserved() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("app.jar");
        let output = temp.path().join("app.jar.unsigned");
        sample(&input);

        let preserved = partition(&input, &output, &matcher(&[], &["META-INF/**"])).unwrap();

        assert_eq!(
            entry_names(&output),
            vec!["META-INF/", "A.class", "com/", "com/B.class", "logo.png"]
        );
        assert_eq!(preserved.len(), 2);
        let notice = &preserved["META-INF/NOTICE"];
        assert_eq!(notice.content, b"notice text");
        assert_eq!(notice.last_modified, Some(fixed_time()));
    }

    #[test]
    fn test_directories_always_go_to_signable_subset() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("app.jar");
        let output = temp.path().join("app.jar.unsigned");
        sample(&input);

        partition(&input, &output, &matcher(&["**/*.class"], &[])).unwrap();

        let names = entry_names(&output);
        assert!(names.contains(&"META-INF/".to_string()));
        assert!(names.contains(&"com/".to_string()));
        assert!(!names.contains(&"logo.png".to_string()));
    }

    #[test]
    fn test_partition_covers_every_entry_exactly_once() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("app.jar");
        let output = temp.path().join("app.jar.unsigned");
        sample(&input);

        let preserved =
            partition(&input, &output, &matcher(&["**/*.class", "META-INF/**"], &["**/NOTICE"]))
                .unwrap();

        let signable: Vec<ArchiveEntry> = read_entries(&output).unwrap();
        let original = read_entries(&input).unwrap();

        for entry in &original {
            let in_subset = signable.iter().any(|e| e.path == entry.path);
            let in_preserved = preserved.contains_key(&entry.path);
            assert!(in_subset ^ in_preserved, "{} must land in exactly one side", entry.path);
        }

        let union: BTreeSet<String> = signable
            .iter()
            .map(|e| e.path.clone())
            .chain(preserved.keys().cloned())
            .collect();
        let all: BTreeSet<String> = original.iter().map(|e| e.path.clone()).collect();
        assert_eq!(union, all);
        assert_eq!(signable.len() + preserved.len(), original.len());
    }

    #[test]
    fn test_copied_entries_keep_content_and_time() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("app.jar");
        let output = temp.path().join("app.jar.unsigned");
        sample(&input);

        partition(&input, &output, &matcher(&[], &["logo.png"])).unwrap();

        let original = read_entries(&input).unwrap();
        let copied = read_entries(&output).unwrap();
        for entry in &copied {
            let source = original.iter().find(|e| e.path == entry.path).unwrap();
            assert_eq!(entry, source);
        }
    }

    #[test]
    fn test_preallocation_ignores_huge_declared_sizes() {
        assert_eq!(preallocation(0), 0);
        assert_eq!(preallocation(4096), 4096);
        assert_eq!(preallocation(u64::MAX), MAX_PREALLOCATION as usize);
    }

    #[test]
    fn test_large_preserved_entry_is_read_completely() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("app.jar");
        let output = temp.path().join("app.jar.unsigned");
        let big = vec![7u8; (MAX_PREALLOCATION as usize) * 2 + 3];
        write_archive(&input, &[("A.class", b"class A"), ("assets/blob.bin", &big)]);

        let preserved = partition(&input, &output, &matcher(&[], &["assets/**"])).unwrap();
        assert_eq!(preserved["assets/blob.bin"].content, big);
    }

    #[test]
    fn test_corrupt_input_fails() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("app.jar");
        std::fs::write(&input, b"PK\x03\x04 truncated").unwrap();

        let err = partition(&input, &temp.path().join("out"), &matcher(&[], &["x"])).unwrap_err();
        assert!(matches!(err, SigningError::Archive { .. }));
    }
}
