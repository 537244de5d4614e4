use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Lists the entry names of a directory.
///
/// The run pipeline only needs names; this seam lets tests feed listings a real
/// filesystem cannot produce.
pub trait DirectoryLister: Send + Sync {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// Reads entry names straight from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDirectoryLister;

impl DirectoryLister for FsDirectoryLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                // A non-UTF-8 name can never be a segment filename.
                Err(raw) => debug!(
                    event = "non_utf8_entry_skipped",
                    entry = ?raw,
                    "skipping non-UTF-8 directory entry"
                ),
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::{DirectoryLister, FsDirectoryLister};
    use std::fs;

    #[test]
    fn lists_files_and_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("000000010000000000000001"), b"").expect("write segment");
        fs::write(dir.path().join("000000010000000000000002.partial"), b"").expect("write partial");
        fs::create_dir(dir.path().join("archive_status")).expect("mkdir");

        let mut names = FsDirectoryLister.list(dir.path()).expect("listing");
        names.sort();

        assert_eq!(
            names,
            vec![
                "000000010000000000000001",
                "000000010000000000000002.partial",
                "archive_status",
            ]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");

        let err = FsDirectoryLister.list(&missing).expect_err("missing dir");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
