//! On-disk cache of transformed sources.
//!
//! Layout: the cache root plus the normalized absolute source path, with `:`
//! stripped from every component (it is unsafe in the entry-path grammar)
//! and separators preserved, one file per cached unit. Directories are
//! created on demand.
//!
//! Validity is mtime arithmetic: an entry is valid only while its own mtime
//! is strictly newer than everything that feeds it: the source file and the
//! watched set. The write side pins the entry's mtime one second past that
//! maximum, so repeat checks are stable without rewrites, and a touch to any
//! input flips the comparison.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! process racing on the same entry path sees the old bytes or the new ones,
//! never a torn file. Last writer wins.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use filetime::FileTime;

/// The cache root and the operations on entries under it.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic entry path for a source file: root + normalized
    /// absolute source path, colon-stripped, separator-preserving.
    pub fn entry_path(&self, source: &Path) -> PathBuf {
        let mut entry = self.root.clone();
        for component in normalize(source).components() {
            match component {
                Component::RootDir | Component::CurDir | Component::ParentDir => {}
                Component::Prefix(prefix) => {
                    let cleaned = prefix.as_os_str().to_string_lossy().replace(':', "");
                    if !cleaned.is_empty() {
                        entry.push(cleaned);
                    }
                }
                Component::Normal(part) => {
                    let cleaned = part.to_string_lossy().replace(':', "");
                    entry.push(cleaned);
                }
            }
        }
        entry
    }

    /// The entry for `source` if it exists and is still valid against
    /// `newest`, the max mtime of the source and every watched file.
    pub fn lookup(&self, source: &Path, newest: FileTime) -> Option<PathBuf> {
        let entry = self.entry_path(source);
        let meta = fs::metadata(&entry).ok()?;
        let cached = FileTime::from_last_modification_time(&meta);
        (cached > newest).then_some(entry)
    }

    /// Write `content` for `source`, creating directories as needed. The
    /// write lands in a sibling temp file that is renamed into place; when
    /// `stamp` is given the entry's mtime is pinned to it before the rename.
    pub fn write(
        &self,
        source: &Path,
        content: &str,
        stamp: Option<FileTime>,
    ) -> io::Result<PathBuf> {
        let entry = self.entry_path(source);
        if let Some(parent) = entry.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut temp_name = entry
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        temp_name.push(".tmp");
        let temp = entry.with_file_name(temp_name);
        fs::write(&temp, content)?;
        if let Some(stamp) = stamp {
            filetime::set_file_mtime(&temp, stamp)?;
        }
        fs::rename(&temp, &entry)?;
        Ok(entry)
    }

    /// Recursively empty the cache root. Idempotent; a missing root is fine.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error),
        }
    }
}

/// Absolute form of `path` with `.`/`..` components folded away, without
/// touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Modification time of a file, `None` when it cannot be read.
pub(crate) fn mtime(path: &Path) -> Option<FileTime> {
    fs::metadata(path)
        .ok()
        .map(|meta| FileTime::from_last_modification_time(&meta))
}
