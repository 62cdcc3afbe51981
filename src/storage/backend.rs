use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

/// Raw byte storage behind a ledger.
///
/// `read` returns `None` when nothing has been stored yet, so callers can tell
/// a missing ledger apart from an empty one.
pub trait Backend {
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Add bytes at the end, creating the store if needed.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Replace the whole content.
    fn replace(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Exclusive lock held across a read-modify-write cycle.
    fn lock(&self) -> io::Result<BackendLock>;

    /// Human-readable location, used in messages.
    fn describe(&self) -> String;
}

/// Guard returned by [`Backend::lock`]. The lock is released on drop.
#[derive(Debug)]
pub struct BackendLock {
    file: Option<File>,
}

impl BackendLock {
    /// A guard that holds nothing, for backends that can't be shared.
    pub fn none() -> Self {
        Self { file: None }
    }
}

impl Drop for BackendLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// Ledger stored in a file on disk.
///
/// Whole-file rewrites go through a temporary file in the same directory that
/// is then renamed over the target, so a crash mid-write leaves either the
/// old or the new content. Mutations are serialized between processes with
/// an advisory lock on a `<file>.lock` sidecar.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl Backend for FileBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(bytes)?;
        file.sync_data()
    }

    fn replace(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_data()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn lock(&self) -> io::Result<BackendLock> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(BackendLock { file: Some(file) })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Ledger kept in memory. Nothing touches the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    content: Option<Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing content, as if a file with these bytes existed.
    pub fn with_content(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content: Some(bytes.into()),
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }
}

impl Backend for MemoryBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.content.clone())
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.content
            .get_or_insert_with(Vec::new)
            .extend_from_slice(bytes);
        Ok(())
    }

    fn replace(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.content = Some(bytes.to_vec());
        Ok(())
    }

    fn lock(&self) -> io::Result<BackendLock> {
        Ok(BackendLock::none())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
