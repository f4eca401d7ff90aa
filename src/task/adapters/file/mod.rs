//! File-backed document storage.
//!
//! Writes go to a sibling temporary file that is flushed to disk and then
//! renamed over the document, so a crash leaves either the old or the new
//! document and never a torn one.

use super::document::{DocumentBackend, DocumentStorage};
use crate::task::ports::{StorageError, StorageErrorCode, StorageResult};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::{ErrorKind, Write};

/// Capacity applied by [`FileStorage::open`]: 5 MiB.
pub const DEFAULT_FILE_CAPACITY: u64 = 5 * 1024 * 1024;

/// Storage adapter that keeps the document in one file.
pub type FileStorage = DocumentStorage<FileDocument>;

/// Document stored as a single file inside a capability directory.
#[derive(Debug)]
pub struct FileDocument {
    dir: Dir,
    file_name: String,
    temp_name: String,
}

impl FileDocument {
    /// Opens the document at `path`, creating its parent directory if needed.
    ///
    /// The file itself is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorCode::StorageUnavailable`] when the path has no
    /// file name or the parent directory cannot be opened.
    pub fn open(path: &Utf8Path) -> StorageResult<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| StorageError::unavailable(format!("{path} has no file name")))?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|err| io_error(&err))?;
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| io_error(&err))?;
        Ok(Self::from_dir(dir, file_name))
    }

    /// Uses `file_name` inside an already opened directory.
    #[must_use]
    pub fn from_dir(dir: Dir, file_name: &str) -> Self {
        Self {
            dir,
            file_name: file_name.to_owned(),
            temp_name: format!(".{file_name}.tmp"),
        }
    }

    /// Returns the document file name.
    #[must_use]
    pub fn file_name(&self) -> &Utf8Path {
        Utf8Path::new(&self.file_name)
    }
}

impl DocumentBackend for FileDocument {
    fn read(&self) -> StorageResult<Option<String>> {
        match self.dir.read_to_string(&self.file_name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                Err(StorageError::parse(err.to_string()))
            }
            Err(err) => Err(io_error(&err)),
        }
    }

    fn write(&self, contents: &str) -> StorageResult<()> {
        let mut file = self
            .dir
            .create(&self.temp_name)
            .map_err(|err| io_error(&err))?;
        file.write_all(contents.as_bytes())
            .map_err(|err| io_error(&err))?;
        file.sync_all().map_err(|err| io_error(&err))?;
        drop(file);
        self.dir
            .rename(&self.temp_name, &self.dir, &self.file_name)
            .map_err(|err| io_error(&err))
    }

    fn clear(&self) -> StorageResult<()> {
        match self.dir.remove_file(&self.file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&err)),
        }
    }

    fn size(&self) -> StorageResult<u64> {
        match self.dir.metadata(&self.file_name) {
            Ok(metadata) => Ok(metadata.len()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(io_error(&err)),
        }
    }

    fn is_available(&self) -> bool {
        self.dir.dir_metadata().is_ok()
    }
}

impl FileStorage {
    /// Opens file storage at `path` with [`DEFAULT_FILE_CAPACITY`].
    ///
    /// # Errors
    ///
    /// See [`FileDocument::open`].
    pub fn open(path: impl Into<Utf8PathBuf>) -> StorageResult<Self> {
        let document_path = path.into();
        let document = FileDocument::open(&document_path)?;
        Ok(Self::new(document).with_capacity(DEFAULT_FILE_CAPACITY))
    }
}

fn io_error(err: &std::io::Error) -> StorageError {
    let code = match err.kind() {
        ErrorKind::StorageFull => StorageErrorCode::QuotaExceeded,
        ErrorKind::TimedOut => StorageErrorCode::Timeout,
        _ => StorageErrorCode::StorageUnavailable,
    };
    StorageError::new(code, err.to_string())
}
