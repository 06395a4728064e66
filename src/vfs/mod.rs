//! Storage driver seam.
//!
//! The copy engine never touches the host filesystem directly; everything
//! goes through these capability traits so the same engine runs against any
//! mountable container. Handles are released by `Drop`, which closes them on
//! every exit path.

use crate::error::DriverError;
use crate::metadata::ArchiveFormatInfo;
use crate::path::PathSpec;

pub mod host;

pub type DriverResult<T> = Result<T, DriverError>;

/// The kind of archive an address resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// The destination SD card root.
    Sdmc,
    /// A per-application save-data store.
    UserSave,
    /// A per-application extra-data store.
    ExtData,
}

/// One directory entry, as the driver reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// File open disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Open for writing, creating or truncating as needed.
    WriteCreate,
}

/// Mounts archives and answers allocation queries about them.
pub trait StorageDriver {
    /// Opens the archive at `path`. A failed open yields no handle.
    fn open_archive(&self, kind: ArchiveKind, path: &PathSpec) -> DriverResult<Box<dyn Archive>>;

    /// Allocation statistics for the archive at `path`.
    fn format_info(&self, kind: ArchiveKind, path: &PathSpec) -> DriverResult<ArchiveFormatInfo>;
}

/// An open archive.
pub trait Archive {
    fn open_dir(&self, path: &PathSpec) -> DriverResult<Box<dyn DirHandle>>;

    fn open_file(&self, path: &PathSpec, mode: OpenMode) -> DriverResult<Box<dyn FileHandle>>;

    /// Creates a directory. A pre-existing directory is not an error.
    fn create_dir(&self, path: &PathSpec) -> DriverResult<()>;

    /// Removes a directory tree. A missing target is not an error.
    fn remove_dir_all(&self, path: &PathSpec) -> DriverResult<()>;
}

/// An open directory, read one entry at a time.
pub trait DirHandle {
    /// The next entry, or `None` at end-of-directory.
    fn read_next(&mut self) -> DriverResult<Option<DirEntry>>;
}

/// An open file.
pub trait FileHandle {
    fn size(&mut self) -> DriverResult<u64>;

    /// Reads into `buf`, returning the number of bytes transferred.
    fn read(&mut self, buf: &mut [u8]) -> DriverResult<u64>;

    /// Writes `buf`, returning the number of bytes transferred.
    fn write(&mut self, buf: &[u8]) -> DriverResult<u64>;
}
