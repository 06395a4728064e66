//! Host-filesystem implementations of the driver and catalog seams.
//!
//! Save and extra-data archives live as directories named by the 16
//! lowercase hex digits of their container id under the configured source
//! roots; the destination archive is the output root itself. This is the
//! implementation the CLI runs against, and the tests too.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, CatalogKind};
use crate::error::DriverError;
use crate::metadata::ArchiveFormatInfo;
use crate::path::{decode_container_id, PathSpec};
use crate::vfs::{
    Archive, ArchiveKind, DirEntry, DirHandle, DriverResult, FileHandle, OpenMode, StorageDriver,
};

fn io_err(path: &Path, source: io::Error) -> DriverError {
    DriverError::Io {
        source,
        path: path.to_path_buf(),
    }
}

/// Driver mapping archive addresses onto host directories.
pub struct HostDriver {
    saves_root: PathBuf,
    extdata_root: PathBuf,
    sdmc_root: PathBuf,
}

impl HostDriver {
    pub fn new(saves_root: PathBuf, extdata_root: PathBuf, sdmc_root: PathBuf) -> Self {
        Self {
            saves_root,
            extdata_root,
            sdmc_root,
        }
    }

    fn archive_root(&self, kind: ArchiveKind, path: &PathSpec) -> DriverResult<PathBuf> {
        match kind {
            ArchiveKind::Sdmc => Ok(self.sdmc_root.clone()),
            ArchiveKind::UserSave => addressed_root(&self.saves_root, path),
            ArchiveKind::ExtData => addressed_root(&self.extdata_root, path),
        }
    }
}

fn addressed_root(base: &Path, path: &PathSpec) -> DriverResult<PathBuf> {
    let id = decode_container_id(path).ok_or(DriverError::BadAddress)?;
    Ok(base.join(format!("{:016x}", id)))
}

impl StorageDriver for HostDriver {
    fn open_archive(&self, kind: ArchiveKind, path: &PathSpec) -> DriverResult<Box<dyn Archive>> {
        let root = self.archive_root(kind, path)?;
        match kind {
            // The destination root is created on first open.
            ArchiveKind::Sdmc => fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?,
            _ => {
                if !root.is_dir() {
                    return Err(io_err(
                        &root,
                        io::Error::new(io::ErrorKind::NotFound, "archive directory not found"),
                    ));
                }
            }
        }
        Ok(Box::new(HostArchive { root }))
    }

    fn format_info(&self, kind: ArchiveKind, path: &PathSpec) -> DriverResult<ArchiveFormatInfo> {
        let root = self.archive_root(kind, path)?;
        scan_format_info(&root)
    }
}

/// Walks an archive directory computing the statistics the metadata record
/// reports. Sizes saturate at the field width.
fn scan_format_info(root: &Path) -> DriverResult<ArchiveFormatInfo> {
    let mut info = ArchiveFormatInfo::default();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            let meta = entry.metadata().map_err(|e| io_err(&entry.path(), e))?;
            if meta.is_dir() {
                info.number_directories += 1;
                pending.push(entry.path());
            } else {
                info.number_files += 1;
                let len = u32::try_from(meta.len()).unwrap_or(u32::MAX);
                info.total_size = info.total_size.saturating_add(len);
            }
        }
    }
    Ok(info)
}

struct HostArchive {
    root: PathBuf,
}

impl HostArchive {
    /// Resolves a text path spec against the archive root. Empty segments
    /// collapse, so `""`, `"/"` and the empty spec all mean the root.
    fn resolve(&self, path: &PathSpec) -> DriverResult<PathBuf> {
        match path {
            PathSpec::Empty => Ok(self.root.clone()),
            PathSpec::Text(text) => {
                let mut full = self.root.clone();
                for segment in text.split('/').filter(|s| !s.is_empty()) {
                    full.push(segment);
                }
                Ok(full)
            }
            PathSpec::Binary(_) => Err(DriverError::BadAddress),
        }
    }
}

impl Archive for HostArchive {
    fn open_dir(&self, path: &PathSpec) -> DriverResult<Box<dyn DirHandle>> {
        let full = self.resolve(path)?;
        let inner = fs::read_dir(&full).map_err(|e| io_err(&full, e))?;
        Ok(Box::new(HostDirHandle { path: full, inner }))
    }

    fn open_file(&self, path: &PathSpec, mode: OpenMode) -> DriverResult<Box<dyn FileHandle>> {
        let full = self.resolve(path)?;
        let file = match mode {
            OpenMode::Read => fs::File::open(&full),
            OpenMode::WriteCreate => fs::File::create(&full),
        }
        .map_err(|e| io_err(&full, e))?;
        Ok(Box::new(HostFileHandle { path: full, file }))
    }

    fn create_dir(&self, path: &PathSpec) -> DriverResult<()> {
        let full = self.resolve(path)?;
        match fs::create_dir(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(io_err(&full, e)),
        }
    }

    fn remove_dir_all(&self, path: &PathSpec) -> DriverResult<()> {
        let full = self.resolve(path)?;
        match fs::remove_dir_all(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&full, e)),
        }
    }
}

struct HostDirHandle {
    path: PathBuf,
    inner: fs::ReadDir,
}

impl DirHandle for HostDirHandle {
    fn read_next(&mut self) -> DriverResult<Option<DirEntry>> {
        match self.inner.next() {
            None => Ok(None),
            Some(Err(e)) => Err(io_err(&self.path, e)),
            Some(Ok(entry)) => {
                let is_dir = entry
                    .file_type()
                    .map_err(|e| io_err(&entry.path(), e))?
                    .is_dir();
                Ok(Some(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    is_dir,
                }))
            }
        }
    }
}

struct HostFileHandle {
    path: PathBuf,
    file: fs::File,
}

impl FileHandle for HostFileHandle {
    fn size(&mut self) -> DriverResult<u64> {
        let meta = self.file.metadata().map_err(|e| io_err(&self.path, e))?;
        Ok(meta.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> DriverResult<u64> {
        use std::io::Read;
        let mut total = 0usize;
        while total < buf.len() {
            match self.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_err(&self.path, e)),
            }
        }
        Ok(total as u64)
    }

    fn write(&mut self, buf: &[u8]) -> DriverResult<u64> {
        use std::io::Write;
        self.file.write_all(buf).map_err(|e| io_err(&self.path, e))?;
        Ok(buf.len() as u64)
    }
}

/// Catalog scanning the source roots for container directories.
pub struct HostCatalog {
    saves_root: PathBuf,
    extdata_root: PathBuf,
}

impl HostCatalog {
    pub fn new(saves_root: PathBuf, extdata_root: PathBuf) -> Self {
        Self {
            saves_root,
            extdata_root,
        }
    }

    fn kind_root(&self, kind: CatalogKind) -> &Path {
        match kind {
            CatalogKind::Titles => &self.saves_root,
            CatalogKind::ExtData => &self.extdata_root,
        }
    }

    /// All container ids under the kind's root, sorted for a deterministic
    /// export order. A missing root reads as an empty catalog.
    fn scan(&self, kind: CatalogKind) -> DriverResult<Vec<u64>> {
        let root = self.kind_root(kind);
        let mut ids = Vec::new();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(io_err(root, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_err(root, e))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Some(id) = parse_container_id(name) {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Parses a 16-hex-digit directory name into a container id.
fn parse_container_id(name: &str) -> Option<u64> {
    if name.len() != 16 {
        return None;
    }
    u64::from_str_radix(name, 16).ok()
}

impl Catalog for HostCatalog {
    fn count(&self, kind: CatalogKind) -> DriverResult<u32> {
        Ok(self.scan(kind)?.len() as u32)
    }

    fn list(&self, kind: CatalogKind, max: u32) -> DriverResult<Vec<u64>> {
        let mut ids = self.scan(kind)?;
        ids.truncate(max as usize);
        Ok(ids)
    }
}
