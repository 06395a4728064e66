//! Directory enumeration and the tree copy engine.
//!
//! `copy_tree` mirrors a source archive's directory structure into a
//! destination archive and streams every file across whole. Failures inside
//! a tree are reported and skipped; the rest of the tree is still processed.

use crate::error::{report_failure, DriverError};
use crate::path::PathSpec;
use crate::vfs::{Archive, DirEntry, DriverResult, OpenMode};

/// Counters for one tree copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    /// Directories mirrored into the destination.
    pub directories: u64,
    pub files_copied: u64,
    pub files_failed: u64,
    /// Directories that could not be created or enumerated.
    pub dirs_failed: u64,
}

impl CopyStats {
    /// True when nothing in the tree was skipped.
    pub fn clean(&self) -> bool {
        self.files_failed == 0 && self.dirs_failed == 0
    }
}

/// Reads every entry of the directory at `path`.
///
/// Entries come back one at a time until the driver signals
/// end-of-directory; the handle is released on every exit path. Order is
/// whatever the driver reports.
pub fn list_entries(archive: &dyn Archive, path: &str) -> DriverResult<Vec<DirEntry>> {
    let mut dir = archive.open_dir(&PathSpec::text(path))?;
    let mut entries = Vec::new();
    while let Some(entry) = dir.read_next()? {
        entries.push(entry);
    }
    Ok(entries)
}

/// Mirrors the tree under `src_root` into `dst_root`.
///
/// Traverses with an explicit work list rather than recursing, so tree
/// depth is bounded by memory, not the call stack. An empty `src_root`
/// means the archive root.
pub fn copy_tree(
    src: &dyn Archive,
    src_root: &str,
    dst: &dyn Archive,
    dst_root: &str,
) -> CopyStats {
    let mut stats = CopyStats::default();
    let mut pending = vec![(src_root.to_string(), dst_root.to_string())];

    while let Some((src_path, dst_path)) = pending.pop() {
        tracing::debug!("copying directory {:?} -> {:?}", src_path, dst_path);
        if let Err(err) = dst.create_dir(&PathSpec::text(&dst_path)) {
            report_failure("CreateDirectory (dest)", &err);
            stats.dirs_failed += 1;
            continue;
        }
        stats.directories += 1;

        // An empty text path is ambiguous with "no path" at the driver
        // level; enumerate the root explicitly.
        let list_path = if src_path.is_empty() { "/" } else { src_path.as_str() };
        let entries = match list_entries(src, list_path) {
            Ok(entries) => entries,
            Err(err) => {
                report_failure("ReadDirectory (source)", &err);
                stats.dirs_failed += 1;
                continue;
            }
        };

        for entry in entries {
            let sub_src = format!("{}/{}", src_path, entry.name);
            let sub_dst = format!("{}/{}", dst_path, entry.name);
            if entry.is_dir {
                pending.push((sub_src, sub_dst));
            } else if copy_file(src, &sub_src, dst, &sub_dst).is_err() {
                eprintln!(" {}", sub_src);
                stats.files_failed += 1;
            } else {
                stats.files_copied += 1;
            }
        }
    }

    stats
}

/// Reports the failing operation and passes the error through.
fn noted(op: &'static str, err: DriverError) -> DriverError {
    report_failure(op, &err);
    err
}

/// Copies one file whole: a single full-size read, then a single write. A
/// transfer moving fewer bytes than asked for fails the file.
fn copy_file(
    src: &dyn Archive,
    src_path: &str,
    dst: &dyn Archive,
    dst_path: &str,
) -> DriverResult<()> {
    let mut buffer = Vec::new();
    {
        let mut file = src
            .open_file(&PathSpec::text(src_path), OpenMode::Read)
            .map_err(|e| noted("OpenFile (source)", e))?;
        let size = file.size().map_err(|e| noted("GetSize (source)", e))?;
        if size > 0 {
            buffer = vec![0u8; size as usize];
            let read = file
                .read(&mut buffer)
                .map_err(|e| noted("Read (source)", e))?;
            if read != size {
                return Err(noted(
                    "Read (source)",
                    DriverError::SizeMismatch {
                        expected: size,
                        actual: read,
                    },
                ));
            }
        }
    }

    let mut file = dst
        .open_file(&PathSpec::text(dst_path), OpenMode::WriteCreate)
        .map_err(|e| noted("OpenFile (dest)", e))?;
    if !buffer.is_empty() {
        let written = file
            .write(&buffer)
            .map_err(|e| noted("Write (dest)", e))?;
        if written != buffer.len() as u64 {
            return Err(noted(
                "Write (dest)",
                DriverError::SizeMismatch {
                    expected: buffer.len() as u64,
                    actual: written,
                },
            ));
        }
    }
    Ok(())
}
