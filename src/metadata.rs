//! Fixed-layout archive metadata records.
//!
//! Each exported container gets a 16-byte record of its allocation
//! statistics, written next to the copied tree. The byte layout is part of
//! the on-disk contract with the consuming emulator and never changes.

use crate::error::{report_failure, DriverError};
use crate::path::PathSpec;
use crate::vfs::{Archive, ArchiveKind, DriverResult, OpenMode, StorageDriver};

/// Serialized size of a record.
pub const FORMAT_INFO_LEN: usize = 16;

/// Allocation statistics for one archive.
///
/// Serialized as three little-endian u32 fields, one flag byte, and three
/// zero pad bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveFormatInfo {
    pub total_size: u32,
    pub number_directories: u32,
    pub number_files: u32,
    pub duplicate_data: bool,
}

impl ArchiveFormatInfo {
    pub fn to_bytes(&self) -> [u8; FORMAT_INFO_LEN] {
        let mut out = [0u8; FORMAT_INFO_LEN];
        out[0..4].copy_from_slice(&self.total_size.to_le_bytes());
        out[4..8].copy_from_slice(&self.number_directories.to_le_bytes());
        out[8..12].copy_from_slice(&self.number_files.to_le_bytes());
        out[12] = self.duplicate_data as u8;
        out
    }

    pub fn from_bytes(bytes: &[u8; FORMAT_INFO_LEN]) -> Self {
        let word = |at: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[at..at + 4]);
            u32::from_le_bytes(buf)
        };
        Self {
            total_size: word(0),
            number_directories: word(4),
            number_files: word(8),
            duplicate_data: bytes[12] != 0,
        }
    }
}

/// Queries allocation statistics for the archive at `address` and writes the
/// 16-byte record to `dst_path` in the destination archive.
///
/// A failed query is reported and leaves the record zeroed; the record is
/// written either way. A short write is a size-mismatch failure.
pub fn export_metadata(
    driver: &dyn StorageDriver,
    kind: ArchiveKind,
    address: &PathSpec,
    dst: &dyn Archive,
    dst_path: &str,
) -> DriverResult<()> {
    let mut info = ArchiveFormatInfo::default();
    match driver.format_info(kind, address) {
        Ok(queried) => info = queried,
        Err(err) => report_failure("GetFormatInfo", &err),
    }

    let mut file = dst.open_file(&PathSpec::text(dst_path), OpenMode::WriteCreate)?;
    let bytes = info.to_bytes();
    let written = file.write(&bytes)?;
    if written != bytes.len() as u64 {
        return Err(DriverError::SizeMismatch {
            expected: bytes.len() as u64,
            actual: written,
        });
    }
    Ok(())
}
