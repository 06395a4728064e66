use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single storage-driver operation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io { source: io::Error, path: PathBuf },

    /// Fewer (or more) bytes were transferred than a read or write asked for.
    #[error("size mismatch: expected {expected} bytes, transferred {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The path spec does not address anything this driver can resolve.
    #[error("unsupported archive address")]
    BadAddress,
}

/// Errors that abort an export run as a whole.
///
/// Everything else is absorbed per-file or per-container; see the
/// orchestrator in [`crate::export`].
#[derive(Debug, Error)]
pub enum ExportError {
    /// The destination root could not be prepared.
    #[error("{op}: {source}")]
    Setup { op: &'static str, source: DriverError },

    /// The catalog service failed while counting or listing containers.
    #[error("{op}: {source}")]
    Catalog { op: &'static str, source: DriverError },

    /// The catalog listed a different number of containers than it counted.
    #[error("catalog count mismatch: counted {counted}, listed {listed}")]
    CountMismatch { counted: u32, listed: u32 },

    /// The catalog handed back more entries than the requested capacity.
    #[error("catalog returned {returned} entries for capacity {capacity}")]
    CapacityOverflow { returned: u32, capacity: u32 },
}

/// Prints the one-line `<operation>: <error>` diagnostic used for failures
/// that the run absorbs and continues past.
pub(crate) fn report_failure(op: &str, err: &DriverError) {
    eprintln!("{}: {}", op, err);
}
