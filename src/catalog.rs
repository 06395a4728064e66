//! Container catalog seam.
//!
//! The catalog service enumerates the 64-bit container ids available on the
//! source device. Two enumeration strategies exist: counted (ask how many,
//! then list exactly that many) and growing (list with a doubling capacity
//! until the service returns fewer entries than asked for). The extra-data
//! side of the device answers no count query, hence the second strategy.

use crate::error::ExportError;
use crate::vfs::DriverResult;

/// The kind of container a catalog query enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// Installed application titles (save-data owners).
    Titles,
    /// Extra-data stores.
    ExtData,
}

/// Enumerates the container ids available on the source device.
pub trait Catalog {
    fn count(&self, kind: CatalogKind) -> DriverResult<u32>;

    /// Up to `max` ids. A result filling the whole capacity means more may
    /// be available.
    fn list(&self, kind: CatalogKind, max: u32) -> DriverResult<Vec<u64>>;
}

/// Counts, then lists exactly that many ids. The two calls disagreeing is
/// fatal to the run.
pub fn list_counted(catalog: &dyn Catalog, kind: CatalogKind) -> Result<Vec<u64>, ExportError> {
    let counted = catalog
        .count(kind)
        .map_err(|source| ExportError::Catalog { op: "CountContainers", source })?;
    let ids = catalog
        .list(kind, counted)
        .map_err(|source| ExportError::Catalog { op: "ListContainers", source })?;
    if ids.len() as u32 != counted {
        return Err(ExportError::CountMismatch {
            counted,
            listed: ids.len() as u32,
        });
    }
    Ok(ids)
}

/// Starting capacity for the growing enumeration.
const INITIAL_CAPACITY: u32 = 4;

/// Lists ids without a prior count. An undersized result is authoritative;
/// a full one re-queries with doubled capacity. A result exceeding the
/// requested capacity breaks the service contract and is fatal.
pub fn list_growing(catalog: &dyn Catalog, kind: CatalogKind) -> Result<Vec<u64>, ExportError> {
    let mut capacity = INITIAL_CAPACITY;
    loop {
        let ids = catalog
            .list(kind, capacity)
            .map_err(|source| ExportError::Catalog { op: "ListContainers", source })?;
        let returned = ids.len() as u32;
        if returned > capacity {
            return Err(ExportError::CapacityOverflow { returned, capacity });
        }
        if returned < capacity {
            return Ok(ids);
        }
        capacity *= 2;
    }
}
