//! The export run: catalog enumeration, per-container tree copy, metadata.
//!
//! One container is fully processed before the next begins. Per-container
//! and per-file failures are absorbed and the run continues; only catalog
//! enumeration and destination-root setup escalate.

use crate::catalog::{self, Catalog, CatalogKind};
use crate::copy::{copy_tree, CopyStats};
use crate::error::{report_failure, ExportError};
use crate::layout::{Layout, EXT_CLASSIFIER, SAVE_CLASSIFIER};
use crate::metadata::export_metadata;
use crate::path::{PathSpec, SaveBinaryPath};
use crate::vfs::{Archive, ArchiveKind, StorageDriver};

/// What happened to one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerOutcome {
    /// Tree copied without a single failure.
    Exported,
    /// Tree copied, but some files or directories were skipped.
    Partial,
    /// The source archive could not be opened.
    OpenFailed,
    /// The entry's classifier bits did not match the pass.
    Rejected,
}

/// Per-container record in the run summary.
#[derive(Debug, Clone, Copy)]
pub struct ContainerReport {
    pub id: u64,
    pub kind: CatalogKind,
    pub outcome: ContainerOutcome,
    pub stats: CopyStats,
}

/// Summary of one export run. "All done!" alone does not mean full success;
/// this does.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub containers: Vec<ContainerReport>,
}

impl ExportReport {
    pub fn exported(&self) -> usize {
        self.containers
            .iter()
            .filter(|c| {
                matches!(
                    c.outcome,
                    ContainerOutcome::Exported | ContainerOutcome::Partial
                )
            })
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.containers.len() - self.exported()
    }

    /// True when every container exported with nothing skipped.
    pub fn clean(&self) -> bool {
        self.containers
            .iter()
            .all(|c| c.outcome == ContainerOutcome::Exported)
    }
}

/// Drives the whole export against a storage driver and a catalog service.
pub struct Exporter<'a> {
    driver: &'a dyn StorageDriver,
    catalog: &'a dyn Catalog,
    layout: Layout,
}

impl<'a> Exporter<'a> {
    pub fn new(driver: &'a dyn StorageDriver, catalog: &'a dyn Catalog) -> Self {
        Self::with_layout(driver, catalog, Layout::default())
    }

    pub fn with_layout(
        driver: &'a dyn StorageDriver,
        catalog: &'a dyn Catalog,
        layout: Layout,
    ) -> Self {
        Self {
            driver,
            catalog,
            layout,
        }
    }

    /// Runs destination setup, the save pass, and the extra-data pass.
    pub fn run(&self) -> Result<ExportReport, ExportError> {
        let dest = self.prepare_destination()?;
        let mut report = ExportReport::default();
        self.export_saves(dest.as_ref(), &mut report)?;
        self.export_ext(dest.as_ref(), &mut report)?;
        Ok(report)
    }

    /// Opens the destination archive and recreates the export root from
    /// scratch.
    fn prepare_destination(&self) -> Result<Box<dyn Archive>, ExportError> {
        let dest = self
            .driver
            .open_archive(ArchiveKind::Sdmc, &PathSpec::Empty)
            .map_err(|source| ExportError::Setup {
                op: "OpenArchive (dest)",
                source,
            })?;

        if let Err(err) = dest.remove_dir_all(&PathSpec::text(self.layout.root())) {
            report_failure("DeleteDirectory (dest root)", &err);
        }
        for dir in self.layout.base_dirs() {
            dest.create_dir(&PathSpec::text(&dir))
                .map_err(|source| ExportError::Setup {
                    op: "CreateDirectory (dest root)",
                    source,
                })?;
        }
        Ok(dest)
    }

    fn export_saves(
        &self,
        dest: &dyn Archive,
        report: &mut ExportReport,
    ) -> Result<(), ExportError> {
        println!("Dumping save archives...");

        let ids = catalog::list_counted(self.catalog, CatalogKind::Titles)?;
        println!("Title count: {}", ids.len());

        for id in ids {
            // The title catalog legitimately holds other classifiers;
            // only application saves are exported.
            if (id >> 32) as u32 != SAVE_CLASSIFIER {
                continue;
            }

            let address = SaveBinaryPath::new(id);
            let archive = match self
                .driver
                .open_archive(ArchiveKind::UserSave, &address.spec())
            {
                Ok(archive) => archive,
                Err(err) => {
                    report_failure("OpenArchive (save)", &err);
                    report.containers.push(ContainerReport {
                        id,
                        kind: CatalogKind::Titles,
                        outcome: ContainerOutcome::OpenFailed,
                        stats: CopyStats::default(),
                    });
                    continue;
                }
            };

            println!("Title: {:016X}", id);
            tracing::debug!("exporting save container {:016x}", id);

            let container_dir = self.layout.save_dir(id as u32);
            let data_dir = format!("{}/data", container_dir);
            for dir in [&container_dir, &data_dir] {
                if let Err(err) = dest.create_dir(&PathSpec::text(dir)) {
                    report_failure("CreateDirectory (dest)", &err);
                }
            }
            let tree_dir = format!("{}/00000001", data_dir);
            let metadata_path = format!("{}/00000001.metadata", data_dir);

            let stats = copy_tree(archive.as_ref(), "", dest, &tree_dir);
            drop(archive);

            if let Err(err) = export_metadata(
                self.driver,
                ArchiveKind::UserSave,
                &address.spec(),
                dest,
                &metadata_path,
            ) {
                report_failure("WriteMetadata (save)", &err);
            }

            report.containers.push(ContainerReport {
                id,
                kind: CatalogKind::Titles,
                outcome: if stats.clean() {
                    ContainerOutcome::Exported
                } else {
                    ContainerOutcome::Partial
                },
                stats,
            });
        }

        println!("Done");
        Ok(())
    }

    fn export_ext(
        &self,
        dest: &dyn Archive,
        report: &mut ExportReport,
    ) -> Result<(), ExportError> {
        println!("Dumping extra-data archives...");

        let ids = catalog::list_growing(self.catalog, CatalogKind::ExtData)?;
        println!("Extra-data count: {}", ids.len());

        for id in ids {
            println!("Ext: {:016X}", id);

            if (id >> 32) as u32 != EXT_CLASSIFIER {
                eprintln!("unexpected classifier bits in {:016X}, skipping", id);
                report.containers.push(ContainerReport {
                    id,
                    kind: CatalogKind::ExtData,
                    outcome: ContainerOutcome::Rejected,
                    stats: CopyStats::default(),
                });
                continue;
            }
            tracing::debug!("exporting extra-data container {:016x}", id);

            let container_dir = self.layout.ext_dir(id as u32);
            let user_dir = format!("{}/user", container_dir);
            let boss_dir = format!("{}/boss", container_dir);
            let metadata_path = format!("{}/metadata", container_dir);
            for dir in [&container_dir, &user_dir, &boss_dir] {
                if let Err(err) = dest.create_dir(&PathSpec::text(dir)) {
                    report_failure("CreateDirectory (dest)", &err);
                }
            }

            let address = SaveBinaryPath::new(id);
            match self
                .driver
                .open_archive(ArchiveKind::ExtData, &address.spec())
            {
                Ok(archive) => {
                    let stats = copy_tree(archive.as_ref(), "", dest, &user_dir);
                    report.containers.push(ContainerReport {
                        id,
                        kind: CatalogKind::ExtData,
                        outcome: if stats.clean() {
                            ContainerOutcome::Exported
                        } else {
                            ContainerOutcome::Partial
                        },
                        stats,
                    });
                }
                Err(err) => {
                    report_failure("OpenArchive (ext)", &err);
                    report.containers.push(ContainerReport {
                        id,
                        kind: CatalogKind::ExtData,
                        outcome: ContainerOutcome::OpenFailed,
                        stats: CopyStats::default(),
                    });
                }
            }

            // The record is written even when the archive failed to open.
            if let Err(err) = export_metadata(
                self.driver,
                ArchiveKind::ExtData,
                &address.spec(),
                dest,
                &metadata_path,
            ) {
                report_failure("WriteMetadata (ext)", &err);
            }
        }

        println!("Done");
        Ok(())
    }
}
