use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use savedump::catalog::{Catalog, CatalogKind};
use savedump::export::{ContainerOutcome, Exporter};
use savedump::metadata::{ArchiveFormatInfo, FORMAT_INFO_LEN};
use savedump::vfs::host::{HostCatalog, HostDriver};
use savedump::vfs::DriverResult;

/// Catalog with pre-baked id lists, independent of what actually exists on
/// disk, so runs can be pointed at containers that fail to open.
struct FixedCatalog {
    titles: Vec<u64>,
    ext: Vec<u64>,
}

impl Catalog for FixedCatalog {
    fn count(&self, kind: CatalogKind) -> DriverResult<u32> {
        Ok(match kind {
            CatalogKind::Titles => self.titles.len() as u32,
            CatalogKind::ExtData => self.ext.len() as u32,
        })
    }

    fn list(&self, kind: CatalogKind, max: u32) -> DriverResult<Vec<u64>> {
        let ids = match kind {
            CatalogKind::Titles => &self.titles,
            CatalogKind::ExtData => &self.ext,
        };
        Ok(ids.iter().copied().take(max as usize).collect())
    }
}

fn media_root(output: &Path) -> PathBuf {
    output
        .join("save-to-citra/sdmc/Nintendo 3DS")
        .join("00000000000000000000000000000000")
        .join("00000000000000000000000000000000")
}

fn plant_container(base: &Path, id: u64) -> PathBuf {
    let root = base.join(format!("{:016x}", id));
    fs::create_dir_all(&root).unwrap();
    root
}

#[test]
fn exports_single_save_container_end_to_end() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let saves = source.path().join("saves");
    let extdata = source.path().join("extdata");

    let save_root = plant_container(&saves, 0x0004000000001234);
    let payload: Vec<u8> = (0..100u8).collect();
    fs::write(save_root.join("save.dat"), &payload).unwrap();

    let driver = HostDriver::new(saves.clone(), extdata.clone(), output.path().to_path_buf());
    let catalog = HostCatalog::new(saves, extdata);
    let report = Exporter::new(&driver, &catalog).run().unwrap();

    assert!(report.clean());
    assert_eq!(report.exported(), 1);

    let title_dir = media_root(output.path()).join("title/00040000/00001234");
    let copied = title_dir.join("data/00000001/save.dat");
    assert_eq!(fs::read(copied).unwrap(), payload);

    let metadata = fs::read(title_dir.join("data/00000001.metadata")).unwrap();
    assert_eq!(metadata.len(), FORMAT_INFO_LEN);
    let info = ArchiveFormatInfo::from_bytes(&metadata.try_into().unwrap());
    assert_eq!(info.total_size, 100);
    assert_eq!(info.number_files, 1);
    assert_eq!(info.number_directories, 0);
    assert!(!info.duplicate_data);
}

#[test]
fn run_continues_past_containers_that_fail_to_open() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let saves = source.path().join("saves");
    let extdata = source.path().join("extdata");
    fs::create_dir_all(&extdata).unwrap();

    let good = plant_container(&saves, 0x0004000000000002);
    fs::write(good.join("data.bin"), b"still exported").unwrap();

    // The first id has no backing directory and cannot be opened.
    let catalog = FixedCatalog {
        titles: vec![0x0004000000000001, 0x0004000000000002],
        ext: Vec::new(),
    };
    let driver = HostDriver::new(saves, extdata, output.path().to_path_buf());
    let report = Exporter::new(&driver, &catalog).run().unwrap();

    assert_eq!(report.containers.len(), 2);
    assert_eq!(report.containers[0].outcome, ContainerOutcome::OpenFailed);
    assert_eq!(report.containers[1].outcome, ContainerOutcome::Exported);
    assert_eq!(report.exported(), 1);
    assert_eq!(report.skipped(), 1);

    let copied = media_root(output.path()).join("title/00040000/00000002/data/00000001/data.bin");
    assert_eq!(fs::read(copied).unwrap(), b"still exported");
}

#[test]
fn title_catalog_entries_with_other_classifiers_are_ignored() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let saves = source.path().join("saves");
    let extdata = source.path().join("extdata");
    fs::create_dir_all(&extdata).unwrap();

    // A system title sharing the catalog; it must not be exported even
    // though its directory exists.
    let system = plant_container(&saves, 0x0004001000005678);
    fs::write(system.join("nope.bin"), b"no").unwrap();
    let app = plant_container(&saves, 0x0004000000009999);
    fs::write(app.join("yes.bin"), b"yes").unwrap();

    let driver = HostDriver::new(saves.clone(), extdata.clone(), output.path().to_path_buf());
    let catalog = HostCatalog::new(saves, extdata);
    let report = Exporter::new(&driver, &catalog).run().unwrap();

    assert_eq!(report.containers.len(), 1);
    assert_eq!(report.containers[0].id, 0x0004000000009999);

    let title_root = media_root(output.path()).join("title/00040000");
    assert!(title_root.join("00009999").is_dir());
    assert!(!title_root.join("00005678").exists());
}

#[test]
fn ext_pass_builds_user_boss_and_metadata() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let saves = source.path().join("saves");
    let extdata = source.path().join("extdata");
    fs::create_dir_all(&saves).unwrap();

    let ext_root = plant_container(&extdata, 0x0000000000000042);
    fs::create_dir(ext_root.join("records")).unwrap();
    fs::write(ext_root.join("records/entry.bin"), b"ext payload").unwrap();

    let driver = HostDriver::new(saves.clone(), extdata.clone(), output.path().to_path_buf());
    let catalog = HostCatalog::new(saves, extdata);
    let report = Exporter::new(&driver, &catalog).run().unwrap();

    assert!(report.clean());
    let container = media_root(output.path()).join("extdata/00000000/00000042");
    assert!(container.join("boss").is_dir());
    assert_eq!(
        fs::read(container.join("user/records/entry.bin")).unwrap(),
        b"ext payload"
    );

    let metadata = fs::read(container.join("metadata")).unwrap();
    assert_eq!(metadata.len(), FORMAT_INFO_LEN);
    let info = ArchiveFormatInfo::from_bytes(&metadata.try_into().unwrap());
    assert_eq!(info.number_directories, 1);
    assert_eq!(info.number_files, 1);
}

#[test]
fn ext_entries_with_nonzero_high_bits_are_rejected() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let saves = source.path().join("saves");
    let extdata = source.path().join("extdata");
    fs::create_dir_all(&saves).unwrap();

    let rogue = plant_container(&extdata, 0x0000000100000007);
    fs::write(rogue.join("x.bin"), b"x").unwrap();

    let catalog = FixedCatalog {
        titles: Vec::new(),
        ext: vec![0x0000000100000007],
    };
    let driver = HostDriver::new(saves, extdata, output.path().to_path_buf());
    let report = Exporter::new(&driver, &catalog).run().unwrap();

    assert_eq!(report.containers.len(), 1);
    assert_eq!(report.containers[0].outcome, ContainerOutcome::Rejected);
    // Nothing is created for a rejected entry.
    assert!(!media_root(output.path())
        .join("extdata/00000000/00000007")
        .exists());
}

#[test]
fn rerun_replaces_the_export_root() {
    let source = tempdir().unwrap();
    let output = tempdir().unwrap();
    let saves = source.path().join("saves");
    let extdata = source.path().join("extdata");
    fs::create_dir_all(&extdata).unwrap();

    let save_root = plant_container(&saves, 0x0004000000000001);
    fs::write(save_root.join("a.bin"), b"first run").unwrap();

    let driver = HostDriver::new(saves.clone(), extdata.clone(), output.path().to_path_buf());
    let catalog = HostCatalog::new(saves.clone(), extdata.clone());
    Exporter::new(&driver, &catalog).run().unwrap();

    // Leftovers from the first run must not survive the second.
    let stale = media_root(output.path()).join("title/00040000/deadbeef");
    fs::create_dir_all(&stale).unwrap();
    fs::write(save_root.join("a.bin"), b"second run").unwrap();

    Exporter::new(&driver, &catalog).run().unwrap();
    assert!(!stale.exists());
    let copied = media_root(output.path()).join("title/00040000/00000001/data/00000001/a.bin");
    assert_eq!(fs::read(copied).unwrap(), b"second run");
}
