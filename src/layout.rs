//! Destination directory layout.
//!
//! The consuming emulator expects an exact on-disk shape, so every literal
//! segment lives here rather than inline in the orchestrator. The full tree
//! is
//!
//! ```text
//! /save-to-citra/sdmc/Nintendo 3DS/<device id>/<profile id>/
//!     title/00040000/<low id>/data/00000001/...      (copied save tree)
//!     title/00040000/<low id>/data/00000001.metadata (16-byte record)
//!     extdata/00000000/<low id>/{user,boss,metadata}
//! ```

use crate::path::hex32;

/// Root directory recreated on every run.
pub const EXPORT_ROOT: &str = "/save-to-citra";

/// SD card mount directory under the export root.
pub const SDMC_DIR: &str = "sdmc";

/// Console data directory as the emulator names it.
pub const CONSOLE_DIR: &str = "Nintendo 3DS";

/// Zero-filled device identifier segment.
pub const DEVICE_ID: &str = "00000000000000000000000000000000";

/// Zero-filled profile identifier segment.
pub const PROFILE_ID: &str = DEVICE_ID;

/// Classifier (high word) of application save-data container ids; also
/// names their subtree.
pub const SAVE_CLASSIFIER: u32 = 0x00040000;

/// Classifier expected of extra-data container ids.
pub const EXT_CLASSIFIER: u32 = 0;

const TITLE_DIR: &str = "title";
const EXTDATA_DIR: &str = "extdata";

/// Destination path synthesis rooted at a configurable export root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(EXPORT_ROOT)
    }
}

impl Layout {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// The media root holding the `title` and `extdata` subtrees.
    fn media_root(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.root, SDMC_DIR, CONSOLE_DIR, DEVICE_ID, PROFILE_ID
        )
    }

    /// Base of the save-data subtree.
    pub fn save_root(&self) -> String {
        format!("{}/{}/{}", self.media_root(), TITLE_DIR, hex32(SAVE_CLASSIFIER))
    }

    /// Base of the extra-data subtree.
    pub fn ext_root(&self) -> String {
        format!("{}/{}/{}", self.media_root(), EXTDATA_DIR, hex32(EXT_CLASSIFIER))
    }

    /// Per-container save directory, named by the id's low word.
    pub fn save_dir(&self, low: u32) -> String {
        format!("{}/{}", self.save_root(), hex32(low))
    }

    /// Per-container extra-data directory, named by the id's low word.
    pub fn ext_dir(&self, low: u32) -> String {
        format!("{}/{}", self.ext_root(), hex32(low))
    }

    /// Every directory the run creates before touching containers, in
    /// creation order.
    pub fn base_dirs(&self) -> Vec<String> {
        let mut dirs = vec![self.root.clone()];
        let mut path = self.root.clone();
        for segment in [SDMC_DIR, CONSOLE_DIR, DEVICE_ID, PROFILE_ID] {
            path.push('/');
            path.push_str(segment);
            dirs.push(path.clone());
        }
        dirs.push(format!("{}/{}", path, TITLE_DIR));
        dirs.push(self.save_root());
        dirs.push(format!("{}/{}", path, EXTDATA_DIR));
        dirs.push(self.ext_root());
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dirs_are_ordered_parents_first() {
        let layout = Layout::default();
        let dirs = layout.base_dirs();
        assert_eq!(dirs[0], "/save-to-citra");
        assert_eq!(dirs[1], "/save-to-citra/sdmc");
        assert_eq!(dirs[2], "/save-to-citra/sdmc/Nintendo 3DS");
        assert_eq!(
            dirs.last().unwrap(),
            "/save-to-citra/sdmc/Nintendo 3DS/00000000000000000000000000000000/00000000000000000000000000000000/extdata/00000000"
        );
        for dir in &dirs[1..] {
            let parent = &dir[..dir.rfind('/').unwrap()];
            assert!(
                dirs.iter().any(|d| d == parent),
                "parent of {} missing",
                dir
            );
        }
    }

    #[test]
    fn container_paths_use_low_word_hex() {
        let layout = Layout::default();
        assert_eq!(
            layout.save_dir(0x1234),
            "/save-to-citra/sdmc/Nintendo 3DS/00000000000000000000000000000000/00000000000000000000000000000000/title/00040000/00001234"
        );
        assert_eq!(
            layout.ext_dir(0x42),
            "/save-to-citra/sdmc/Nintendo 3DS/00000000000000000000000000000000/00000000000000000000000000000000/extdata/00000000/00000042"
        );
    }

    #[test]
    fn custom_root_flows_through() {
        let layout = Layout::new("/elsewhere");
        assert!(layout.save_root().starts_with("/elsewhere/sdmc/"));
        assert_eq!(layout.base_dirs()[0], "/elsewhere");
    }
}
