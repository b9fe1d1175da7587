//! Clap-free settings for the export pipeline.

use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;
use vertrack_probes::DEFAULT_DRAIN_TIMEOUT;

pub const DEFAULT_TOOL_DIR: &str = "VersionTracker";
pub const DEFAULT_ASSETS_DIR: &str = "Assets";

/// Where and how artifacts are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub project_root: Utf8PathBuf,
    /// Asset tree holding integrated components, relative to `project_root`.
    pub assets_dir: Utf8PathBuf,
    /// Output folder name, created next to the asset tree.
    pub tool_dir: String,
    pub strip_spaces: bool,
    pub drain_timeout: Duration,
    pub show_progress: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            assets_dir: Utf8PathBuf::from(DEFAULT_ASSETS_DIR),
            tool_dir: DEFAULT_TOOL_DIR.to_string(),
            strip_spaces: true,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            show_progress: true,
        }
    }
}

impl ExportSettings {
    pub fn assets_root(&self) -> Utf8PathBuf {
        if self.assets_dir.is_absolute() {
            self.assets_dir.clone()
        } else {
            self.project_root.join(&self.assets_dir)
        }
    }

    /// Base that output paths hang off: `<base>/../<tool_dir>/...`.
    pub fn output_base(&self) -> Utf8PathBuf {
        self.assets_root()
    }

    pub fn resolve(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.project_root.join(rel)
        }
    }
}
