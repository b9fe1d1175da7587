//! Default filesystem-backed port implementations.

use crate::ports::{AndroidSettings, IosSettings, ReadPort, SettingsProvider, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

/// Filesystem read operations.
#[derive(Debug, Clone, Default)]
pub struct FsReadPort;

impl ReadPort for FsReadPort {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        fs::read_to_string(path).with_context(|| format!("read {}", path))
    }
}

/// In-memory file store for embedding and testing; implements both ports.
#[derive(Debug, Default)]
pub struct InMemoryFiles {
    files: Mutex<BTreeMap<Utf8PathBuf, Vec<u8>>>,
}

impl InMemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Written paths, sorted.
    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.lock().keys().cloned().collect()
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Utf8PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WritePort for InMemoryFiles {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        self.lock().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
        Ok(())
    }
}

impl ReadPort for InMemoryFiles {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.lock().contains_key(path)
    }

    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        let bytes = self
            .get(path)
            .with_context(|| format!("no such file {}", path))?;
        String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8", path))
    }
}

/// Settings fixed at construction, e.g. loaded from `vertrack.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSettings {
    pub host_version: String,
    pub product_name: String,
    pub package_id: String,
    pub package_version: String,
    /// Graphics APIs keyed by target platform.
    pub graphics_apis: BTreeMap<String, Vec<String>>,
    /// Managed stripping level keyed by platform group.
    pub stripping_levels: BTreeMap<String, String>,
    pub render_pipeline: Option<String>,
    pub android: AndroidSettings,
    pub ios: IosSettings,
}

impl SettingsProvider for StaticSettings {
    fn host_version(&self) -> String {
        self.host_version.clone()
    }

    fn product_name(&self) -> String {
        self.product_name.clone()
    }

    fn package_id(&self) -> String {
        self.package_id.clone()
    }

    fn package_version(&self) -> String {
        self.package_version.clone()
    }

    fn graphics_apis(&self, platform: &str) -> Vec<String> {
        self.graphics_apis.get(platform).cloned().unwrap_or_default()
    }

    fn stripping_level(&self, platform_group: &str) -> String {
        self.stripping_levels
            .get(platform_group)
            .cloned()
            .unwrap_or_default()
    }

    fn render_pipeline(&self) -> Option<String> {
        self.render_pipeline.clone()
    }

    fn android(&self) -> AndroidSettings {
        self.android.clone()
    }

    fn ios(&self) -> IosSettings {
        self.ios.clone()
    }
}
