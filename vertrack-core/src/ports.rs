//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;

/// Android player settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AndroidSettings {
    pub bundle_version_code: i64,
    pub min_sdk: i64,
    pub target_sdk: i64,
}

/// iOS player settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IosSettings {
    pub build_number: i64,
    pub target_os_version: String,
}

/// Environment and player settings of the project being exported.
pub trait SettingsProvider: Send + Sync {
    fn host_version(&self) -> String;
    fn product_name(&self) -> String;
    fn package_id(&self) -> String;
    fn package_version(&self) -> String;
    fn graphics_apis(&self, platform: &str) -> Vec<String>;
    fn stripping_level(&self, platform_group: &str) -> String;
    /// Identity of the active scriptable render pipeline, if any.
    fn render_pipeline(&self) -> Option<String>;
    fn android(&self) -> AndroidSettings;
    fn ios(&self) -> IosSettings;
}

/// File-system write operations.
pub trait WritePort: Send + Sync {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}

/// File-system read operations.
pub trait ReadPort: Send + Sync {
    fn exists(&self, path: &Utf8Path) -> bool;
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String>;
}
