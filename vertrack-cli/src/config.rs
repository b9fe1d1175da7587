//! Configuration file loading for vertrack.
//!
//! Discovers and loads `vertrack.toml` from the project root, then merges it with CLI
//! arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vertrack_core::adapters::StaticSettings;
use vertrack_core::ports::{AndroidSettings, IosSettings};
use vertrack_core::settings::ExportSettings;
use vertrack_probes::{HostRegistry, JsonFileOperation, StaticHostType};

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "vertrack.toml";

/// Top-level configuration from vertrack.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VertrackConfig {
    /// Product identity and host environment.
    pub project: ProjectConfig,

    /// Output location and export tuning.
    pub output: OutputConfig,

    /// Per-platform player settings, keyed by platform identifier.
    pub platforms: BTreeMap<String, PlatformConfig>,

    pub android: AndroidConfig,

    pub ios: IosConfig,

    /// Host capabilities, keyed by fully qualified type name.
    pub host: BTreeMap<String, HostTypeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub product_name: String,
    pub host_version: String,
    pub package_id: String,
    pub package_version: String,

    /// Identity of the active render pipeline asset; absent means built-in.
    pub render_pipeline: Option<String>,

    /// Asset tree relative to the project root (default: `Assets`).
    pub assets_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output folder created next to the asset tree.
    pub tool_dir: Option<String>,

    /// Strip spaces from output file names (default: true).
    pub strip_spaces: Option<bool>,

    /// Upper bound on waiting for asynchronous host operations.
    pub drain_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub graphics_apis: Vec<String>,
    pub stripping_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    pub bundle_version_code: i64,
    pub min_sdk: i64,
    pub target_sdk: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IosConfig {
    pub build_number: i64,
    pub target_os_version: String,
}

/// A host type exposing static members and file-backed operations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostTypeConfig {
    pub members: BTreeMap<String, String>,

    /// Operation name to the JSON payload it delivers, relative to the project root.
    pub operations: BTreeMap<String, Utf8PathBuf>,
}

impl VertrackConfig {
    /// Settings provider backed by the `[project]`, `[platforms]`, `[android]` and `[ios]`
    /// sections.
    pub fn settings_provider(&self) -> StaticSettings {
        let mut graphics_apis = BTreeMap::new();
        let mut stripping_levels = BTreeMap::new();
        for (platform, cfg) in &self.platforms {
            graphics_apis.insert(platform.clone(), cfg.graphics_apis.clone());
            if let Some(level) = &cfg.stripping_level {
                stripping_levels.insert(platform.clone(), level.clone());
            }
        }

        StaticSettings {
            host_version: self.project.host_version.clone(),
            product_name: self.project.product_name.clone(),
            package_id: self.project.package_id.clone(),
            package_version: self.project.package_version.clone(),
            graphics_apis,
            stripping_levels,
            render_pipeline: self.project.render_pipeline.clone(),
            android: AndroidSettings {
                bundle_version_code: self.android.bundle_version_code,
                min_sdk: self.android.min_sdk,
                target_sdk: self.android.target_sdk,
            },
            ios: IosSettings {
                build_number: self.ios.build_number,
                target_os_version: self.ios.target_os_version.clone(),
            },
        }
    }

    /// Host capabilities declared under `[host."<type>"]`. Operation paths are resolved
    /// against the project root.
    pub fn host_registry(&self, export: &ExportSettings) -> HostRegistry {
        let mut registry = HostRegistry::new();
        for (type_name, cfg) in &self.host {
            let mut host_type = StaticHostType::new();
            for (member, value) in &cfg.members {
                host_type = host_type.with_member(member.clone(), value.clone());
            }
            for (operation, path) in &cfg.operations {
                let path = export.resolve(path);
                debug!(host_type = %type_name, operation = %operation, path = %path, "host operation");
                host_type =
                    host_type.with_operation(operation.clone(), Arc::new(JsonFileOperation::new(path)));
            }
            registry.register(type_name.clone(), Arc::new(host_type));
        }
        registry
    }
}

/// Discover the vertrack.toml config file.
///
/// Returns `None` if no config file is found in the project root.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a vertrack.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<VertrackConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<VertrackConfig> {
    let config: VertrackConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<VertrackConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(VertrackConfig::default()),
    }
}

/// Everything an [`Exporter`](vertrack_core::Exporter) needs, after merging.
#[derive(Debug)]
pub struct MergedConfig {
    pub export: ExportSettings,
    pub provider: StaticSettings,
    pub host: HostRegistry,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: VertrackConfig,
}

impl ConfigMerger {
    pub fn new(config: VertrackConfig) -> Self {
        Self { config }
    }

    /// CLI `tool_dir` and `drain_timeout_secs` override the `[output]` section when set.
    pub fn merge_cli_args(
        self,
        project_root: &Utf8Path,
        cli_tool_dir: Option<&str>,
        cli_drain_timeout_secs: Option<u64>,
        show_progress: bool,
    ) -> MergedConfig {
        let defaults = ExportSettings::default();
        let output = &self.config.output;

        let export = ExportSettings {
            project_root: project_root.to_path_buf(),
            assets_dir: self
                .config
                .project
                .assets_dir
                .clone()
                .unwrap_or(defaults.assets_dir),
            tool_dir: cli_tool_dir
                .map(str::to_string)
                .or_else(|| output.tool_dir.clone())
                .unwrap_or(defaults.tool_dir),
            strip_spaces: output.strip_spaces.unwrap_or(defaults.strip_spaces),
            drain_timeout: cli_drain_timeout_secs
                .or(output.drain_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.drain_timeout),
            show_progress,
        };

        let provider = self.config.settings_provider();
        let host = self.config.host_registry(&export);
        MergedConfig {
            export,
            provider,
            host,
        }
    }
}
