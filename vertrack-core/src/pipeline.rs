//! Export and read-back pipelines.
//!
//! These entry points are I/O-agnostic: settings come from a [`SettingsProvider`] and all
//! filesystem access goes through the port traits.

use crate::adapters::{FsReadPort, FsWritePort};
use crate::persist::{
    self, ArtifactKind, PersistError, parse_build_info, parse_sdk_info, render_build_info,
    render_sdk_info,
};
use crate::ports::{ReadPort, SettingsProvider, WritePort};
use crate::progress::ProgressIndicator;
use crate::settings::ExportSettings;
use camino::Utf8PathBuf;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};
use vertrack_domain::{ComponentRegistry, Resolution, Resolver};
use vertrack_probes::{FsProjectView, HostRegistry, ProbeContext};
use vertrack_types::build::BuildSummary;
use vertrack_types::component::ComponentRecord;
use vertrack_types::snapshot::ProjectSnapshot;

/// Where the most recent export stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportPhase {
    #[default]
    Idle,
    Resolving,
    BuildingSnapshot,
    Serializing,
    Persisted,
    Failed,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportPhase::Idle => "idle",
            ExportPhase::Resolving => "resolving",
            ExportPhase::BuildingSnapshot => "building_snapshot",
            ExportPhase::Serializing => "serializing",
            ExportPhase::Persisted => "persisted",
            ExportPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Owns everything one export invocation needs: registry, host capabilities, settings,
/// I/O ports and the progress indicator.
pub struct Exporter {
    settings: ExportSettings,
    provider: Arc<dyn SettingsProvider>,
    registry: ComponentRegistry,
    host: HostRegistry,
    writer: Arc<dyn WritePort>,
    reader: Arc<dyn ReadPort>,
    progress: ProgressIndicator,
    phase: Mutex<ExportPhase>,
}

impl Exporter {
    pub fn new(
        settings: ExportSettings,
        provider: Arc<dyn SettingsProvider>,
        registry: ComponentRegistry,
        host: HostRegistry,
    ) -> Self {
        let progress = if settings.show_progress {
            ProgressIndicator::stderr()
        } else {
            ProgressIndicator::hidden()
        };
        Self {
            settings,
            provider,
            registry,
            host,
            writer: Arc::new(FsWritePort),
            reader: Arc::new(FsReadPort),
            progress,
            phase: Mutex::new(ExportPhase::Idle),
        }
    }

    pub fn with_writer(mut self, writer: Arc<dyn WritePort>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_reader(mut self, reader: Arc<dyn ReadPort>) -> Self {
        self.reader = reader;
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn progress(&self) -> &ProgressIndicator {
        &self.progress
    }

    pub fn phase(&self) -> ExportPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, phase: ExportPhase) {
        debug!(phase = %phase, "export phase");
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Run every registered probe once against the asset tree.
    pub fn resolve(&self) -> Resolution {
        let view = FsProjectView::new(self.settings.assets_root());
        let ctx = ProbeContext {
            project: &view,
            host: &self.host,
            drain_timeout: self.settings.drain_timeout,
        };
        Resolver::new(&self.registry).resolve(&ctx)
    }

    pub fn artifact_path(&self, kind: ArtifactKind<'_>) -> Utf8PathBuf {
        persist::artifact_path(
            &self.settings.output_base(),
            &self.settings.tool_dir,
            &self.provider.product_name(),
            &self.provider.package_version(),
            kind,
            self.settings.strip_spaces,
        )
    }

    pub fn build_info_path(&self, platform: &str) -> Utf8PathBuf {
        self.artifact_path(ArtifactKind::BuildInfo { platform })
    }

    pub fn sdk_info_path(&self) -> Utf8PathBuf {
        self.artifact_path(ArtifactKind::SdkInfo)
    }

    /// Resolve components and write the bare component list.
    pub fn try_export_sdk_info(&self) -> Result<Utf8PathBuf, PersistError> {
        let _progress = self.progress.scope();

        self.enter(ExportPhase::Resolving);
        let components = self.resolve().components;

        self.finish(self.write_sdk_info(&components))
    }

    fn write_sdk_info(&self, components: &[ComponentRecord]) -> Result<Utf8PathBuf, PersistError> {
        self.enter(ExportPhase::Serializing);
        let text = render_sdk_info(components)?;
        let path = self.sdk_info_path();
        persist::persist(self.writer.as_ref(), &path, &text)?;
        Ok(path)
    }

    pub fn export_sdk_info(&self) -> Option<Utf8PathBuf> {
        match self.try_export_sdk_info() {
            Ok(path) => {
                info!(path = %path, "sdk info saved");
                Some(path)
            }
            Err(e) => {
                error!(error = %e, "sdk info export failed");
                None
            }
        }
    }

    /// Build the full snapshot for a finished build and write it.
    pub fn try_export_build_info(&self, summary: &BuildSummary) -> Result<Utf8PathBuf, PersistError> {
        let _progress = self.progress.scope();

        self.enter(ExportPhase::Resolving);
        let components = self.resolve().components;

        self.enter(ExportPhase::BuildingSnapshot);
        let snapshot = crate::snapshot::build_snapshot(summary, self.provider.as_ref(), components);

        self.finish(self.write_build_info(&snapshot))
    }

    fn write_build_info(&self, snapshot: &ProjectSnapshot) -> Result<Utf8PathBuf, PersistError> {
        self.enter(ExportPhase::Serializing);
        let text = render_build_info(snapshot)?;
        let path = self.build_info_path(snapshot.platform());
        persist::persist(self.writer.as_ref(), &path, &text)?;
        Ok(path)
    }

    fn finish(&self, result: Result<Utf8PathBuf, PersistError>) -> Result<Utf8PathBuf, PersistError> {
        self.enter(match result {
            Ok(_) => ExportPhase::Persisted,
            Err(_) => ExportPhase::Failed,
        });
        result
    }

    pub fn export_build_info(&self, summary: &BuildSummary) -> Option<Utf8PathBuf> {
        match self.try_export_build_info(summary) {
            Ok(path) => {
                info!(platform = %summary.platform, path = %path, "build info saved");
                Some(path)
            }
            Err(e) => {
                error!(platform = %summary.platform, error = %e, "build info export failed");
                None
            }
        }
    }

    /// Run the build-info export on a background thread; the caller continues immediately.
    pub fn export_build_info_async(
        self: &Arc<Self>,
        summary: BuildSummary,
    ) -> JoinHandle<Option<Utf8PathBuf>> {
        let exporter = Arc::clone(self);
        thread::spawn(move || exporter.export_build_info(&summary))
    }

    /// Post-build hook. Failed and cancelled builds are not exported.
    pub fn on_build_finished(
        self: &Arc<Self>,
        summary: BuildSummary,
    ) -> Option<JoinHandle<Option<Utf8PathBuf>>> {
        if !summary.result.allows_export() {
            error!(
                platform = %summary.platform,
                result = %summary.result,
                "build did not succeed; skipping version export"
            );
            return None;
        }
        Some(self.export_build_info_async(summary))
    }

    pub fn try_read_build_info(&self, platform: &str) -> Result<ProjectSnapshot, PersistError> {
        let path = self.build_info_path(platform);
        let text = self.read(&path)?;
        parse_build_info(&path, &text)
    }

    pub fn read_build_info(&self, platform: &str) -> Option<ProjectSnapshot> {
        match self.try_read_build_info(platform) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                error!(platform, error = %e, "build info could not be read");
                None
            }
        }
    }

    pub fn try_read_sdk_info(&self) -> Result<Vec<ComponentRecord>, PersistError> {
        let path = self.sdk_info_path();
        let text = self.read(&path)?;
        parse_sdk_info(&path, &text)
    }

    pub fn read_sdk_info(&self) -> Option<Vec<ComponentRecord>> {
        match self.try_read_sdk_info() {
            Ok(components) => Some(components),
            Err(e) => {
                error!(error = %e, "sdk info could not be read");
                None
            }
        }
    }

    fn read(&self, path: &camino::Utf8Path) -> Result<String, PersistError> {
        if !self.reader.exists(path) {
            return Err(PersistError::NotFound {
                path: path.to_path_buf(),
            });
        }
        self.reader
            .read_to_string(path)
            .map_err(|e| PersistError::Io {
                path: path.to_path_buf(),
                message: format!("{e:#}"),
            })
    }
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("settings", &self.settings)
            .field("registry", &self.registry.names())
            .field("host", &self.host)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
