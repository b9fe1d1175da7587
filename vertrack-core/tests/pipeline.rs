use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vertrack_core::adapters::{InMemoryFiles, StaticSettings};
use vertrack_core::persist::PersistError;
use vertrack_core::ports::{AndroidSettings, WritePort};
use vertrack_core::settings::ExportSettings;
use vertrack_core::{ExportPhase, Exporter, HostRegistry, builtin_registry};
use vertrack_probes::StaticHostType;
use vertrack_types::build::{BuildOptions, BuildResult, BuildSummary};
use vertrack_types::snapshot::{CompressionMethod, PlatformSpecific, RenderPipeline};

struct Project {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Project {
    fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        std::fs::create_dir_all(root.join("Assets")).expect("mkdir");
        Self { _temp: temp, root }
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, contents).expect("write");
    }

    fn settings(&self) -> ExportSettings {
        ExportSettings {
            project_root: self.root.clone(),
            drain_timeout: Duration::from_secs(5),
            show_progress: false,
            ..ExportSettings::default()
        }
    }
}

fn provider() -> Arc<StaticSettings> {
    let mut settings = StaticSettings {
        host_version: "2022.3.10f1".to_string(),
        product_name: "Space Game".to_string(),
        package_id: "com.example.spacegame".to_string(),
        package_version: "1.4.0".to_string(),
        render_pipeline: Some("UnityEngine.Rendering.Universal.UniversalRenderPipelineAsset".to_string()),
        android: AndroidSettings {
            bundle_version_code: 14,
            min_sdk: 23,
            target_sdk: 34,
        },
        ..StaticSettings::default()
    };
    settings
        .graphics_apis
        .insert("Android".to_string(), vec!["Vulkan".to_string()]);
    settings
        .stripping_levels
        .insert("Android".to_string(), "Minimal".to_string());
    Arc::new(settings)
}

fn exporter(project: &Project) -> Exporter {
    let host = HostRegistry::new().with(
        "AmazonConstants",
        Arc::new(StaticHostType::new().with_member("VERSION", "1.9.0")),
    );
    Exporter::new(
        project.settings(),
        provider(),
        builtin_registry().expect("builtin registry"),
        host,
    )
}

#[test]
fn build_info_is_written_next_to_assets_and_reads_back() {
    let project = Project::new();
    project.write("Assets/Adjust/package.json", r#"{ "version": "5.0.1" }"#);
    let exporter = exporter(&project);

    let mut summary = BuildSummary::new("Android", "Android");
    summary.options = BuildOptions::COMPRESS_WITH_LZ4_HC;

    let path = exporter.export_build_info(&summary).expect("exported");
    assert_eq!(
        path,
        project
            .root
            .join("Assets/../VersionTracker/SpaceGame_1.4.0_Android_BuildInfo.json")
    );
    assert!(path.is_file());
    assert_eq!(exporter.phase(), ExportPhase::Persisted);
    assert!(!exporter.progress().is_active());

    let snapshot = exporter.read_build_info("Android").expect("read back");
    let facts = snapshot.facts();
    assert_eq!(facts.compression_method, CompressionMethod::Lz4Hc);
    assert_eq!(facts.render_pipeline, RenderPipeline::Universal);
    assert_eq!(facts.graphics_apis, vec!["Vulkan".to_string()]);
    assert_eq!(
        facts.platform_specific,
        PlatformSpecific::Android {
            bundle_version_code: 14,
            min_sdk: 23,
            target_sdk: 34
        }
    );
    assert_eq!(
        snapshot.component("AdjustSdk").and_then(|c| c.version.as_deref()),
        Some("5.0.1")
    );
    assert_eq!(
        snapshot.component("AmazonSdk").and_then(|c| c.version.as_deref()),
        Some("1.9.0")
    );
    assert_eq!(snapshot.component("Odeeo").and_then(|c| c.version.as_deref()), None);
    assert_eq!(snapshot.components().len(), 8);
}

#[test]
fn written_document_keeps_explicit_nulls() {
    let project = Project::new();
    let exporter = exporter(&project);

    let path = exporter
        .export_build_info(&BuildSummary::new("Android", "Android"))
        .expect("exported");
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).expect("read")).expect("json");

    assert_eq!(doc["schema"], "vertrack.build_info.v1");
    assert!(doc["projectInfo"]["ios"].is_null());
    assert!(doc["projectInfo"].as_object().expect("object").contains_key("ios"));
    let odeeo = &doc["sdkInfo"][3];
    assert_eq!(odeeo["name"], "Odeeo");
    assert!(odeeo["version"].is_null());
    assert_eq!(odeeo["pluginVersionInfo"], serde_json::json!([]));
}

#[test]
fn sdk_info_goes_to_subfolder() {
    let project = Project::new();
    let exporter = exporter(&project);

    let path = exporter.export_sdk_info().expect("exported");
    assert_eq!(
        path,
        project
            .root
            .join("Assets/../VersionTracker/SdkInfo/SpaceGame_1.4.0_SdkInfo.json")
    );

    let components = exporter.read_sdk_info().expect("read back");
    let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, builtin_registry().expect("registry").names());
}

#[test]
fn reading_missing_build_info_is_none() {
    let project = Project::new();
    let exporter = exporter(&project);

    assert!(exporter.read_build_info("iOS").is_none());
    assert!(matches!(
        exporter.try_read_build_info("iOS"),
        Err(PersistError::NotFound { .. })
    ));
}

#[test]
fn reading_corrupt_build_info_is_none() {
    let project = Project::new();
    let exporter = exporter(&project);
    let path = exporter.build_info_path("Android");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, "{ \"projectInfo\": ").expect("write");

    assert!(exporter.read_build_info("Android").is_none());
    assert!(matches!(
        exporter.try_read_build_info("Android"),
        Err(PersistError::Parse { .. })
    ));
}

struct FailingWriter;

impl WritePort for FailingWriter {
    fn write_file(&self, path: &Utf8Path, _contents: &[u8]) -> anyhow::Result<()> {
        anyhow::bail!("disk full while writing {path}")
    }

    fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failure_is_logged_and_surfaced_as_none() {
    let project = Project::new();
    let exporter = exporter(&project).with_writer(Arc::new(FailingWriter));

    assert!(exporter.export_sdk_info().is_none());
    assert_eq!(exporter.phase(), ExportPhase::Failed);
    assert!(!exporter.progress().is_active());

    let err = exporter.try_export_sdk_info().expect_err("write fails");
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn in_memory_ports_capture_output() {
    let project = Project::new();
    let files = Arc::new(InMemoryFiles::new());
    let exporter = exporter(&project)
        .with_writer(files.clone())
        .with_reader(files.clone());

    let path = exporter
        .export_build_info(&BuildSummary::new("iOS", "iOS"))
        .expect("exported");
    assert_eq!(files.paths(), vec![path]);
    assert!(!project.root.join("VersionTracker").exists());

    let snapshot = exporter.read_build_info("iOS").expect("read back");
    assert!(matches!(snapshot.platform_specific(), PlatformSpecific::Ios { .. }));
}

#[test]
fn post_build_hook_exports_in_background() {
    let project = Project::new();
    let exporter = Arc::new(exporter(&project));

    let handle = exporter
        .on_build_finished(BuildSummary::new("Android", "Android"))
        .expect("export started");
    let path = handle.join().expect("thread").expect("exported");
    assert!(path.is_file());
}

#[test]
fn post_build_hook_skips_failed_and_cancelled_builds() {
    let project = Project::new();
    let exporter = Arc::new(exporter(&project));

    for result in [BuildResult::Failed, BuildResult::Cancelled] {
        let mut summary = BuildSummary::new("Android", "Android");
        summary.result = result;
        assert!(exporter.on_build_finished(summary).is_none());
    }
    assert_eq!(exporter.phase(), ExportPhase::Idle);
    assert!(!project.root.join("VersionTracker").exists());
}
