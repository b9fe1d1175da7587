//! Assembly of a [`ProjectSnapshot`] from settings, the build summary and resolved components.

use crate::ports::SettingsProvider;
use vertrack_types::build::{BuildOptions, BuildSummary};
use vertrack_types::component::ComponentRecord;
use vertrack_types::platform;
use vertrack_types::snapshot::{
    CompressionMethod, PlatformSpecific, ProjectFacts, ProjectSnapshot, RenderPipeline,
};

/// LZ4 wins when both compression flags are set.
pub fn compression_method(options: BuildOptions) -> CompressionMethod {
    if options.contains(BuildOptions::COMPRESS_WITH_LZ4) {
        CompressionMethod::Lz4
    } else if options.contains(BuildOptions::COMPRESS_WITH_LZ4_HC) {
        CompressionMethod::Lz4Hc
    } else {
        CompressionMethod::Default
    }
}

/// Classify the active render pipeline by its identity.
pub fn classify_render_pipeline(identity: Option<&str>) -> RenderPipeline {
    RenderPipeline::classify(identity)
}

pub fn platform_specific(platform_key: &str, settings: &dyn SettingsProvider) -> PlatformSpecific {
    match platform_key {
        platform::ANDROID => {
            let android = settings.android();
            PlatformSpecific::Android {
                bundle_version_code: android.bundle_version_code,
                min_sdk: android.min_sdk,
                target_sdk: android.target_sdk,
            }
        }
        platform::IOS => {
            let ios = settings.ios();
            PlatformSpecific::Ios {
                build_number: ios.build_number,
                target_os_version: ios.target_os_version,
            }
        }
        _ => PlatformSpecific::None,
    }
}

pub fn build_snapshot(
    summary: &BuildSummary,
    settings: &dyn SettingsProvider,
    components: Vec<ComponentRecord>,
) -> ProjectSnapshot {
    let facts = ProjectFacts {
        platform: summary.platform.clone(),
        host_version: settings.host_version(),
        package_id: settings.package_id(),
        package_version: settings.package_version(),
        compression_method: compression_method(summary.options),
        graphics_apis: settings.graphics_apis(&summary.platform),
        stripping_level: settings.stripping_level(&summary.platform_group),
        render_pipeline: classify_render_pipeline(settings.render_pipeline().as_deref()),
        platform_specific: platform_specific(&summary.platform, settings),
    };
    ProjectSnapshot::new(facts, components)
}
