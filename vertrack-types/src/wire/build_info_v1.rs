use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::component::ComponentRecord;
use crate::snapshot::{
    CompressionMethod, PlatformSpecific, ProjectFacts, ProjectSnapshot, RenderPipeline,
};
use crate::wire::WireError;

/// Schema-exact wire representation of vertrack.build_info.v1.
///
/// `schema` is absent in documents written by the legacy exporter; those still read. Legacy
/// documents also use older key names (`unityVersion`, `packageName`, `version`,
/// `graphicsAPIs`, `managedStrippingLevel`), omit `renderPipeline` and `buildNumber`, and
/// write Android levels as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfoV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub project_info: ProjectInfoV1,

    #[serde(default)]
    pub sdk_info: Vec<ComponentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfoV1 {
    pub platform: String,

    #[serde(alias = "unityVersion")]
    pub host_version: String,

    #[serde(alias = "packageName")]
    pub package_id: String,

    #[serde(alias = "version")]
    pub package_version: String,

    pub compression_method: String,

    #[serde(default, alias = "graphicsAPIs")]
    pub graphics_apis: Vec<String>,

    #[serde(alias = "managedStrippingLevel")]
    pub stripping_level: String,

    #[serde(default = "built_in_label")]
    pub render_pipeline: String,

    /// Always written; `null` unless the platform is Android.
    pub android: Option<AndroidInfoV1>,

    /// Always written; `null` unless the platform is iOS.
    pub ios: Option<IosInfoV1>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidInfoV1 {
    #[serde(deserialize_with = "lenient_i64")]
    pub bundle_version_code: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub min_sdk_version: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub target_sdk_version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosInfoV1 {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub build_number: i64,

    #[serde(rename = "targetOSVersion")]
    pub target_os_version: String,
}

fn built_in_label() -> String {
    RenderPipeline::BuiltIn.as_str().to_string()
}

/// Integer written either as a number or as text. Text may be a plain integer or an API
/// level name such as `AndroidApiLevel23`; `AndroidApiLevelAuto` reads as 0.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) => parse_level(&text)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, found '{text}'"))),
    }
}

fn parse_level(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(n) = text.parse() {
        return Some(n);
    }
    if text.ends_with("Auto") {
        return Some(0);
    }
    let digits = text.len() - text.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    text[text.len() - digits..].parse().ok()
}

impl From<&ProjectSnapshot> for BuildInfoV1 {
    fn from(snapshot: &ProjectSnapshot) -> Self {
        let facts = snapshot.facts();
        let (android, ios) = match &facts.platform_specific {
            PlatformSpecific::None => (None, None),
            PlatformSpecific::Android {
                bundle_version_code,
                min_sdk,
                target_sdk,
            } => (
                Some(AndroidInfoV1 {
                    bundle_version_code: *bundle_version_code,
                    min_sdk_version: *min_sdk,
                    target_sdk_version: *target_sdk,
                }),
                None,
            ),
            PlatformSpecific::Ios {
                build_number,
                target_os_version,
            } => (
                None,
                Some(IosInfoV1 {
                    build_number: *build_number,
                    target_os_version: target_os_version.clone(),
                }),
            ),
        };

        Self {
            schema: Some(crate::schema::BUILD_INFO_V1.to_string()),
            project_info: ProjectInfoV1 {
                platform: facts.platform.clone(),
                host_version: facts.host_version.clone(),
                package_id: facts.package_id.clone(),
                package_version: facts.package_version.clone(),
                compression_method: facts.compression_method.as_str().to_string(),
                graphics_apis: facts.graphics_apis.clone(),
                stripping_level: facts.stripping_level.clone(),
                render_pipeline: facts.render_pipeline.as_str().to_string(),
                android,
                ios,
            },
            sdk_info: snapshot.components().to_vec(),
        }
    }
}

impl TryFrom<BuildInfoV1> for ProjectSnapshot {
    type Error = WireError;

    fn try_from(wire: BuildInfoV1) -> Result<Self, Self::Error> {
        if let Some(schema) = &wire.schema
            && schema != crate::schema::BUILD_INFO_V1
        {
            return Err(WireError::UnsupportedSchema {
                found: schema.clone(),
            });
        }

        let info = wire.project_info;
        let compression_method = CompressionMethod::parse(&info.compression_method).ok_or(
            WireError::UnknownCompression {
                value: info.compression_method.clone(),
            },
        )?;

        let platform_specific = match (info.android, info.ios) {
            (None, None) => PlatformSpecific::None,
            (Some(a), None) => PlatformSpecific::Android {
                bundle_version_code: a.bundle_version_code,
                min_sdk: a.min_sdk_version,
                target_sdk: a.target_sdk_version,
            },
            (None, Some(i)) => PlatformSpecific::Ios {
                build_number: i.build_number,
                target_os_version: i.target_os_version,
            },
            (Some(_), Some(_)) => return Err(WireError::ConflictingPlatformBlocks),
        };

        let facts = ProjectFacts {
            platform: info.platform,
            host_version: info.host_version,
            package_id: info.package_id,
            package_version: info.package_version,
            compression_method,
            graphics_apis: info.graphics_apis,
            stripping_level: info.stripping_level,
            render_pipeline: RenderPipeline::parse(&info.render_pipeline),
            platform_specific,
        };

        Ok(ProjectSnapshot::new(facts, wire.sdk_info))
    }
}
