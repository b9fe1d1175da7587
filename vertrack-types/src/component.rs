use serde::{Deserialize, Deserializer, Serialize};

/// Version of a single sub-component (a mediation adapter, a plugin module, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubVersion {
    pub name: String,
    pub version: Option<String>,
}

impl SubVersion {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// Outcome of one probe invocation.
///
/// Absence is a normal outcome: a component may simply not be integrated in this build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub version: Option<String>,
    pub sub_versions: Vec<SubVersion>,
}

impl ProbeResult {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            sub_versions: Vec::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.version.is_none() && self.sub_versions.is_empty()
    }
}

/// Resolved versions for one registered component.
///
/// Serialized as `{ "name", "version", "pluginVersionInfo" }`; `version` is written as `null`
/// when unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub name: String,

    pub version: Option<String>,

    /// Legacy documents write `null` here when there was nothing to report.
    #[serde(
        rename = "pluginVersionInfo",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub sub_versions: Vec<SubVersion>,
}

impl ComponentRecord {
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            sub_versions: Vec::new(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<SubVersion>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<SubVersion>>::deserialize(deserializer)?.unwrap_or_default())
}
