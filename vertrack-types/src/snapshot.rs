use crate::component::ComponentRecord;
use std::fmt;

/// Asset compression selected for the build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompressionMethod {
    #[default]
    Default,
    Lz4,
    Lz4Hc,
}

impl CompressionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMethod::Default => "Default",
            CompressionMethod::Lz4 => "LZ4",
            CompressionMethod::Lz4Hc => "LZ4HC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Default" => Some(CompressionMethod::Default),
            "LZ4" => Some(CompressionMethod::Lz4),
            "LZ4HC" => Some(CompressionMethod::Lz4Hc),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render pipeline classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RenderPipeline {
    #[default]
    BuiltIn,
    Universal,
    HighDefinition,
    /// A scriptable pipeline that is neither URP nor HDRP, by identity.
    Custom(String),
}

impl RenderPipeline {
    pub fn as_str(&self) -> &str {
        match self {
            RenderPipeline::BuiltIn => "Built-in",
            RenderPipeline::Universal => "URP",
            RenderPipeline::HighDefinition => "HDRP",
            RenderPipeline::Custom(name) => name,
        }
    }

    /// Classify a pipeline by the identity of its asset. No identity means built-in.
    ///
    /// Identities equal to one of the rendered labels classify as that variant, so
    /// `classify(Some(p.as_str())) == p` for every classified `p`.
    pub fn classify(identity: Option<&str>) -> Self {
        match identity.map(str::trim) {
            None | Some("") | Some("Built-in") => RenderPipeline::BuiltIn,
            Some("URP") => RenderPipeline::Universal,
            Some("HDRP") => RenderPipeline::HighDefinition,
            Some(id) if id.contains("Universal") => RenderPipeline::Universal,
            Some(id) if id.contains("HighDefinition") => RenderPipeline::HighDefinition,
            Some(id) => RenderPipeline::Custom(id.to_string()),
        }
    }

    /// Read a rendered label back.
    pub fn parse(s: &str) -> Self {
        Self::classify(Some(s))
    }
}

impl fmt::Display for RenderPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings that only exist for some target platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlatformSpecific {
    #[default]
    None,
    Android {
        bundle_version_code: i64,
        min_sdk: i64,
        target_sdk: i64,
    },
    Ios {
        build_number: i64,
        target_os_version: String,
    },
}

/// Environment and platform facts captured alongside component versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFacts {
    pub platform: String,
    pub host_version: String,
    pub package_id: String,
    pub package_version: String,
    pub compression_method: CompressionMethod,
    pub graphics_apis: Vec<String>,
    pub stripping_level: String,
    pub render_pipeline: RenderPipeline,
    pub platform_specific: PlatformSpecific,
}

/// Immutable aggregate of project facts and resolved component versions.
///
/// Built once per export; there are no mutating accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    facts: ProjectFacts,
    components: Vec<ComponentRecord>,
}

impl ProjectSnapshot {
    pub fn new(facts: ProjectFacts, components: Vec<ComponentRecord>) -> Self {
        Self { facts, components }
    }

    pub fn facts(&self) -> &ProjectFacts {
        &self.facts
    }

    pub fn platform(&self) -> &str {
        &self.facts.platform
    }

    pub fn platform_specific(&self) -> &PlatformSpecific {
        &self.facts.platform_specific
    }

    pub fn components(&self) -> &[ComponentRecord] {
        &self.components
    }

    pub fn component(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn into_parts(self) -> (ProjectFacts, Vec<ComponentRecord>) {
        (self.facts, self.components)
    }
}
