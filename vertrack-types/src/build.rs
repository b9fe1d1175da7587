use std::fmt;
use std::ops::BitOr;

/// Build option flags reported by the build pipeline.
///
/// Bit positions match the host editor's build-option enumeration so raw values
/// can be passed through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BuildOptions(u32);

impl BuildOptions {
    pub const NONE: Self = Self(0);
    pub const DEVELOPMENT: Self = Self(1 << 0);
    pub const COMPRESS_WITH_LZ4: Self = Self(1 << 8);
    pub const COMPRESS_WITH_LZ4_HC: Self = Self(1 << 19);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Parse a flag name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::NONE),
            "development" | "dev" => Some(Self::DEVELOPMENT),
            "lz4" => Some(Self::COMPRESS_WITH_LZ4),
            "lz4hc" => Some(Self::COMPRESS_WITH_LZ4_HC),
            _ => None,
        }
    }
}

impl BitOr for BuildOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Final state of the build that triggered an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildResult {
    #[default]
    Unknown,
    Succeeded,
    Failed,
    Cancelled,
}

impl BuildResult {
    /// Exports only run for builds that were neither failed nor cancelled.
    pub fn allows_export(self) -> bool {
        !matches!(self, BuildResult::Failed | BuildResult::Cancelled)
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildResult::Unknown => "unknown",
            BuildResult::Succeeded => "succeeded",
            BuildResult::Failed => "failed",
            BuildResult::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Read-only facts about a finished build, supplied by the build pipeline.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Target platform identifier, e.g. "Android", "iOS", "StandaloneWindows64".
    pub platform: String,
    /// Platform group identifier used for per-group settings lookups.
    pub platform_group: String,
    pub options: BuildOptions,
    pub result: BuildResult,
}

impl BuildSummary {
    pub fn new(platform: impl Into<String>, platform_group: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            platform_group: platform_group.into(),
            options: BuildOptions::NONE,
            result: BuildResult::Succeeded,
        }
    }
}
