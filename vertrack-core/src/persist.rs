//! Output paths, rendering and parsing of persisted artifacts.

use crate::ports::WritePort;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::info;
use vertrack_types::component::ComponentRecord;
use vertrack_types::snapshot::ProjectSnapshot;
use vertrack_types::wire::{BuildInfoV1, SdkInfoV1, WireError};

/// Characters that are not legal in a file name on at least one supported host.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

pub const SDK_INFO_SUBFOLDER: &str = "SdkInfo";
pub const SDK_INFO_SUFFIX: &str = "SdkInfo";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    #[error("invalid document {path}: {source}")]
    Wire {
        path: Utf8PathBuf,
        #[source]
        source: WireError,
    },

    #[error("io error at {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },

    #[error("no artifact at {path}")]
    NotFound { path: Utf8PathBuf },
}

/// Which document is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind<'a> {
    BuildInfo { platform: &'a str },
    SdkInfo,
}

impl ArtifactKind<'_> {
    pub fn subfolder(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::BuildInfo { .. } => None,
            ArtifactKind::SdkInfo => Some(SDK_INFO_SUBFOLDER),
        }
    }

    pub fn suffix(&self) -> String {
        match self {
            ArtifactKind::BuildInfo { platform } => format!("{platform}_BuildInfo"),
            ArtifactKind::SdkInfo => SDK_INFO_SUFFIX.to_string(),
        }
    }
}

/// Replace reserved and control characters with `-`; optionally drop spaces.
pub fn sanitize_file_name(name: &str, strip_spaces: bool) -> String {
    name.chars()
        .filter(|c| !(strip_spaces && *c == ' '))
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// `<base>/../<tool_dir>/[subfolder/]<product>_<version>_<suffix>.json`
pub fn artifact_path(
    base: &Utf8Path,
    tool_dir: &str,
    product: &str,
    version: &str,
    kind: ArtifactKind<'_>,
    strip_spaces: bool,
) -> Utf8PathBuf {
    let mut dir = base.join("..").join(tool_dir);
    if let Some(sub) = kind.subfolder() {
        dir.push(sub);
    }
    let file_name = format!("{}_{}_{}.json", product, version, kind.suffix());
    dir.join(sanitize_file_name(&file_name, strip_spaces))
}

pub fn render_build_info(snapshot: &ProjectSnapshot) -> Result<String, PersistError> {
    let wire = BuildInfoV1::from(snapshot);
    serde_json::to_string_pretty(&wire).map_err(|source| PersistError::Serialize {
        what: "build info",
        source,
    })
}

pub fn parse_build_info(path: &Utf8Path, text: &str) -> Result<ProjectSnapshot, PersistError> {
    let wire: BuildInfoV1 = serde_json::from_str(text).map_err(|e| PersistError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    ProjectSnapshot::try_from(wire).map_err(|source| PersistError::Wire {
        path: path.to_path_buf(),
        source,
    })
}

pub fn render_sdk_info(components: &[ComponentRecord]) -> Result<String, PersistError> {
    serde_json::to_string_pretty(components).map_err(|source| PersistError::Serialize {
        what: "sdk info",
        source,
    })
}

pub fn parse_sdk_info(path: &Utf8Path, text: &str) -> Result<Vec<ComponentRecord>, PersistError> {
    serde_json::from_str::<SdkInfoV1>(text).map_err(|e| PersistError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write `contents` to `path`, creating parent directories. Last write wins.
pub fn persist(writer: &dyn WritePort, path: &Utf8Path, contents: &str) -> Result<(), PersistError> {
    let io_err = |e: anyhow::Error| PersistError::Io {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    };
    if let Some(parent) = path.parent() {
        writer.create_dir_all(parent).map_err(io_err)?;
    }
    writer.write_file(path, contents.as_bytes()).map_err(io_err)?;
    info!(path = %path, bytes = contents.len(), "artifact written");
    Ok(())
}
