pub mod build_info_v1;

pub use build_info_v1::{AndroidInfoV1, BuildInfoV1, IosInfoV1, ProjectInfoV1};

use crate::component::ComponentRecord;

/// Standalone SDK info document: the bare component list.
pub type SdkInfoV1 = Vec<ComponentRecord>;

/// Errors emitted while converting wire documents back into the in-memory model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    UnsupportedSchema { found: String },
    UnknownCompression { value: String },
    ConflictingPlatformBlocks,
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::UnsupportedSchema { found } => {
                write!(f, "unsupported schema '{}'", found)
            }
            WireError::UnknownCompression { value } => {
                write!(f, "unknown compression method '{}'", value)
            }
            WireError::ConflictingPlatformBlocks => {
                write!(f, "both android and ios blocks are present")
            }
        }
    }
}

impl std::error::Error for WireError {}
