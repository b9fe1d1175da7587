//! Shared DTOs (schemas-as-code) for the vertrack workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Absent optional values are written as explicit `null`; key presence is part of the format.
//! - Be conservative with breaking changes.

pub mod build;
pub mod component;
pub mod snapshot;
pub mod wire;

/// Schema identifiers.
pub mod schema {
    pub const BUILD_INFO_V1: &str = "vertrack.build_info.v1";
}

/// Platform keys with a platform-specific settings block.
pub mod platform {
    pub const ANDROID: &str = "Android";
    pub const IOS: &str = "iOS";
}
