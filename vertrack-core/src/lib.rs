//! Embeddable core library for vertrack.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking into a build
//! pipeline or other host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`SettingsProvider`](ports::SettingsProvider): project and player settings
//! - [`WritePort`](ports::WritePort): write files and create directories
//! - [`ReadPort`](ports::ReadPort): read persisted artifacts back
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`Exporter::export_build_info`](pipeline::Exporter::export_build_info): full snapshot
//! - [`Exporter::export_sdk_info`](pipeline::Exporter::export_sdk_info): component list only
//! - [`Exporter::on_build_finished`](pipeline::Exporter::on_build_finished): post-build hook
//! - [`Exporter::read_build_info`](pipeline::Exporter::read_build_info): read-back

pub mod adapters;
pub mod persist;
pub mod pipeline;
pub mod ports;
pub mod progress;
pub mod settings;
pub mod snapshot;

pub use pipeline::{ExportPhase, Exporter};

// Re-exported so embedders don't need the lower crates directly.
pub use vertrack_domain::{ComponentRegistry, builtin_registry};
pub use vertrack_probes::{HostRegistry, ProjectView};
