//! Version probe strategies.
//!
//! Each probe extracts version facts from one kind of source: a capability registered by the
//! host, a dependency manifest (XML/JSON), a filename convention, or a callback-driven host
//! operation that has to be drained. Probes are tolerant: a component that is not integrated
//! in this build yields an absent [`ProbeResult`] plus a diagnostic, never an error.
//! Errors are reserved for sources that exist but cannot be read or parsed.

mod capability;
mod drain;
mod error;
mod filename;
mod host;
mod manifest;
mod probe;
mod view;

pub use capability::{CapabilityProbe, VersionFilter};
pub use drain::{AsyncDrainProbe, DEFAULT_DRAIN_TIMEOUT, DrainOutcome, PluginDataRule, drain};
pub use error::ProbeError;
pub use filename::{FilenameConventionProbe, parse_manifest_file_name};
pub use host::{
    Completion, HostOperation, HostRegistry, HostType, JsonFileOperation, StaticHostType, Step,
    StepHandle,
};
pub use manifest::{ExtractionRule, ManifestFileProbe, extract_json_key, extract_xml_attribute, split_spec};
pub use probe::{Probe, ProbeContext, ProbeKind};
pub use view::{FsProjectView, ProjectView};
pub use vertrack_types::component::{ProbeResult, SubVersion};
