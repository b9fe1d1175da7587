use crate::error::ProbeError;
use crate::host::HostRegistry;
use crate::view::ProjectView;
use std::time::Duration;
use vertrack_types::component::ProbeResult;

/// Source kind a probe reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Capability,
    ManifestFile,
    FilenameConvention,
    AsyncDrain,
}

impl ProbeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeKind::Capability => "capability",
            ProbeKind::ManifestFile => "manifest_file",
            ProbeKind::FilenameConvention => "filename_convention",
            ProbeKind::AsyncDrain => "async_drain",
        }
    }
}

/// Everything a probe may consult during one resolution pass.
pub struct ProbeContext<'a> {
    pub project: &'a dyn ProjectView,
    pub host: &'a HostRegistry,
    /// Upper bound for draining callback-driven host operations.
    pub drain_timeout: Duration,
}

pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    /// Short human-readable description of the source, for logs and listings.
    fn describe(&self) -> String;

    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError>;
}
