use crate::error::ProbeError;
use crate::probe::{Probe, ProbeContext, ProbeKind};
use regex::Regex;
use tracing::{debug, warn};
use vertrack_types::component::ProbeResult;

/// Post-processing applied to a raw member value.
#[derive(Debug, Clone)]
pub enum VersionFilter {
    /// Keep the first capture group of the first match, e.g. `v(\d+\.\d+\.\d+)`.
    Pattern(Regex),
}

impl VersionFilter {
    pub fn pattern(pattern: &str) -> Result<Self, ProbeError> {
        Regex::new(pattern)
            .map(VersionFilter::Pattern)
            .map_err(|e| ProbeError::Pattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn apply(&self, raw: &str) -> Option<String> {
        match self {
            VersionFilter::Pattern(re) => {
                let caps = re.captures(raw)?;
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().to_string())
            }
        }
    }
}

/// Reads a static member of a named host type.
#[derive(Debug, Clone)]
pub struct CapabilityProbe {
    type_name: String,
    member: String,
    filter: Option<VersionFilter>,
}

impl CapabilityProbe {
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: VersionFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl Probe for CapabilityProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Capability
    }

    fn describe(&self) -> String {
        format!("{}.{}", self.type_name, self.member)
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        let Some(host_type) = ctx.host.get(&self.type_name) else {
            warn!(type_name = %self.type_name, "type not found in the project");
            return Ok(ProbeResult::absent());
        };

        let Some(raw) = host_type.static_member(&self.member) else {
            warn!(
                type_name = %self.type_name,
                member = %self.member,
                "member not found"
            );
            return Ok(ProbeResult::absent());
        };

        let raw = raw.trim();
        if raw.is_empty() {
            warn!(type_name = %self.type_name, member = %self.member, "member is empty");
            return Ok(ProbeResult::absent());
        }

        let version = match &self.filter {
            None => raw.to_string(),
            Some(filter) => match filter.apply(raw) {
                Some(v) => v,
                None => {
                    warn!(
                        type_name = %self.type_name,
                        member = %self.member,
                        value = %raw,
                        "member value has no recognizable version"
                    );
                    return Ok(ProbeResult::absent());
                }
            },
        };

        debug!(type_name = %self.type_name, version = %version, "resolved from host");
        Ok(ProbeResult::version(version))
    }
}
