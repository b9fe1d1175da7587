use crate::registry::{ComponentDescriptor, ComponentRegistry};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};
use vertrack_probes::{Probe, ProbeContext, ProbeResult};
use vertrack_types::component::ComponentRecord;

/// Per-pass probe outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub resolved: usize,
    pub absent: usize,
    pub faulted: usize,
}

impl ResolveReport {
    pub fn attempted(&self) -> usize {
        self.resolved + self.absent + self.faulted
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// One record per registered component, in declaration order.
    pub components: Vec<ComponentRecord>,
    pub report: ResolveReport,
}

enum Slot {
    Primary,
    SubVersions,
}

impl Slot {
    fn as_str(&self) -> &'static str {
        match self {
            Slot::Primary => "version",
            Slot::SubVersions => "sub_versions",
        }
    }
}

/// Runs every registered probe once and assembles component records.
///
/// A probe that errors or panics only empties its own slot; every other component is still
/// attempted.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r ComponentRegistry,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r ComponentRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, ctx: &ProbeContext<'_>) -> Resolution {
        let mut report = ResolveReport::default();
        let components = self
            .registry
            .iter()
            .map(|descriptor| resolve_one(descriptor, ctx, &mut report))
            .collect();

        info!(
            components = self.registry.len(),
            resolved = report.resolved,
            absent = report.absent,
            faulted = report.faulted,
            "resolved component versions"
        );

        Resolution { components, report }
    }
}

fn resolve_one(
    descriptor: &ComponentDescriptor,
    ctx: &ProbeContext<'_>,
    report: &mut ResolveReport,
) -> ComponentRecord {
    let name = descriptor.name();
    let primary = run_probe(name, Slot::Primary, descriptor.version_probe(), ctx, report);

    let sub_versions = match descriptor.sub_versions_probe() {
        Some(probe) => run_probe(name, Slot::SubVersions, probe, ctx, report).sub_versions,
        None => Vec::new(),
    };

    ComponentRecord {
        name: name.to_string(),
        version: primary.version,
        sub_versions,
    }
}

fn run_probe(
    component: &str,
    slot: Slot,
    probe: &dyn Probe,
    ctx: &ProbeContext<'_>,
    report: &mut ResolveReport,
) -> ProbeResult {
    debug!(
        component,
        slot = slot.as_str(),
        kind = probe.kind().as_str(),
        source = %probe.describe(),
        "probing"
    );

    match panic::catch_unwind(AssertUnwindSafe(|| probe.probe(ctx))) {
        Ok(Ok(result)) => {
            if result.is_absent() {
                report.absent += 1;
                warn!(component, slot = slot.as_str(), "version not found");
            } else {
                report.resolved += 1;
            }
            result
        }
        Ok(Err(e)) => {
            report.faulted += 1;
            warn!(component, slot = slot.as_str(), error = %e, "probe failed");
            ProbeResult::absent()
        }
        Err(payload) => {
            report.faulted += 1;
            error!(
                component,
                slot = slot.as_str(),
                panic = %panic_message(payload.as_ref()),
                "probe panicked"
            );
            ProbeResult::absent()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vertrack_probes::{FsProjectView, HostRegistry, ProbeError, ProbeKind, SubVersion};
    use std::time::Duration;

    struct Fixed(ProbeResult);

    impl Probe for Fixed {
        fn kind(&self) -> ProbeKind {
            ProbeKind::Capability
        }
        fn describe(&self) -> String {
            "fixed".to_string()
        }
        fn probe(&self, _ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl Probe for Failing {
        fn kind(&self) -> ProbeKind {
            ProbeKind::ManifestFile
        }
        fn describe(&self) -> String {
            "failing".to_string()
        }
        fn probe(&self, _ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
            Err(ProbeError::Xml {
                path: "AppDependencies.xml".to_string(),
                message: "unexpected end of file".to_string(),
            })
        }
    }

    struct Panicking;

    impl Probe for Panicking {
        fn kind(&self) -> ProbeKind {
            ProbeKind::Capability
        }
        fn describe(&self) -> String {
            "panicking".to_string()
        }
        fn probe(&self, _ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
            panic!("host type misbehaved")
        }
    }

    fn resolve(registry: &ComponentRegistry) -> Resolution {
        let view = FsProjectView::new("/nonexistent".into());
        let host = HostRegistry::new();
        let ctx = ProbeContext {
            project: &view,
            host: &host,
            drain_timeout: Duration::from_secs(1),
        };
        Resolver::new(registry).resolve(&ctx)
    }

    fn sub(name: &str, version: &str) -> SubVersion {
        SubVersion::new(name, Some(version.to_string()))
    }

    #[test]
    fn panicking_probe_only_empties_its_component() {
        let registry = ComponentRegistry::new()
            .with(ComponentDescriptor::new("First", Panicking))
            .and_then(|r| r.with(ComponentDescriptor::new("Second", Fixed(ProbeResult::version("2.0.0")))))
            .expect("registry");

        let resolution = resolve(&registry);
        assert_eq!(
            resolution.components,
            vec![
                ComponentRecord::absent("First"),
                ComponentRecord {
                    name: "Second".to_string(),
                    version: Some("2.0.0".to_string()),
                    sub_versions: vec![],
                },
            ]
        );
        assert_eq!(resolution.report.faulted, 1);
        assert_eq!(resolution.report.resolved, 1);
    }

    #[test]
    fn failing_probe_is_absent() {
        let registry = ComponentRegistry::new()
            .with(ComponentDescriptor::new("Firebase", Failing))
            .expect("registry");
        let resolution = resolve(&registry);
        assert_eq!(resolution.components, vec![ComponentRecord::absent("Firebase")]);
        assert_eq!(resolution.report.faulted, 1);
    }

    #[test]
    fn sub_probe_supplies_sub_versions() {
        let primary = ProbeResult {
            version: Some("12.1.0".to_string()),
            sub_versions: vec![sub("ignored", "0")],
        };
        let secondary = ProbeResult {
            version: Some("ignored".to_string()),
            sub_versions: vec![sub("FirebaseAnalytics", "12.1.0")],
        };
        let registry = ComponentRegistry::new()
            .with(ComponentDescriptor::new("Firebase", Fixed(primary)).with_sub_versions(Fixed(secondary)))
            .expect("registry");

        let record = &resolve(&registry).components[0];
        assert_eq!(record.version.as_deref(), Some("12.1.0"));
        assert_eq!(record.sub_versions, vec![sub("FirebaseAnalytics", "12.1.0")]);
    }

    #[test]
    fn without_sub_probe_sub_versions_stay_empty() {
        let primary = ProbeResult {
            version: Some("1.0.0".to_string()),
            sub_versions: vec![sub("widget", "1.0.0")],
        };
        let registry = ComponentRegistry::new()
            .with(ComponentDescriptor::new("Widget", Fixed(primary)))
            .expect("registry");
        let record = &resolve(&registry).components[0];
        assert_eq!(record.version.as_deref(), Some("1.0.0"));
        assert!(record.sub_versions.is_empty());
    }

    #[test]
    fn failing_sub_probe_keeps_primary_version() {
        let registry = ComponentRegistry::new()
            .with(
                ComponentDescriptor::new("AppLovinMAX", Fixed(ProbeResult::version("6.1.0")))
                    .with_sub_versions(Panicking),
            )
            .expect("registry");
        let resolution = resolve(&registry);
        assert_eq!(resolution.components[0].version.as_deref(), Some("6.1.0"));
        assert!(resolution.components[0].sub_versions.is_empty());
        assert_eq!(resolution.report.attempted(), 2);
    }

    #[test]
    fn empty_registry_resolves_to_empty_list() {
        let resolution = resolve(&ComponentRegistry::new());
        assert!(resolution.components.is_empty());
        assert_eq!(resolution.report, ResolveReport::default());
    }

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let static_str: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(static_str.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
