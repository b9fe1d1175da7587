//! Property-based tests for declaration-order output and fault isolation.

use proptest::prelude::*;
use std::time::Duration;
use vertrack_domain::{ComponentDescriptor, ComponentRegistry, Resolver};
use vertrack_probes::{
    FsProjectView, HostRegistry, Probe, ProbeContext, ProbeError, ProbeKind, ProbeResult,
};

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Resolves,
    Absent,
    Fails,
    Panics,
}

struct Scripted {
    behavior: Behavior,
}

impl Probe for Scripted {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Capability
    }

    fn describe(&self) -> String {
        format!("{:?}", self.behavior)
    }

    fn probe(&self, _ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        match self.behavior {
            Behavior::Resolves => Ok(ProbeResult::version("1.0.0")),
            Behavior::Absent => Ok(ProbeResult::absent()),
            Behavior::Fails => Err(ProbeError::Io {
                path: "manifest".to_string(),
                message: "denied".to_string(),
            }),
            Behavior::Panics => panic!("probe exploded"),
        }
    }
}

fn arb_behavior() -> impl Strategy<Value = Behavior> {
    prop_oneof![
        Just(Behavior::Resolves),
        Just(Behavior::Absent),
        Just(Behavior::Fails),
        Just(Behavior::Panics),
    ]
}

/// Unique component names paired with a probe behavior, in arbitrary order.
fn arb_components() -> impl Strategy<Value = Vec<(String, Behavior)>> {
    prop::collection::btree_set("[A-Z][A-Za-z0-9]{0,10}", 0..8)
        .prop_flat_map(|names| {
            let len = names.len();
            (
                Just(names.into_iter().collect::<Vec<_>>()),
                prop::collection::vec(arb_behavior(), len),
            )
        })
        .prop_map(|(names, behaviors)| names.into_iter().zip(behaviors).collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    /// Output order equals declaration order; only resolving probes produce versions.
    #[test]
    fn records_follow_declaration_order(components in arb_components()) {
        let mut registry = ComponentRegistry::new();
        for (name, behavior) in &components {
            registry
                .register(ComponentDescriptor::new(name.clone(), Scripted { behavior: *behavior }))
                .unwrap();
        }

        let view = FsProjectView::new("/nonexistent".into());
        let host = HostRegistry::new();
        let ctx = ProbeContext { project: &view, host: &host, drain_timeout: Duration::from_secs(1) };
        let resolution = Resolver::new(&registry).resolve(&ctx);

        prop_assert_eq!(resolution.components.len(), components.len());
        for (record, (name, behavior)) in resolution.components.iter().zip(&components) {
            prop_assert_eq!(&record.name, name);
            let expect_version = matches!(behavior, Behavior::Resolves);
            prop_assert_eq!(record.version.is_some(), expect_version);
        }

        let faults = components
            .iter()
            .filter(|(_, b)| matches!(b, Behavior::Fails | Behavior::Panics))
            .count();
        prop_assert_eq!(resolution.report.faulted, faults);
        prop_assert_eq!(resolution.report.attempted(), components.len());
    }
}
