//! Bounded draining of callback-driven host operations.
//!
//! Some components only report their versions through a completion callback fired by a
//! cooperative operation. The operation is advanced on a worker thread while the caller
//! waits on a channel, never longer than the configured bound.

use crate::error::ProbeError;
use crate::host::{Completion, HostOperation, Step};
use crate::probe::{Probe, ProbeContext, ProbeKind};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use vertrack_types::component::{ProbeResult, SubVersion};

pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) enum DrainMessage {
    Delivered(Value),
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    /// The operation ran to completion; payloads in delivery order.
    Completed(Vec<Value>),
    /// The bound elapsed first.
    TimedOut { delivered: usize },
}

/// Start `operation` and collect every payload it delivers, waiting at most `timeout`.
///
/// On timeout the worker is told to stop and exits before its next step; the handle is
/// dropped with it. A `timeout` too large to form a deadline waits without bound.
pub fn drain(
    operation: &Arc<dyn HostOperation>,
    timeout: Duration,
) -> Result<DrainOutcome, ProbeError> {
    let (tx, rx) = mpsc::channel();
    let mut handle = operation.start(Completion::new(tx.clone()))?;
    let cancelled = Arc::new(AtomicBool::new(false));

    let worker_cancelled = Arc::clone(&cancelled);
    thread::Builder::new()
        .name("vertrack-drain".to_string())
        .spawn(move || {
            while !worker_cancelled.load(Ordering::Acquire) {
                if handle.advance() != Step::Pending {
                    let _ = tx.send(DrainMessage::Finished);
                    return;
                }
                thread::yield_now();
            }
        })
        .map_err(|e| ProbeError::Host {
            operation: "drain".to_string(),
            message: e.to_string(),
        })?;

    let deadline = Instant::now().checked_add(timeout);
    let mut payloads = Vec::new();
    loop {
        let received = match deadline {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(DrainMessage::Delivered(value)) => payloads.push(value),
            Ok(DrainMessage::Finished) | Err(RecvTimeoutError::Disconnected) => {
                // Pick up anything delivered between the last receive and completion.
                while let Ok(DrainMessage::Delivered(value)) = rx.try_recv() {
                    payloads.push(value);
                }
                return Ok(DrainOutcome::Completed(payloads));
            }
            Err(RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::Release);
                return Ok(DrainOutcome::TimedOut {
                    delivered: payloads.len(),
                });
            }
        }
    }
}

/// How to turn a delivered plugin-data payload into sub-versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDataRule {
    /// Top-level key that must be present and non-null for the payload to count.
    pub required_key: Option<String>,
    /// Top-level arrays whose entries are collected, in this order.
    pub list_keys: Vec<String>,
    /// Entry field holding the sub-component name.
    pub name_key: String,
    /// Path inside each entry to its version.
    pub version_path: Vec<String>,
}

impl PluginDataRule {
    /// Sub-versions carried by one payload, or `None` when the payload does not qualify.
    pub fn extract(&self, payload: &Value) -> Option<Vec<SubVersion>> {
        if let Some(key) = &self.required_key
            && payload.get(key).is_none_or(Value::is_null)
        {
            return None;
        }

        let mut out = Vec::new();
        for key in &self.list_keys {
            let entries = payload.get(key)?.as_array()?;
            for entry in entries {
                let Some(name) = entry.get(&self.name_key).and_then(Value::as_str) else {
                    continue;
                };
                let version = self
                    .version_path
                    .iter()
                    .try_fold(entry, |node, segment| node.get(segment))
                    .and_then(scalar_to_string);
                out.push(SubVersion::new(name, version));
            }
        }
        Some(out)
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolves sub-versions by draining a host operation's callback.
pub struct AsyncDrainProbe {
    type_name: String,
    operation: String,
    rule: PluginDataRule,
}

impl AsyncDrainProbe {
    pub fn new(
        type_name: impl Into<String>,
        operation: impl Into<String>,
        rule: PluginDataRule,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            operation: operation.into(),
            rule,
        }
    }
}

impl Probe for AsyncDrainProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::AsyncDrain
    }

    fn describe(&self) -> String {
        format!("{}.{}()", self.type_name, self.operation)
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        let Some(host_type) = ctx.host.get(&self.type_name) else {
            warn!(type_name = %self.type_name, "type not found in the project");
            return Ok(ProbeResult::absent());
        };
        let Some(operation) = host_type.operation(&self.operation) else {
            warn!(
                type_name = %self.type_name,
                operation = %self.operation,
                "operation not found"
            );
            return Ok(ProbeResult::absent());
        };

        let payloads = match drain(&operation, ctx.drain_timeout)? {
            DrainOutcome::Completed(payloads) => payloads,
            DrainOutcome::TimedOut { delivered } => {
                warn!(
                    operation = %self.operation,
                    timeout_ms = ctx.drain_timeout.as_millis() as u64,
                    delivered,
                    "operation did not complete in time"
                );
                return Ok(ProbeResult::absent());
            }
        };

        if payloads.is_empty() {
            warn!(operation = %self.operation, "operation completed without a result");
            return Ok(ProbeResult::absent());
        }

        let mut sub_versions = Vec::new();
        for payload in &payloads {
            match self.rule.extract(payload) {
                Some(found) => sub_versions.extend(found),
                None => {
                    warn!(operation = %self.operation, "payload is missing plugin data");
                    return Ok(ProbeResult::absent());
                }
            }
        }

        debug!(
            operation = %self.operation,
            count = sub_versions.len(),
            "drained sub-versions"
        );
        Ok(ProbeResult {
            version: None,
            sub_versions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostRegistry, StaticHostType, StepHandle};
    use crate::view::FsProjectView;
    use serde_json::json;

    /// Delivers each payload on its own step.
    struct Scripted {
        payloads: Vec<Value>,
    }

    struct ScriptedRun {
        payloads: std::vec::IntoIter<Value>,
        completion: Completion,
    }

    impl HostOperation for Scripted {
        fn start(&self, completion: Completion) -> Result<Box<dyn StepHandle>, ProbeError> {
            Ok(Box::new(ScriptedRun {
                payloads: self.payloads.clone().into_iter(),
                completion,
            }))
        }
    }

    impl StepHandle for ScriptedRun {
        fn advance(&mut self) -> Step {
            match self.payloads.next() {
                Some(p) => {
                    self.completion.deliver(p);
                    Step::Pending
                }
                None => Step::Done,
            }
        }
    }

    /// Never finishes.
    struct Stuck;

    struct StuckRun;

    impl HostOperation for Stuck {
        fn start(&self, _completion: Completion) -> Result<Box<dyn StepHandle>, ProbeError> {
            Ok(Box::new(StuckRun))
        }
    }

    impl StepHandle for StuckRun {
        fn advance(&mut self) -> Step {
            thread::sleep(Duration::from_millis(5));
            Step::Pending
        }
    }

    /// Never finishes and counts how often it was advanced.
    struct Counting {
        steps: Arc<std::sync::atomic::AtomicUsize>,
    }

    struct CountingRun {
        steps: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl HostOperation for Counting {
        fn start(&self, _completion: Completion) -> Result<Box<dyn StepHandle>, ProbeError> {
            Ok(Box::new(CountingRun {
                steps: Arc::clone(&self.steps),
            }))
        }
    }

    impl StepHandle for CountingRun {
        fn advance(&mut self) -> Step {
            self.steps.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
            Step::Pending
        }
    }

    struct Refuses;

    impl HostOperation for Refuses {
        fn start(&self, _completion: Completion) -> Result<Box<dyn StepHandle>, ProbeError> {
            Err(ProbeError::Host {
                operation: "LoadPluginData".to_string(),
                message: "not ready".to_string(),
            })
        }
    }

    fn max_rule() -> PluginDataRule {
        PluginDataRule {
            required_key: Some("AppLovinMax".to_string()),
            list_keys: vec!["MediatedNetworks".to_string(), "PartnerMicroSdks".to_string()],
            name_key: "DisplayName".to_string(),
            version_path: vec!["CurrentVersions".to_string(), "Unity".to_string()],
        }
    }

    fn plugin_data() -> Value {
        json!({
            "AppLovinMax": { "CurrentVersions": { "Unity": "6.1.0" } },
            "MediatedNetworks": [
                { "DisplayName": "AdMob", "CurrentVersions": { "Unity": "android_23.0.0" } },
                { "DisplayName": "Unity Ads", "CurrentVersions": null },
                { "CurrentVersions": { "Unity": "ignored" } }
            ],
            "PartnerMicroSdks": [
                { "DisplayName": "Pangle", "CurrentVersions": { "Unity": "5.7.0" } }
            ]
        })
    }

    fn run_probe(op: Arc<dyn HostOperation>, timeout: Duration) -> ProbeResult {
        let host = HostRegistry::new().with(
            "AppLovinIntegrationManager",
            Arc::new(StaticHostType::new().with_operation("LoadPluginData", op)),
        );
        let view = FsProjectView::new("/nonexistent".into());
        let ctx = ProbeContext {
            project: &view,
            host: &host,
            drain_timeout: timeout,
        };
        AsyncDrainProbe::new("AppLovinIntegrationManager", "LoadPluginData", max_rule())
            .probe(&ctx)
            .expect("probe")
    }

    #[test]
    fn drain_collects_every_delivery_in_order() {
        let op: Arc<dyn HostOperation> = Arc::new(Scripted {
            payloads: vec![json!(1), json!(2), json!(3)],
        });
        let outcome = drain(&op, Duration::from_secs(5)).expect("drain");
        assert_eq!(
            outcome,
            DrainOutcome::Completed(vec![json!(1), json!(2), json!(3)])
        );
    }

    #[test]
    fn drain_times_out_within_bound() {
        let op: Arc<dyn HostOperation> = Arc::new(Stuck);
        let started = Instant::now();
        let outcome = drain(&op, Duration::from_millis(100)).expect("drain");
        assert_eq!(outcome, DrainOutcome::TimedOut { delivered: 0 });
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn timed_out_operation_stops_advancing() {
        let steps = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let op: Arc<dyn HostOperation> = Arc::new(Counting {
            steps: Arc::clone(&steps),
        });
        let outcome = drain(&op, Duration::from_millis(50)).expect("drain");
        assert_eq!(outcome, DrainOutcome::TimedOut { delivered: 0 });

        // Let the worker observe the stop request and finish its current step.
        thread::sleep(Duration::from_millis(50));
        let settled = steps.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(steps.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn unbounded_timeout_waits_for_completion() {
        let op: Arc<dyn HostOperation> = Arc::new(Scripted {
            payloads: vec![json!("a"), json!("b")],
        });
        let outcome = drain(&op, Duration::MAX).expect("drain");
        assert_eq!(outcome, DrainOutcome::Completed(vec![json!("a"), json!("b")]));
    }

    #[test]
    fn probe_with_unbounded_timeout_resolves() {
        let op: Arc<dyn HostOperation> = Arc::new(Scripted {
            payloads: vec![plugin_data()],
        });
        assert_eq!(run_probe(op, Duration::MAX).sub_versions.len(), 3);
    }

    #[test]
    fn drain_propagates_start_failure() {
        let op: Arc<dyn HostOperation> = Arc::new(Refuses);
        assert!(matches!(
            drain(&op, Duration::from_secs(1)),
            Err(ProbeError::Host { .. })
        ));
    }

    #[test]
    fn rule_collects_both_lists_and_skips_nameless_entries() {
        let subs = max_rule().extract(&plugin_data()).expect("qualifies");
        assert_eq!(
            subs,
            vec![
                SubVersion::new("AdMob", Some("android_23.0.0".to_string())),
                SubVersion::new("Unity Ads", None),
                SubVersion::new("Pangle", Some("5.7.0".to_string())),
            ]
        );
    }

    #[test]
    fn rule_rejects_payload_without_required_key() {
        let payload = json!({ "AppLovinMax": null, "MediatedNetworks": [], "PartnerMicroSdks": [] });
        assert!(max_rule().extract(&payload).is_none());
    }

    #[test]
    fn rule_rejects_payload_with_missing_list() {
        let payload = json!({ "AppLovinMax": {}, "MediatedNetworks": [] });
        assert!(max_rule().extract(&payload).is_none());
    }

    #[test]
    fn probe_resolves_sub_versions() {
        let op: Arc<dyn HostOperation> = Arc::new(Scripted {
            payloads: vec![plugin_data()],
        });
        let result = run_probe(op, Duration::from_secs(5));
        assert_eq!(result.version, None);
        assert_eq!(result.sub_versions.len(), 3);
    }

    #[test]
    fn probe_is_absent_when_completion_never_fires() {
        let op: Arc<dyn HostOperation> = Arc::new(Scripted { payloads: vec![] });
        assert!(run_probe(op, Duration::from_secs(5)).is_absent());
    }

    #[test]
    fn probe_is_absent_on_timeout() {
        let op: Arc<dyn HostOperation> = Arc::new(Stuck);
        let started = Instant::now();
        assert!(run_probe(op, Duration::from_millis(100)).is_absent());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn probe_is_absent_when_operation_missing() {
        let host = HostRegistry::new().with(
            "AppLovinIntegrationManager",
            Arc::new(StaticHostType::new()),
        );
        let view = FsProjectView::new("/nonexistent".into());
        let ctx = ProbeContext {
            project: &view,
            host: &host,
            drain_timeout: Duration::from_secs(1),
        };
        let result = AsyncDrainProbe::new("AppLovinIntegrationManager", "LoadPluginData", max_rule())
            .probe(&ctx)
            .expect("probe");
        assert!(result.is_absent());
    }
}
