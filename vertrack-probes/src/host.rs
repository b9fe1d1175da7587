//! Host capabilities registered by integrated components.
//!
//! Components expose their version facts through a named [`HostType`] registered into a
//! [`HostRegistry`] when the exporter is constructed. Probes depend only on these traits.

use crate::drain::DrainMessage;
use crate::error::ProbeError;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tracing::{debug, warn};

/// A named capability: static members plus callback-driven operations.
pub trait HostType: Send + Sync {
    fn static_member(&self, member: &str) -> Option<String>;

    fn operation(&self, _name: &str) -> Option<Arc<dyn HostOperation>> {
        None
    }
}

/// Progress of a cooperative host operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Pending,
    Done,
}

/// Cooperative handle returned by [`HostOperation::start`]; advanced until `Done`.
pub trait StepHandle: Send {
    fn advance(&mut self) -> Step;
}

/// A host operation that reports its result through a callback rather than a return value.
pub trait HostOperation: Send + Sync {
    fn start(&self, completion: Completion) -> Result<Box<dyn StepHandle>, ProbeError>;
}

/// Completion callback handed to a host operation. May be invoked any number of times.
#[derive(Clone)]
pub struct Completion {
    tx: Sender<DrainMessage>,
}

impl Completion {
    pub(crate) fn new(tx: Sender<DrainMessage>) -> Self {
        Self { tx }
    }

    pub fn deliver(&self, payload: serde_json::Value) {
        // The receiver is gone once the drain timed out; late deliveries are dropped.
        if self.tx.send(DrainMessage::Delivered(payload)).is_err() {
            debug!("completion delivered after drain ended");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// Registry of host types keyed by fully-qualified name.
#[derive(Clone, Default)]
pub struct HostRegistry {
    types: BTreeMap<String, Arc<dyn HostType>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host type. A later registration under the same name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, host_type: Arc<dyn HostType>) {
        let name = name.into();
        if self.types.insert(name.clone(), host_type).is_some() {
            warn!(type_name = %name, "host type registered twice; keeping the latest");
        }
    }

    pub fn with(mut self, name: impl Into<String>, host_type: Arc<dyn HostType>) -> Self {
        self.register(name, host_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn HostType>> {
        self.types.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Host type backed by fixed values, e.g. loaded from configuration.
#[derive(Clone, Default)]
pub struct StaticHostType {
    members: BTreeMap<String, String>,
    operations: BTreeMap<String, Arc<dyn HostOperation>>,
}

impl StaticHostType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, member: impl Into<String>, value: impl Into<String>) -> Self {
        self.members.insert(member.into(), value.into());
        self
    }

    pub fn with_operation(
        mut self,
        name: impl Into<String>,
        operation: Arc<dyn HostOperation>,
    ) -> Self {
        self.operations.insert(name.into(), operation);
        self
    }
}

impl HostType for StaticHostType {
    fn static_member(&self, member: &str) -> Option<String> {
        self.members.get(member).cloned()
    }

    fn operation(&self, name: &str) -> Option<Arc<dyn HostOperation>> {
        self.operations.get(name).cloned()
    }
}

/// Operation that delivers a JSON payload read from disk.
///
/// Reading happens on the second step, mirroring a load that is kicked off, then completes.
#[derive(Debug, Clone)]
pub struct JsonFileOperation {
    path: Utf8PathBuf,
}

impl JsonFileOperation {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl HostOperation for JsonFileOperation {
    fn start(&self, completion: Completion) -> Result<Box<dyn StepHandle>, ProbeError> {
        Ok(Box::new(JsonFileLoad {
            path: self.path.clone(),
            completion,
            started: false,
        }))
    }
}

struct JsonFileLoad {
    path: Utf8PathBuf,
    completion: Completion,
    started: bool,
}

impl StepHandle for JsonFileLoad {
    fn advance(&mut self) -> Step {
        if !self.started {
            self.started = true;
            return Step::Pending;
        }

        let parsed = fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()));
        match parsed {
            Ok(payload) => self.completion.deliver(payload),
            Err(message) => {
                // The callback never fires; the drain reports it as absent.
                warn!(path = %self.path, error = %message, "plugin data load failed");
            }
        }
        Step::Done
    }
}
