use serde::Serialize;
use thiserror::Error;
use vertrack_probes::{Probe, ProbeError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("component '{name}' is registered twice")]
    DuplicateName { name: String },

    #[error("component name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// One tracked component: a primary-version probe plus an optional sub-components probe.
pub struct ComponentDescriptor {
    name: String,
    version: Box<dyn Probe>,
    sub_versions: Option<Box<dyn Probe>>,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, version: impl Probe + 'static) -> Self {
        Self {
            name: name.into(),
            version: Box::new(version),
            sub_versions: None,
        }
    }

    pub fn with_sub_versions(mut self, probe: impl Probe + 'static) -> Self {
        self.sub_versions = Some(Box::new(probe));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_probe(&self) -> &dyn Probe {
        self.version.as_ref()
    }

    pub fn sub_versions_probe(&self) -> Option<&dyn Probe> {
        self.sub_versions.as_deref()
    }

    pub fn info(&self) -> ComponentInfo {
        ComponentInfo {
            name: self.name.clone(),
            version_source: SourceInfo::of(self.version.as_ref()),
            sub_versions_source: self.sub_versions.as_deref().map(SourceInfo::of),
        }
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("version", &self.version.describe())
            .field(
                "sub_versions",
                &self.sub_versions.as_ref().map(|p| p.describe()),
            )
            .finish()
    }
}

/// Listing entry for a registered component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentInfo {
    pub name: String,
    pub version_source: SourceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_versions_source: Option<SourceInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub kind: &'static str,
    pub source: String,
}

impl SourceInfo {
    fn of(probe: &dyn Probe) -> Self {
        Self {
            kind: probe.kind().as_str(),
            source: probe.describe(),
        }
    }
}

/// Ordered set of component descriptors. Declaration order is the output order.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    descriptors: Vec<ComponentDescriptor>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ComponentDescriptor) -> Result<(), RegistryError> {
        if descriptor.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.get(&descriptor.name).is_some() {
            return Err(RegistryError::DuplicateName {
                name: descriptor.name,
            });
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn with(mut self, descriptor: ComponentDescriptor) -> Result<Self, RegistryError> {
        self.register(descriptor)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn infos(&self) -> Vec<ComponentInfo> {
        self.descriptors.iter().map(ComponentDescriptor::info).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
