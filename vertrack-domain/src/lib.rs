//! Domain logic: turn a component registry plus project state into ordered version records.
//!
//! This crate owns *which* components are tracked and how their probe results combine. It
//! does not own where results are written; that's `vertrack-core`.

mod catalog;
mod registry;
mod resolver;

pub use catalog::{APPLOVIN_INTEGRATION_MANAGER, applovin_plugin_data_rule, builtin_registry};
pub use registry::{
    ComponentDescriptor, ComponentInfo, ComponentRegistry, RegistryError, SourceInfo,
};
pub use resolver::{Resolution, ResolveReport, Resolver};
