//! # Schema Assembly
//!
//! Turns a closed [`FragmentRegistry`] into a queryable [`DescriptorPool`], and looks symbols up
//! in the result.
use crate::reflection::registry::FragmentRegistry;
use prost_reflect::{
    DescriptorError, DescriptorPool, EnumDescriptor, MessageDescriptor, ServiceDescriptor,
};

/// Builds a [`DescriptorPool`] from every file in `registry`.
///
/// Fails if the files do not form a valid schema, e.g. they reference types that none of them
/// define.
pub fn assemble(registry: FragmentRegistry) -> Result<DescriptorPool, DescriptorError> {
    DescriptorPool::from_file_descriptor_set(registry.into_file_descriptor_set())
}

/// Looks up a service, message or enum by its fully qualified name.
pub fn lookup(pool: &DescriptorPool, symbol: &str) -> Option<Descriptor> {
    if let Some(descriptor) = pool.get_service_by_name(symbol) {
        return Some(Descriptor::ServiceDescriptor(descriptor));
    }
    if let Some(descriptor) = pool.get_message_by_name(symbol) {
        return Some(Descriptor::MessageDescriptor(descriptor));
    }
    if let Some(descriptor) = pool.get_enum_by_name(symbol) {
        return Some(Descriptor::EnumDescriptor(descriptor));
    }
    None
}

/// A generic wrapper for the descriptors a symbol can resolve to.
#[derive(Debug, Clone)]
pub enum Descriptor {
    MessageDescriptor(MessageDescriptor),
    ServiceDescriptor(ServiceDescriptor),
    EnumDescriptor(EnumDescriptor),
}

impl Descriptor {
    /// Returns the fully qualified name (e.g.,`my.package.v1.MyMessage`) of the inner descriptor
    pub fn full_name(&self) -> &str {
        match self {
            Descriptor::MessageDescriptor(v) => v.full_name(),
            Descriptor::ServiceDescriptor(v) => v.full_name(),
            Descriptor::EnumDescriptor(v) => v.full_name(),
        }
    }
}
