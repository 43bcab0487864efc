//! # Proteus Core
//!
//! `proteus-core` reconstructs the Protobuf schema of a running gRPC server through the
//! Server Reflection Protocol (`grpc.reflection.v1`), without any compile-time knowledge of it.
//!
//! Reflection answers one file at a time, and each file may import others. The heart of this
//! crate is the resolver that follows those imports, fetching every missing file exactly once,
//! until the set of files is closed and can be assembled into a [`DescriptorPool`].
//!
//! ## Key Components
//!
//! * **[`ReflectionClient`]:** The main entry point. Lists services and resolves schemas by
//!   symbol or by file name.
//! * **[`ClientConfig`]:** Address, TLS credentials, timeouts and request metadata.
//! * **[`reflection::transport::ReflectionTransport`]:** One request/one response access to a
//!   reflection service. [`reflection::transport::TonicTransport`] implements it over any
//!   tonic service.
//! * **[`reflection::resolver`]:** The dependency resolver.
//! * **[`schema`]:** Assembly of resolved files into a [`DescriptorPool`] and symbol lookup.
//!
//! ## Feature Flags (Internal use only)
//!
//! * `gen-proto`: Enables support for generating reflection service bindings (internal use).
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, `prost-types` and `tonic` to ensure that
//! consumers use compatible versions of these underlying dependencies.
//!
//! [`DescriptorPool`]: prost_reflect::DescriptorPool
pub mod client;
pub mod config;
pub mod reflection;
pub mod schema;

pub use client::{ClientConnectError, DescribeError, ReflectionClient, ResolveSchemaError};
pub use config::{ClientConfig, TlsConfig};

// Re-exports
pub use prost;
pub use prost_reflect;
pub use prost_types;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
