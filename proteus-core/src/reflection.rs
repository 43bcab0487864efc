//! # Server Reflection
//!
//! This module contains the logic necessary to interact with the gRPC Server Reflection Protocol.
//!
//! Layers, leaf first:
//!
//! * [`transport`]: a single request/response exchange with the server.
//! * [`fetcher`]: typed lookups (by symbol, by file name, service listing) on top of one exchange.
//! * [`resolver`]: follows imports until the set of fetched files is closed.
//!
//! ## References
//!
//! * [gRPC Server Reflection Protocol](https://github.com/grpc/grpc/blob/master/doc/server-reflection.md)
pub mod error;
pub mod fetcher;
pub mod generated;
pub mod registry;
pub mod resolver;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
