//! # Reflection Client
//!
//! [`ReflectionClient`] is the main entry point. It composes the
//! [`FragmentFetcher`] (one request per lookup), the [resolver](crate::reflection::resolver)
//! (transitive imports) and the [schema assembler](crate::schema) to answer three questions:
//!
//! * which services does the server expose ([`ReflectionClient::list_services`]),
//! * what is the schema around a symbol ([`ReflectionClient::resolve_by_symbol`]),
//! * what is the schema around a file ([`ReflectionClient::resolve_by_filename`]).
//!
//! Every call resolves from scratch: nothing is cached between calls.
//!
//! ## Example
//!
//! ```rust,no_run
//! use proteus_core::{ClientConfig, ReflectionClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://localhost:50051").with_header("x-api-key", "secret");
//! let mut client = ReflectionClient::connect(&config).await?;
//!
//! let services = client.list_services().await?;
//! let pool = client.resolve_by_symbol(&services[0]).await?;
//! # Ok(())
//! # }
//! ```
use crate::{
    BoxError,
    config::ClientConfig,
    reflection::{
        error::ReflectionResolveError,
        fetcher::FragmentFetcher,
        registry::FragmentRegistry,
        resolver,
        transport::{ReflectionTransport, TonicTransport},
    },
    schema::{self, Descriptor},
};
use http_body::Body as HttpBody;
use prost_reflect::{DescriptorError, DescriptorPool};
use prost_types::FileDescriptorSet;
use std::path::PathBuf;
use tonic::metadata::errors::{InvalidMetadataKey, InvalidMetadataValue};
use tonic::transport::Channel;

/// Errors that can occur when connecting to a gRPC server.
#[derive(Debug, thiserror::Error)]
pub enum ClientConnectError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Invalid TLS configuration: {0}")]
    InvalidTlsConfig(#[source] tonic::transport::Error),
    #[error("Failed to read CA certificate '{}': {source}", .path.display())]
    ReadCertificate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
}

/// Errors that can occur when resolving a schema.
#[derive(Debug, thiserror::Error)]
pub enum ResolveSchemaError {
    #[error("Reflection resolution failed: '{0}'")]
    Reflection(#[from] ReflectionResolveError),
    #[error("Failed to build schema from file descriptors: '{0}'")]
    Schema(#[from] DescriptorError),
}

/// Errors that can occur when describing a symbol.
#[derive(Debug, thiserror::Error)]
pub enum DescribeError {
    #[error("Reflection resolution failed: '{0}'")]
    Reflection(#[from] ReflectionResolveError),
    #[error("Failed to build schema from file descriptors: '{0}'")]
    Schema(#[from] DescriptorError),
    #[error("Symbol '{0}' not found")]
    NotFound(String),
}

/// A client for the gRPC Server Reflection Protocol (`grpc.reflection.v1`).
pub struct ReflectionClient<T = TonicTransport<Channel>> {
    fetcher: FragmentFetcher<T>,
}

impl ReflectionClient<TonicTransport<Channel>> {
    /// Connects to the server described by `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(ReflectionClient)` - The connected client.
    /// * `Err(ClientConnectError)` - If the configuration is invalid or the connection fails.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientConnectError> {
        let endpoint = config.endpoint()?;
        let metadata = config.metadata()?;

        tracing::debug!(url = %config.target_url(), tls = config.uses_tls(), "connecting");

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ClientConnectError::ConnectionFailed(config.url.clone(), e))?;

        let transport = TonicTransport::new(channel).with_metadata(metadata);

        Ok(Self::new(transport).with_host(config.host.clone()))
    }
}

impl<S> ReflectionClient<TonicTransport<S>>
where
    S: tonic::client::GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Creates a client from an existing Tonic service/channel.
    pub fn from_service(service: S) -> Self {
        Self::new(TonicTransport::new(service))
    }
}

impl<T: ReflectionTransport> ReflectionClient<T> {
    /// Creates a client over any [`ReflectionTransport`].
    pub fn new(transport: T) -> Self {
        Self {
            fetcher: FragmentFetcher::new(transport),
        }
    }

    /// Sets the `host` field sent with every reflection request.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.fetcher = self.fetcher.with_host(host);
        self
    }

    /// Lists all services exposed by the server.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Fully qualified service names (e.g. `helloworld.Greeter`), in server order.
    /// * `Err(ReflectionResolveError)` - If the exchange fails or the server answers with anything
    ///   but a service list.
    pub async fn list_services(&mut self) -> Result<Vec<String>, ReflectionResolveError> {
        self.fetcher.list_services().await
    }

    /// Resolves the schema around `symbol` (e.g., `my.package.MyService`).
    ///
    /// The server returns the file declaring the symbol; every file it imports, directly or
    /// transitively, is then fetched until the schema is complete.
    pub async fn resolve_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<DescriptorPool, ResolveSchemaError> {
        let registry = self.registry_by_symbol(symbol).await?;
        Ok(schema::assemble(registry)?)
    }

    /// Resolves the schema around the file named `filename` (e.g., `my/package/service.proto`).
    pub async fn resolve_by_filename(
        &mut self,
        filename: &str,
    ) -> Result<DescriptorPool, ResolveSchemaError> {
        let registry = self.registry_by_filename(filename).await?;
        Ok(schema::assemble(registry)?)
    }

    /// Like [`Self::resolve_by_symbol`], but returns the raw file descriptors, dependencies first.
    pub async fn file_descriptor_set_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<FileDescriptorSet, ReflectionResolveError> {
        let registry = self.registry_by_symbol(symbol).await?;
        Ok(registry.into_file_descriptor_set())
    }

    /// Like [`Self::resolve_by_filename`], but returns the raw file descriptors, dependencies first.
    pub async fn file_descriptor_set_by_filename(
        &mut self,
        filename: &str,
    ) -> Result<FileDescriptorSet, ReflectionResolveError> {
        let registry = self.registry_by_filename(filename).await?;
        Ok(registry.into_file_descriptor_set())
    }

    /// Resolves `symbol` and returns its service, message or enum descriptor.
    ///
    /// A symbol the server does not know is reported as [`DescribeError::NotFound`].
    pub async fn describe_symbol(&mut self, symbol: &str) -> Result<Descriptor, DescribeError> {
        let registry = self.registry_by_symbol(symbol).await.map_err(|err| {
            if err.is_not_found() {
                DescribeError::NotFound(symbol.to_string())
            } else {
                DescribeError::Reflection(err)
            }
        })?;

        let pool = schema::assemble(registry)?;

        schema::lookup(&pool, symbol).ok_or_else(|| DescribeError::NotFound(symbol.to_string()))
    }

    async fn registry_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<FragmentRegistry, ReflectionResolveError> {
        let roots = self.fetcher.fetch_by_symbol(symbol).await?;
        resolver::resolve(&mut self.fetcher, roots).await
    }

    async fn registry_by_filename(
        &mut self,
        filename: &str,
    ) -> Result<FragmentRegistry, ReflectionResolveError> {
        let roots = self.fetcher.fetch_by_filename(filename).await?;
        resolver::resolve(&mut self.fetcher, roots).await
    }
}
