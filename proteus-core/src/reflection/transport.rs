//! # Reflection Transport
//!
//! A transport session performs exactly one reflection exchange: it sends a single
//! [`ServerReflectionRequest`] and yields the single [`ServerReflectionResponse`] the server
//! answers with.
//!
//! The production implementation, [`TonicTransport`], opens a fresh `ServerReflectionInfo`
//! bidirectional stream per exchange, so no exchange ever spans two fetches.
use super::error::ReflectionResolveError;
use super::generated::reflection_v1::{
    ServerReflectionRequest, ServerReflectionResponse,
    server_reflection_client::ServerReflectionClient,
};
use crate::BoxError;
use futures_util::stream::once;
use http_body::Body as HttpBody;
use tonic::client::GrpcService;
use tonic::metadata::MetadataMap;
use tonic::transport::Channel;

/// One-request/one-response access to a server reflection service.
pub trait ReflectionTransport {
    fn exchange(
        &mut self,
        request: ServerReflectionRequest,
    ) -> impl Future<Output = Result<ServerReflectionResponse, ReflectionResolveError>>;
}

/// A [`ReflectionTransport`] backed by a tonic service (a `Channel`, an in-process router, ...).
#[derive(Debug, Clone)]
pub struct TonicTransport<S = Channel> {
    client: ServerReflectionClient<S>,
    metadata: MetadataMap,
}

impl<S> TonicTransport<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        Self {
            client: ServerReflectionClient::new(service),
            metadata: MetadataMap::new(),
        }
    }

    /// Attaches `metadata` to every exchange performed by this transport.
    pub fn with_metadata(mut self, metadata: MetadataMap) -> Self {
        self.metadata = metadata;
        self
    }
}

impl<S> ReflectionTransport for TonicTransport<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    async fn exchange(
        &mut self,
        request: ServerReflectionRequest,
    ) -> Result<ServerReflectionResponse, ReflectionResolveError> {
        let mut outbound = tonic::Request::new(once(async move { request }));
        *outbound.metadata_mut() = self.metadata.clone();

        let mut response_stream = self
            .client
            .server_reflection_info(outbound)
            .await
            .map_err(ReflectionResolveError::ServerStreamInitFailed)?
            .into_inner();

        response_stream
            .message()
            .await
            .map_err(ReflectionResolveError::ServerStreamFailure)?
            .ok_or(ReflectionResolveError::StreamClosed)
    }
}
