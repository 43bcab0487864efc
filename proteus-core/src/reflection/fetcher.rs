//! # Fragment Fetcher
//!
//! Turns single reflection exchanges into typed results: raw `FileDescriptorProto` bytes for
//! symbol and filename lookups, service names for listings.
//!
//! Every call is an independent exchange on the underlying [`ReflectionTransport`]. The
//! response must carry the variant matching the request kind; anything else is an error.
use super::error::ReflectionResolveError;
use super::generated::reflection_v1::{
    ServerReflectionRequest, ServerReflectionResponse, server_reflection_request::MessageRequest,
    server_reflection_response::MessageResponse,
};
use super::transport::ReflectionTransport;

/// The pattern sent with `list_services` requests. Servers ignore it in practice.
const LIST_ALL_SERVICES: &str = "*";

pub struct FragmentFetcher<T> {
    transport: T,
    host: String,
}

impl<T: ReflectionTransport> FragmentFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            host: String::new(),
        }
    }

    /// Sets the `host` field sent with every request.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Fetches the file declaring `symbol`. Servers may include some or all of its dependencies.
    pub async fn fetch_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<Vec<Vec<u8>>, ReflectionResolveError> {
        self.fetch_fragments(MessageRequest::FileContainingSymbol(symbol.to_string()))
            .await
    }

    /// Fetches the file named `filename`.
    pub async fn fetch_by_filename(
        &mut self,
        filename: &str,
    ) -> Result<Vec<Vec<u8>>, ReflectionResolveError> {
        self.fetch_fragments(MessageRequest::FileByFilename(filename.to_string()))
            .await
    }

    /// Lists the fully qualified names of all services exposed by the server, in server order.
    pub async fn list_services(&mut self) -> Result<Vec<String>, ReflectionResolveError> {
        let response = self
            .send(MessageRequest::ListServices(LIST_ALL_SERVICES.to_string()))
            .await?;

        match response.message_response {
            Some(MessageResponse::ListServicesResponse(resp)) => {
                Ok(resp.service.into_iter().map(|s| s.name).collect())
            }
            other => Err(unexpected_response(other)),
        }
    }

    async fn fetch_fragments(
        &mut self,
        request: MessageRequest,
    ) -> Result<Vec<Vec<u8>>, ReflectionResolveError> {
        let response = self.send(request).await?;

        match response.message_response {
            Some(MessageResponse::FileDescriptorResponse(resp)) => Ok(resp.file_descriptor_proto),
            other => Err(unexpected_response(other)),
        }
    }

    async fn send(
        &mut self,
        request: MessageRequest,
    ) -> Result<ServerReflectionResponse, ReflectionResolveError> {
        tracing::debug!(request = ?request, host = %self.host, "sending reflection request");

        let req = ServerReflectionRequest {
            host: self.host.clone(),
            message_request: Some(request),
        };

        self.transport.exchange(req).await
    }
}

fn unexpected_response(response: Option<MessageResponse>) -> ReflectionResolveError {
    match response {
        Some(MessageResponse::ErrorResponse(e)) => ReflectionResolveError::ServerError {
            code: e.error_code,
            message: e.error_message,
        },
        Some(other) => ReflectionResolveError::UnexpectedResponseType(format!("{other:?}")),
        None => ReflectionResolveError::UnexpectedResponseType("Empty Message".into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reflection::error::ErrorKind;
    use crate::reflection::generated::reflection_v1::{
        ErrorResponse, ExtensionNumberResponse, FileDescriptorResponse, ListServiceResponse,
        ServiceResponse,
    };
    use crate::reflection::testing::ScriptedTransport;

    fn response(message: MessageResponse) -> ServerReflectionResponse {
        ServerReflectionResponse {
            message_response: Some(message),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn list_services_keeps_server_order() {
        let transport = ScriptedTransport::new().on_list(response(
            MessageResponse::ListServicesResponse(ListServiceResponse {
                service: vec![
                    ServiceResponse {
                        name: "pkg.Alpha".into(),
                    },
                    ServiceResponse {
                        name: "pkg.Beta".into(),
                    },
                ],
            }),
        ));
        let mut fetcher = FragmentFetcher::new(transport.clone());

        let services = fetcher.list_services().await.unwrap();

        assert_eq!(services, vec!["pkg.Alpha", "pkg.Beta"]);
        assert_eq!(
            transport.requests(),
            vec![MessageRequest::ListServices("*".into())]
        );
    }

    #[tokio::test]
    async fn fetch_by_symbol_returns_raw_fragments() {
        let transport = ScriptedTransport::new().on_symbol(
            "pkg.Alpha",
            response(MessageResponse::FileDescriptorResponse(
                FileDescriptorResponse {
                    file_descriptor_proto: vec![vec![1, 2, 3]],
                },
            )),
        );
        let mut fetcher = FragmentFetcher::new(transport);

        let fragments = fetcher.fetch_by_symbol("pkg.Alpha").await.unwrap();

        assert_eq!(fragments, vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn error_response_is_a_remote_error() {
        let transport = ScriptedTransport::new().on_file(
            "missing.proto",
            response(MessageResponse::ErrorResponse(ErrorResponse {
                error_code: 5,
                error_message: "file not found".into(),
            })),
        );
        let mut fetcher = FragmentFetcher::new(transport);

        let err = fetcher.fetch_by_filename("missing.proto").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Remote);
        assert!(err.is_not_found());
        assert!(matches!(
            err,
            ReflectionResolveError::ServerError { code: 5, ref message } if message == "file not found"
        ));
    }

    #[tokio::test]
    async fn empty_response_is_a_protocol_error() {
        let transport = ScriptedTransport::new()
            .on_file("a.proto", ServerReflectionResponse::default());
        let mut fetcher = FragmentFetcher::new(transport);

        let err = fetcher.fetch_by_filename("a.proto").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn mismatched_response_is_a_protocol_error() {
        let transport = ScriptedTransport::new().on_list(response(
            MessageResponse::AllExtensionNumbersResponse(ExtensionNumberResponse::default()),
        ));
        let mut fetcher = FragmentFetcher::new(transport);

        let err = fetcher.list_services().await.unwrap_err();

        assert!(matches!(err, ReflectionResolveError::UnexpectedResponseType(_)));
    }

    #[tokio::test]
    async fn host_is_sent_with_every_request() {
        let transport = ScriptedTransport::new().on_list(response(
            MessageResponse::ListServicesResponse(ListServiceResponse::default()),
        ));
        let mut fetcher = FragmentFetcher::new(transport.clone()).with_host("api.internal");

        fetcher.list_services().await.unwrap();

        assert_eq!(transport.hosts(), vec!["api.internal"]);
    }
}
