/// Errors raised while talking to a reflection service or resolving what it returns.
#[derive(Debug, thiserror::Error)]
pub enum ReflectionResolveError {
    #[error(
        "Failed to start a stream request with the reflection server, reflection might not be supported: '{0}'"
    )]
    ServerStreamInitFailed(#[source] tonic::Status),

    #[error("The server stream returned an error status: '{0}'")]
    ServerStreamFailure(#[source] tonic::Status),

    #[error("Reflection stream closed unexpectedly")]
    StreamClosed,

    #[error("Server returned reflection error code {code}: {message}")]
    ServerError { code: i32, message: String },

    #[error("Protocol error: Received unexpected response type: {0}")]
    UnexpectedResponseType(String),

    #[error("Protocol error: '{file}' depends on '{dependency}' but the server never returned it")]
    UnresolvedDependency { file: String, dependency: String },

    #[error("Failed to decode FileDescriptorProto: {0}")]
    DecodeError(#[from] prost::DecodeError),

    #[error("Received a FileDescriptorProto without a file name")]
    MissingFileName,
}

/// Coarse classification of a [`ReflectionResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The exchange itself failed (stream could not start, errored or closed early).
    Transport,
    /// A response arrived but did not fit the request that produced it.
    Protocol,
    /// The server answered with an explicit `error_response`.
    Remote,
    /// Fragment bytes could not be decoded.
    Decode,
}

impl ReflectionResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ServerStreamInitFailed(_) | Self::ServerStreamFailure(_) | Self::StreamClosed => {
                ErrorKind::Transport
            }
            Self::UnexpectedResponseType(_) | Self::UnresolvedDependency { .. } => {
                ErrorKind::Protocol
            }
            Self::ServerError { .. } => ErrorKind::Remote,
            Self::DecodeError(_) | Self::MissingFileName => ErrorKind::Decode,
        }
    }

    /// Whether the server reported that the requested symbol or file does not exist,
    /// either as a `NOT_FOUND` stream status or as an `error_response` carrying that code.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ServerStreamFailure(status) => status.code() == tonic::Code::NotFound,
            Self::ServerError { code, .. } => *code == tonic::Code::NotFound as i32,
            _ => false,
        }
    }
}
