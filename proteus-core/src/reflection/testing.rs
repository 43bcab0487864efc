//! In-memory [`ReflectionTransport`] used by unit tests.
use super::error::ReflectionResolveError;
use super::generated::reflection_v1::{
    FileDescriptorResponse, ServerReflectionRequest, ServerReflectionResponse,
    server_reflection_request::MessageRequest, server_reflection_response::MessageResponse,
};
use super::transport::ReflectionTransport;
use prost::Message;
use prost_types::FileDescriptorProto;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Answers requests from a fixed script and records every request it receives.
///
/// Clones share the script and the request log.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    by_symbol: HashMap<String, ServerReflectionResponse>,
    by_file: HashMap<String, ServerReflectionResponse>,
    list: Option<ServerReflectionResponse>,
    received: Vec<ServerReflectionRequest>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_symbol(self, symbol: &str, response: ServerReflectionResponse) -> Self {
        self.script().by_symbol.insert(symbol.to_string(), response);
        self
    }

    pub(crate) fn on_file(self, filename: &str, response: ServerReflectionResponse) -> Self {
        self.script().by_file.insert(filename.to_string(), response);
        self
    }

    pub(crate) fn on_list(self, response: ServerReflectionResponse) -> Self {
        self.script().list = Some(response);
        self
    }

    /// Serves `files` by filename, each answered with just its own encoded descriptor.
    pub(crate) fn serving(mut self, files: &[FileDescriptorProto]) -> Self {
        for file in files {
            self = self.on_file(file.name(), fragments_response(&[file]));
        }
        self
    }

    pub(crate) fn requests(&self) -> Vec<MessageRequest> {
        self.script()
            .received
            .iter()
            .filter_map(|req| req.message_request.clone())
            .collect()
    }

    pub(crate) fn hosts(&self) -> Vec<String> {
        self.script()
            .received
            .iter()
            .map(|req| req.host.clone())
            .collect()
    }

    /// Filenames requested through `file_by_filename`, in request order.
    pub(crate) fn fetched_files(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|req| match req {
                MessageRequest::FileByFilename(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.inner.lock().unwrap()
    }
}

impl ReflectionTransport for ScriptedTransport {
    async fn exchange(
        &mut self,
        request: ServerReflectionRequest,
    ) -> Result<ServerReflectionResponse, ReflectionResolveError> {
        let mut script = self.script();
        script.received.push(request.clone());

        let answer = match &request.message_request {
            Some(MessageRequest::FileContainingSymbol(symbol)) => script.by_symbol.get(symbol),
            Some(MessageRequest::FileByFilename(filename)) => script.by_file.get(filename),
            Some(MessageRequest::ListServices(_)) => script.list.as_ref(),
            _ => None,
        };

        answer.cloned().ok_or_else(|| {
            ReflectionResolveError::ServerStreamFailure(tonic::Status::not_found(
                "unscripted request",
            ))
        })
    }
}

pub(crate) fn fragments_response(files: &[&FileDescriptorProto]) -> ServerReflectionResponse {
    ServerReflectionResponse {
        message_response: Some(MessageResponse::FileDescriptorResponse(
            FileDescriptorResponse {
                file_descriptor_proto: files.iter().map(|f| f.encode_to_vec()).collect(),
            },
        )),
        ..Default::default()
    }
}

/// A bare file descriptor named `name` importing `dependencies`.
pub(crate) fn file(name: &str, dependencies: &[&str]) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        dependency: dependencies.iter().map(|d| d.to_string()).collect(),
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}
