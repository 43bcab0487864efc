//! # Dependency Resolver
//!
//! Builds a [`FragmentRegistry`] that is closed under imports, starting from the raw
//! descriptors returned by an initial lookup.
//!
//! The walk is depth-first and strictly sequential. For every decoded file, each import is
//! handled in order before the file itself is registered:
//!
//! 1. Already registered, or currently being walked further up the stack (an import cycle):
//!    nothing to do.
//! 2. Received in an earlier response but not walked yet: walk it now.
//! 3. Otherwise request it with `file_by_filename`, unless it was requested already, and walk
//!    whatever the server returns.
//!
//! A file name is therefore requested at most once per resolution, and the walk terminates on
//! any finite import graph. The recursion lives on an explicit stack of frames, one frame per
//! response batch.
use super::error::ReflectionResolveError;
use super::fetcher::FragmentFetcher;
use super::registry::FragmentRegistry;
use super::transport::ReflectionTransport;
use prost::Message;
use prost_types::FileDescriptorProto;
use std::collections::{HashSet, VecDeque};

/// Resolves `roots`, and everything they transitively import, into a closed registry.
///
/// Any fetch, decode or protocol failure aborts the whole resolution.
pub async fn resolve<T: ReflectionTransport>(
    fetcher: &mut FragmentFetcher<T>,
    roots: Vec<Vec<u8>>,
) -> Result<FragmentRegistry, ReflectionResolveError> {
    let mut registry = FragmentRegistry::default();
    let mut requested = HashSet::new();
    let mut in_progress = HashSet::new();
    let mut stack = vec![Frame::decode(roots)?];

    while let Some(frame) = stack.last_mut() {
        let step = match frame.current.as_mut() {
            Some(walk) => match walk.next_dependency() {
                Some(dependency) => Step::Import(dependency),
                None => Step::Register,
            },
            None => match frame.pending.pop_front() {
                Some(file) => Step::Begin(file),
                None => Step::Pop,
            },
        };

        match step {
            Step::Begin(file) => {
                if registry.contains(file.name())
                    || !in_progress.insert(file.name().to_string())
                {
                    tracing::trace!(file = file.name(), "skipping duplicate file");
                    continue;
                }
                frame.current = Some(Walk::new(file));
            }
            Step::Register => {
                if let Some(walk) = frame.current.take() {
                    tracing::trace!(file = walk.file.name(), "registering file");
                    registry.insert(walk.file);
                }
            }
            Step::Pop => {
                stack.pop();
            }
            Step::Import(dependency) => {
                if registry.contains(&dependency) || in_progress.contains(&dependency) {
                    continue;
                }

                if let Some(file) = take_pending(&mut stack, &dependency) {
                    stack.push(Frame::from_files(vec![file]));
                    continue;
                }

                if !requested.insert(dependency.clone()) {
                    continue;
                }

                tracing::debug!(file = %dependency, "fetching missing dependency");
                let raw = fetcher.fetch_by_filename(&dependency).await?;
                stack.push(Frame::decode(raw)?);
            }
        }
    }

    if let Some((file, dependency)) = registry.unresolved_dependency() {
        return Err(ReflectionResolveError::UnresolvedDependency {
            file: file.to_string(),
            dependency: dependency.to_string(),
        });
    }

    tracing::debug!(
        files = registry.len(),
        fetched = requested.len(),
        "resolved file descriptors"
    );

    Ok(registry)
}

enum Step {
    Begin(FileDescriptorProto),
    Import(String),
    Register,
    Pop,
}

/// One response batch: files not walked yet, and the file currently being walked.
struct Frame {
    pending: VecDeque<FileDescriptorProto>,
    current: Option<Walk>,
}

impl Frame {
    fn decode(raw: Vec<Vec<u8>>) -> Result<Self, ReflectionResolveError> {
        let files = raw
            .iter()
            .map(|bytes| decode_file(bytes))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_files(files))
    }

    fn from_files(files: Vec<FileDescriptorProto>) -> Self {
        Self {
            pending: files.into(),
            current: None,
        }
    }
}

struct Walk {
    file: FileDescriptorProto,
    next: usize,
}

impl Walk {
    fn new(file: FileDescriptorProto) -> Self {
        Self { file, next: 0 }
    }

    fn next_dependency(&mut self) -> Option<String> {
        let dependency = self.file.dependency.get(self.next)?.clone();
        self.next += 1;
        Some(dependency)
    }
}

fn decode_file(bytes: &[u8]) -> Result<FileDescriptorProto, ReflectionResolveError> {
    let file = FileDescriptorProto::decode(bytes)?;

    if file.name().is_empty() {
        return Err(ReflectionResolveError::MissingFileName);
    }

    Ok(file)
}

/// Removes the not-yet-walked file named `name` from whichever frame holds it.
fn take_pending(stack: &mut [Frame], name: &str) -> Option<FileDescriptorProto> {
    stack.iter_mut().rev().find_map(|frame| {
        let position = frame.pending.iter().position(|f| f.name() == name)?;
        frame.pending.remove(position)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reflection::error::ErrorKind;
    use crate::reflection::generated::reflection_v1::{
        ErrorResponse, FileDescriptorResponse, ServerReflectionResponse,
        server_reflection_response::MessageResponse,
    };
    use crate::reflection::testing::{ScriptedTransport, file, fragments_response};

    fn encode(files: &[&FileDescriptorProto]) -> Vec<Vec<u8>> {
        files.iter().map(|f| f.encode_to_vec()).collect()
    }

    fn names(registry: &FragmentRegistry) -> Vec<&str> {
        registry.names().collect()
    }

    #[tokio::test]
    async fn file_without_imports_resolves_to_itself() {
        let transport = ScriptedTransport::new();
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &[]);

        let registry = resolve(&mut fetcher, encode(&[&root])).await.unwrap();

        assert_eq!(names(&registry), vec!["a.proto"]);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn shared_dependency_is_fetched_once() {
        let b = file("b.proto", &["d.proto"]);
        let c = file("c.proto", &["d.proto"]);
        let d = file("d.proto", &[]);
        let transport = ScriptedTransport::new().serving(&[b, c, d]);
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["b.proto", "c.proto"]);

        let registry = resolve(&mut fetcher, encode(&[&root])).await.unwrap();

        assert_eq!(
            names(&registry),
            vec!["d.proto", "b.proto", "c.proto", "a.proto"]
        );
        assert_eq!(
            transport.fetched_files(),
            vec!["b.proto", "d.proto", "c.proto"]
        );
    }

    #[tokio::test]
    async fn registry_is_exactly_the_reachable_set() {
        let b = file("b.proto", &["c.proto"]);
        let c = file("c.proto", &[]);
        let unrelated = file("unrelated.proto", &[]);
        let transport = ScriptedTransport::new().serving(&[b, c, unrelated]);
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["b.proto"]);

        let registry = resolve(&mut fetcher, encode(&[&root])).await.unwrap();

        assert_eq!(registry.len(), 3);
        assert!(!registry.contains("unrelated.proto"));
        assert_eq!(registry.unresolved_dependency(), None);
    }

    #[tokio::test]
    async fn import_cycle_terminates_with_single_fetch() {
        let b = file("b.proto", &["a.proto"]);
        let transport = ScriptedTransport::new().serving(&[b]);
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["b.proto"]);

        let registry = resolve(&mut fetcher, encode(&[&root])).await.unwrap();

        assert_eq!(names(&registry), vec!["b.proto", "a.proto"]);
        assert_eq!(transport.fetched_files(), vec!["b.proto"]);
    }

    #[tokio::test]
    async fn cycle_through_a_resent_root_is_walked_once() {
        // The server answers for b.proto with b.proto and, again, a.proto.
        let a = file("a.proto", &["b.proto"]);
        let b = file("b.proto", &["a.proto"]);
        let transport =
            ScriptedTransport::new().on_file("b.proto", fragments_response(&[&b, &a]));
        let mut fetcher = FragmentFetcher::new(transport.clone());

        let registry = resolve(&mut fetcher, encode(&[&a])).await.unwrap();

        assert_eq!(names(&registry), vec!["b.proto", "a.proto"]);
        assert_eq!(transport.fetched_files(), vec!["b.proto"]);
    }

    #[tokio::test]
    async fn self_import_does_not_fetch() {
        let transport = ScriptedTransport::new();
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["a.proto"]);

        let registry = resolve(&mut fetcher, encode(&[&root])).await.unwrap();

        assert_eq!(names(&registry), vec!["a.proto"]);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn dependencies_sent_alongside_the_root_are_not_fetched() {
        let transport = ScriptedTransport::new();
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["b.proto"]);
        let b = file("b.proto", &["c.proto"]);
        let c = file("c.proto", &[]);

        let registry = resolve(&mut fetcher, encode(&[&root, &c, &b]))
            .await
            .unwrap();

        assert_eq!(names(&registry), vec!["c.proto", "b.proto", "a.proto"]);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn duplicate_roots_are_registered_once() {
        let transport = ScriptedTransport::new();
        let mut fetcher = FragmentFetcher::new(transport);
        let root = file("a.proto", &[]);

        let registry = resolve(&mut fetcher, encode(&[&root, &root]))
            .await
            .unwrap();

        assert_eq!(names(&registry), vec!["a.proto"]);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_resolution() {
        let missing = ServerReflectionResponse {
            message_response: Some(MessageResponse::ErrorResponse(ErrorResponse {
                error_code: 5,
                error_message: "missing.proto not found".into(),
            })),
            ..Default::default()
        };
        let transport = ScriptedTransport::new()
            .serving(&[file("b.proto", &[])])
            .on_file("missing.proto", missing);
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["missing.proto", "b.proto"]);

        let err = resolve(&mut fetcher, encode(&[&root])).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(transport.fetched_files(), vec!["missing.proto"]);
    }

    #[tokio::test]
    async fn transport_failure_on_a_dependency_aborts_resolution() {
        let transport = ScriptedTransport::new().serving(&[file("b.proto", &[])]);
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["b.proto", "unknown.proto"]);

        let err = resolve(&mut fetcher, encode(&[&root])).await.unwrap_err();

        assert!(matches!(err, ReflectionResolveError::ServerStreamFailure(_)));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(transport.fetched_files(), vec!["b.proto", "unknown.proto"]);
    }

    #[tokio::test]
    async fn undecodable_dependency_is_a_decode_error() {
        let corrupt = ServerReflectionResponse {
            message_response: Some(MessageResponse::FileDescriptorResponse(
                FileDescriptorResponse {
                    file_descriptor_proto: vec![vec![0xff, 0xff]],
                },
            )),
            ..Default::default()
        };
        let transport = ScriptedTransport::new().on_file("b.proto", corrupt);
        let mut fetcher = FragmentFetcher::new(transport.clone());
        let root = file("a.proto", &["b.proto"]);

        let err = resolve(&mut fetcher, encode(&[&root])).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(transport.fetched_files(), vec!["b.proto"]);
    }

    #[tokio::test]
    async fn undecodable_bytes_are_a_decode_error() {
        let mut fetcher = FragmentFetcher::new(ScriptedTransport::new());

        let err = resolve(&mut fetcher, vec![vec![0xff, 0xff]])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn file_without_name_is_rejected() {
        let mut fetcher = FragmentFetcher::new(ScriptedTransport::new());
        let nameless = FileDescriptorProto::default();

        let err = resolve(&mut fetcher, encode(&[&nameless]))
            .await
            .unwrap_err();

        assert!(matches!(err, ReflectionResolveError::MissingFileName));
    }

    #[tokio::test]
    async fn answer_without_requested_file_is_a_protocol_error() {
        let wrong = file("c.proto", &[]);
        let transport =
            ScriptedTransport::new().on_file("b.proto", fragments_response(&[&wrong]));
        let mut fetcher = FragmentFetcher::new(transport);
        let root = file("a.proto", &["b.proto"]);

        let err = resolve(&mut fetcher, encode(&[&root])).await.unwrap_err();

        assert!(matches!(
            err,
            ReflectionResolveError::UnresolvedDependency { ref file, ref dependency }
                if file == "a.proto" && dependency == "b.proto"
        ));
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }
}
