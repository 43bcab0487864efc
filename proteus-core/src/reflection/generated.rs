//! Checked-in bindings for `grpc/reflection/v1/reflection.proto`.
//!
//! Regenerate with `cargo run -p proteus-core --features gen-proto --bin generate-reflection-service`.
#![allow(clippy::all)]

pub mod reflection_v1 {
    include!("generated/grpc.reflection.v1.rs");
}
