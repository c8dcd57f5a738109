//! proto2asciidoc library
//!
//! Turns protobuf schemas into AsciiDoc documentation. Two front ends share
//! one model and one renderer: the protoc plugin walks the
//! `FileDescriptorProto`s of a `CodeGeneratorRequest`, the standalone CLI
//! parses `.proto` source text itself.

#![deny(warnings)]
#![deny(missing_docs)]

pub mod comments;
pub mod docs;
pub mod generator;
pub mod model;
pub mod options;
pub mod render;
pub mod source;
pub mod types;
pub mod walker;

use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter for both binaries
pub const LOG_ENV: &str = "PROTO2ASCIIDOC_LOG";

/// Errors of the plugin pipeline
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The request bytes are not a valid `CodeGeneratorRequest`
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The request is well-formed but cannot be served
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Generate documentation from a decoded `CodeGeneratorRequest`
pub fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    generator::generate(request)
}

/// Generate documentation from raw request bytes
///
/// This entry point keeps `google.api.http` extension data by decoding the
/// method options a second time with prost-reflect.
pub fn generate_from_bytes(bytes: &[u8]) -> Result<CodeGeneratorResponse, GeneratorError> {
    generator::generate_from_bytes(bytes)
}

/// Install the stderr log subscriber
///
/// The filter comes from [`LOG_ENV`], falling back to `default_directive`.
/// Calling this more than once is harmless.
pub fn init_logging(default_directive: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
