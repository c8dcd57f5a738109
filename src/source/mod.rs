//! `.proto` source front end
//!
//! Parses schema text directly, without protoc, into the same
//! [`SchemaUnit`](crate::model::SchemaUnit) the plugin builds from
//! descriptors. Comments are recovered from the text by line number.

mod aggregate;
mod parser;
mod scanner;

pub use aggregate::{parse_aggregate, rest_binding_from_aggregate, AggregateEntry, AggregateValue};
pub use parser::{parse_proto_file, parse_source};

use thiserror::Error;

/// Errors from reading or parsing `.proto` source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file could not be read
    #[error("could not read {path}: {source}")]
    Io {
        /// Path as given
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The text does not match the grammar
    #[error("could not parse {path}: {message}")]
    Parse {
        /// Source path, or `<aggregate>` for option bodies
        path: String,
        /// Rendered parser error with position
        message: String,
    },
}
