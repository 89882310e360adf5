//! protoc-gen-template library
//!
//! This crate renders a directory of Handlebars templates against the
//! protobuf descriptors protoc hands to a plugin. Template paths are
//! templates too, so one template can fan out to one output per service or
//! per file, and outputs that land on the same path are concatenated.

#![deny(warnings)]
#![deny(missing_docs)]

pub mod bridge;
pub mod generator;
pub mod logging;
pub mod params;
pub mod registry;
pub mod schema;
pub mod template;

use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Invalid plugin configuration or request
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to decode a protobuf message
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The template root could not be walked
    #[error("cannot get templates from {root:?}: {source}")]
    Discovery {
        /// Template root being walked
        root: PathBuf,
        /// Underlying walk failure
        #[source]
        source: walkdir::Error,
    },

    /// A template failed to expand
    #[error("template {template:?}: {message}")]
    Render {
        /// Template path relative to the template root
        template: String,
        /// What went wrong
        message: String,
    },

    /// A file to generate could not be found
    #[error("Schema lookup failed: {0}")]
    SchemaLookup(String),

    /// The request files do not form a consistent descriptor set
    #[error("registry: failed to load the request: {0}")]
    Registry(String),

    /// Filesystem failure outside template expansion
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Generate outputs from a decoded `CodeGeneratorRequest`
///
/// Descriptors pass through `prost-types`, so their unknown fields are lost.
pub fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    generator::generate(request)
}

/// Generate outputs from raw request bytes
///
/// This entry point preserves unknown fields and extensions by decoding each
/// file through prost-reflect.
pub fn generate_from_bytes(bytes: &[u8]) -> Result<CodeGeneratorResponse, GeneratorError> {
    generator::generate_from_bytes(bytes)
}
