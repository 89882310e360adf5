//! Request handling
//!
//! Turns a `CodeGeneratorRequest` into a `CodeGeneratorResponse`: parse the
//! parameters, optionally load the registry, then render one batch per file
//! (`all=true`) or per service and merge everything that comes back.

use crate::bridge;
use crate::logging;
use crate::params::Params;
use crate::registry::Registry;
use crate::schema::FileDescriptor;
use crate::template::{Encoder, Environment, OutputMerger, Renderer};
use crate::GeneratorError;
use prost::Message;
use prost_types::compiler::{code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse};
use std::collections::HashMap;

/// `CodeGeneratorRequest` with each `proto_file` left encoded
///
/// Decoding the files separately through the reflection bridge keeps their
/// unknown fields and extensions, which `prost-types` would drop.
#[derive(Clone, PartialEq, Message)]
struct RawCodeGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    parameter: Option<String>,
    #[prost(message, optional, tag = "3")]
    compiler_version: Option<prost_types::compiler::Version>,
    #[prost(bytes = "vec", repeated, tag = "15")]
    proto_file: Vec<Vec<u8>>,
}

/// Decoded request, independent of how it was decoded
struct Request {
    file_to_generate: Vec<String>,
    parameter: Option<String>,
    compiler_version: Option<prost_types::compiler::Version>,
    files: Vec<FileDescriptor>,
}

/// Generate from an already-decoded request
pub fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    let files = bridge::prost::import_request_files(&request.proto_file);
    run(Request {
        file_to_generate: request.file_to_generate,
        parameter: request.parameter,
        compiler_version: request.compiler_version,
        files,
    })
}

/// Generate from the encoded request protoc writes to stdin
pub fn generate_from_bytes(bytes: &[u8]) -> Result<CodeGeneratorResponse, GeneratorError> {
    let raw = RawCodeGeneratorRequest::decode(bytes)
        .map_err(|e| GeneratorError::DecodeError(format!("CodeGeneratorRequest: {}", e)))?;
    let files = raw
        .proto_file
        .iter()
        .map(|file| bridge::dynamic::decode_file(file))
        .collect::<Result<Vec<_>, _>>()?;
    run(Request {
        file_to_generate: raw.file_to_generate,
        parameter: raw.parameter,
        compiler_version: raw.compiler_version,
        files,
    })
}

fn run(request: Request) -> Result<CodeGeneratorResponse, GeneratorError> {
    let params = Params::parse(request.parameter.as_deref());
    logging::set_debug(params.debug);
    tracing::debug!(?params, "parsed parameters");
    if let Some(version) = &request.compiler_version {
        tracing::debug!(compiler = %format_version(version), "compiler version");
    }

    if request.file_to_generate.is_empty() {
        return Err(GeneratorError::InvalidConfig(
            "no files to generate".to_string(),
        ));
    }

    let registry = if params.single_package_mode {
        Some(Registry::load(&request.files)?)
    } else {
        None
    };
    let by_name: HashMap<&str, &FileDescriptor> =
        request.files.iter().map(|f| (f.name(), f)).collect();

    let env = Environment::capture();
    let renderer = Renderer::new(&params, registry.as_ref())?;
    tracing::debug!(
        template_dir = %params.template_dir.display(),
        templates = renderer.templates().len(),
        "templates discovered"
    );

    let mut merger = OutputMerger::new();
    for name in &request.file_to_generate {
        let file = match &registry {
            Some(registry) => registry.lookup_file(name)?,
            None => by_name.get(name.as_str()).copied().ok_or_else(|| {
                GeneratorError::SchemaLookup(format!("{:?} is not among the request files", name))
            })?,
        };

        if params.all {
            merger.extend(Encoder::for_file(&renderer, &env, file).files()?);
            continue;
        }
        for service in &file.service {
            merger.extend(Encoder::for_service(&renderer, &env, file, service).files()?);
        }
    }

    tracing::debug!(outputs = merger.len(), "generation finished");
    Ok(CodeGeneratorResponse {
        file: merger.into_files(),
        supported_features: Some(code_generator_response::Feature::Proto3Optional as u64),
        ..Default::default()
    })
}

fn format_version(version: &prost_types::compiler::Version) -> String {
    let mut text = format!(
        "{}.{}.{}",
        version.major.unwrap_or_default(),
        version.minor.unwrap_or_default(),
        version.patch.unwrap_or_default()
    );
    if let Some(suffix) = version.suffix.as_deref().filter(|s| !s.is_empty()) {
        text.push('-');
        text.push_str(suffix);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_request_matches_prost_request() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["a.proto".to_string()],
            parameter: Some("all=true".to_string()),
            proto_file: vec![prost_types::FileDescriptorProto {
                name: Some("a.proto".to_string()),
                ..Default::default()
            }],
            compiler_version: Some(prost_types::compiler::Version {
                major: Some(25),
                minor: Some(1),
                patch: Some(0),
                suffix: Some(String::new()),
            }),
            ..Default::default()
        };

        let raw = RawCodeGeneratorRequest::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(raw.file_to_generate, request.file_to_generate);
        assert_eq!(raw.parameter, request.parameter);
        assert_eq!(raw.compiler_version, request.compiler_version);
        assert_eq!(raw.proto_file.len(), 1);
        assert_eq!(raw.proto_file[0], request.proto_file[0].encode_to_vec());
    }

    #[test]
    fn test_no_files_to_generate() {
        let err = generate(CodeGeneratorRequest::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_garbage_bytes() {
        let err = generate_from_bytes(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, GeneratorError::DecodeError(_)));
    }

    #[test]
    fn test_format_version() {
        let version = prost_types::compiler::Version {
            major: Some(3),
            minor: Some(21),
            patch: Some(12),
            suffix: Some("rc1".to_string()),
        };
        assert_eq!(format_version(&version), "3.21.12-rc1");
    }
}
