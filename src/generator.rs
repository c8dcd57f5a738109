//! Plugin pipeline
//!
//! Parameters are parsed once, every requested file becomes a
//! [`SchemaUnit`], and the rendered units are concatenated into a single
//! `docs.adoc`.

use crate::model::SchemaUnit;
use crate::options::{extract_rest_bindings, Parameters, RestBindings};
use crate::render::{render_unit, RenderOptions};
use crate::walker::walk_file;
use crate::GeneratorError;
use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use tracing::debug;

/// Name of the single generated file
pub const OUTPUT_FILE_NAME: &str = "docs.adoc";

/// Generate documentation from an already decoded request
///
/// Extension data is gone at this point, so REST bindings are only found when
/// protoc left them as uninterpreted options.
pub fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    generate_with_bindings(request, &RestBindings::default())
}

/// Generate documentation from raw request bytes
pub fn generate_from_bytes(bytes: &[u8]) -> Result<CodeGeneratorResponse, GeneratorError> {
    let request = CodeGeneratorRequest::decode(bytes)
        .map_err(|e| GeneratorError::DecodeError(format!("CodeGeneratorRequest: {}", e)))?;
    let bindings = extract_rest_bindings(bytes)?;
    generate_with_bindings(request, &bindings)
}

/// Generate documentation with REST bindings extracted beforehand
pub fn generate_with_bindings(
    request: CodeGeneratorRequest,
    bindings: &RestBindings,
) -> Result<CodeGeneratorResponse, GeneratorError> {
    let params = Parameters::parse(request.parameter());
    let options = RenderOptions::from_parameters(&params);

    let units = build_units(&request, bindings, options.sorted)?;
    let content: String = units
        .iter()
        .map(|unit| render_unit(unit, &options))
        .collect();

    debug!(
        units = units.len(),
        bytes = content.len(),
        "rendered {}",
        OUTPUT_FILE_NAME
    );

    Ok(CodeGeneratorResponse {
        file: vec![File {
            name: Some(OUTPUT_FILE_NAME.to_string()),
            content: Some(content),
            ..Default::default()
        }],
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    })
}

/// One unit per `file_to_generate`, in request order
pub fn build_units(
    request: &CodeGeneratorRequest,
    bindings: &RestBindings,
    sorted: bool,
) -> Result<Vec<SchemaUnit>, GeneratorError> {
    request
        .file_to_generate
        .iter()
        .map(|wanted| {
            let file = request
                .proto_file
                .iter()
                .find(|file| file.name() == wanted)
                .ok_or_else(|| {
                    GeneratorError::InvalidConfig(format!(
                        "file to generate not found in request: {}",
                        wanted
                    ))
                })?;
            let mut unit = walk_file(file, bindings);
            if sorted {
                unit.sort_by_name();
            }
            Ok(unit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{DescriptorProto, FileDescriptorProto};

    fn file(name: &str, messages: &[&str]) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(name.to_string()),
            message_type: messages
                .iter()
                .map(|m| DescriptorProto {
                    name: Some(m.to_string()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_only_requested_files() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["b.proto".to_string()],
            proto_file: vec![file("a.proto", &["Dependency"]), file("b.proto", &["Wanted"])],
            ..Default::default()
        };
        let units = build_units(&request, &RestBindings::default(), false).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].messages[0].name, "Wanted");
    }

    #[test]
    fn test_missing_file_is_invalid_config() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["missing.proto".to_string()],
            ..Default::default()
        };
        let err = generate(request).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_sorted_parameter() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["a.proto".to_string()],
            proto_file: vec![file("a.proto", &["Zeta", "Alpha", "Mid"])],
            parameter: Some("sorted=on".to_string()),
            ..Default::default()
        };
        let response = generate(request).unwrap();
        let content = response.file[0].content();
        let alpha = content.find("== Alpha Message").unwrap();
        let mid = content.find("== Mid Message").unwrap();
        let zeta = content.find("== Zeta Message").unwrap();
        assert!(alpha < mid && mid < zeta);
    }

    #[test]
    fn test_declaration_order_without_sorted() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["a.proto".to_string()],
            proto_file: vec![file("a.proto", &["Zeta", "Alpha"])],
            ..Default::default()
        };
        let response = generate(request).unwrap();
        let content = response.file[0].content();
        assert!(content.find("== Zeta Message").unwrap() < content.find("== Alpha Message").unwrap());
    }

    #[test]
    fn test_files_are_concatenated() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["a.proto".to_string(), "b.proto".to_string()],
            proto_file: vec![file("a.proto", &["First"]), file("b.proto", &["Second"])],
            ..Default::default()
        };
        let response = generate(request).unwrap();
        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name(), OUTPUT_FILE_NAME);
        let content = response.file[0].content();
        assert!(content.contains("== First Message"));
        assert!(content.contains("== Second Message"));
        assert_eq!(
            response.supported_features,
            Some(Feature::Proto3Optional as u64)
        );
    }
}
