//! Plugin parameters and method options
//!
//! The parameter string is whatever follows `--proto2asciidoc_out=` up to the
//! colon, e.g. `sorted=on,icons=on`.
//!
//! REST bindings live in the `google.api.http` extension of `MethodOptions`.
//! prost drops unknown extension fields while decoding, so the raw request
//! bytes are decoded a second time with prost-reflect, against a descriptor
//! pool built from the request's own files.

use crate::model::RestBinding;
use crate::source::{parse_aggregate, rest_binding_from_aggregate};
use crate::GeneratorError;
use prost::Message;
use prost_reflect::{DescriptorPool, Value};
use prost_types::{MethodOptions, UninterpretedOption};
use std::collections::HashMap;
use tracing::debug;

/// Extension name of the HTTP rule on methods
const HTTP_EXTENSION_NAME: &str = "google.api.http";

/// Parsed plugin parameter string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(HashMap<String, String>);

impl Parameters {
    /// Parse a comma-separated `key=value` list
    ///
    /// Entries that do not split into exactly one key and one value are kept
    /// whole as a bare key with an empty value.
    pub fn parse(raw: &str) -> Self {
        let mut params = HashMap::new();
        for entry in raw.split(',') {
            let parts: Vec<&str> = entry.split('=').collect();
            if let [key, value] = parts.as_slice() {
                params.insert(key.to_string(), value.to_string());
            } else {
                params.insert(entry.to_string(), String::new());
            }
        }
        Parameters(params)
    }

    /// Raw value of a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True when the key is set to `on`
    pub fn is_on(&self, key: &str) -> bool {
        self.get(key) == Some("on")
    }
}

/// REST bindings keyed by (file name, service name, method name)
#[derive(Debug, Clone, Default)]
pub struct RestBindings(HashMap<(String, String, String), RestBinding>);

impl RestBindings {
    /// Record a binding
    pub fn insert(&mut self, file: &str, service: &str, method: &str, binding: RestBinding) {
        self.0.insert(
            (file.to_string(), service.to_string(), method.to_string()),
            binding,
        );
    }

    /// Look up the binding of one method
    pub fn get(&self, file: &str, service: &str, method: &str) -> Option<&RestBinding> {
        self.0
            .get(&(file.to_string(), service.to_string(), method.to_string()))
    }

    /// Number of bound methods
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no method carries a binding
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `CodeGeneratorRequest` reduced to the undecoded bytes of its files
#[derive(Clone, PartialEq, Message)]
struct RawRequestFiles {
    #[prost(bytes = "vec", repeated, tag = "15")]
    proto_file: Vec<Vec<u8>>,
}

/// `FileDescriptorSet` built from undecoded file bytes
#[derive(Clone, PartialEq, Message)]
struct RawFileDescriptorSet {
    #[prost(bytes = "vec", repeated, tag = "1")]
    file: Vec<Vec<u8>>,
}

/// Extract `google.api.http` bindings from raw `CodeGeneratorRequest` bytes
///
/// Requests whose files cannot form a descriptor pool, or that never import
/// the annotation, simply yield no bindings.
pub fn extract_rest_bindings(bytes: &[u8]) -> Result<RestBindings, GeneratorError> {
    let request = RawRequestFiles::decode(bytes)
        .map_err(|e| GeneratorError::DecodeError(format!("CodeGeneratorRequest: {}", e)))?;

    let set = RawFileDescriptorSet {
        file: request.proto_file,
    }
    .encode_to_vec();

    let mut bindings = RestBindings::default();

    let pool = match DescriptorPool::decode(set.as_slice()) {
        Ok(pool) => pool,
        Err(e) => {
            debug!(error = %e, "could not build descriptor pool, skipping REST bindings");
            return Ok(bindings);
        }
    };

    let Some(http) = pool.get_extension_by_name(HTTP_EXTENSION_NAME) else {
        return Ok(bindings);
    };

    for service in pool.services() {
        for method in service.methods() {
            let options = method.options();
            if !options.has_extension(&http) {
                continue;
            }
            let value = options.get_extension(&http);
            if let Some(binding) = convert_to_rest_binding(&value) {
                bindings.insert(
                    service.parent_file().name(),
                    service.name(),
                    method.name(),
                    binding,
                );
            }
        }
    }

    debug!(count = bindings.len(), "extracted REST bindings");
    Ok(bindings)
}

/// Convert a dynamic `google.api.HttpRule` into a binding
fn convert_to_rest_binding(value: &Value) -> Option<RestBinding> {
    let rule = value.as_message()?;

    let string_field = |name: &str| -> Option<String> {
        if !rule.has_field_by_name(name) {
            return None;
        }
        rule.get_field_by_name(name)
            .and_then(|cow| cow.as_ref().as_str().map(str::to_string))
    };

    let verbs = ["get", "put", "post", "delete", "patch"]
        .into_iter()
        .filter_map(|verb| string_field(verb).map(|url| (verb, url)))
        .collect::<Vec<_>>();
    let body = string_field("body").unwrap_or_default();

    let custom = if rule.has_field_by_name("custom") {
        rule.get_field_by_name("custom").and_then(|cow| {
            let custom = cow.as_ref().as_message()?;
            let kind = custom.get_field_by_name("kind")?.as_ref().as_str()?.to_string();
            let path = custom.get_field_by_name("path")?.as_ref().as_str()?.to_string();
            Some((kind, path))
        })
    } else {
        None
    };

    let entries = verbs
        .iter()
        .map(|(verb, url)| (*verb, url.as_str()))
        .chain(std::iter::once(("body", body.as_str())));
    RestBinding::from_entries(entries, custom)
}

/// Read a `google.api.http` rule left as an uninterpreted option
pub fn parse_http_rule_uninterpreted(options: &MethodOptions) -> Option<RestBinding> {
    options
        .uninterpreted_option
        .iter()
        .filter(|opt| is_extension_option(opt, HTTP_EXTENSION_NAME))
        .find_map(|opt| {
            let aggregate = opt.aggregate_value.as_deref()?;
            match parse_aggregate(aggregate) {
                Ok(entries) => rest_binding_from_aggregate(&entries),
                Err(e) => {
                    debug!(error = %e, "unparsable {} aggregate", HTTP_EXTENSION_NAME);
                    None
                }
            }
        })
}

/// Check whether an uninterpreted option names the given extension
fn is_extension_option(opt: &UninterpretedOption, extension_name: &str) -> bool {
    match opt.name.first() {
        Some(part) => {
            part.is_extension
                && part.name_part.trim_start_matches('.') == extension_name
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::uninterpreted_option::NamePart;

    #[test]
    fn test_parse_parameters() {
        let params = Parameters::parse("sorted=on,icons=off,extension");
        assert!(params.is_on("sorted"));
        assert!(!params.is_on("icons"));
        assert_eq!(params.get("icons"), Some("off"));
        assert_eq!(params.get("extension"), Some(""));
        assert!(!params.is_on("extension"));
        assert!(!params.is_on("unknown"));
    }

    #[test]
    fn test_parse_parameters_odd_entries() {
        let params = Parameters::parse("a=b=c,,x=1");
        assert_eq!(params.get("a=b=c"), Some(""));
        assert_eq!(params.get(""), Some(""));
        assert_eq!(params.get("x"), Some("1"));
    }

    fn http_option(aggregate: &str) -> MethodOptions {
        MethodOptions {
            uninterpreted_option: vec![UninterpretedOption {
                name: vec![NamePart {
                    name_part: "google.api.http".to_string(),
                    is_extension: true,
                }],
                aggregate_value: Some(aggregate.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_http_rule_from_uninterpreted() {
        let binding =
            parse_http_rule_uninterpreted(&http_option("post: \"/v1/users\" body: \"*\""))
                .unwrap();
        assert_eq!(binding.method, "post");
        assert_eq!(binding.url, "/v1/users");
        assert_eq!(binding.body.as_deref(), Some("*"));
    }

    #[test]
    fn test_http_rule_custom_pattern() {
        let binding = parse_http_rule_uninterpreted(&http_option(
            "custom { kind: \"HEAD\" path: \"/v1/ping\" }",
        ))
        .unwrap();
        assert_eq!(binding.method, "HEAD");
        assert_eq!(binding.url, "/v1/ping");
        assert_eq!(binding.body, None);
    }

    #[test]
    fn test_other_options_ignored() {
        let mut options = http_option("get: \"/v1/x\"");
        options.uninterpreted_option[0].name[0].name_part = "acme.other".to_string();
        assert!(parse_http_rule_uninterpreted(&options).is_none());
    }

    #[test]
    fn test_extract_rest_bindings_rejects_garbage() {
        assert!(extract_rest_bindings(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_extract_rest_bindings_without_annotations() {
        let request = prost_types::compiler::CodeGeneratorRequest {
            file_to_generate: vec!["a.proto".to_string()],
            proto_file: vec![prost_types::FileDescriptorProto {
                name: Some("a.proto".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let bindings = extract_rest_bindings(&request.encode_to_vec()).unwrap();
        assert!(bindings.is_empty());
    }
}
