//! pest walker from `.proto` text to [`SchemaUnit`]

use super::aggregate::{entries, rest_binding_from_aggregate};
use super::scanner::CommentIndex;
use super::SourceError;
use crate::comments::{clean_legacy, dialect_for_source, CommentDialect};
use crate::model::{
    Comments, EnumDecl, EnumValueDecl, FieldDecl, MessageDecl, MethodDecl, RestBinding,
    SchemaUnit, ServiceDecl,
};
use crate::types::relative_type_name;
use pest::iterators::Pair;
use pest::Parser as _;
use pest_derive::Parser;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Parser)]
#[grammar = "source/proto.pest"]
pub(crate) struct ProtoParser;

/// Read and parse a `.proto` file
///
/// The comment dialect is chosen from the path.
pub fn parse_proto_file<P: AsRef<Path>>(path: P) -> Result<SchemaUnit, SourceError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: origin.clone(),
        source,
    })?;
    parse_source(&text, &origin, dialect_for_source(&origin))
}

/// Parse `.proto` source text
///
/// `origin` names the unit and shows up in parse errors.
pub fn parse_source(
    text: &str,
    origin: &str,
    dialect: Option<&dyn CommentDialect>,
) -> Result<SchemaUnit, SourceError> {
    let root = ProtoParser::parse(Rule::proto, text)
        .map_err(|e| SourceError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?
        .next()
        .ok_or_else(|| SourceError::Parse {
            path: origin.to_string(),
            message: "empty parse tree".to_string(),
        })?;

    // types are made relative to the package wherever it is declared
    let package = root
        .clone()
        .into_inner()
        .find(|p| p.as_rule() == Rule::package)
        .and_then(|p| p.into_inner().find(|p| p.as_rule() == Rule::full_ident))
        .map(|p| p.as_str().to_string());

    let walker = SourceWalker {
        comments: CommentIndex::scan(text),
        dialect,
        package: package.clone().unwrap_or_default(),
    };

    let mut unit = SchemaUnit {
        name: origin.to_string(),
        package,
        ..Default::default()
    };

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::message => walker.message(pair, &mut unit),
            Rule::enum_def => {
                let decl = walker.enumeration(pair);
                unit.enums.push(decl);
            }
            Rule::service => {
                let decl = walker.service(pair);
                unit.services.push(decl);
            }
            _ => {}
        }
    }

    debug!(
        source = origin,
        messages = unit.messages.len(),
        enums = unit.enums.len(),
        services = unit.services.len(),
        "parsed proto source"
    );

    Ok(unit)
}

fn start_line(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn end_line(pair: &Pair<Rule>) -> usize {
    pair.as_span().end_pos().line_col().0
}

struct SourceWalker<'d> {
    comments: CommentIndex,
    dialect: Option<&'d dyn CommentDialect>,
    package: String,
}

impl SourceWalker<'_> {
    fn leading(&self, pair: &Pair<Rule>) -> String {
        self.comments
            .leading(start_line(pair))
            .map(|lines| clean_legacy(lines, self.dialect))
            .unwrap_or_default()
    }

    fn inline_at(&self, line: usize) -> String {
        self.comments
            .inline(line)
            .map(|lines| clean_legacy(lines, self.dialect))
            .unwrap_or_default()
    }

    /// Leading block plus the inline comment after the closing `;`
    fn member_comments(&self, pair: &Pair<Rule>) -> Comments {
        Comments {
            leading: self.leading(pair),
            trailing: self.inline_at(end_line(pair)),
        }
    }

    fn type_name(&self, written: &str) -> String {
        relative_type_name(written, &self.package)
    }

    /// Push the message, then its nested messages, groups and enums
    ///
    /// Also takes a `group`, whose body is a message of the same name.
    fn message(&self, pair: Pair<Rule>, unit: &mut SchemaUnit) {
        let mut decl = MessageDecl {
            comments: Comments {
                leading: self.leading(&pair),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut nested = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::field => decl.fields.push(self.field(inner)),
                Rule::map_field => decl.fields.push(self.map_field(inner)),
                Rule::oneof => decl.fields.extend(
                    inner
                        .into_inner()
                        .filter(|p| p.as_rule() == Rule::oneof_field)
                        .map(|p| self.field(p)),
                ),
                Rule::group => {
                    decl.fields.push(self.group_field(&inner));
                    nested.push(inner);
                }
                Rule::message | Rule::enum_def => nested.push(inner),
                _ => {}
            }
        }

        unit.messages.push(decl);

        for inner in nested {
            if inner.as_rule() == Rule::enum_def {
                let decl = self.enumeration(inner);
                unit.enums.push(decl);
            } else {
                self.message(inner, unit);
            }
        }
    }

    /// The field half of a group: lowercase name, typed by the group message
    fn group_field(&self, pair: &Pair<Rule>) -> FieldDecl {
        let mut decl = FieldDecl {
            comments: Comments {
                leading: self.leading(pair),
                ..Default::default()
            },
            ..Default::default()
        };
        for inner in pair.clone().into_inner() {
            match inner.as_rule() {
                Rule::label => decl.repeated = inner.as_str() == "repeated",
                Rule::ident => {
                    decl.name = inner.as_str().to_lowercase();
                    decl.type_name = inner.as_str().to_string();
                }
                Rule::int_lit => decl.number = parse_int(inner.as_str()),
                _ => {}
            }
        }
        decl
    }

    /// Plain and oneof fields
    fn field(&self, pair: Pair<Rule>) -> FieldDecl {
        let mut decl = FieldDecl {
            comments: self.member_comments(&pair),
            ..Default::default()
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::label => decl.repeated = inner.as_str() == "repeated",
                Rule::type_name => decl.type_name = self.type_name(inner.as_str()),
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::int_lit => decl.number = parse_int(inner.as_str()),
                _ => {}
            }
        }
        decl
    }

    fn map_field(&self, pair: Pair<Rule>) -> FieldDecl {
        let mut decl = FieldDecl {
            comments: self.member_comments(&pair),
            ..Default::default()
        };
        let mut key = "";
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::map_key => key = inner.as_str(),
                Rule::type_name => {
                    decl.type_name = format!("map[{}]{}", key, self.type_name(inner.as_str()))
                }
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::int_lit => decl.number = parse_int(inner.as_str()),
                _ => {}
            }
        }
        decl
    }

    fn enumeration(&self, pair: Pair<Rule>) -> EnumDecl {
        let mut decl = EnumDecl {
            comments: Comments {
                leading: self.leading(&pair),
                ..Default::default()
            },
            ..Default::default()
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::enum_value => decl.values.push(self.enum_value(inner)),
                _ => {}
            }
        }
        decl
    }

    fn enum_value(&self, pair: Pair<Rule>) -> EnumValueDecl {
        let mut decl = EnumValueDecl {
            comments: self.member_comments(&pair),
            ..Default::default()
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::int_lit => decl.number = parse_int(inner.as_str()),
                _ => {}
            }
        }
        decl
    }

    fn service(&self, pair: Pair<Rule>) -> ServiceDecl {
        let mut decl = ServiceDecl {
            comments: Comments {
                leading: self.leading(&pair),
                ..Default::default()
            },
            ..Default::default()
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::rpc => decl.methods.push(self.rpc(inner)),
                _ => {}
            }
        }
        decl
    }

    fn rpc(&self, pair: Pair<Rule>) -> MethodDecl {
        // inline comment sits after the `;`, or after the `{` of an option body
        let trailing_line = pair
            .clone()
            .into_inner()
            .find(|p| p.as_rule() == Rule::rpc_body)
            .map_or_else(|| end_line(&pair), |body| start_line(&body));
        let mut decl = MethodDecl {
            comments: Comments {
                leading: self.leading(&pair),
                trailing: self.inline_at(trailing_line),
            },
            ..Default::default()
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => decl.name = inner.as_str().to_string(),
                Rule::rpc_request => {
                    let (streaming, type_name) = self.stream_type(inner);
                    decl.client_streaming = streaming;
                    decl.request_type = type_name;
                }
                Rule::rpc_response => {
                    let (streaming, type_name) = self.stream_type(inner);
                    decl.server_streaming = streaming;
                    decl.response_type = type_name;
                }
                Rule::rpc_body => {
                    decl.rest = inner
                        .into_inner()
                        .filter(|p| p.as_rule() == Rule::option)
                        .find_map(http_rule);
                }
                _ => {}
            }
        }
        decl
    }

    fn stream_type(&self, pair: Pair<Rule>) -> (bool, String) {
        let mut streaming = false;
        let mut type_name = String::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::kw_stream => streaming = true,
                Rule::type_name => type_name = self.type_name(inner.as_str()),
                _ => {}
            }
        }
        (streaming, type_name)
    }
}

/// `option (google.api.http) = { ... };`
fn http_rule(option: Pair<Rule>) -> Option<RestBinding> {
    let mut inner = option.into_inner().skip_while(|p| p.as_rule() != Rule::option_name);
    let name = inner.next()?;
    let name = name.as_str().replace(' ', "");
    if name != "(google.api.http)" && name != "(.google.api.http)" {
        return None;
    }
    let constant = inner.find(|p| p.as_rule() == Rule::constant)?;
    let aggregate = constant
        .into_inner()
        .find(|p| p.as_rule() == Rule::aggregate)?;
    rest_binding_from_aggregate(&entries(aggregate))
}

/// Decimal, hex or octal integer literal; out-of-range values become 0
fn parse_int(literal: &str) -> i32 {
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.trim_start_matches('+')),
    };
    let parsed = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<i64>()
    };
    let value = parsed.unwrap_or_default();
    i32::try_from(if negative { -value } else { value }).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::GoogleApisDialect;

    const USER_PROTO: &str = r#"syntax = "proto3";

package acme.users;

import "google/api/annotations.proto";

// Manages users.
service UserService {
  // Fetch one user.
  rpc GetUser(GetUserRequest) returns (User) {
    option (google.api.http) = {
      get: "/v1/users/{id}"
    };
  }
  rpc WatchUsers(stream GetUserRequest) returns (stream .acme.users.User); // live feed
}

// tag::User[]
// A user of the system.
// end::User[]
message User {
  string name = 1; // Display name
  Status status = 2;
  repeated string tags = 3;
  map<string, int32> counters = 4;
  oneof contact {
    string email = 5;
    string phone = 6;
  }
  reserved 10 to 12;

  // Nested address.
  message Address {
    string street = 1;
  }
}

message GetUserRequest {
  string id = 1 [json_name = "id"];
}

/*
 * Account state.
 */
enum Status {
  option allow_alias = true;
  ACTIVE = 0; // In use
  INACTIVE = 0x1;
  DELETED = -1;
}
"#;

    fn parse() -> SchemaUnit {
        parse_source(USER_PROTO, "acme/users.proto", None).unwrap()
    }

    #[test]
    fn test_package_and_counts() {
        let unit = parse();
        assert_eq!(unit.package.as_deref(), Some("acme.users"));
        let names: Vec<_> = unit.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["User", "Address", "GetUserRequest"]);
        assert_eq!(unit.enums.len(), 1);
        assert_eq!(unit.services.len(), 1);
    }

    #[test]
    fn test_message_fields() {
        let unit = parse();
        let user = &unit.messages[0];
        assert_eq!(user.comments.leading, "A user of the system.");

        let fields: Vec<_> = user
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_str(), f.number, f.repeated))
            .collect();
        assert_eq!(
            fields,
            [
                ("name", "string", 1, false),
                ("status", "Status", 2, false),
                ("tags", "string", 3, true),
                ("counters", "map[string]int32", 4, false),
                ("email", "string", 5, false),
                ("phone", "string", 6, false),
            ]
        );
        assert_eq!(user.fields[0].comments.trailing, "Display name");
        assert!(user.fields.iter().all(|f| !f.builtin));
    }

    #[test]
    fn test_nested_message_comment() {
        let unit = parse();
        assert_eq!(unit.messages[1].comments.leading, "Nested address.");
    }

    #[test]
    fn test_enum_values() {
        let unit = parse();
        let status = &unit.enums[0];
        assert_eq!(status.name, "Status");
        assert_eq!(status.comments.leading, "Account state.");
        let values: Vec<_> = status.values.iter().map(|v| (v.name.as_str(), v.number)).collect();
        assert_eq!(values, [("ACTIVE", 0), ("INACTIVE", 1), ("DELETED", -1)]);
        assert_eq!(status.values[0].comments.trailing, "In use");
    }

    #[test]
    fn test_service_methods() {
        let unit = parse();
        let service = &unit.services[0];
        assert_eq!(service.comments.leading, "Manages users.");

        let get = &service.methods[0];
        assert_eq!(get.name, "GetUser");
        assert_eq!(get.comments.leading, "Fetch one user.");
        let rest = get.rest.as_ref().unwrap();
        assert_eq!(rest.method, "get");
        assert_eq!(rest.url, "/v1/users/{id}");
        assert_eq!(rest.body, None);

        let watch = &service.methods[1];
        assert!(watch.client_streaming);
        assert!(watch.server_streaming);
        assert_eq!(watch.request_type, "GetUserRequest");
        assert_eq!(watch.response_type, "User");
        assert_eq!(watch.comments.trailing, "live feed");
        assert!(watch.rest.is_none());
    }

    #[test]
    fn test_proto2_signed_identifier_defaults() {
        let text = r#"syntax = "proto2";
message Limits {
  optional double low = 1 [default = -inf];
  optional float high = 2 [default = +inf, deprecated = true];
  optional int32 floor = 3 [default = -5];
}
"#;
        let unit = parse_source(text, "limits.proto", None).unwrap();
        let names: Vec<_> = unit.messages[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["low", "high", "floor"]);
    }

    #[test]
    fn test_proto2_group() {
        let text = r#"syntax = "proto2";
message SearchResponse {
  // One hit.
  repeated group Result = 1 {
    required string url = 2;
    optional string title = 3;
  }
  optional int32 total = 4;
}
"#;
        let unit = parse_source(text, "search.proto", None).unwrap();
        let names: Vec<_> = unit.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["SearchResponse", "Result"]);

        let response = &unit.messages[0];
        let fields: Vec<_> = response
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_str(), f.number, f.repeated))
            .collect();
        assert_eq!(fields, [("result", "Result", 1, true), ("total", "int32", 4, false)]);
        assert_eq!(response.fields[0].comments.leading, "One hit.");

        let result = &unit.messages[1];
        assert_eq!(result.fields.len(), 2);
        assert_eq!(result.fields[0].name, "url");
    }

    #[test]
    fn test_rpc_signature_over_two_lines() {
        let text = r#"service Feed {
  // lead
  rpc Watch(Req)
      returns (stream Event); // trail
  rpc Get(Req)
      returns (Event) { // with body
    option deprecated = true;
  }
}
"#;
        let unit = parse_source(text, "feed.proto", None).unwrap();
        let methods = &unit.services[0].methods;
        assert_eq!(methods[0].comments.leading, "lead");
        assert_eq!(methods[0].comments.trailing, "trail");
        assert!(methods[0].server_streaming);
        assert_eq!(methods[1].comments.trailing, "with body");
    }

    #[test]
    fn test_block_comment_before_declaration() {
        let text = "/* About A */ message A {\n  string f = 1;\n}\n";
        let unit = parse_source(text, "a.proto", None).unwrap();
        assert_eq!(unit.messages[0].comments.leading, "About A");
        assert_eq!(unit.messages[0].fields[0].comments.leading, "");
    }

    #[test]
    fn test_types_relative_to_package() {
        let text = r#"package acme.users;
message User {
  .acme.users.Status status = 1;
  acme.other.Thing thing = 2;
  map<string, acme.users.Status> history = 3;
}
"#;
        let unit = parse_source(text, "users.proto", None).unwrap();
        let types: Vec<_> = unit.messages[0]
            .fields
            .iter()
            .map(|f| f.type_name.as_str())
            .collect();
        assert_eq!(types, ["Status", "acme.other.Thing", "map[string]Status"]);
    }

    #[test]
    fn test_dialect_rewrites_comments() {
        let text = "// # Overview\n// Example usage\nmessage Doc {}\n";
        let unit = parse_source(text, "google/doc.proto", Some(&GoogleApisDialect)).unwrap();
        assert_eq!(unit.messages[0].comments.leading, "=== Overview\n.Example usage");
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = parse_source("message {", "broken.proto", None).unwrap_err();
        assert!(err.to_string().contains("broken.proto"));
    }

    #[test]
    fn test_parse_int_forms() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("0x1F"), 31);
        assert_eq!(parse_int("010"), 8);
        assert_eq!(parse_int("-3"), -3);
        assert_eq!(parse_int("0"), 0);
        assert_eq!(parse_int("99999999999"), 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_proto_file("/nonexistent/definitely/missing.proto").unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
