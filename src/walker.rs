//! Descriptor walker
//!
//! Turns a `FileDescriptorProto` into a [`SchemaUnit`] and attaches the
//! comments protoc recorded in `SourceCodeInfo`.

use crate::comments::clean;
use crate::model::{
    EnumDecl, EnumValueDecl, FieldDecl, LocationComment, LocationPath, MessageDecl, MethodDecl,
    SchemaUnit, ServiceDecl,
};
use crate::options::{parse_http_rule_uninterpreted, RestBindings};
use crate::types::{relative_type_name, scalar_name};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto,
};
use tracing::{debug, trace};

/// Attach location comments to the declarations they address
///
/// Locations that do not address a declaration or child of this unit
/// (unknown kinds, other depths, indices past the end) are skipped.
pub fn attach_comments(unit: &mut SchemaUnit, locations: &[LocationComment]) {
    for location in locations {
        let Some(path) = LocationPath::decode(&location.path) else {
            continue;
        };
        let Some(target) = unit.comments_at_mut(path) else {
            trace!(path = ?location.path, "location has no matching declaration");
            continue;
        };
        if let Some(leading) = &location.leading {
            target.leading = clean(leading);
        }
        if let Some(trailing) = &location.trailing {
            target.trailing = clean(trailing);
        }
    }
}

/// Collect the comment-bearing locations of a file
pub fn location_comments(file: &FileDescriptorProto) -> Vec<LocationComment> {
    let Some(info) = &file.source_code_info else {
        return Vec::new();
    };
    info.location
        .iter()
        .filter(|loc| loc.leading_comments.is_some() || loc.trailing_comments.is_some())
        .map(|loc| LocationComment {
            path: loc.path.clone(),
            leading: loc.leading_comments.clone(),
            trailing: loc.trailing_comments.clone(),
        })
        .collect()
}

/// Build the annotated unit for one file
pub fn walk_file(file: &FileDescriptorProto, rest: &RestBindings) -> SchemaUnit {
    let package = file.package();

    let mut unit = SchemaUnit {
        name: file.name().to_string(),
        package: file.package.clone(),
        messages: file
            .message_type
            .iter()
            .map(|message| walk_message(message, package))
            .collect(),
        enums: file.enum_type.iter().map(walk_enum).collect(),
        services: file
            .service
            .iter()
            .map(|service| walk_service(file, service, rest))
            .collect(),
    };

    let locations = location_comments(file);
    attach_comments(&mut unit, &locations);

    debug!(
        file = %unit.name,
        messages = unit.messages.len(),
        enums = unit.enums.len(),
        services = unit.services.len(),
        "walked file descriptor"
    );

    unit
}

fn walk_message(message: &DescriptorProto, package: &str) -> MessageDecl {
    MessageDecl {
        name: message.name().to_string(),
        fields: message
            .field
            .iter()
            .map(|field| walk_field(message, field, package))
            .collect(),
        comments: Default::default(),
    }
}

fn walk_field(message: &DescriptorProto, field: &FieldDescriptorProto, package: &str) -> FieldDecl {
    let mut decl = FieldDecl {
        name: field.name().to_string(),
        number: field.number(),
        repeated: field.label() == Label::Repeated,
        ..Default::default()
    };

    if let Some((key, value)) = map_entry_types(message, field, package) {
        decl.type_name = format!("map[{}]{}", key, value);
        decl.repeated = false;
        return decl;
    }

    let (type_name, builtin) = declared_type(field, package);
    decl.type_name = type_name;
    decl.builtin = builtin;
    decl
}

/// Declared type of a field and whether it is a known scalar
fn declared_type(field: &FieldDescriptorProto, package: &str) -> (String, bool) {
    let builtin = field.r#type.and_then(|_| scalar_name(field.r#type()));
    match builtin {
        Some(name) => (name.to_string(), true),
        None => (relative_type_name(field.type_name(), package), false),
    }
}

/// Key and value types when the field is a protobuf map
///
/// protoc lowers `map<K, V>` to a repeated field of a nested `...Entry`
/// message flagged `map_entry`.
fn map_entry_types(
    message: &DescriptorProto,
    field: &FieldDescriptorProto,
    package: &str,
) -> Option<(String, String)> {
    if field.label() != Label::Repeated || field.r#type() != Type::Message {
        return None;
    }
    let entry_name = field.type_name().rsplit('.').next()?;
    let entry = message.nested_type.iter().find(|nested| {
        nested.name() == entry_name
            && nested
                .options
                .as_ref()
                .and_then(|opts| opts.map_entry)
                .unwrap_or(false)
    })?;

    let key = entry.field.iter().find(|f| f.number() == 1)?;
    let value = entry.field.iter().find(|f| f.number() == 2)?;
    Some((declared_type(key, package).0, declared_type(value, package).0))
}

fn walk_enum(enumeration: &EnumDescriptorProto) -> EnumDecl {
    EnumDecl {
        name: enumeration.name().to_string(),
        values: enumeration
            .value
            .iter()
            .map(|value| EnumValueDecl {
                name: value.name().to_string(),
                number: value.number(),
                comments: Default::default(),
            })
            .collect(),
        comments: Default::default(),
    }
}

fn walk_service(
    file: &FileDescriptorProto,
    service: &ServiceDescriptorProto,
    rest: &RestBindings,
) -> ServiceDecl {
    let package = file.package();
    ServiceDecl {
        name: service.name().to_string(),
        methods: service
            .method
            .iter()
            .map(|method| MethodDecl {
                name: method.name().to_string(),
                request_type: relative_type_name(method.input_type(), package),
                response_type: relative_type_name(method.output_type(), package),
                client_streaming: method.client_streaming(),
                server_streaming: method.server_streaming(),
                rest: rest
                    .get(file.name(), service.name(), method.name())
                    .cloned()
                    .or_else(|| {
                        method
                            .options
                            .as_ref()
                            .and_then(parse_http_rule_uninterpreted)
                    }),
                comments: Default::default(),
            })
            .collect(),
        comments: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::source_code_info::Location;
    use prost_types::{EnumValueDescriptorProto, MessageOptions, SourceCodeInfo};

    fn field(name: &str, number: i32, ty: Type, type_name: Option<&str>) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            r#type: Some(ty.into()),
            type_name: type_name.map(str::to_string),
            label: Some(Label::Optional.into()),
            ..Default::default()
        }
    }

    fn two_messages() -> SchemaUnit {
        SchemaUnit {
            messages: vec![
                MessageDecl {
                    name: "First".to_string(),
                    ..Default::default()
                },
                MessageDecl {
                    name: "Second".to_string(),
                    fields: vec![FieldDecl {
                        name: "id".to_string(),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn location(path: &[i32], leading: &str) -> LocationComment {
        LocationComment {
            path: path.to_vec(),
            leading: Some(leading.to_string()),
            trailing: None,
        }
    }

    #[test]
    fn test_attach_to_declaration() {
        let mut unit = two_messages();
        attach_comments(&mut unit, &[location(&[4, 1], " The second one\n")]);
        assert_eq!(unit.messages[1].comments.leading, " The second one");
        assert!(unit.messages[0].comments.is_blank());
    }

    #[test]
    fn test_attach_to_field() {
        let mut unit = two_messages();
        attach_comments(&mut unit, &[location(&[4, 1, 2, 0], " Identifier\n")]);
        assert_eq!(unit.messages[1].fields[0].comments.leading, " Identifier");
        assert!(unit.messages[1].comments.is_blank());
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut unit = two_messages();
        let before = unit.clone();
        attach_comments(
            &mut unit,
            &[
                location(&[4, 99], "nope"),
                location(&[4, 1, 2, 7], "nope"),
                location(&[5, 0], "no enums here"),
                location(&[4, 0, 3, 0], "nested type"),
            ],
        );
        assert_eq!(unit, before);
    }

    #[test]
    fn test_trailing_comment_cleaned() {
        let mut unit = two_messages();
        attach_comments(
            &mut unit,
            &[LocationComment {
                path: vec![4, 0],
                leading: None,
                trailing: Some(" tag::First[]\n after\n end::First[]\n".to_string()),
            }],
        );
        assert_eq!(unit.messages[0].comments.trailing, " after");
        assert_eq!(unit.messages[0].comments.leading, "");
    }

    #[test]
    fn test_walk_file_fields_and_comments() {
        let file = FileDescriptorProto {
            name: Some("test/user.proto".to_string()),
            package: Some("test".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("User".to_string()),
                field: vec![
                    field("name", 1, Type::String, None),
                    field("status", 2, Type::Enum, Some(".test.Status")),
                    field("created", 3, Type::Message, Some(".google.protobuf.Timestamp")),
                ],
                ..Default::default()
            }],
            enum_type: vec![EnumDescriptorProto {
                name: Some("Status".to_string()),
                value: vec![EnumValueDescriptorProto {
                    name: Some("ACTIVE".to_string()),
                    number: Some(0),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            source_code_info: Some(SourceCodeInfo {
                location: vec![
                    Location {
                        path: vec![4, 0],
                        leading_comments: Some(" A user\n".to_string()),
                        ..Default::default()
                    },
                    Location {
                        path: vec![5, 0, 2, 0],
                        trailing_comments: Some(" Active user\n".to_string()),
                        ..Default::default()
                    },
                ],
            }),
            ..Default::default()
        };

        let unit = walk_file(&file, &RestBindings::default());
        let user = &unit.messages[0];
        assert_eq!(user.comments.leading, " A user");
        assert_eq!(user.fields[0].type_name, "string");
        assert!(user.fields[0].builtin);
        assert_eq!(user.fields[1].type_name, "Status");
        assert!(!user.fields[1].builtin);
        assert_eq!(user.fields[2].type_name, "google.protobuf.Timestamp");
        assert_eq!(unit.enums[0].values[0].comments.trailing, " Active user");
    }

    #[test]
    fn test_walk_map_field() {
        let entry = DescriptorProto {
            name: Some("LabelsEntry".to_string()),
            field: vec![
                field("key", 1, Type::String, None),
                field("value", 2, Type::Int32, None),
            ],
            options: Some(MessageOptions {
                map_entry: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut labels = field("labels", 1, Type::Message, Some(".test.User.LabelsEntry"));
        labels.label = Some(Label::Repeated.into());

        let message = DescriptorProto {
            name: Some("User".to_string()),
            field: vec![labels],
            nested_type: vec![entry],
            ..Default::default()
        };

        let decl = walk_message(&message, "test");
        assert_eq!(decl.fields[0].type_name, "map[string]int32");
        assert!(!decl.fields[0].repeated);
    }
}
