//! Field type resolution
//!
//! Decides whether a declared field type points at a message or enum of the
//! same unit, is a scalar, or refers to something declared elsewhere, and
//! formats the matching cross-reference.

use crate::model::{DeclKind, FieldDecl, SchemaUnit};
use prost_types::field_descriptor_proto::Type;
use std::collections::HashSet;

/// How cross-references to local declarations are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossRefStyle {
    /// Plain AsciiDoc cross-reference: `<<User_message>>`
    #[default]
    Anchor,
    /// Inline macro of the Asciidoctor extension: `proto2asciidoc:message[User]`
    InlineMacro,
}

impl CrossRefStyle {
    /// Section id for a declaration, matching what [`ResolvedTypeRef::display`] links to
    pub fn anchor_id(&self, name: &str, kind: DeclKind) -> String {
        let id = format!("{}_{}", name, kind.anchor_suffix());
        match self {
            CrossRefStyle::Anchor => id,
            // the extension lowercases every link target
            CrossRefStyle::InlineMacro => id.to_lowercase(),
        }
    }

    /// Cross-reference to a local declaration
    pub fn reference(&self, name: &str, kind: DeclKind) -> String {
        match self {
            CrossRefStyle::Anchor => format!("<<{}_{}>>", name, kind.anchor_suffix()),
            CrossRefStyle::InlineMacro => {
                format!("proto2asciidoc:{}[{}]", kind.anchor_suffix(), name)
            }
        }
    }
}

/// A field type after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTypeRef {
    /// Scalar or map type, shown as written (empty for untyped fields)
    Scalar(String),
    /// Message declared in the same unit
    LocalMessage(String),
    /// Enum declared in the same unit
    LocalEnum(String),
    /// Anything else; carries the reference key with `.` replaced by `_`
    External(String),
}

impl ResolvedTypeRef {
    /// Section id a local reference links to
    pub fn anchor(&self, style: CrossRefStyle) -> Option<String> {
        match self {
            ResolvedTypeRef::LocalMessage(name) => Some(style.anchor_id(name, DeclKind::Message)),
            ResolvedTypeRef::LocalEnum(name) => Some(style.anchor_id(name, DeclKind::Enum)),
            ResolvedTypeRef::Scalar(_) | ResolvedTypeRef::External(_) => None,
        }
    }

    /// Text to put in a type column
    pub fn display(&self, style: CrossRefStyle) -> String {
        match self {
            ResolvedTypeRef::Scalar(raw) => raw.clone(),
            ResolvedTypeRef::LocalMessage(name) => style.reference(name, DeclKind::Message),
            ResolvedTypeRef::LocalEnum(name) => style.reference(name, DeclKind::Enum),
            ResolvedTypeRef::External(key) => format!("<<{}>>", key),
        }
    }
}

/// Message and enum names known in one unit
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    messages: HashSet<String>,
    enums: HashSet<String>,
}

impl TypeIndex {
    /// Build an index from explicit name lists
    pub fn new<M, E>(messages: M, enums: E) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        TypeIndex {
            messages: messages.into_iter().map(Into::into).collect(),
            enums: enums.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the index of a unit's own declarations
    pub fn for_unit(unit: &SchemaUnit) -> Self {
        TypeIndex::new(
            unit.messages.iter().map(|m| m.name.clone()),
            unit.enums.iter().map(|e| e.name.clone()),
        )
    }

    /// Resolve a declared type name
    ///
    /// Exact local names are checked before the scalar heuristic, so a local
    /// message called `bool` still resolves to that message. The heuristic
    /// is loose: anything containing `int` or `bool` counts
    /// as a scalar.
    pub fn resolve(&self, field_type: &str) -> ResolvedTypeRef {
        if field_type.is_empty() {
            return ResolvedTypeRef::Scalar(String::new());
        }
        if self.enums.contains(field_type) {
            return ResolvedTypeRef::LocalEnum(field_type.to_string());
        }
        if self.messages.contains(field_type) {
            return ResolvedTypeRef::LocalMessage(field_type.to_string());
        }
        if field_type == "string"
            || field_type.contains("map[")
            || field_type.contains("int")
            || field_type.contains("bool")
        {
            return ResolvedTypeRef::Scalar(field_type.to_string());
        }
        ResolvedTypeRef::External(field_type.replace('.', "_"))
    }

    /// Resolve a field, trusting descriptor-proven scalars
    pub fn resolve_field(&self, field: &FieldDecl) -> ResolvedTypeRef {
        if field.builtin {
            ResolvedTypeRef::Scalar(field.type_name.clone())
        } else {
            self.resolve(&field.type_name)
        }
    }
}

/// Lowercase protobuf name of a scalar descriptor type
pub fn scalar_name(ty: Type) -> Option<&'static str> {
    let name = match ty {
        Type::Double => "double",
        Type::Float => "float",
        Type::Int64 => "int64",
        Type::Uint64 => "uint64",
        Type::Int32 => "int32",
        Type::Fixed64 => "fixed64",
        Type::Fixed32 => "fixed32",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Bytes => "bytes",
        Type::Uint32 => "uint32",
        Type::Sfixed32 => "sfixed32",
        Type::Sfixed64 => "sfixed64",
        Type::Sint32 => "sint32",
        Type::Sint64 => "sint64",
        Type::Group | Type::Message | Type::Enum => return None,
    };
    Some(name)
}

/// Express a descriptor type name (`.pkg.User`) relative to the file package
pub fn relative_type_name(type_name: &str, package: &str) -> String {
    let name = type_name.strip_prefix('.').unwrap_or(type_name);
    if !package.is_empty() {
        if let Some(rest) = name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
        {
            return rest.to_string();
        }
    }
    name.to_string()
}
