//! Annotated schema tree
//!
//! Both front ends (protoc plugin and `.proto` source parser) produce a
//! [`SchemaUnit`]; the renderer only ever sees this model.

/// Leading and trailing comment text attached to a declaration or child
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Comment block above the element
    pub leading: String,
    /// Comment after the element (same line, or the line below for protoc)
    pub trailing: String,
}

impl Comments {
    /// Display text: leading then trailing, each trimmed of spaces
    pub fn text(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if !self.leading.is_empty() {
            parts.push(self.leading.trim_matches(' '));
        }
        if !self.trailing.is_empty() {
            parts.push(self.trailing.trim_matches(' '));
        }
        parts.join("\n")
    }

    /// True when there is nothing worth rendering
    pub fn is_blank(&self) -> bool {
        self.text().trim_matches(|c| c == '\n' || c == ' ').is_empty()
    }
}

/// One parsed schema file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaUnit {
    /// File name (`test/user.proto`) or source path
    pub name: String,
    /// Declared package, if any
    pub package: Option<String>,
    /// Messages in declaration order
    pub messages: Vec<MessageDecl>,
    /// Enums in declaration order
    pub enums: Vec<EnumDecl>,
    /// Services in declaration order
    pub services: Vec<ServiceDecl>,
}

/// A message declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDecl {
    /// Message name, unique within the unit
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDecl>,
    /// Attached comments
    pub comments: Comments,
}

/// A message field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type as written (`string`, `Status`, `pkg.Other`, `map[string]int32`)
    pub type_name: String,
    /// Set when a descriptor already proved the type is a scalar
    pub builtin: bool,
    /// Field number from the declaration
    pub number: i32,
    /// `repeated` label
    pub repeated: bool,
    /// Attached comments
    pub comments: Comments,
}

/// An enum declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumDecl {
    /// Enum name, unique within the unit
    pub name: String,
    /// Values in declaration order
    pub values: Vec<EnumValueDecl>,
    /// Attached comments
    pub comments: Comments,
}

/// An enum value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValueDecl {
    /// Value name
    pub name: String,
    /// Integer value
    pub number: i32,
    /// Attached comments
    pub comments: Comments,
}

/// A service declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDecl {
    /// Service name
    pub name: String,
    /// Methods in declaration order
    pub methods: Vec<MethodDecl>,
    /// Attached comments
    pub comments: Comments,
}

/// A service method (rpc)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Request message type
    pub request_type: String,
    /// Response message type
    pub response_type: String,
    /// `stream` on the request
    pub client_streaming: bool,
    /// `stream` on the response
    pub server_streaming: bool,
    /// HTTP binding from `google.api.http`
    pub rest: Option<RestBinding>,
    /// Attached comments
    pub comments: Comments,
}

/// REST mapping of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestBinding {
    /// HTTP verb as written in the rule (`get`, `post`, custom kinds verbatim)
    pub method: String,
    /// URL template
    pub url: String,
    /// Request body field, `*` for the whole message
    pub body: Option<String>,
}

/// Verbs that map directly onto a `HttpRule` pattern field
const HTTP_VERBS: [&str; 5] = ["get", "put", "post", "delete", "patch"];

impl RestBinding {
    /// Build a binding from the key/value entries of an `HttpRule` aggregate
    ///
    /// `custom` carries its own nested aggregate, handed in pre-split by the caller
    /// through `custom`. Returns `None` when no verb is present.
    pub fn from_entries<'a, I>(entries: I, custom: Option<(String, String)>) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut pattern: Option<(String, String)> = None;
        let mut body = None;

        for (key, value) in entries {
            if key == "body" {
                if !value.is_empty() {
                    body = Some(value.to_string());
                }
            } else if pattern.is_none() && HTTP_VERBS.contains(&key) {
                pattern = Some((key.to_string(), value.to_string()));
            }
        }

        let (method, url) = pattern.or(custom)?;
        Some(RestBinding { method, url, body })
    }
}

/// The closed set of declaration kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// `message`
    Message,
    /// `enum`
    Enum,
    /// `service`
    Service,
}

impl DeclKind {
    /// Decode the `FileDescriptorProto` field number used as `path[0]`
    pub fn from_path_code(code: i32) -> Option<Self> {
        match code {
            4 => Some(DeclKind::Message),
            5 => Some(DeclKind::Enum),
            6 => Some(DeclKind::Service),
            _ => None,
        }
    }

    /// Field number of the child list (`field`, `value`, `method`)
    pub fn child_code(&self) -> i32 {
        2
    }

    /// Title word used in section headers
    pub fn title(&self) -> &'static str {
        match self {
            DeclKind::Message => "Message",
            DeclKind::Enum => "Enum",
            DeclKind::Service => "Service",
        }
    }

    /// Suffix used in anchors and cross-reference macros
    pub fn anchor_suffix(&self) -> &'static str {
        match self {
            DeclKind::Message => "message",
            DeclKind::Enum => "enum",
            DeclKind::Service => "service",
        }
    }
}

/// A source location with its raw comments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationComment {
    /// Positional path into the file descriptor
    pub path: Vec<i32>,
    /// Raw leading comment
    pub leading: Option<String>,
    /// Raw trailing comment
    pub trailing: Option<String>,
}

/// A location path decoded into the declaration it addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationPath {
    /// Declaration kind
    pub kind: DeclKind,
    /// Index of the declaration within its kind
    pub index: usize,
    /// Index of the field / value / method, when the path targets a child
    pub child: Option<usize>,
}

impl LocationPath {
    /// Decode a raw path; anything this model does not address yields `None`
    pub fn decode(path: &[i32]) -> Option<Self> {
        if path.len() < 2 {
            return None;
        }
        let kind = DeclKind::from_path_code(path[0])?;
        let index = usize::try_from(path[1]).ok()?;

        match path.len() {
            2 => Some(LocationPath {
                kind,
                index,
                child: None,
            }),
            4 if path[2] == kind.child_code() => Some(LocationPath {
                kind,
                index,
                child: Some(usize::try_from(path[3]).ok()?),
            }),
            _ => None,
        }
    }
}

/// Borrowed view over any declaration
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    /// A message
    Message(&'a MessageDecl),
    /// An enum
    Enum(&'a EnumDecl),
    /// A service
    Service(&'a ServiceDecl),
}

impl<'a> Declaration<'a> {
    /// Kind of this declaration
    pub fn kind(&self) -> DeclKind {
        match self {
            Declaration::Message(_) => DeclKind::Message,
            Declaration::Enum(_) => DeclKind::Enum,
            Declaration::Service(_) => DeclKind::Service,
        }
    }

    /// Declared name
    pub fn name(&self) -> &'a str {
        match self {
            Declaration::Message(m) => &m.name,
            Declaration::Enum(e) => &e.name,
            Declaration::Service(s) => &s.name,
        }
    }

    /// Attached comments
    pub fn comments(&self) -> &'a Comments {
        match self {
            Declaration::Message(m) => &m.comments,
            Declaration::Enum(e) => &e.comments,
            Declaration::Service(s) => &s.comments,
        }
    }
}

impl SchemaUnit {
    /// All declarations: services, then messages, then enums
    pub fn declarations(&self) -> impl Iterator<Item = Declaration<'_>> {
        self.services
            .iter()
            .map(Declaration::Service)
            .chain(self.messages.iter().map(Declaration::Message))
            .chain(self.enums.iter().map(Declaration::Enum))
    }

    /// Comment slot addressed by a location path, if it exists
    pub fn comments_at_mut(&mut self, path: LocationPath) -> Option<&mut Comments> {
        match (path.kind, path.child) {
            (DeclKind::Message, None) => self.messages.get_mut(path.index).map(|m| &mut m.comments),
            (DeclKind::Message, Some(child)) => self
                .messages
                .get_mut(path.index)?
                .fields
                .get_mut(child)
                .map(|f| &mut f.comments),
            (DeclKind::Enum, None) => self.enums.get_mut(path.index).map(|e| &mut e.comments),
            (DeclKind::Enum, Some(child)) => self
                .enums
                .get_mut(path.index)?
                .values
                .get_mut(child)
                .map(|v| &mut v.comments),
            (DeclKind::Service, None) => self.services.get_mut(path.index).map(|s| &mut s.comments),
            (DeclKind::Service, Some(child)) => self
                .services
                .get_mut(path.index)?
                .methods
                .get_mut(child)
                .map(|m| &mut m.comments),
        }
    }

    /// Stable-sort messages, enums and services by name
    pub fn sort_by_name(&mut self) {
        self.messages.sort_by(|a, b| a.name.cmp(&b.name));
        self.enums.sort_by(|a, b| a.name.cmp(&b.name));
        self.services.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_declaration_path() {
        let path = LocationPath::decode(&[4, 1]).unwrap();
        assert_eq!(path.kind, DeclKind::Message);
        assert_eq!(path.index, 1);
        assert_eq!(path.child, None);
    }

    #[test]
    fn test_decode_child_path() {
        let path = LocationPath::decode(&[6, 0, 2, 3]).unwrap();
        assert_eq!(path.kind, DeclKind::Service);
        assert_eq!(path.child, Some(3));
    }

    #[test]
    fn test_decode_rejects_unaddressed_paths() {
        assert!(LocationPath::decode(&[4]).is_none());
        assert!(LocationPath::decode(&[3, 0]).is_none());
        assert!(LocationPath::decode(&[4, -1]).is_none());
        // nested type of a message, not a field
        assert!(LocationPath::decode(&[4, 0, 3, 0]).is_none());
        // field type, deeper than this model goes
        assert!(LocationPath::decode(&[4, 0, 2, 0, 5]).is_none());
    }

    #[test]
    fn test_comments_text() {
        let comments = Comments {
            leading: " Leading".to_string(),
            trailing: "Trailing ".to_string(),
        };
        assert_eq!(comments.text(), "Leading\nTrailing");
        assert!(!comments.is_blank());
        assert!(Comments::default().is_blank());
    }

    #[test]
    fn test_rest_binding_from_entries() {
        let binding =
            RestBinding::from_entries([("post", "/v1/users"), ("body", "*")], None).unwrap();
        assert_eq!(binding.method, "post");
        assert_eq!(binding.url, "/v1/users");
        assert_eq!(binding.body.as_deref(), Some("*"));

        let custom = RestBinding::from_entries(
            [("body", "")],
            Some(("HEAD".to_string(), "/v1/ping".to_string())),
        )
        .unwrap();
        assert_eq!(custom.method, "HEAD");
        assert_eq!(custom.body, None);

        assert!(RestBinding::from_entries([("body", "*")], None).is_none());
    }

    #[test]
    fn test_sort_by_name_is_stable() {
        let mut unit = SchemaUnit {
            messages: vec![
                MessageDecl {
                    name: "b".to_string(),
                    ..Default::default()
                },
                MessageDecl {
                    name: "a".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        unit.sort_by_name();
        let names: Vec<_> = unit.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
