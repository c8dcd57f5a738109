//! AsciiDoc rendering
//!
//! One block per declaration. The block layout is shared by both front ends;
//! what differs between them is carried in [`RenderOptions`] and the
//! [`IncludeResolver`] handed to the [`Renderer`].

mod enumeration;
mod message;
mod service;

use crate::model::{Comments, Declaration, MessageDecl, MethodDecl, SchemaUnit, ServiceDecl};
use crate::options::Parameters;
use crate::types::{CrossRefStyle, TypeIndex};

/// Rendering switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Sort declarations by name before rendering
    pub sorted: bool,
    /// Booleans as `{true-icon}` / `{false-icon}` attributes
    pub icons: bool,
    /// Cross-reference syntax for local types
    pub xref: CrossRefStyle,
    /// Wrap message and enum tables in a collapsible block
    pub collapsible: bool,
    /// Source file to include `.Protobuf Source` snippets from; also turns on
    /// `tag::` / `end::` region markers around every block
    pub source_file: Option<String>,
}

impl RenderOptions {
    /// Options from plugin parameters
    ///
    /// `sorted`, `icons`, `extension` and `collapsible` are recognized, each
    /// only when set to `on`.
    pub fn from_parameters(params: &Parameters) -> Self {
        RenderOptions {
            sorted: params.is_on("sorted"),
            icons: params.is_on("icons"),
            xref: if params.is_on("extension") {
                CrossRefStyle::InlineMacro
            } else {
                CrossRefStyle::Anchor
            },
            collapsible: params.is_on("collapsible"),
            source_file: None,
        }
    }
}

/// Supplies hand-written documents to include next to generated blocks
///
/// Each method returns an include target, or `None` when there is nothing
/// to include.
pub trait IncludeResolver {
    /// Intro text for a service
    fn service_intro(&self, _service: &ServiceDecl) -> Option<String> {
        None
    }

    /// Extra documentation for one method
    fn method_doc(&self, _service: &ServiceDecl, _method: &MethodDecl) -> Option<String> {
        None
    }

    /// File holding a `tag::<Name>Message[]` example for a message
    fn message_example(&self, _message: &MessageDecl) -> Option<String> {
        None
    }
}

/// Resolver that never includes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {}

static NO_INCLUDES: NoIncludes = NoIncludes;

/// Renders the declarations of one unit
pub struct Renderer<'a> {
    options: &'a RenderOptions,
    types: TypeIndex,
    includes: &'a dyn IncludeResolver,
}

impl<'a> Renderer<'a> {
    /// Renderer for `unit`, resolving field types against its declarations
    pub fn new(unit: &SchemaUnit, options: &'a RenderOptions) -> Self {
        Renderer {
            options,
            types: TypeIndex::for_unit(unit),
            includes: &NO_INCLUDES,
        }
    }

    /// Use `includes` for hand-written documents
    pub fn with_includes(mut self, includes: &'a dyn IncludeResolver) -> Self {
        self.includes = includes;
        self
    }

    /// Render any declaration
    pub fn render_declaration(&self, decl: Declaration<'_>) -> String {
        match decl {
            Declaration::Message(message) => self.render_message(message),
            Declaration::Enum(enumeration) => self.render_enum(enumeration),
            Declaration::Service(service) => self.render_service(service),
        }
    }

    fn bool_cell(&self, value: bool) -> &'static str {
        bool_icon(value, self.options.icons)
    }

    /// `[#id]`, `== Name Kind`, opening region marker and comment text
    fn section_header(&self, out: &mut String, decl: Declaration<'_>) {
        out.push_str(&format!(
            "[#{}]\n",
            self.options.xref.anchor_id(decl.name(), decl.kind())
        ));
        out.push_str(&format!("== {} {}\n", decl.name(), decl.kind().title()));
        if self.options.source_file.is_some() {
            out.push_str(&format!("// tag::{}[]\n", decl.name()));
        }
        out.push_str(&comment_block(decl.comments()));
    }

    /// Closing region marker and the blank line between blocks
    fn section_footer(&self, out: &mut String, name: &str) {
        if self.options.source_file.is_some() {
            out.push_str(&format!("// end::{}[]\n", name));
        }
        out.push('\n');
    }

    /// Collapsible `.Protobuf Source` include of the named region
    fn protobuf_source(&self, out: &mut String, name: &str) {
        let Some(source) = &self.options.source_file else {
            return;
        };
        out.push_str("\n.Protobuf Source\n[%collapsible]\n====\n[source,protobuf]\n----\n");
        out.push_str(&format!("include::{}[tag={}]\n", source, name));
        out.push_str("----\n====\n");
    }

    /// `.Name Overview` caption, optionally opening a collapsible block
    fn table_caption(&self, out: &mut String, name: &str, collapsible: bool) {
        out.push_str(&format!("\n.{} Overview", name));
        if collapsible {
            out.push_str("\n[%collapsible]\n====");
        }
    }
}

/// Render a whole unit: services, then messages, then enums
///
/// Sorting is the caller's business; see [`SchemaUnit::sort_by_name`].
pub fn render_unit(unit: &SchemaUnit, options: &RenderOptions) -> String {
    let renderer = Renderer::new(unit, options);
    unit.declarations()
        .map(|decl| renderer.render_declaration(decl))
        .collect()
}

/// AsciiDoc text for a boolean cell
pub fn bool_icon(value: bool, icons: bool) -> &'static str {
    match (icons, value) {
        (true, true) => "{true-icon}",
        (true, false) => "{false-icon}",
        (false, true) => "true",
        (false, false) => "false",
    }
}

/// Comment text followed by a newline; a lone newline when there is none
fn comment_block(comments: &Comments) -> String {
    if comments.is_blank() {
        "\n".to_string()
    } else {
        format!("{}\n", comments.text())
    }
}
