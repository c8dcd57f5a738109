//! Document assembly for the standalone CLI
//!
//! Wraps the rendered declarations of one `.proto` file into a complete
//! AsciiDoc document. In api-docs mode the document also pulls in
//! hand-written files found next to the output (service intros, endpoint
//! docs, about/examples pages, errors, command docs).

use crate::model::{MessageDecl, MethodDecl, SchemaUnit, ServiceDecl};
use crate::render::{IncludeResolver, RenderOptions, Renderer};
use crate::types::CrossRefStyle;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Sample file holding `tag::<Name>Message[]` examples
const MESSAGE_SAMPLES: &str = "message_samples.adoc";

/// Where things are, as given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocPaths {
    /// The `.proto` file being documented
    pub source_file: String,
    /// Output path; empty for stdout
    pub destination: String,
    /// Api directory relative to the output's directory
    pub api_dir: String,
}

impl DocPaths {
    /// Directory part of the destination, with its trailing `/`
    fn destination_dir(&self) -> &str {
        match self.destination.rfind('/') {
            Some(idx) => &self.destination[..=idx],
            None => "",
        }
    }

    /// Include target for `filename` inside the api dir, when the file exists
    ///
    /// Names that climb out of the api dir (`../about.adoc`) come back as
    /// given, since Asciidoctor does not resolve `../api/../about.adoc`.
    pub fn filepath_for(&self, filename: &str) -> Option<String> {
        let relative = format!("{}/{}", self.api_dir, filename);
        let on_disk = format!("{}{}", self.destination_dir(), relative);
        if !Path::new(&on_disk).exists() {
            return None;
        }
        if relative.contains(&format!("{}/../", self.api_dir)) {
            Some(filename.to_string())
        } else {
            Some(relative)
        }
    }

    /// Include targets of the `.adoc` files in a directory below the api dir
    pub fn files_in_dir(&self, dir: &str) -> Vec<String> {
        let relative = format!("{}/{}", self.api_dir, dir);
        let on_disk = format!("{}{}", self.destination_dir(), relative);
        let Ok(entries) = fs::read_dir(&on_disk) else {
            return Vec::new();
        };

        let prefix = if relative.contains(&format!("{}/../", self.api_dir)) {
            dir.to_string()
        } else {
            relative
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".adoc"))
            .collect();
        names.sort();
        names
            .into_iter()
            .map(|name| format!("{}/{}", prefix, name))
            .collect()
    }
}

/// A file given with `--sample-files`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleFile {
    /// Base name
    pub name: String,
    /// Path as given
    pub path: String,
    /// Include target relative to the output
    pub relative: String,
}

impl SampleFile {
    /// Sample file at `path`, not yet resolved against [`DocPaths`]
    pub fn new(path: &str) -> Self {
        SampleFile {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            relative: String::new(),
        }
    }

    /// Work out the include target
    ///
    /// Paths under a `generated` directory become `../generated/...`; paths
    /// under `api/` are rebased onto the api dir.
    pub fn process_path(&mut self, paths: &DocPaths) {
        if let Some((_, rest)) = self.path.split_once("generated") {
            self.relative = format!("../generated{}", rest);
            return;
        }
        if self.path.contains("api/") {
            let api_base = paths
                .api_dir
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default();
            if api_base.is_empty() || api_base == "." {
                return;
            }
            if let Some((_, rest)) = self.path.split_once(api_base) {
                self.relative = format!("{}{}", paths.api_dir, rest);
            }
        }
    }

    /// Document attribute name: the base name without extension
    fn attribute_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }
}

/// Switches for [`build_document`]
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// Write the `= Protobuffer Declarations` header and toc
    pub header: bool,
    /// Full API documentation with services and includes
    pub api_docs: bool,
    /// Sample files, already passed through [`SampleFile::process_path`]
    pub samples: Vec<SampleFile>,
}

/// [`IncludeResolver`] backed by files next to the output
pub struct ApiIncludes<'a> {
    paths: &'a DocPaths,
    samples: &'a [SampleFile],
}

impl<'a> ApiIncludes<'a> {
    /// Resolver for the given paths and sample files
    pub fn new(paths: &'a DocPaths, samples: &'a [SampleFile]) -> Self {
        ApiIncludes { paths, samples }
    }
}

impl IncludeResolver for ApiIncludes<'_> {
    fn service_intro(&self, service: &ServiceDecl) -> Option<String> {
        self.paths
            .filepath_for(&format!("{}.adoc", service.name.to_lowercase()))
    }

    fn method_doc(&self, service: &ServiceDecl, method: &MethodDecl) -> Option<String> {
        self.paths.filepath_for(&format!(
            "{}/{}.adoc",
            service.name.to_lowercase(),
            method.name.to_lowercase()
        ))
    }

    fn message_example(&self, message: &MessageDecl) -> Option<String> {
        let sample = self.samples.iter().find(|s| s.name == MESSAGE_SAMPLES)?;
        let tag = format!("{}Message", message.name);
        let text = fs::read_to_string(&sample.path).ok()?;
        text.contains(&tag).then(|| sample.relative.clone())
    }
}

const BOOK_HEADER: &str = "
= {project-name} Documentation
:doctype: book
:toc: left
:toclevels: 3
:icons: font
{project-author} <{project-repo}>
Version {version}

:apidoc: true
:sectnums:
:sectnumlevels: 2
";

/// Build the complete document for one parsed source file
///
/// Declarations are always sorted by name, rendered with icons and the
/// inline-macro cross-reference style, and tagged for source includes.
/// Services only appear in api-docs mode.
pub fn build_document(unit: &SchemaUnit, paths: &DocPaths, options: &DocumentOptions) -> String {
    let mut unit = unit.clone();
    unit.sort_by_name();

    let render_options = RenderOptions {
        sorted: true,
        icons: true,
        xref: CrossRefStyle::InlineMacro,
        collapsible: false,
        source_file: Some(paths.source_file.clone()),
    };
    let includes = ApiIncludes::new(paths, &options.samples);
    let renderer = Renderer::new(&unit, &render_options).with_includes(&includes);

    let mut out = String::new();

    if options.api_docs {
        out.push_str(BOOK_HEADER);
        for sample in &options.samples {
            if sample.path.contains("adoc") && !sample.attribute_name().is_empty() {
                out.push_str(&format!(":{}: {}\n", sample.attribute_name(), sample.path));
            }
        }
    } else if options.header {
        out.push_str("= Protobuffer Declarations\n:toc: left\n:toclevels: 4\n");
    }

    out.push_str(":true-icon: ✅\n:false-icon: ❌\n");
    out.push_str("\n// WARNING\n// THIS FILE IS GENERATED. DO NOT EDIT.\n\n");

    if options.api_docs {
        out.push_str(&api_preface(&unit, paths));
        for service in &unit.services {
            out.push_str(&renderer.render_service(service));
        }
        if let Some(errors) = paths.filepath_for("errors.adoc") {
            out.push_str(&format!("include::{}[leveloffset=+1]\n", errors));
        }
        out.push_str("== Protobuffer Declarations\n=== Protobuf Enums\n\n:leveloffset: +2\n");
    }

    for enumeration in &unit.enums {
        out.push_str(&renderer.render_enum(enumeration));
    }

    if options.api_docs {
        out.push_str("\n:leveloffset: -2\n=== Protobuf Messages\n\n:leveloffset: +2\n");
    }

    for message in &unit.messages {
        out.push_str(&renderer.render_message(message));
    }

    if options.api_docs {
        out.push_str("\n:leveloffset: -2\n");
        out.push_str("=== Imported Protobuf Declarations\n");
        for file in imported_declarations(paths) {
            out.push_str(&format!("include::api/{}[leveloffset=+2]\n", file));
        }
    }

    debug!(
        bytes = out.len(),
        api_docs = options.api_docs,
        "built document"
    );
    out
}

/// About/examples includes, REST url attributes and `/cmd` includes
fn api_preface(unit: &SchemaUnit, paths: &DocPaths) -> String {
    let mut out = String::new();

    for page in ["about", "examples"] {
        out.push_str(&format!("// start included {}.adoc (if found)\n", page));
        if let Some(file) = paths.filepath_for(&format!("../{}.adoc", page)) {
            out.push_str(&format!("include::{}[leveloffset=+1]\n", file));
        }
        out.push_str(&format!("// end included {}.adoc\n\n", page));
    }

    out.push_str("\n// start variables for the REST API endpoints\n");
    for service in &unit.services {
        for method in &service.methods {
            if let Some(rest) = &method.rest {
                out.push_str(&format!(
                    ":{}_{}_rest: {}\n",
                    service.name, method.name, rest.url
                ));
            }
        }
    }
    out.push_str("// end variables for the REST API endpoints\n\n");

    out.push_str("// start included files from the /cmd directory (if found any)\n");
    for file in paths.files_in_dir("../cmd") {
        out.push_str(&format!("include::{}[leveloffset=+1]\n", file));
    }
    out.push_str("// end included files from the /cmd directory\n\n");

    out
}

/// `.adoc` files in the `api/` directory next to the output
fn imported_declarations(paths: &DocPaths) -> Vec<String> {
    let dir = format!("{}api", paths.destination_dir());
    let Ok(entries) = fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".adoc"))
        .collect();
    names.sort();
    names
}

/// Write the document, refusing to replace an existing file unless asked
pub fn write_output(path: &Path, content: &str, overwrite: bool) -> io::Result<()> {
    if path.exists() {
        if !overwrite {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        fs::remove_file(path)?;
    }
    fs::write(path, content)
}
