//! proto2asciidoc CLI
//!
//! Parses one `.proto` source file and writes an AsciiDoc document to a file
//! or stdout.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use proto2asciidoc::docs::{build_document, write_output, DocPaths, DocumentOptions, SampleFile};
use proto2asciidoc::source::parse_proto_file;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// Exit status for usage errors, help output and missing input
const EXIT_USAGE: u8 = 100;

#[derive(Parser)]
#[command(name = "proto2asciidoc")]
#[command(version, about = "Generate AsciiDoc documentation from a .proto file", long_about = None)]
#[command(after_help = "API DOCS:\n  \
    With --api-docs, files next to the output are included when present.\n  \
    For service Foo with endpoint Do() and --api-dir ../api:\n\n    \
    docs/api/foo.adoc        service intro\n    \
    docs/api/foo/do.adoc     endpoint documentation\n    \
    docs/cmd/*.adoc          command documentation\n    \
    docs/about.adoc          about page\n    \
    docs/examples.adoc       examples page\n    \
    docs/api/errors.adoc     error reference")]
struct Cli {
    /// Source .proto file; an absolute path is recommended
    #[arg(long)]
    source: Option<PathBuf>,

    /// File to write to; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(short = 'f', long)]
    overwrite: bool,

    /// Do not write a document header and table of contents
    #[arg(long)]
    no_header: bool,

    /// Generate full API documentation including services and hand-written files
    #[arg(long)]
    api_docs: bool,

    /// Comma-separated sample files; api/foo_samples.adoc becomes :foo_samples:
    #[arg(long, value_delimiter = ',')]
    sample_files: Vec<String>,

    /// Path from the output's directory to the api dir
    #[arg(long, default_value = "../api")]
    api_dir: String,

    /// Log pipeline steps to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    // --help and --version end here too, with the usage status
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    proto2asciidoc::init_logging(if cli.verbose { "debug" } else { "warn" });

    let Some(source) = cli.source.clone() else {
        eprintln!("{} --source must be set\n", "error:".red().bold());
        let _ = Cli::command().write_help(&mut std::io::stderr());
        return ExitCode::from(EXIT_USAGE);
    };

    match run(&cli, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, source: &Path) -> Result<()> {
    let unit = parse_proto_file(source)
        .with_context(|| format!("Could not parse {}", source.display()))?;

    let paths = DocPaths {
        source_file: source.display().to_string(),
        destination: cli
            .out
            .as_ref()
            .map(|out| out.display().to_string())
            .unwrap_or_default(),
        api_dir: cli.api_dir.clone(),
    };

    let samples = if cli.api_docs {
        cli.sample_files
            .iter()
            .map(|path| {
                let mut sample = SampleFile::new(path);
                sample.process_path(&paths);
                sample
            })
            .collect()
    } else {
        Vec::new()
    };

    let options = DocumentOptions {
        header: !cli.no_header,
        api_docs: cli.api_docs,
        samples,
    };

    let document = build_document(&unit, &paths, &options);

    match &cli.out {
        Some(out) => {
            write_output(out, &document, cli.overwrite)
                .with_context(|| format!("Could not write {}", out.display()))?;
            debug!(out = %out.display(), "wrote document");
        }
        None => println!("{}", document),
    }

    Ok(())
}
