//! protoc-gen-proto2asciidoc - protoc plugin emitting AsciiDoc documentation
//!
//! Reads a CodeGeneratorRequest from stdin and writes a CodeGeneratorResponse
//! holding `docs.adoc` to stdout.

use prost::Message;
use std::io::{self, Read, Write};
use tracing::debug;

/// When set, the raw request is saved to `protowire` instead of processed
const WRITE_WIRE_ENV: &str = "PROTO2ASCIIDOC_WRITE_WIRE";

/// File receiving the raw request in capture mode
const WIRE_FILE: &str = "protowire";

fn main() {
    proto2asciidoc::init_logging("warn");

    if let Err(e) = run() {
        eprintln!("protoc-gen-proto2asciidoc: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;

    if std::env::var_os(WRITE_WIRE_ENV).is_some() {
        std::fs::write(WIRE_FILE, &buf)?;
        debug!(bytes = buf.len(), "captured request to {}", WIRE_FILE);
        return Ok(());
    }

    // any failure leaves stdout empty
    let response = proto2asciidoc::generate_from_bytes(&buf)?;

    for file in &response.file {
        debug!(
            name = file.name.as_deref().unwrap_or("<unnamed>"),
            bytes = file.content().len(),
            "generated file"
        );
    }

    let mut out = Vec::new();
    response.encode(&mut out)?;
    io::stdout().write_all(&out)?;

    Ok(())
}
