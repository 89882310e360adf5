//! protoc-gen-template - a protoc plugin rendering Handlebars templates
//!
//! This binary reads a CodeGeneratorRequest from stdin and writes a
//! CodeGeneratorResponse to stdout, following the protoc plugin protocol.

use prost::Message;
use std::io::{self, Read, Write};

fn main() {
    protoc_gen_template::logging::init();

    if let Err(e) = run() {
        eprintln!("protoc-gen-template: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;

    // Any failure aborts before a response is written
    let response = protoc_gen_template::generate_from_bytes(&buf)?;
    tracing::debug!(files = response.file.len(), "writing response");
    for f in &response.file {
        tracing::debug!(name = f.name.as_deref().unwrap_or("<unnamed>"), "generated");
    }

    let mut out = Vec::new();
    response.encode(&mut out)?;
    io::stdout().write_all(&out)?;

    Ok(())
}
