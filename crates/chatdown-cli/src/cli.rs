//! Command-line interface.
//!
//! Reads a page snapshot (HTML, or a CDP node tree as JSON) from a file or
//! stdin, exports it and writes the Markdown, or the JSON response with
//! `--json`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatdown::{
    document_title, parse_document, suggested_filename, ExportRequest, ExportResponse, Exporter,
    Node, SelectorCatalog,
};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Export a Google AI Mode conversation snapshot to Markdown
#[derive(Parser)]
#[command(name = "chatdown")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Page snapshot to read, or `-` for stdin
    input: PathBuf,

    /// Snapshot format; inferred from the file extension when omitted
    #[arg(short = 'f', long, value_enum)]
    input_format: Option<InputFormat>,

    /// Selector catalog (TOML) replacing the built-in one
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Document title; defaults to the page's <title>
    #[arg(short, long)]
    title: Option<String>,

    /// Write the Markdown to this file instead of stdout
    #[arg(short, long, value_name = "PATH", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write the Markdown into this directory, named after the title
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Print the JSON export response instead of Markdown
    #[arg(long, conflicts_with_all = ["output", "output_dir"])]
    json: bool,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// HTML document, e.g. a saved page
    Html,
    /// CDP `DOM.getDocument` result or a bare node
    CdpJson,
}

/// `DOM.getDocument` wraps the tree in `{"root": ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum CdpSnapshot {
    Document { root: Node },
    Node(Node),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();

    let exporter = match &cli.catalog {
        Some(path) => Exporter::with_catalog(
            SelectorCatalog::from_path(path)
                .with_context(|| format!("Failed to load selector catalog {}", path.display()))?,
        ),
        None => Exporter::new(),
    };

    let source = read_input(&cli.input)?;
    let format = cli
        .input_format
        .unwrap_or_else(|| infer_format(&cli.input));
    let document = load_document(&source, format)?;
    debug!(?format, bytes = source.len(), "loaded snapshot");

    let title = cli.title.clone().or_else(|| document_title(&document));
    let response = exporter.handle(&ExportRequest::ExportToMarkdown, &document, title.as_deref());

    if cli.json {
        let json = serde_json::to_string_pretty(&response)?;
        writeln!(io::stdout(), "{json}")?;
    }

    let markdown = match response {
        ExportResponse::Success { markdown, .. } => markdown,
        ExportResponse::Failure { error } => anyhow::bail!(error),
    };
    if cli.json {
        return Ok(());
    }

    let target = match (&cli.output, &cli.output_dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => Some(dir.join(suggested_filename(title.as_deref()))),
        (None, None) => None,
    };
    match target {
        Some(path) => {
            fs::write(&path, format!("{markdown}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote export");
        }
        None => writeln!(io::stdout(), "{markdown}")?,
    }
    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read snapshot from stdin")?;
        return Ok(source);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn infer_format(input: &Path) -> InputFormat {
    match input.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::CdpJson,
        _ => InputFormat::Html,
    }
}

fn load_document(source: &str, format: InputFormat) -> Result<Node> {
    Ok(match format {
        InputFormat::Html => parse_document(source),
        InputFormat::CdpJson => {
            match serde_json::from_str(source).context("Invalid CDP node tree")? {
                CdpSnapshot::Document { root } => root,
                CdpSnapshot::Node(node) => node,
            }
        }
    })
}
