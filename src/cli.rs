//! CLI: schema documents for the sample registries, and polymorphic checks of
//! JSON inputs against them.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use regex::Regex;

use json_poly::records::{self, RECORD_INTERFACE};
use json_poly::{Codec, CodecConfig, CodecError, Factory, JsonValue, Limits, SchemaGenerator};

use crate::input::{Document, InputSettings};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode polymorphic JSON through discriminator registries and publish
/// self-checked schema documents for them
#[derive(Parser, Debug)]
#[command(name = "json-poly", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate schema documents (every example is round-tripped first)
    Schema(SchemaOut),
    /// decode inputs through an interface registry and report per document
    Check(CheckIn),
}

#[derive(Args, Debug, Clone)]
struct CodecSettings {
    /// maximum nesting depth accepted while decoding
    #[arg(long)]
    max_depth: Option<usize>,

    /// allow nesting up to the lenient limit
    #[arg(long, default_value_t = false, conflicts_with = "max_depth")]
    lenient: bool,

    /// member that carries the discriminator
    #[arg(long)]
    discriminator_field: Option<String>,

    /// pretty-print JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    codec: CodecSettings,

    /// only the document of this interface
    #[arg(long)]
    interface: Option<String>,

    /// keep only variants whose discriminator matches this regular expression
    #[arg(long)]
    only: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckIn {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    codec: CodecSettings,

    /// interface every document is decoded as
    #[arg(long, default_value = RECORD_INTERFACE)]
    interface: String,

    /// print the canonical re-encoding of every document that decodes
    #[arg(long, default_value_t = false)]
    canonical: bool,
}

/// Outcome of one document.
#[derive(Debug)]
struct Report {
    label: String,
    outcome: Result<JsonValue, CodecError>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CodecSettings {
    fn config(&self) -> CodecConfig {
        let limits = match (self.max_depth, self.lenient) {
            (Some(max_depth), _) => Limits { max_depth },
            (None, true) => Limits::lenient(),
            (None, false) => Limits::strict(),
        };
        let mut config = CodecConfig::default().with_limits(limits).with_pretty(self.pretty);
        if let Some(field) = self.discriminator_field.as_ref() {
            config = config.with_discriminator_field(field.clone());
        }
        config
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Schema(target) => target.run(),
            Command::Check(target) => target.run(),
        }
    }
}

impl SchemaOut {
    fn run(&self) -> Result<ExitCode> {
        let factory = records::factory(self.codec.config());
        let only = self
            .only
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("invalid --only pattern")?;

        let keep = |discriminator: &str| only.as_ref().is_none_or(|re| re.is_match(discriminator));
        let mut docs = SchemaGenerator::new(&factory).generate_matching(keep)?;
        if let Some(name) = self.interface.as_deref() {
            docs.retain(|doc| doc.title == name);
            anyhow::ensure!(!docs.is_empty(), "no registry serves interface `{name}`");
        }

        let codec = Codec::new(&factory);
        let bytes = match docs.as_slice() {
            [single] => codec.encode(single)?,
            all => codec.encode(all)?,
        };
        write_output(self.out.as_deref(), &bytes)?;
        Ok(ExitCode::SUCCESS)
    }
}

impl CheckIn {
    fn run(&self) -> Result<ExitCode> {
        let factory = records::factory(self.codec.config());
        anyhow::ensure!(
            factory.interfaces().any(|name| name == self.interface),
            "no registry serves interface `{}`",
            self.interface
        );
        let paths = self.input_settings.resolve_paths()?;

        let per_file = paths
            .par_iter()
            .map(|path| self.check_file(&factory, path))
            .collect::<Result<Vec<_>>>()?;

        let codec = Codec::new(&factory);
        let field = &factory.config().discriminator_field;
        let mut failures = 0usize;
        let mut total = 0usize;
        for report in per_file.iter().flatten() {
            total += 1;
            match &report.outcome {
                Ok(value) => {
                    let kind = value.get(field).and_then(JsonValue::as_str).unwrap_or("?");
                    println!("{} {} ({kind})", "ok".green().bold(), report.label);
                    if self.canonical {
                        let bytes = codec.encode(value)?;
                        println!("{}", String::from_utf8_lossy(&bytes));
                    }
                }
                Err(error) => {
                    failures += 1;
                    println!("{} {}: {error}", "fail".red().bold(), report.label);
                }
            }
        }

        let summary = format!("{} of {total} documents decoded", total - failures);
        if failures == 0 {
            eprintln!("{}", summary.green());
            Ok(ExitCode::SUCCESS)
        } else {
            eprintln!("{}", summary.yellow());
            Ok(ExitCode::FAILURE)
        }
    }

    fn check_file(&self, factory: &Factory, path: &Path) -> Result<Vec<Report>> {
        let codec = Codec::new(factory);
        let documents = self.input_settings.load_file(path)?;
        Ok(documents
            .into_iter()
            .map(|Document { label, bytes }| {
                let outcome = codec
                    .parse(&bytes)
                    .and_then(|value| factory.canonicalize(&self.interface, &value));
                tracing::debug!(%label, ok = outcome.is_ok(), "document checked");
                Report { label, outcome }
            })
            .collect())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{}", String::from_utf8_lossy(bytes)),
    }
    Ok(())
}
