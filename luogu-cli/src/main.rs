use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use luogu_common::observability::{LogConfig, init_logging};
use luogu_config::{ExtractorConfig, ExtractorConfigLoader, default_config_path};
use luogu_extract::{RawResponse, ResponseClassifier, ResponseKind, normalize_author};
use serde_json::Value;

/// Normalize a saved Luogu response into an article, paste, judgement log
/// or user profile record and print it as JSON.
#[derive(Debug, Parser)]
#[command(name = "luogu-normalize", version)]
struct Cli {
    /// article, paste, judgement-log or user-profile (legacy codes 0/1/3/4 work too)
    #[arg(short, long, env = "LUOGU_KIND")]
    kind: ResponseKind,

    /// Response body to read; stdin when omitted
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Extractor config file; defaults to <config dir>/luogu/luogu.yaml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How to interpret the body before extraction
    #[arg(long, value_enum, default_value = "auto")]
    format: BodyFormat,

    /// Print the normalized author of the extracted record instead
    #[arg(long)]
    author: bool,

    /// Debug logging duplicated to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BodyFormat {
    /// Decode as JSON when possible, keep as text otherwise
    Auto,
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_logging(LogConfig {
        app_name: "luogu-normalize",
        log_dir: config.logging.dir.clone(),
        emit_stderr: cli.verbose || config.logging.emit_stderr,
        format: config.logging.format,
        default_filter: if cli.verbose {
            "debug".to_string()
        } else {
            config.logging.filter.clone()
        },
    })?;

    let body = read_body(cli.input.as_ref())?;
    let response = build_response(&body, cli.format)?;
    tracing::info!(kind = %cli.kind, bytes = body.len(), "normalizing response");

    let classifier = ResponseClassifier::new(config);
    let extracted = classifier.normalize(&response, cli.kind)?;
    let output = render(extracted.into_value(), cli.author)?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ExtractorConfig> {
    let mut loader = ExtractorConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    } else if let Some(path) = default_config_path() {
        loader = loader.with_optional_file(path);
    }
    loader.load().context("failed to load extractor configuration")
}

fn read_body(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read stdin")?;
            Ok(body)
        }
    }
}

fn build_response(body: &str, format: BodyFormat) -> Result<RawResponse> {
    Ok(match format {
        BodyFormat::Auto => RawResponse::sniff(body),
        BodyFormat::Text => RawResponse::from_text(body),
        BodyFormat::Json => {
            RawResponse::from_json(serde_json::from_str(body).context("body is not valid JSON")?)
        }
    })
}

fn render(extracted: Option<Value>, author: bool) -> Result<Value> {
    if author {
        return Ok(serde_json::to_value(normalize_author(extracted.as_ref()))?);
    }
    Ok(extracted.unwrap_or(Value::Null))
}
