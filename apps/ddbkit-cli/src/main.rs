//! ddbkit - compile single-table descriptors into store expressions.
//!
//! Reads one JSON request and prints the expressions and placeholder tables
//! the repository layer would send to the store. Nothing is sent anywhere.
//!
//! # Usage
//!
//! ```text
//! ddbkit request.json
//! echo '{"key": {"PK": "USER#1", "SK": "ORDER#"}}' | ddbkit
//! ```
//!
//! The request may contain any of `key`, `filter`, `projection` and
//! `update`. Filter and projection extend the key condition's placeholder
//! table, as they would in a query.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ddbkit_core::expression::{
    CompiledExpression, FilterPredicate, Key, PlaceholderTable, UpdateSpec, compile_filter,
    compile_key_condition, compile_projection, compile_update,
};

const USAGE: &str = "usage: ddbkit [FILE]\n\nReads a JSON request from FILE or stdin.";

/// Descriptors to compile.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CompileRequest {
    #[serde(default)]
    key: Option<Key>,
    #[serde(default)]
    filter: Vec<FilterPredicate>,
    #[serde(default)]
    projection: Vec<String>,
    #[serde(default)]
    update: Option<UpdateSpec>,
}

/// Compiled output, one section per requested descriptor.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompileReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    key_condition: Option<CompiledExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<CompiledExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    projection: Option<CompiledExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<CompiledExpression>,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`.
fn init_tracing() -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
        EnvFilter::try_new(&log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

fn read_request(path: Option<&str>) -> Result<CompileRequest> {
    let raw = match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("invalid request")
}

fn compile(request: CompileRequest) -> Result<CompileReport> {
    let mut report = CompileReport::default();
    let mut placeholders = PlaceholderTable::new();

    if let Some(key) = &request.key {
        let compiled = compile_key_condition(key).context("failed to compile key")?;
        placeholders = compiled.placeholders.clone();
        report.key_condition = Some(compiled);
    }

    if !request.filter.is_empty() {
        let compiled =
            compile_filter(&request.filter, placeholders).context("failed to compile filter")?;
        placeholders = compiled.placeholders.clone();
        report.filter = Some(compiled);
    }

    if !request.projection.is_empty() {
        report.projection = Some(compile_projection(&request.projection, placeholders));
    }

    if let Some(spec) = request.update {
        report.update = Some(compile_update(spec));
    }

    Ok(report)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }
    if args.len() > 1 {
        anyhow::bail!("{USAGE}");
    }

    init_tracing()?;

    let path = args.first().map(String::as_str);
    debug!(source = path.unwrap_or("stdin"), "Reading request");
    let request = read_request(path)?;
    let report = compile(request)?;

    let sections = [
        report.key_condition.is_some(),
        report.filter.is_some(),
        report.projection.is_some(),
        report.update.is_some(),
    ];
    info!(
        sections = sections.iter().filter(|s| **s).count(),
        "Compiled request"
    );

    let output = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    println!("{output}");
    Ok(())
}
