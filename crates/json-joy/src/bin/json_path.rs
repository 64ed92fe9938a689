//! `json-path` — a small `jq`-like CLI for running a JSONPath expression
//! against a JSON document read from stdin (or `--file`).
//!
//! Usage:
//!   json-path '$.store.book[*].title'
//!   json-path --file doc.json --first '$.store.book[0]'
//!   json-path --validate '$.a..b[?(@.c > 1)]'

use anyhow::{bail, Context, Result};
use clap::Parser;
use json_joy::{serialize, JsonFilter, JsonPath, QueryOptions, SerializeOptions};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "json-path", about = "Run a JSONPath expression against a JSON document")]
struct Cli {
    /// JSONPath expression, e.g. `$.store.book[*].title`.
    expression: String,

    /// Read the document from this file instead of stdin.
    #[arg(long)]
    file: Option<String>,

    /// Only print the first match.
    #[arg(long)]
    first: bool,

    /// Cap the number of results returned.
    #[arg(long, default_value_t = 0)]
    max_results: usize,

    /// Validate the expression's syntax and exit, without reading any document.
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.validate {
        if JsonPath::is_valid_expression(&cli.expression) {
            println!("valid");
            return Ok(());
        }
        bail!("invalid JSONPath expression");
    }

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let doc = json_joy::parse(&input).map_err(|e| anyhow::anyhow!("{e}"))?;

    if cli.first {
        match JsonFilter::select_first(&doc, &cli.expression) {
            Some(value) => println!("{}", serialize(&value, SerializeOptions::default())),
            None => eprintln!("no match"),
        }
        return Ok(());
    }

    let options = QueryOptions { max_results: cli.max_results, stop_on_first_match: false };
    for m in JsonFilter::query(&doc, &cli.expression, options) {
        println!("{}\t{}", m.path, serialize(&m.value, SerializeOptions::default()));
    }
    Ok(())
}
