use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::TokenizeArgs;
use crate::commands::write_json_stdout;
use crate::tokenizer::{
    default_headers, parse_tesseract_tsv, positional_headers, tokenize, tokenize_blocks,
};

pub fn run(args: TokenizeArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let headers = match args.positional {
        Some(width) => positional_headers(width),
        None if args.headers.is_empty() => default_headers(),
        None => args.headers,
    };

    let table = if args.tsv {
        let tokens = parse_tesseract_tsv(&raw)
            .with_context(|| format!("failed to parse {}", args.input.display()))?;
        tokenize_blocks(&tokens, &headers)
    } else {
        tokenize(&raw, &headers)
    };

    info!(
        input = %args.input.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "tokenized document"
    );

    write_json_stdout(&table)
}
