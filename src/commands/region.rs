use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RegionArgs;
use crate::region::detect_region;

pub fn run(args: RegionArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let region = detect_region(&raw);
    info!(input = %args.input.display(), region = %region, "region hint detected");

    let mut output = io::stdout().lock();
    writeln!(output, "{region}")?;
    output.flush()?;
    Ok(())
}
