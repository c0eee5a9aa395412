use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::OcrArgs;
use crate::commands::write_json_stdout;
use crate::ocr::TesseractOcr;
use crate::util::{replace_file, write_json_pretty};

pub fn run(args: OcrArgs) -> Result<()> {
    let ocr = TesseractOcr {
        lang: args.lang,
        timeout: Duration::from_secs(args.ocr_timeout_secs),
        ..TesseractOcr::default()
    };

    if args.tsv {
        let tokens = ocr.extract_tokens(&args.image)?;
        return match &args.output {
            Some(path) => {
                write_json_pretty(path, &tokens)?;
                info!(path = %path.display(), tokens = tokens.len(), "wrote ocr tokens");
                Ok(())
            }
            None => write_json_stdout(&tokens),
        };
    }

    let text = ocr.extract_text(&args.image)?;
    match &args.output {
        Some(path) => {
            replace_file(path, format!("{text}\n").as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote ocr text");
        }
        None => {
            let mut output = io::stdout().lock();
            writeln!(output, "{text}")?;
            output.flush()?;
        }
    }

    Ok(())
}
