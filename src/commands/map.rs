use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dialoguer::Select;
use tracing::{info, warn};

use crate::cli::MapArgs;
use crate::commands::{manifest_dir, open_overrides, open_registry};
use crate::error::MappingError;
use crate::export::{SheetStyle, export_table};
use crate::matcher::{ResolutionMethod, ScriptedResolver, UnmatchedResolver};
use crate::model::{MappingCounts, MappingRunManifest};
use crate::ocr::TesseractOcr;
use crate::pipeline::{MappingOutcome, MappingRequest, map_document};
use crate::tokenizer::{default_headers, tokenize};
use crate::util::{now_utc_string, replace_file, sha256_hex, utc_compact_string, write_json_pretty};

pub fn run(args: MapArgs, data_dir: &Path) -> Result<()> {
    let (source_path, source_bytes, raw_text) = read_source(&args)?;

    let headers = if args.headers.is_empty() {
        default_headers()
    } else {
        args.headers.clone()
    };
    let table = tokenize(&raw_text, &headers);
    info!(
        source = %source_path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "tokenized document"
    );

    let mut registry = open_registry(data_dir);
    let overrides = open_overrides(data_dir)?;

    let mut resolver: Box<dyn UnmatchedResolver> = if args.non_interactive {
        Box::new(ScriptedResolver::new(args.assignments.clone()))
    } else {
        Box::new(PromptResolver::new(args.assignments.clone()))
    };

    let outcome = map_document(
        MappingRequest {
            raw_text: &raw_text,
            table,
            schema_name: args.schema.as_deref(),
            cutoff: args.cutoff,
        },
        &mut registry,
        &overrides,
        resolver.as_mut(),
    )
    .with_context(|| format!("failed to map {}", source_path.display()))?;

    for warning in &outcome.warnings {
        warn!(warning = %warning, "mapping warning");
    }

    let style = SheetStyle {
        font_name: args.font_name.clone(),
        font_size: args.font_size,
        ..SheetStyle::default()
    };
    let bytes = export_table(&outcome.table, args.format, &style)?;
    replace_file(&args.output, &bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        format = args.format.as_str(),
        rows = outcome.table.rows.len(),
        "wrote mapped table"
    );

    if args.no_manifest {
        return Ok(());
    }

    let run_id = run_id_for(Utc::now(), &source_bytes);
    let manifest = build_manifest(&run_id, &args, &source_path, &source_bytes, &outcome);
    let manifest_path = manifest_dir(data_dir).join(format!("mapping_run_{run_id}.json"));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), run_id = %run_id, "wrote mapping manifest");

    Ok(())
}

fn read_source(args: &MapArgs) -> Result<(PathBuf, Vec<u8>, String)> {
    if let Some(input) = &args.input {
        let bytes = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
        let text = String::from_utf8(bytes.clone())
            .with_context(|| format!("{} is not valid UTF-8", input.display()))?;
        return Ok((input.clone(), bytes, text));
    }

    let image = args
        .image
        .as_ref()
        .context("either --input or --image is required")?;
    let bytes = fs::read(image).with_context(|| format!("failed to read {}", image.display()))?;
    let ocr = TesseractOcr {
        lang: args.lang.clone(),
        timeout: Duration::from_secs(args.ocr_timeout_secs),
        ..TesseractOcr::default()
    };
    let text = ocr.extract_text(image)?;
    Ok((image.clone(), bytes, text))
}

fn build_manifest(
    run_id: &str,
    args: &MapArgs,
    source_path: &Path,
    source_bytes: &[u8],
    outcome: &MappingOutcome,
) -> MappingRunManifest {
    let count_method = |method: ResolutionMethod| {
        outcome
            .mapping
            .columns
            .iter()
            .filter(|column| column.method == method)
            .count()
    };

    MappingRunManifest {
        manifest_version: 1,
        run_id: run_id.to_string(),
        generated_at: now_utc_string(),
        source_path: source_path.display().to_string(),
        source_sha256: sha256_hex(source_bytes),
        region_hint: outcome.region.as_str().to_string(),
        schema_name: outcome.schema_name.clone(),
        cutoff: args.cutoff,
        output_path: args.output.display().to_string(),
        output_format: args.format.as_str().to_string(),
        counts: MappingCounts {
            row_count: outcome.table.rows.len(),
            column_count: outcome.table.headers.len(),
            fuzzy_columns: count_method(ResolutionMethod::Fuzzy),
            override_columns: count_method(ResolutionMethod::Override),
            manual_columns: count_method(ResolutionMethod::Manual),
        },
        columns: outcome.mapping.columns.clone(),
        warnings: outcome.warnings.clone(),
    }
}

pub struct PromptResolver {
    preset: BTreeMap<String, String>,
}

impl PromptResolver {
    pub fn new(preset: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            preset: preset.into_iter().collect(),
        }
    }
}

impl UnmatchedResolver for PromptResolver {
    fn resolve_unmatched(
        &mut self,
        header: &str,
        candidates: &[String],
    ) -> Result<String, MappingError> {
        if let Some(choice) = self.preset.get(header) {
            return Ok(choice.clone());
        }

        let unresolved = |reason: String| MappingError::Unresolved {
            header: header.to_string(),
            reason,
        };

        if candidates.is_empty() {
            return Err(unresolved("schema has no canonical fields".to_string()));
        }

        let index = Select::new()
            .with_prompt(format!("No confident match for header '{header}'. Choose a field"))
            .items(candidates)
            .default(0)
            .interact()
            .map_err(|err| unresolved(format!("prompt failed: {err}")))?;

        candidates
            .get(index)
            .cloned()
            .ok_or_else(|| unresolved(format!("selection {index} is out of range")))
    }
}

pub fn run_id_for(now: DateTime<Utc>, source_bytes: &[u8]) -> String {
    let digest = sha256_hex(source_bytes);
    format!(
        "map-{}-{}-{}",
        utc_compact_string(now),
        now.format("%3f"),
        &digest[..8]
    )
}
