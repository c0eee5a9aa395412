use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::MappingError;
use crate::matcher::{ColumnMapping, UnmatchedResolver, resolve_columns};
use crate::model::{MappedTable, RawTable};
use crate::region::{Region, detect_region};
use crate::registry::SchemaRegistry;
use crate::store::ManualOverrideStore;
use crate::validator::ensure_valid;

pub fn build_mapped_table(table: RawTable, resolutions: &BTreeMap<String, String>) -> MappedTable {
    let headers = table
        .headers
        .into_iter()
        .map(|header| resolutions.get(&header).cloned().unwrap_or(header))
        .collect();

    MappedTable {
        headers,
        rows: table.rows,
    }
}

#[derive(Debug)]
pub struct MappingRequest<'a> {
    pub raw_text: &'a str,
    pub table: RawTable,
    pub schema_name: Option<&'a str>,
    pub cutoff: f64,
}

#[derive(Debug)]
pub struct MappingOutcome {
    pub region: Region,
    pub schema_name: String,
    pub table: MappedTable,
    pub mapping: ColumnMapping,
    pub warnings: Vec<String>,
}

pub fn map_document(
    request: MappingRequest<'_>,
    registry: &mut SchemaRegistry,
    overrides: &ManualOverrideStore,
    resolver: &mut dyn UnmatchedResolver,
) -> Result<MappingOutcome, MappingError> {
    let region = detect_region(request.raw_text);
    let requested = request.schema_name.unwrap_or(region.as_str());
    info!(region = %region, schema = requested, "selecting schema");

    let mut warnings = Vec::new();
    let loaded = registry.get_schema(requested);
    if let Some(err) = &loaded.warning {
        warnings.push(format!("schema '{requested}' unavailable, using Default: {err}"));
    }

    ensure_valid(&loaded.name, &loaded.schema)?;

    let mapping = resolve_columns(
        &request.table.headers,
        &loaded.schema,
        overrides,
        request.cutoff,
        resolver,
    )?;
    for err in &mapping.persistence_failures {
        warnings.push(format!(
            "manual mapping was applied but not saved for future documents: {err}"
        ));
    }

    let table = build_mapped_table(request.table, &mapping.resolutions());
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "mapping finished with warnings");
    }

    Ok(MappingOutcome {
        region,
        schema_name: loaded.name,
        table,
        mapping,
        warnings,
    })
}
