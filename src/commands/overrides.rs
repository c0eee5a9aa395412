use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{OverridesArgs, OverridesCommand};
use crate::commands::{open_overrides, open_registry};
use crate::registry::SchemaRegistry;
use crate::store::ManualOverrideStore;

pub fn run(args: OverridesArgs, data_dir: &Path) -> Result<()> {
    let overrides = open_overrides(data_dir)?;

    match args.command {
        OverridesCommand::List => {
            let entries = overrides.snapshot();
            let mut output = io::BufWriter::new(io::stdout().lock());
            for (header, field) in &entries {
                writeln!(output, "{header}\t{field}")?;
            }
            output.flush()?;
            info!(count = entries.len(), "listed manual overrides");
        }
        OverridesCommand::Set {
            header,
            field,
            schema,
        } => {
            let mut registry = open_registry(data_dir);
            set_override(&mut registry, &overrides, &schema, &header, &field)?;
        }
    }

    Ok(())
}

pub fn set_override(
    registry: &mut SchemaRegistry,
    overrides: &ManualOverrideStore,
    schema_name: &str,
    header: &str,
    field: &str,
) -> Result<()> {
    let header = header.trim();
    let field = field.trim();

    let loaded = registry.get_schema(schema_name);
    if let Some(err) = &loaded.warning {
        warn!(schema = schema_name, error = %err, "checking override against default schema");
    }

    let allowed = loaded.schema.canonical_fields();
    if !allowed.iter().any(|candidate| candidate == field) {
        bail!(
            "'{field}' is not a canonical field of the {} schema; expected one of: {}",
            loaded.name,
            allowed.join(", ")
        );
    }

    overrides
        .record(header, field)
        .with_context(|| format!("failed to save override for '{header}'"))?;
    info!(header, field, schema = %loaded.name, "manual override saved");
    Ok(())
}
