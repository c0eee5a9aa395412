use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{EditSchemaArgs, SchemasArgs, SchemasCommand};
use crate::commands::{open_registry, write_json_stdout};
use crate::registry::SchemaRegistry;
use crate::schema::{Schema, compare_schemas};
use crate::validator::validate;

pub fn run(args: SchemasArgs, data_dir: &Path) -> Result<()> {
    let mut registry = open_registry(data_dir);

    match args.command {
        SchemasCommand::List => list(&registry),
        SchemasCommand::Show { name } => show(&mut registry, &name),
        SchemasCommand::Compare { left, right } => compare(&mut registry, &left, &right),
        SchemasCommand::Edit(edit) => edit_custom(&mut registry, edit),
    }
}

fn list(registry: &SchemaRegistry) -> Result<()> {
    let names = registry.list_schema_names();
    info!(schema_dir = %registry.schema_dir().display(), count = names.len(), "listing schemas");

    let mut output = io::stdout().lock();
    for name in names {
        writeln!(output, "{name}")?;
    }
    output.flush()?;
    Ok(())
}

fn show(registry: &mut SchemaRegistry, name: &str) -> Result<()> {
    let loaded = registry.get_schema(name);
    if let Some(err) = &loaded.warning {
        warn!(requested = name, error = %err, "showing Default schema instead");
    }
    info!(schema = %loaded.name, entries = loaded.schema.len(), "showing schema");
    write_json_stdout(&loaded.schema)
}

fn compare(registry: &mut SchemaRegistry, left: &str, right: &str) -> Result<()> {
    let left_loaded = registry.get_schema(left);
    let right_loaded = registry.get_schema(right);
    let rows = compare_schemas(&left_loaded.schema, &right_loaded.schema);

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "header\t{}\t{}", left_loaded.name, right_loaded.name)?;
    for row in &rows {
        writeln!(
            output,
            "{}\t{}\t{}",
            row.header,
            row.left.as_deref().unwrap_or("-"),
            row.right.as_deref().unwrap_or("-")
        )?;
    }
    output.flush()?;

    info!(rows = rows.len(), "compared schemas");
    Ok(())
}

fn edit_custom(registry: &mut SchemaRegistry, edit: EditSchemaArgs) -> Result<()> {
    let base = registry.get_schema(&edit.base);
    if let Some(err) = &base.warning {
        warn!(requested = %edit.base, error = %err, "editing from Default schema instead");
    }

    let edited = apply_edits(base.schema, &edit.set, &edit.remove);
    registry
        .save_custom_schema(&edited)
        .context("failed to save custom schema")?;

    for finding in validate(&edited) {
        warn!(finding = %finding, "custom schema saved with validation finding");
    }
    info!(base = %base.name, entries = edited.len(), "custom schema updated");
    Ok(())
}

pub fn apply_edits(mut schema: Schema, set: &[(String, String)], remove: &[String]) -> Schema {
    for header in remove {
        if !schema.remove(header) {
            warn!(header = %header, "header not present in schema");
        }
    }
    for (header, field) in set {
        schema.set(header.as_str(), field.as_str());
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::apply_edits;
    use crate::schema::Schema;

    #[test]
    fn edits_remove_then_set_in_place() {
        let base = Schema::builtin_default();
        let edited = apply_edits(
            base,
            &[
                ("नियम".to_string(), "rule_reference".to_string()),
                ("खेवट".to_string(), "khewat_number".to_string()),
            ],
            &["खिंजरि".to_string(), "अनुपस्थित".to_string()],
        );

        assert_eq!(edited.len(), 8);
        assert_eq!(edited.field_for("खिंजरि"), None);
        assert_eq!(edited.field_for("नियम"), Some("rule_reference"));

        let keys = edited.entries().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keys[6], "नियम");
        assert_eq!(keys[7], "खेवट");
    }
}
