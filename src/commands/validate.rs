use std::io::{self, Write};
use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::ValidateArgs;
use crate::commands::open_registry;
use crate::error::ValidationError;
use crate::registry::SchemaRegistry;
use crate::schema::CUSTOM_SCHEMA_NAME;
use crate::validator::validate;

#[derive(Debug)]
pub struct SchemaReport {
    pub name: String,
    pub load_warning: Option<String>,
    pub findings: Vec<ValidationError>,
    pub is_empty_schema: bool,
}

impl SchemaReport {
    pub fn is_valid(&self) -> bool {
        self.load_warning.is_none() && self.findings.is_empty()
    }
}

pub fn run(args: ValidateArgs, data_dir: &Path) -> Result<()> {
    let mut registry = open_registry(data_dir);
    let explicit = args.schema.is_some();
    let names = match &args.schema {
        Some(name) => vec![name.clone()],
        None => registry.list_schema_names(),
    };

    let mut reports = check_schemas(&mut registry, &names);
    if !explicit {
        // Custom is empty until first saved.
        reports.retain(|report| !(report.name == CUSTOM_SCHEMA_NAME && report.is_empty_schema));
    }

    let mut output = io::stdout().lock();
    for report in &reports {
        if let Some(warning) = &report.load_warning {
            writeln!(output, "{}: unavailable ({warning})", report.name)?;
        } else if report.findings.is_empty() {
            writeln!(output, "{}: ok", report.name)?;
        } else {
            writeln!(output, "{}: {} finding(s)", report.name, report.findings.len())?;
            for finding in &report.findings {
                writeln!(output, "\t{finding}")?;
            }
        }
    }
    output.flush()?;

    let failed = reports
        .iter()
        .filter(|report| {
            if explicit {
                !report.is_valid()
            } else {
                !report.findings.is_empty()
            }
        })
        .count();
    if failed > 0 {
        bail!("{failed} of {} schema(s) failed validation", reports.len());
    }

    info!(schemas = reports.len(), "all schemas valid");
    Ok(())
}

pub fn check_schemas(registry: &mut SchemaRegistry, names: &[String]) -> Vec<SchemaReport> {
    names
        .iter()
        .map(|name| {
            let loaded = registry.get_schema(name);
            if let Some(err) = loaded.warning {
                return SchemaReport {
                    name: name.clone(),
                    load_warning: Some(err.to_string()),
                    findings: Vec::new(),
                    is_empty_schema: false,
                };
            }

            let findings = validate(&loaded.schema);
            if !findings.is_empty() {
                warn!(schema = %loaded.name, findings = findings.len(), "schema failed validation");
            }
            SchemaReport {
                is_empty_schema: loaded.schema.is_empty(),
                name: loaded.name,
                load_warning: None,
                findings,
            }
        })
        .collect()
}
