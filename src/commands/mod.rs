pub mod map;
pub mod ocr;
pub mod overrides;
pub mod region;
pub mod schemas;
pub mod tokenize;
pub mod validate;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::registry::SchemaRegistry;
use crate::store::{JsonFileStore, ManualOverrideStore};

pub const OVERRIDES_FILE: &str = "saved_mappings.json";

pub fn schema_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("schemas")
}

pub fn manifest_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("manifests")
}

pub fn open_registry(data_dir: &Path) -> SchemaRegistry {
    SchemaRegistry::open(schema_dir(data_dir))
}

pub fn open_overrides(data_dir: &Path) -> Result<ManualOverrideStore> {
    let store = JsonFileStore::new(data_dir.join(OVERRIDES_FILE));
    let path = store.path().to_path_buf();
    let overrides = ManualOverrideStore::load(Box::new(store))
        .with_context(|| format!("failed to load manual overrides from {}", path.display()))?;
    debug!(path = %path.display(), entries = overrides.len(), "loaded manual overrides");
    Ok(overrides)
}

pub fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}
