use serde::{Deserialize, Serialize};

use crate::matcher::ColumnResolution;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    pub block_num: u32,
    pub line_num: u32,
    pub word_num: u32,
    pub text: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingCounts {
    pub row_count: usize,
    pub column_count: usize,
    pub fuzzy_columns: usize,
    pub override_columns: usize,
    pub manual_columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub region_hint: String,
    pub schema_name: String,
    pub cutoff: f64,
    pub output_path: String,
    pub output_format: String,
    pub counts: MappingCounts,
    pub columns: Vec<ColumnResolution>,
    pub warnings: Vec<String>,
}
