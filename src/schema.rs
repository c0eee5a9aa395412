use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SCHEMA_NAME: &str = "Default";
pub const CUSTOM_SCHEMA_NAME: &str = "Custom";

const DEFAULT_ENTRIES: [(&str, &str); 8] = [
    ("खाता संख्या", "account_number"),
    ("खसरा नंबर", "plot_number"),
    ("साङ्गीदार का नाम", "owner_name"),
    ("रकबा", "area"),
    ("अभिलेख में दुरुस्ती का लेखा", "correction_note"),
    ("शेरक्षर खसरा नाम भूमि", "land_type"),
    ("खिंजरि", "category"),
    ("नियम", "rule"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    entries: Map<String, Value>,
}

impl Schema {
    pub fn builtin_default() -> Self {
        Self::from_pairs(DEFAULT_ENTRIES)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), Value::String(value.into())))
            .collect();
        Self { entries }
    }

    pub fn from_json_object(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn string_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|field| (key.as_str(), field)))
    }

    #[cfg(test)]
    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.entries.get(header).and_then(Value::as_str)
    }

    pub fn canonical_fields(&self) -> Vec<String> {
        let mut fields = Vec::<String>::new();
        for (_, field) in self.string_entries() {
            if !fields.iter().any(|existing| existing == field) {
                fields.push(field.to_string());
            }
        }
        fields
    }

    pub fn set(&mut self, header: impl Into<String>, field: impl Into<String>) {
        self.entries
            .insert(header.into(), Value::String(field.into()));
    }

    pub fn remove(&mut self, header: &str) -> bool {
        self.entries.shift_remove(header).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaComparisonRow {
    pub header: String,
    pub left: Option<String>,
    pub right: Option<String>,
}

pub fn compare_schemas(left: &Schema, right: &Schema) -> Vec<SchemaComparisonRow> {
    let mut headers = left
        .entries()
        .chain(right.entries())
        .map(|(key, _)| key.to_string())
        .collect::<Vec<_>>();
    headers.sort();
    headers.dedup();

    headers
        .into_iter()
        .map(|header| SchemaComparisonRow {
            left: left.entries.get(&header).map(render_value),
            right: right.entries.get(&header).map(render_value),
            header,
        })
        .collect()
}

pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
