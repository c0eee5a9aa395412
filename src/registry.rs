use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PersistenceError, SchemaLoadError};
use crate::schema::{CUSTOM_SCHEMA_NAME, DEFAULT_SCHEMA_NAME, Schema};
use crate::store::{DocumentStore, JsonFileStore};

pub const CUSTOM_SCHEMA_FILE: &str = "custom_schema.json";

const REGIONAL_VARIANTS: [&str; 2] = ["Punjab", "Haryana"];

#[derive(Debug)]
pub struct LoadedSchema {
    pub name: String,
    pub schema: Schema,
    pub warning: Option<SchemaLoadError>,
}

pub struct SchemaRegistry {
    schema_dir: PathBuf,
    custom_store: Box<dyn DocumentStore>,
    cache: HashMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn open(schema_dir: impl Into<PathBuf>) -> Self {
        let schema_dir = schema_dir.into();
        let custom_store = JsonFileStore::new(schema_dir.join(CUSTOM_SCHEMA_FILE));
        Self::with_custom_store(schema_dir, Box::new(custom_store))
    }

    pub fn with_custom_store(
        schema_dir: impl Into<PathBuf>,
        custom_store: Box<dyn DocumentStore>,
    ) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            custom_store,
            cache: HashMap::new(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    pub fn list_schema_names(&self) -> Vec<String> {
        let mut names = vec![DEFAULT_SCHEMA_NAME.to_string()];
        names.extend(REGIONAL_VARIANTS.iter().map(|name| (*name).to_string()));

        let mut discovered = discover_variant_names(&self.schema_dir);
        discovered.retain(|name| !names.iter().any(|known| known.eq_ignore_ascii_case(name)));
        discovered.sort();
        names.extend(discovered);

        names.push(CUSTOM_SCHEMA_NAME.to_string());
        names
    }

    pub fn canonical_name(&self, requested: &str) -> Option<String> {
        let requested = requested.trim();
        self.list_schema_names()
            .into_iter()
            .find(|name| name.eq_ignore_ascii_case(requested))
    }

    pub fn get_schema(&mut self, requested: &str) -> LoadedSchema {
        let Some(name) = self.canonical_name(requested) else {
            return fallback(requested, SchemaLoadError::Unknown(requested.to_string()));
        };

        if name == DEFAULT_SCHEMA_NAME {
            return LoadedSchema {
                name,
                schema: Schema::builtin_default(),
                warning: None,
            };
        }

        if let Some(schema) = self.cache.get(&name) {
            debug!(schema = %name, "schema served from cache");
            return LoadedSchema {
                name,
                schema: schema.clone(),
                warning: None,
            };
        }

        let loaded = if name == CUSTOM_SCHEMA_NAME {
            self.load_custom()
        } else {
            load_variant_file(&name, &self.variant_path(&name))
        };

        match loaded {
            Ok(schema) => {
                info!(schema = %name, entries = schema.len(), "loaded schema");
                self.cache.insert(name.clone(), schema.clone());
                LoadedSchema {
                    name,
                    schema,
                    warning: None,
                }
            }
            Err(err) => fallback(&name, err),
        }
    }

    pub fn save_custom_schema(&mut self, schema: &Schema) -> Result<(), PersistenceError> {
        let document =
            serde_json::to_string_pretty(schema).map_err(|source| PersistenceError::Serialize {
                store: self.custom_store.name().to_string(),
                source,
            })?;
        self.custom_store.write_all(&document)?;
        self.cache
            .insert(CUSTOM_SCHEMA_NAME.to_string(), schema.clone());

        info!(entries = schema.len(), "saved custom schema");
        Ok(())
    }

    fn variant_path(&self, name: &str) -> PathBuf {
        let stem = name.trim().to_lowercase().replace(' ', "_");
        self.schema_dir.join(format!("{stem}_schema.json"))
    }

    fn load_custom(&self) -> Result<Schema, SchemaLoadError> {
        let source = |source: PersistenceError| SchemaLoadError::Store {
            name: CUSTOM_SCHEMA_NAME.to_string(),
            source,
        };
        match self.custom_store.read_all().map_err(source)? {
            Some(raw) if !raw.trim().is_empty() => {
                let path = self.schema_dir.join(CUSTOM_SCHEMA_FILE);
                parse_schema_document(CUSTOM_SCHEMA_NAME, &path, &raw)
            }
            _ => Ok(Schema::default()),
        }
    }
}

fn fallback(name: &str, err: SchemaLoadError) -> LoadedSchema {
    warn!(schema = %name, error = %err, "falling back to default schema");
    LoadedSchema {
        name: DEFAULT_SCHEMA_NAME.to_string(),
        schema: Schema::builtin_default(),
        warning: Some(err),
    }
}

fn load_variant_file(name: &str, path: &Path) -> Result<Schema, SchemaLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| SchemaLoadError::Read {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema_document(name, path, &raw)
}

pub fn parse_schema_document(name: &str, path: &Path, raw: &str) -> Result<Schema, SchemaLoadError> {
    let value = serde_json::from_str::<Value>(raw).map_err(|source| SchemaLoadError::Parse {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(entries) => Ok(Schema::from_json_object(entries)),
        _ => Err(SchemaLoadError::NotAnObject {
            name: name.to_string(),
            path: path.to_path_buf(),
        }),
    }
}

fn discover_variant_names(schema_dir: &Path) -> Vec<String> {
    let Ok(pattern) = Regex::new(r"^([a-z0-9]+(?:_[a-z0-9]+)*)_schema\.json$") else {
        return Vec::new();
    };
    let Ok(entries) = fs::read_dir(schema_dir) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().to_str().map(ToOwned::to_owned))
        .filter_map(|filename| {
            let stem = pattern.captures(&filename)?.get(1)?.as_str().to_string();
            (stem != "custom").then(|| display_name(&stem))
        })
        .collect()
}

fn display_name(stem: &str) -> String {
    stem.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{SchemaRegistry, display_name};
    use crate::error::SchemaLoadError;
    use crate::schema::Schema;
    use crate::store::MemoryStore;

    fn write(dir: &std::path::Path, file: &str, contents: &str) {
        fs::write(dir.join(file), contents).expect("write schema file");
    }

    #[test]
    fn lists_builtin_variants_discovered_files_and_custom() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "himachal_pradesh_schema.json", "{}");
        write(dir.path(), "punjab_schema.json", "{}");
        write(dir.path(), "custom_schema.json", "{}");
        write(dir.path(), "notes.txt", "");

        let registry = SchemaRegistry::open(dir.path());
        assert_eq!(
            registry.list_schema_names(),
            vec!["Default", "Punjab", "Haryana", "Himachal Pradesh", "Custom"]
        );
    }

    #[test]
    fn loads_regional_variant_by_case_insensitive_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "haryana_schema.json",
            r#"{"खाता नं": "account_number", "खसरा": "plot_number", "मालिक": "owner_name"}"#,
        );

        let mut registry = SchemaRegistry::open(dir.path());
        let loaded = registry.get_schema("haryana");
        assert_eq!(loaded.name, "Haryana");
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.schema.field_for("मालिक"), Some("owner_name"));

        fs::remove_file(dir.path().join("haryana_schema.json")).expect("remove");
        let cached = registry.get_schema("Haryana");
        assert_eq!(cached.schema.len(), 3);
    }

    #[test]
    fn missing_variant_falls_back_with_warning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = SchemaRegistry::open(dir.path());

        let loaded = registry.get_schema("Punjab");
        assert_eq!(loaded.name, "Default");
        assert_eq!(loaded.schema, Schema::builtin_default());
        assert!(matches!(loaded.warning, Some(SchemaLoadError::Read { .. })));
    }

    #[test]
    fn malformed_documents_fall_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "punjab_schema.json", "{not json");
        write(dir.path(), "haryana_schema.json", r#"["खाता संख्या"]"#);

        let mut registry = SchemaRegistry::open(dir.path());
        assert!(matches!(
            registry.get_schema("Punjab").warning,
            Some(SchemaLoadError::Parse { .. })
        ));
        assert!(matches!(
            registry.get_schema("Haryana").warning,
            Some(SchemaLoadError::NotAnObject { .. })
        ));
        assert!(matches!(
            registry.get_schema("Kerala").warning,
            Some(SchemaLoadError::Unknown(_))
        ));
    }

    #[test]
    fn custom_schema_defaults_to_empty_and_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry =
            SchemaRegistry::with_custom_store(dir.path(), Box::new(MemoryStore::default()));

        let loaded = registry.get_schema("Custom");
        assert_eq!(loaded.name, "Custom");
        assert!(loaded.schema.is_empty());
        assert!(loaded.warning.is_none());

        let mut edited = Schema::builtin_default();
        edited.set("खेवट", "khewat_number");
        registry.save_custom_schema(&edited).expect("save");
        assert_eq!(registry.get_schema("custom").schema, edited);
    }

    #[test]
    fn custom_schema_persists_across_registries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let edited = Schema::from_pairs([("नाम", "owner_name")]);

        SchemaRegistry::open(dir.path())
            .save_custom_schema(&edited)
            .expect("save");

        let raw = fs::read_to_string(dir.path().join("custom_schema.json")).expect("file");
        assert!(raw.contains("\"नाम\": \"owner_name\""));

        let mut reopened = SchemaRegistry::open(dir.path());
        assert_eq!(reopened.get_schema("Custom").schema, edited);
    }

    #[test]
    fn failed_custom_save_is_a_persistence_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry =
            SchemaRegistry::with_custom_store(dir.path(), Box::new(MemoryStore::failing()));
        assert!(registry.save_custom_schema(&Schema::default()).is_err());
    }

    #[test]
    fn display_names_title_case_each_word() {
        assert_eq!(display_name("himachal_pradesh"), "Himachal Pradesh");
        assert_eq!(display_name("up"), "Up");
    }
}
