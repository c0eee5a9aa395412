use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::util::replace_file;

pub type DocumentEdit<'a> = dyn FnMut(Option<String>) -> Result<String, PersistenceError> + 'a;

pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    fn read_all(&self) -> Result<Option<String>, PersistenceError>;

    // Read-modify-write under the store's exclusive lock.
    fn update(&self, edit: &mut DocumentEdit<'_>) -> Result<(), PersistenceError>;

    fn write_all(&self, document: &str) -> Result<(), PersistenceError> {
        self.update(&mut |_| Ok(document.to_string()))
    }
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    name: String,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("store")
            .to_string();
        let lock_path = path.with_file_name(format!("{name}.lock"));
        Self {
            path,
            lock_path,
            name,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Write {
            path: self.path.clone(),
            source,
        }
    }

    // Released when the returned handle is dropped.
    fn lock_file(&self) -> Result<File, PersistenceError> {
        if let Some(parent) = self
            .lock_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|source| self.write_error(source))?;
        file.lock().map_err(|source| self.write_error(source))?;
        Ok(file)
    }
}

impl DocumentStore for JsonFileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_all(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn update(&self, edit: &mut DocumentEdit<'_>) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock();
        let _file_lock = self.lock_file()?;

        let document = edit(self.read_all()?)?;
        replace_file(&self.path, document.as_bytes()).map_err(|source| self.write_error(source))?;
        debug!(path = %self.path.display(), bytes = document.len(), "replaced store document");
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<String>>,
    fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
            fail_writes: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            document: Mutex::new(None),
            fail_writes: true,
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.document.lock().clone()
    }
}

#[cfg(test)]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read_all(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.snapshot())
    }

    fn update(&self, edit: &mut DocumentEdit<'_>) -> Result<(), PersistenceError> {
        let mut document = self.document.lock();
        let next = edit(document.clone())?;
        if self.fail_writes {
            return Err(PersistenceError::Write {
                path: PathBuf::from("memory"),
                source: std::io::Error::new(ErrorKind::PermissionDenied, "store is read-only"),
            });
        }
        *document = Some(next);
        Ok(())
    }
}

fn parse_entries(
    store: &str,
    raw: Option<String>,
) -> Result<BTreeMap<String, String>, PersistenceError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw).map_err(|source| {
            PersistenceError::Corrupt {
                store: store.to_string(),
                source,
            }
        }),
        _ => Ok(BTreeMap::new()),
    }
}

pub struct ManualOverrideStore {
    entries: Mutex<BTreeMap<String, String>>,
    port: Box<dyn DocumentStore>,
}

impl ManualOverrideStore {
    pub fn load(port: Box<dyn DocumentStore>) -> Result<Self, PersistenceError> {
        let entries = parse_entries(port.name(), port.read_all()?)?;

        info!(store = port.name(), overrides = entries.len(), "loaded manual overrides");

        Ok(Self {
            entries: Mutex::new(entries),
            port,
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            port: Box::new(MemoryStore::default()),
        }
    }

    pub fn get(&self, header: &str) -> Option<String> {
        self.entries.lock().get(header).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }

    // The entry stays in memory even when the write fails. Entries saved by
    // other sessions since load are merged in, and the new entry wins.
    pub fn record(&self, header: &str, field: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock();
        entries.insert(header.to_string(), field.to_string());

        let store = self.port.name().to_string();
        let mut merged = None;
        self.port.update(&mut |current| {
            let mut on_disk = parse_entries(&store, current)?;
            on_disk.insert(header.to_string(), field.to_string());
            let document = serde_json::to_string_pretty(&on_disk).map_err(|source| {
                PersistenceError::Serialize {
                    store: store.clone(),
                    source,
                }
            })?;
            merged = Some(on_disk);
            Ok(document)
        })?;

        if let Some(merged) = merged {
            for (saved_header, saved_field) in merged {
                entries.entry(saved_header).or_insert(saved_field);
            }
        }

        info!(header, field, "saved manual header mapping");
        Ok(())
    }
}
