use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;
    data.push(b'\n');

    replace_file(path, &data)
        .with_context(|| format!("failed to write json file: {}", path.display()))
}

pub fn replace_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = sibling_tmp_path(path);
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected HEADER=FIELD, got '{raw}'"))?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return Err(format!("expected HEADER=FIELD, got '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_assignment, replace_file, sha256_hex};

    #[test]
    fn replace_file_overwrites_whole_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("store.json");

        replace_file(&path, b"{\"a\": 1}").expect("first write");
        replace_file(&path, b"{}").expect("second write");

        let contents = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(contents, "{}");
        let leftovers = std::fs::read_dir(path.parent().expect("parent"))
            .expect("list dir")
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        let (key, value) = parse_assignment("खाता संख्या = account_number").expect("parses");
        assert_eq!(key, "खाता संख्या");
        assert_eq!(value, "account_number");
        assert!(parse_assignment("no-separator").is_err());
        assert!(parse_assignment("=field").is_err());
    }

    #[test]
    fn sha256_hex_is_lowercase_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
