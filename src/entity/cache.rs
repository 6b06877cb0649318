//! On-disk entity cache.
//!
//! Layout under the cache root:
//!
//! - `{kind}_id/{id}`: JSON object holding at least `microsoft_api`,
//! - `paper_id_map/{year}{title}`: the numeric id found for a paper title.
//!
//! Writes merge into whatever is already stored; nothing is ever dropped.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use deunicode::deunicode;
use log::debug;
use serde_json::{Map, Value};

use super::{EntityId, EntityKey};
use crate::error::{Error, Result};

pub const API_BLOB_KEY: &str = "microsoft_api";

const PAPER_ID_MAP_DIR: &str = "paper_id_map";

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entity_path(&self, key: EntityKey) -> PathBuf {
        self.root
            .join(key.kind.cache_dirname())
            .join(key.id.to_string())
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entity_path(key).is_file()
    }

    pub fn load(&self, key: EntityKey) -> Result<Option<Map<String, Value>>> {
        let path = self.entity_path(key);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(&text).map_err(|e| Error::json(&path, e))?;
        match value {
            Value::Object(map) => Ok(Some(map)),
            other => Err(Error::CorruptCache {
                path,
                reason: format!("expected an object, found {}", other),
            }),
        }
    }

    /// The cached remote attributes for `key`. A present file is authoritative:
    /// one without `microsoft_api` is an error, never a reason to refetch.
    pub fn api_blob(&self, key: EntityKey) -> Result<Option<Value>> {
        let Some(mut map) = self.load(key)? else {
            return Ok(None);
        };
        match map.remove(API_BLOB_KEY) {
            Some(blob) => Ok(Some(blob)),
            None => Err(Error::CorruptCache {
                path: self.entity_path(key),
                reason: format!("no {} entry", API_BLOB_KEY),
            }),
        }
    }

    /// Merges `data` into the cached object for `key` and writes it back.
    /// Keys in `data` replace stored keys of the same name; other stored keys
    /// are kept. Returns the merged object.
    pub fn merge(&self, key: EntityKey, data: Map<String, Value>) -> Result<Map<String, Value>> {
        let path = self.entity_path(key);
        let mut merged = self.load(key)?.unwrap_or_default();
        merged.extend(data);
        write_file(&path, &serde_json::to_string(&merged).map_err(|e| Error::json(&path, e))?)?;
        debug!("Wrote cache entry {}", path.display());
        Ok(merged)
    }

    pub fn store_api_blob(&self, key: EntityKey, blob: Value) -> Result<Map<String, Value>> {
        let mut data = Map::new();
        data.insert(API_BLOB_KEY.to_string(), blob);
        self.merge(key, data)
    }

    pub fn paper_id_path(&self, year: i64, title: &str) -> PathBuf {
        self.root
            .join(PAPER_ID_MAP_DIR)
            .join(id_map_filename(year, title))
    }

    pub fn load_paper_id(&self, year: i64, title: &str) -> Result<Option<EntityId>> {
        let path = self.paper_id_path(year, title);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        text.trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::CorruptCache {
                path,
                reason: format!("invalid id: {}", e),
            })
    }

    pub fn store_paper_id(&self, year: i64, title: &str, id: EntityId) -> Result<()> {
        let path = self.paper_id_path(year, title);
        write_file(&path, &id.to_string())?;
        debug!("Mapped paper '{}' ({}) to id {}", title, year, id);
        Ok(())
    }
}

/// File name for a paper id-map entry: the year followed by the title with
/// slashes and whitespace removed, lowercased and transliterated to ASCII.
pub fn id_map_filename(year: i64, title: &str) -> String {
    let name: String = format!("{}{}", year, title)
        .chars()
        .filter(|c| *c != '/' && !c.is_whitespace())
        .collect();
    // Transliteration may reintroduce separators, so filter again.
    deunicode(&name.to_lowercase())
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && !c.is_whitespace())
        .collect()
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn id_map_names_are_filesystem_safe() {
        assert_eq!(
            id_map_filename(2016, "Deep Packet / Flow Inspection"),
            "2016deeppacketflowinspection"
        );
        assert_eq!(id_map_filename(2019, "Réseaux  Neuronaux"), "2019reseauxneuronaux");
    }

    #[test]
    fn merge_keeps_disjoint_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let key = EntityKey::new(EntityKind::Author, 42);

        assert!(store.load(key).unwrap().is_none());
        store.merge(key, object(json!({"a": 1}))).unwrap();
        let merged = store.merge(key, object(json!({"b": 2}))).unwrap();

        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 2}));
        assert_eq!(
            Value::Object(store.load(key).unwrap().unwrap()),
            json!({"a": 1, "b": 2})
        );
        assert!(dir.path().join("author_id").join("42").is_file());
    }

    #[test]
    fn api_blob_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let key = EntityKey::new(EntityKind::Journal, 7);
        store.merge(key, object(json!({"notes": "kept"}))).unwrap();
        store.store_api_blob(key, json!({"Id": 7, "JN": "tnsm"})).unwrap();

        assert_eq!(store.api_blob(key).unwrap(), Some(json!({"Id": 7, "JN": "tnsm"})));
        assert_eq!(store.load(key).unwrap().unwrap()["notes"], json!("kept"));
    }

    #[test]
    fn file_without_api_blob_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let key = EntityKey::new(EntityKind::Journal, 5);
        assert_eq!(store.api_blob(key).unwrap(), None);

        store.merge(key, object(json!({"notes": "curated"}))).unwrap();
        assert!(store.contains(key));
        assert!(matches!(
            store.api_blob(key).unwrap_err(),
            Error::CorruptCache { .. }
        ));
    }

    #[test]
    fn paper_id_map() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert_eq!(store.load_paper_id(2017, "A Title").unwrap(), None);
        store.store_paper_id(2017, "A Title", 123).unwrap();
        assert_eq!(store.load_paper_id(2017, "A Title").unwrap(), Some(123));
        assert!(dir.path().join("paper_id_map").join("2017atitle").is_file());
    }

    #[test]
    fn corrupt_id_map_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        write_file(&store.paper_id_path(2017, "x"), "not-a-number").unwrap();
        assert!(matches!(
            store.load_paper_id(2017, "x").unwrap_err(),
            Error::CorruptCache { .. }
        ));
    }
}
