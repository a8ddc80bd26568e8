//! Persistence for demo screens that have no backend tables of their own
//! (content calendar, testimonials, collection forms).
//!
//! Files are a versioned envelope `{"version": N, "collections": {...}}`.
//! Older layouts are upgraded in order on first load and written back.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub const CURRENT_VERSION: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoCollection {
    ContentCalendar,
    Testimonials,
    CollectionForms,
}

impl DemoCollection {
    pub const ALL: [DemoCollection; 3] = [
        DemoCollection::ContentCalendar,
        DemoCollection::Testimonials,
        DemoCollection::CollectionForms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DemoCollection::ContentCalendar => "content_calendar",
            DemoCollection::Testimonials => "testimonials",
            DemoCollection::CollectionForms => "collection_forms",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Error)]
pub enum DemoStoreError {
    #[error("unknown demo collection '{0}'")]
    UnknownCollection(String),
    #[error("item {0} is not a JSON object")]
    InvalidItem(usize),
    #[error("store version {0} is newer than supported version {CURRENT_VERSION}")]
    UnsupportedVersion(u64),
    #[error("store file is malformed: {0}")]
    Malformed(String),
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store JSON failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Named collections of schemaless JSON items
pub trait LocalRepository: Send + Sync {
    fn load(&self, collection: DemoCollection) -> Result<Vec<Value>, DemoStoreError>;

    /// Replace a collection. Items without an `id` are assigned one; the stored items are returned.
    fn save(&self, collection: DemoCollection, items: Vec<Value>) -> Result<Vec<Value>, DemoStoreError>;

    fn clear(&self, collection: DemoCollection) -> Result<(), DemoStoreError>;
}

fn ensure_id(item: &mut Map<String, Value>) {
    let has_id = matches!(item.get("id"), Some(Value::String(s)) if !s.is_empty())
        || matches!(item.get("id"), Some(Value::Number(_)));
    if !has_id {
        item.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
}

fn normalize_items(items: Vec<Value>) -> Result<Vec<Value>, DemoStoreError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(mut obj) => {
                ensure_id(&mut obj);
                Ok(Value::Object(obj))
            }
            _ => Err(DemoStoreError::InvalidItem(index)),
        })
        .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    version: u64,
    #[serde(default)]
    collections: BTreeMap<String, Vec<Value>>,
}

impl Envelope {
    fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            collections: BTreeMap::new(),
        }
    }
}

type Migration = fn(Value) -> Result<Value, DemoStoreError>;

/// Upgrade steps; entry `i` lifts a document from version `i` to `i + 1`.
const MIGRATIONS: [Migration; CURRENT_VERSION as usize] = [v0_parse_blobs, v1_assign_ids];

/// v0 was a flat map of collection name to a stringified JSON array.
fn v0_parse_blobs(doc: Value) -> Result<Value, DemoStoreError> {
    let Value::Object(blobs) = doc else {
        return Err(DemoStoreError::Malformed("expected a JSON object".to_string()));
    };

    let mut collections = Map::new();
    for (key, raw) in blobs {
        let parsed = match raw {
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Dropping unparseable demo blob '{}': {}", key, e);
                    continue;
                }
            },
            other => other,
        };

        match parsed {
            Value::Array(items) => {
                collections.insert(key, Value::Array(items));
            }
            Value::Null => {}
            other => {
                tracing::warn!("Demo blob '{}' is not a list, wrapping it", key);
                collections.insert(key, Value::Array(vec![other]));
            }
        }
    }

    Ok(serde_json::json!({ "version": 1, "collections": collections }))
}

/// v2 requires every item to be an object carrying an `id`.
fn v1_assign_ids(mut doc: Value) -> Result<Value, DemoStoreError> {
    let collections = doc
        .get_mut("collections")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| DemoStoreError::Malformed("missing collections".to_string()))?;

    for (key, items) in collections.iter_mut() {
        let Value::Array(list) = items else {
            return Err(DemoStoreError::Malformed(format!("collection '{}' is not a list", key)));
        };
        list.retain(|item| {
            let keep = item.is_object();
            if !keep {
                tracing::warn!("Dropping non-object item from demo collection '{}'", key);
            }
            keep
        });
        for item in list.iter_mut() {
            if let Value::Object(obj) = item {
                ensure_id(obj);
            }
        }
    }

    doc["version"] = Value::from(2u64);
    Ok(doc)
}

fn document_version(doc: &Value) -> u64 {
    match doc.get("version").and_then(Value::as_u64) {
        Some(version) if doc.get("collections").is_some() => version,
        _ => 0,
    }
}

/// Bring any stored layout up to [`CURRENT_VERSION`]. Returns the envelope and
/// the version it was read at.
fn upgrade(mut doc: Value) -> Result<(Envelope, u64), DemoStoreError> {
    let found = document_version(&doc);
    if found > CURRENT_VERSION {
        return Err(DemoStoreError::UnsupportedVersion(found));
    }

    for migration in &MIGRATIONS[found as usize..] {
        doc = migration(doc)?;
    }

    Ok((serde_json::from_value(doc)?, found))
}

/// JSON file on disk, rewritten atomically on every change
pub struct JsonFileRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Envelope, DemoStoreError> {
        if !self.path.exists() {
            return Ok(Envelope::empty());
        }

        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Envelope::empty());
        }

        let (envelope, found) = upgrade(serde_json::from_str(&text)?)?;
        if found < CURRENT_VERSION {
            tracing::info!(
                "Migrated demo store {} from v{} to v{}",
                self.path.display(),
                found,
                CURRENT_VERSION
            );
            self.write(&envelope)?;
        }
        Ok(envelope)
    }

    fn write(&self, envelope: &Envelope) -> Result<(), DemoStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(envelope)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn with_envelope<T>(
        &self,
        f: impl FnOnce(&mut Envelope) -> Result<(T, bool), DemoStoreError>,
    ) -> Result<T, DemoStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut envelope = self.read()?;
        let (value, dirty) = f(&mut envelope)?;
        if dirty {
            self.write(&envelope)?;
        }
        Ok(value)
    }
}

impl LocalRepository for JsonFileRepository {
    fn load(&self, collection: DemoCollection) -> Result<Vec<Value>, DemoStoreError> {
        self.with_envelope(|env| {
            let items = env.collections.get(collection.as_str()).cloned().unwrap_or_default();
            Ok((items, false))
        })
    }

    fn save(&self, collection: DemoCollection, items: Vec<Value>) -> Result<Vec<Value>, DemoStoreError> {
        let items = normalize_items(items)?;
        self.with_envelope(|env| {
            env.collections.insert(collection.as_str().to_string(), items.clone());
            Ok((items, true))
        })
    }

    fn clear(&self, collection: DemoCollection) -> Result<(), DemoStoreError> {
        self.with_envelope(|env| {
            let removed = env.collections.remove(collection.as_str()).is_some();
            Ok(((), removed))
        })
    }
}

/// Process-local repository used by tests and when no store path is configured
#[derive(Default)]
pub struct MemoryRepository {
    collections: Mutex<HashMap<DemoCollection, Vec<Value>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalRepository for MemoryRepository {
    fn load(&self, collection: DemoCollection) -> Result<Vec<Value>, DemoStoreError> {
        let collections = self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    fn save(&self, collection: DemoCollection, items: Vec<Value>) -> Result<Vec<Value>, DemoStoreError> {
        let items = normalize_items(items)?;
        let mut collections = self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        collections.insert(collection, items.clone());
        Ok(items)
    }

    fn clear(&self, collection: DemoCollection) -> Result<(), DemoStoreError> {
        let mut collections = self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        collections.remove(&collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn file_repo() -> (TempDir, JsonFileRepository) {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("demo.json"));
        (dir, repo)
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(DemoCollection::parse("content_calendar"), Some(DemoCollection::ContentCalendar));
        assert_eq!(DemoCollection::parse("collection_forms"), Some(DemoCollection::CollectionForms));
        assert_eq!(DemoCollection::parse("Testimonials"), None);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let (_dir, repo) = file_repo();
        assert!(repo.load(DemoCollection::Testimonials).unwrap().is_empty());
        assert!(!repo.path().exists());
    }

    #[test]
    fn test_save_assigns_ids_and_persists() {
        let (dir, repo) = file_repo();
        let saved = repo
            .save(
                DemoCollection::Testimonials,
                vec![json!({"author": "Sam", "quote": "Changed my workflow"}), json!({"id": "t-2", "author": "Priya"})],
            )
            .unwrap();
        assert!(saved[0]["id"].is_string());
        assert_eq!(saved[1]["id"], "t-2");

        let reopened = JsonFileRepository::new(dir.path().join("demo.json"));
        assert_eq!(reopened.load(DemoCollection::Testimonials).unwrap(), saved);

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(repo.path()).unwrap()).unwrap();
        assert_eq!(on_disk["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_save_rejects_non_objects() {
        let (_dir, repo) = file_repo();
        let err = repo
            .save(DemoCollection::ContentCalendar, vec![json!({"title": "ok"}), json!("nope")])
            .unwrap_err();
        assert!(matches!(err, DemoStoreError::InvalidItem(1)));
    }

    #[test]
    fn test_clear_only_touches_one_collection() {
        let (_dir, repo) = file_repo();
        repo.save(DemoCollection::Testimonials, vec![json!({"author": "Sam"})]).unwrap();
        repo.save(DemoCollection::CollectionForms, vec![json!({"name": "Intake"})]).unwrap();

        repo.clear(DemoCollection::Testimonials).unwrap();
        assert!(repo.load(DemoCollection::Testimonials).unwrap().is_empty());
        assert_eq!(repo.load(DemoCollection::CollectionForms).unwrap().len(), 1);
    }

    #[test]
    fn test_v0_file_is_migrated() {
        let (_dir, repo) = file_repo();
        let legacy = json!({
            "content_calendar": "[{\"title\":\"Launch teaser\",\"date\":\"2024-03-01\"}]",
            "testimonials": "[{\"author\":\"Sam\"},{\"id\":\"keep-me\",\"author\":\"Priya\"}]",
            "collection_forms": "{not json",
        });
        fs::write(repo.path(), legacy.to_string()).unwrap();

        let calendar = repo.load(DemoCollection::ContentCalendar).unwrap();
        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar[0]["title"], "Launch teaser");
        assert!(calendar[0]["id"].is_string());

        let testimonials = repo.load(DemoCollection::Testimonials).unwrap();
        assert_eq!(testimonials[1]["id"], "keep-me");
        assert!(repo.load(DemoCollection::CollectionForms).unwrap().is_empty());

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(repo.path()).unwrap()).unwrap();
        assert_eq!(on_disk["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_v1_file_gets_ids() {
        let (_dir, repo) = file_repo();
        let v1 = json!({
            "version": 1,
            "collections": {"testimonials": [{"author": "Sam"}, 42]}
        });
        fs::write(repo.path(), v1.to_string()).unwrap();

        let items = repo.load(DemoCollection::Testimonials).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0]["id"].is_string());
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let (_dir, repo) = file_repo();
        fs::write(repo.path(), json!({"version": 9, "collections": {}}).to_string()).unwrap();
        assert!(matches!(
            repo.load(DemoCollection::Testimonials),
            Err(DemoStoreError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_memory_repository() {
        let repo = MemoryRepository::new();
        let saved = repo
            .save(DemoCollection::CollectionForms, vec![json!({"name": "Intake"})])
            .unwrap();
        assert_eq!(repo.load(DemoCollection::CollectionForms).unwrap(), saved);
        repo.clear(DemoCollection::CollectionForms).unwrap();
        assert!(repo.load(DemoCollection::CollectionForms).unwrap().is_empty());
    }
}
