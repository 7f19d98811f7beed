//! Record store - create, read, update and delete records by integer id
//!
//! The store owns record bookkeeping: it assigns ids (never reused), and
//! sets the `created`/`updated` timestamps. Two backends are provided:
//!
//! - [`MemoryStore`] keeps records in a map, for tests and scratch work
//! - [`FileStore`] keeps one YAML file per record under `records/`

use chrono::Utc;
use miette::Diagnostic;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::entity::Entity;
use crate::core::identity::RecordId;
use crate::core::project::Project;
use crate::yaml::{parse_yaml_file, YamlError};

/// Suffix of every record file
pub const RECORD_SUFFIX: &str = ".cca.yaml";

/// Fields a patch can never change
const PROTECTED_FIELDS: &[&str] = &["id", "created", "updated"];

/// Errors raised by record stores
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("record {0} not found")]
    #[diagnostic(
        code(cca::store::not_found),
        help("List existing records with `cca record list`")
    )]
    NotFound(RecordId),

    #[error("invalid update: {0}")]
    #[diagnostic(code(cca::store::invalid_patch))]
    InvalidPatch(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_yml::Error),

    #[error("failed to convert record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Create/read/update/delete of records keyed by [`RecordId`]
pub trait RecordStore<T: Entity> {
    /// Save a new record; id and timestamps supplied by the caller are replaced
    fn create(&mut self, record: T) -> Result<T, StoreError>;

    /// Fetch a record, `Ok(None)` if absent
    fn get(&self, id: RecordId) -> Result<Option<T>, StoreError>;

    /// All records ordered by id
    fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Shallow-merge a JSON object into a record
    ///
    /// Top-level keys of `patch` replace the record's values wholesale and
    /// `null` removes a key; `id`, `created` and `updated` are ignored.
    fn update(&mut self, id: RecordId, patch: &Value) -> Result<T, StoreError>;

    /// Remove a record, returning whether it existed
    fn delete(&mut self, id: RecordId) -> Result<bool, StoreError>;

    /// Fetch a record that must exist
    fn require(&self, id: RecordId) -> Result<T, StoreError> {
        self.get(id)?.ok_or(StoreError::NotFound(id))
    }

    /// Replace every non-protected field with the values of `record`
    ///
    /// Fields the stored record has but `record` leaves out are cleared.
    fn save(&mut self, record: &T) -> Result<T, StoreError> {
        let current = serde_json::to_value(self.require(record.id())?)?;
        let mut patch = serde_json::to_value(record)?;
        if let (Value::Object(fields), Value::Object(old)) = (&mut patch, current) {
            for key in old.keys() {
                fields.entry(key.clone()).or_insert(Value::Null);
            }
        }
        self.update(record.id(), &patch)
    }
}

/// Apply a shallow merge patch to a record
pub fn apply_patch<T: Entity>(record: &T, patch: &Value) -> Result<T, StoreError> {
    let Value::Object(changes) = patch else {
        return Err(StoreError::InvalidPatch(
            "patch must be a JSON object".to_string(),
        ));
    };

    let mut merged = serde_json::to_value(record)?;
    let Value::Object(ref mut fields) = merged else {
        return Err(StoreError::InvalidPatch(format!(
            "{} records do not serialize to an object",
            T::KIND
        )));
    };

    for (key, value) in changes {
        if PROTECTED_FIELDS.contains(&key.as_str()) {
            debug!(field = %key, "ignoring protected field in patch");
            continue;
        }
        if value.is_null() {
            fields.remove(key);
        } else {
            fields.insert(key.clone(), value.clone());
        }
    }

    serde_json::from_value(merged).map_err(|e| StoreError::InvalidPatch(e.to_string()))
}

/// In-memory store
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    records: BTreeMap<RecordId, T>,
    next_id: RecordId,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: RecordId::FIRST,
        }
    }
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Entity> RecordStore<T> for MemoryStore<T> {
    fn create(&mut self, mut record: T) -> Result<T, StoreError> {
        let id = self.next_id;
        let now = Utc::now();
        record.stamp(id, now, now);
        self.records.insert(id, record.clone());
        self.next_id = id.next();
        Ok(record)
    }

    fn get(&self, id: RecordId) -> Result<Option<T>, StoreError> {
        Ok(self.records.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }

    fn update(&mut self, id: RecordId, patch: &Value) -> Result<T, StoreError> {
        let current = self.records.get(&id).ok_or(StoreError::NotFound(id))?;
        let mut merged = apply_patch(current, patch)?;
        merged.stamp(id, current.created(), Utc::now());
        self.records.insert(id, merged.clone());
        Ok(merged)
    }

    fn delete(&mut self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.records.remove(&id).is_some())
    }
}

/// One YAML file per record, plus a sequence file for the next id
#[derive(Debug, Clone)]
pub struct FileStore<T> {
    dir: PathBuf,
    sequence_path: PathBuf,
    _kind: PhantomData<T>,
}

impl<T: Entity> FileStore<T> {
    /// Open the store of a project
    pub fn open(project: &Project) -> Result<Self, StoreError> {
        Self::at(project.records_dir(), project.sequence_path())
    }

    /// Open a store in an arbitrary directory
    pub fn at(dir: PathBuf, sequence_path: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            dir,
            sequence_path,
            _kind: PhantomData,
        })
    }

    /// Directory holding the record files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a record with this id is stored in
    pub fn path_for(&self, id: RecordId) -> PathBuf {
        self.dir
            .join(format!("{}-{:05}{}", T::KIND, id.value(), RECORD_SUFFIX))
    }

    /// Id encoded in a record file name
    ///
    /// Only the zero-padded form written by [`FileStore::path_for`] counts,
    /// so one id never maps to two files.
    pub fn id_from_path(path: &Path) -> Option<RecordId> {
        let name = path.file_name()?.to_str()?;
        let digits = name
            .strip_prefix(T::KIND)?
            .strip_prefix('-')?
            .strip_suffix(RECORD_SUFFIX)?;
        digits
            .parse::<u64>()
            .ok()
            .filter(|v| *v > 0 && format!("{:05}", v) == digits)
            .map(RecordId::new)
    }

    /// Record files present on disk, ordered by id
    pub fn record_files(&self) -> Vec<(RecordId, PathBuf)> {
        let mut files: Vec<(RecordId, PathBuf)> = WalkDir::new(&self.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Self::id_from_path(e.path()).map(|id| (id, e.path().to_path_buf())))
            .collect();
        files.sort_by_key(|(id, _)| *id);
        files
    }

    fn next_id(&self) -> Result<RecordId, StoreError> {
        let from_sequence = match fs::read_to_string(&self.sequence_path) {
            Ok(text) => text.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!(path = %self.sequence_path.display(), "ignoring corrupt sequence file");
                1
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 1,
            Err(e) => return Err(StoreError::io(&self.sequence_path, e)),
        };

        let after_existing = self
            .record_files()
            .last()
            .map(|(id, _)| id.next().value())
            .unwrap_or(1);

        Ok(RecordId::new(from_sequence.max(after_existing).max(1)))
    }

    fn write_sequence(&self, next: RecordId) -> Result<(), StoreError> {
        if let Some(parent) = self.sequence_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(&self.sequence_path, format!("{}\n", next))
            .map_err(|e| StoreError::io(&self.sequence_path, e))
    }

    /// Write through a temporary file so readers never see a partial record
    fn write_record(&self, record: &T) -> Result<PathBuf, StoreError> {
        let path = self.path_for(record.id());
        let yaml = serde_yml::to_string(record)?;
        let tmp = self.dir.join(format!(".{}-{}.tmp", T::KIND, record.id()));
        fs::write(&tmp, yaml).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }
}

impl<T: Entity> RecordStore<T> for FileStore<T> {
    fn create(&mut self, mut record: T) -> Result<T, StoreError> {
        let id = self.next_id()?;
        let now = Utc::now();
        record.stamp(id, now, now);

        let path = self.write_record(&record)?;
        self.write_sequence(id.next())?;

        info!(id = %id, kind = T::KIND, path = %path.display(), "created record");
        Ok(record)
    }

    fn get(&self, id: RecordId) -> Result<Option<T>, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let record: T = parse_yaml_file(&path)?;
        Ok(Some(record))
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        for (id, path) in self.record_files() {
            match parse_yaml_file::<T>(&path) {
                Ok(record) => records.push(record),
                Err(e) => warn!(id = %id, path = %path.display(), error = %e, "skipping unreadable record"),
            }
        }
        Ok(records)
    }

    fn update(&mut self, id: RecordId, patch: &Value) -> Result<T, StoreError> {
        let current = self.require(id)?;
        let mut merged = apply_patch(&current, patch)?;
        merged.stamp(id, current.created(), Utc::now());
        self.write_record(&merged)?;

        debug!(id = %id, kind = T::KIND, "updated record");
        Ok(merged)
    }

    fn delete(&mut self, id: RecordId) -> Result<bool, StoreError> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(id = %id, kind = T::KIND, "deleted record");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: RecordId,
        title: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<Detail>,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Detail {
        a: u32,
        #[serde(default)]
        b: Option<u32>,
    }

    impl Entity for Note {
        const KIND: &'static str = "note";

        fn id(&self) -> RecordId {
            self.id
        }
        fn title(&self) -> &str {
            &self.title
        }
        fn status(&self) -> &str {
            "draft"
        }
        fn created(&self) -> DateTime<Utc> {
            self.created
        }
        fn updated(&self) -> DateTime<Utc> {
            self.updated
        }
        fn author(&self) -> &str {
            "tester"
        }
        fn stamp(&mut self, id: RecordId, created: DateTime<Utc>, updated: DateTime<Utc>) {
            self.id = id;
            self.created = created;
            self.updated = updated;
        }
    }

    fn note(title: &str) -> Note {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        Note {
            id: RecordId::new(999),
            title: title.to_string(),
            tags: Vec::new(),
            detail: Some(Detail { a: 1, b: Some(2) }),
            created: epoch,
            updated: epoch,
        }
    }

    fn file_store(tmp: &tempfile::TempDir) -> FileStore<Note> {
        FileStore::at(tmp.path().join("records"), tmp.path().join(".cca/sequence")).unwrap()
    }

    /// Behaviour every backend must share
    fn exercise_store(store: &mut impl RecordStore<Note>) {
        let a = store.create(note("first")).unwrap();
        let b = store.create(note("second")).unwrap();
        assert_eq!(a.id, RecordId::new(1));
        assert_eq!(b.id, RecordId::new(2));
        assert!(a.created.timestamp() > 0, "store sets creation time");
        assert_eq!(a.created, a.updated);

        let listed: Vec<String> = store.list().unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(listed, vec!["first", "second"]);

        let patched = store
            .update(a.id, &json!({"title": "renamed", "id": 77, "detail": {"a": 5}}))
            .unwrap();
        assert_eq!(patched.id, a.id);
        assert_eq!(patched.title, "renamed");
        // nested objects are replaced, not merged
        assert_eq!(patched.detail, Some(Detail { a: 5, b: None }));
        assert_eq!(patched.created, a.created);
        assert!(patched.updated >= a.updated);
        assert_eq!(store.get(a.id).unwrap().unwrap().title, "renamed");

        let mut cleared = patched.clone();
        cleared.tags = vec!["x".to_string()];
        store.save(&cleared).unwrap();
        cleared.tags.clear();
        cleared.detail = None;
        let saved = store.save(&cleared).unwrap();
        assert!(saved.tags.is_empty(), "save drops fields left out of the record");
        assert_eq!(store.get(a.id).unwrap().unwrap().detail, None);

        assert!(store.delete(b.id).unwrap());
        assert!(!store.delete(b.id).unwrap());
        assert!(store.get(b.id).unwrap().is_none());

        let c = store.create(note("third")).unwrap();
        assert_eq!(c.id, RecordId::new(3), "ids are not reused");
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        exercise_store(&mut store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_file_store() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = file_store(&tmp);
        exercise_store(&mut store);
        assert!(store.path_for(RecordId::new(1)).exists());
        assert!(tmp.path().join("records/note-00003.cca.yaml").exists());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        let first = file_store(&tmp).create(note("kept")).unwrap();

        let store = file_store(&tmp);
        let loaded = store.require(first.id).unwrap();
        assert_eq!(loaded, first);
    }

    #[test]
    fn test_file_store_next_id_after_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = file_store(&tmp);
        store.create(note("one")).unwrap();
        std::fs::remove_file(tmp.path().join(".cca/sequence")).unwrap();

        let two = store.create(note("two")).unwrap();
        assert_eq!(two.id, RecordId::new(2));
    }

    #[test]
    fn test_update_missing_record() {
        let mut store: MemoryStore<Note> = MemoryStore::new();
        let err = store.update(RecordId::new(4), &json!({"title": "x"})).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_invalid_patches() {
        let mut store = MemoryStore::new();
        let n = store.create(note("n")).unwrap();

        let err = store.update(n.id, &json!(["title"])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPatch(_)));

        let err = store.update(n.id, &json!({"title": 12})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPatch(_)));
        assert_eq!(store.require(n.id).unwrap().title, "n");
    }

    #[test]
    fn test_save_replaces_fields() {
        let mut store = MemoryStore::new();
        let mut n = store.create(note("n")).unwrap();
        n.tags.push("x".to_string());
        let saved = store.save(&n).unwrap();
        assert_eq!(saved.tags, vec!["x"]);
    }

    #[test]
    fn test_id_from_path() {
        assert_eq!(
            FileStore::<Note>::id_from_path(Path::new("/r/note-00012.cca.yaml")),
            Some(RecordId::new(12))
        );
        assert_eq!(FileStore::<Note>::id_from_path(Path::new("/r/other-1.cca.yaml")), None);
        assert_eq!(FileStore::<Note>::id_from_path(Path::new("/r/note-1.yaml")), None);
        assert_eq!(
            FileStore::<Note>::id_from_path(Path::new("/r/note-123456.cca.yaml")),
            Some(RecordId::new(123456))
        );
    }

    #[test]
    fn test_unpadded_file_names_are_not_records() {
        for name in ["note-1.cca.yaml", "note-000001.cca.yaml", "note-+0001.cca.yaml"] {
            assert_eq!(FileStore::<Note>::id_from_path(Path::new(name)), None, "{}", name);
        }

        let tmp = tempfile::tempdir().unwrap();
        let mut store = file_store(&tmp);
        store.create(note("first")).unwrap();
        fs::copy(
            store.path_for(RecordId::new(1)),
            tmp.path().join("records/note-1.cca.yaml"),
        )
        .unwrap();

        let ids: Vec<RecordId> = store.list().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![RecordId::new(1)]);
    }
}
