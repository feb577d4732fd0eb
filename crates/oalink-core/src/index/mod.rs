//! Inverted index from `kind:identifier` to the records of every file declaring it.
//!
//! Records are kept serialized per file. Re-indexing a file parses it outside the lock and
//! swaps its whole record set in one short write section, so readers see either the old or
//! the new set.
//!
//! Each file also remembers the content hashes of the documents it references, so a
//! project re-index re-parses a file whose own content is unchanged when one of its
//! referenced documents was edited.

pub mod filter;
pub mod record;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::IndexConfig;
use crate::document::{content_hash, normalize_path};
use crate::error::IndexError;
use crate::locate::Locator;
use crate::model::{ElementKind, SpecElement};
use crate::parse::SpecParser;
use crate::store::DocumentStore;

pub use filter::InputFilter;
pub use record::{IndexKey, IndexRecord};

/// Bumped whenever the record layout changes; snapshots of another version are discarded.
pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    Building,
    Ready,
}

/// Outcome of a project re-index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReindexSummary {
    pub indexed: usize,
    pub unchanged: usize,
    pub removed: usize,
}

#[derive(Debug, Default)]
struct FileEntry {
    content_hash: Option<String>,
    /// `(key, serialized record)` pairs.
    records: Vec<(String, String)>,
    /// File id -> content hash of every document referenced at parse time.
    dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct IndexState {
    files: BTreeMap<String, FileEntry>,
    keys: HashMap<String, BTreeMap<String, Vec<String>>>,
}

impl IndexState {
    fn replace(&mut self, file: &str, entry: FileEntry) {
        self.remove(file);
        for (key, json) in &entry.records {
            let per_file = self
                .keys
                .entry(key.clone())
                .or_default()
                .entry(file.to_string())
                .or_default();
            if !per_file.contains(json) {
                per_file.push(json.clone());
            }
        }
        self.files.insert(file.to_string(), entry);
    }

    fn remove(&mut self, file: &str) -> bool {
        let Some(old) = self.files.remove(file) else {
            return false;
        };
        for (key, _) in &old.records {
            if let Some(per_file) = self.keys.get_mut(key) {
                per_file.remove(file);
                if per_file.is_empty() {
                    self.keys.remove(key);
                }
            }
        }
        true
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    files: BTreeMap<String, SnapshotFile>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
    records: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    dependencies: BTreeMap<String, String>,
}

/// Marks the index as building for as long as it is alive.
#[must_use = "the index is ready again as soon as the guard is dropped"]
pub struct BuildingGuard<'a>(&'a AtomicUsize);

impl<'a> BuildingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BuildingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The spec element index of one project.
#[derive(Debug)]
pub struct SpecIndex {
    root: PathBuf,
    filter: InputFilter,
    store: DocumentStore,
    state: RwLock<IndexState>,
    file_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    building: AtomicUsize,
}

impl SpecIndex {
    /// An empty index over the project at `root`. Record file paths are relative to it.
    pub fn new(root: impl Into<PathBuf>, config: &IndexConfig) -> Self {
        let root = normalize_path(&root.into());
        let root = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root
        };
        Self {
            filter: InputFilter::new(&root, config),
            root,
            store: DocumentStore::new(),
            state: RwLock::new(IndexState::default()),
            file_locks: Mutex::new(HashMap::new()),
            building: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filter(&self) -> &InputFilter {
        &self.filter
    }

    /// Documents parsed while indexing, shared with query-time lookups.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Report [`IndexStatus::Building`] until the returned guard is dropped.
    ///
    /// For callers applying a batch of file changes that queries should not observe halfway.
    pub fn begin_build(&self) -> BuildingGuard<'_> {
        BuildingGuard::enter(&self.building)
    }

    pub fn status(&self) -> IndexStatus {
        if self.building.load(Ordering::SeqCst) > 0 {
            IndexStatus::Building
        } else {
            IndexStatus::Ready
        }
    }

    /// `path` as seen from the project root; relative paths are taken relative to it.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.starts_with(&self.root) {
            normalize_path(path)
        } else {
            normalize_path(&self.root.join(path))
        }
    }

    /// Project-relative, `/`-separated file path stored in records.
    pub fn file_id(&self, path: &Path) -> String {
        let absolute = self.absolute(path);
        let relative = absolute.strip_prefix(&self.root).unwrap_or(&absolute);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parse `path` and replace every record previously stored for it.
    ///
    /// A file that no longer exists or no longer passes the input filter is removed.
    /// Returns the number of records now stored for the file.
    pub fn index_file(&self, path: &Path) -> usize {
        let absolute = self.absolute(path);
        if !self.filter.accepts(&absolute) {
            self.remove_file(&absolute);
            return 0;
        }
        match fs::read(&absolute) {
            Ok(content) => self.index_content(&absolute, content_hash(&content)),
            Err(e) => {
                log::debug!("dropping {} from the index: {e}", absolute.display());
                self.remove_file(&absolute);
                0
            }
        }
    }

    fn index_content(&self, absolute: &Path, hash: String) -> usize {
        let file = self.file_id(absolute);
        let lock = self.file_lock(&file);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let elements = SpecParser::new(&self.store).parse(absolute);
        let entry = FileEntry {
            content_hash: Some(hash),
            records: serialize_records(&file, elements),
            dependencies: self.dependency_hashes(absolute),
        };
        self.swap(&file, entry)
    }

    /// Content hashes of the documents `absolute` references, transitively.
    fn dependency_hashes(&self, absolute: &Path) -> BTreeMap<String, String> {
        let Ok(doc) = self.store.get(absolute) else {
            return BTreeMap::new();
        };
        Locator::new(&self.store)
            .referenced_documents(&doc)
            .iter()
            .map(|dep| (self.file_id(dep.path()), dep.content_hash().to_string()))
            .collect()
    }

    /// Replace the records of `path` with `elements` without parsing.
    pub fn index_elements(&self, path: &Path, elements: Vec<SpecElement>) -> usize {
        let file = self.file_id(path);
        let lock = self.file_lock(&file);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = FileEntry {
            records: serialize_records(&file, elements),
            ..FileEntry::default()
        };
        self.swap(&file, entry)
    }

    fn swap(&self, file: &str, entry: FileEntry) -> usize {
        let count = entry.records.len();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(file, entry);
        log::debug!("indexed {count} records from {file}");
        count
    }

    /// Drop every record of `path`. Returns whether the file was indexed.
    pub fn remove_file(&self, path: &Path) -> bool {
        let file = self.file_id(path);
        let lock = self.file_lock(&file);
        let removed = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.store.invalidate(&self.absolute(path));
            self.state
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&file)
        };
        self.release_file_lock(&file, lock);
        removed
    }

    fn file_lock(&self, file: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .file_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(file.to_string()).or_default())
    }

    /// Forget the lock of a removed file unless another caller still holds a handle to it.
    fn release_file_lock(&self, file: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .file_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Handles are only cloned under `file_locks`: the map's and ours means no waiter.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(file);
        }
    }

    /// Every record stored under `kind:identifier`, ordered by file.
    pub fn lookup(&self, kind: ElementKind, identifier: &str) -> Vec<IndexRecord> {
        self.lookup_key(&IndexKey::new(kind, identifier))
    }

    pub fn lookup_key(&self, key: &IndexKey) -> Vec<IndexRecord> {
        let serialized: Vec<String> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            state
                .keys
                .get(&key.to_string())
                .map(|per_file| per_file.values().flatten().cloned().collect())
                .unwrap_or_default()
        };
        serialized
            .iter()
            .filter_map(|json| match serde_json::from_str::<IndexRecord>(json) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("skipping unreadable record under {key}: {e}");
                    None
                }
            })
            .collect()
    }

    /// Indexed files, project-relative and sorted.
    pub fn files(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .keys()
            .cloned()
            .collect()
    }

    /// Every key currently holding at least one record, sorted.
    pub fn keys(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = state.keys.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn record_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .values()
            .map(|entry| entry.records.len())
            .sum()
    }

    /// Whether `file` was indexed from content hashing to `hash` and none of the documents
    /// it referenced changed since. `on_disk` caches current hashes across calls.
    fn is_current(
        &self,
        file: &str,
        hash: &str,
        on_disk: &mut HashMap<PathBuf, Option<String>>,
    ) -> bool {
        let dependencies = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match state.files.get(file) {
                Some(entry) if entry.content_hash.as_deref() == Some(hash) => {
                    entry.dependencies.clone()
                }
                _ => return false,
            }
        };
        dependencies.iter().all(|(dep, stored)| {
            let current = on_disk
                .entry(self.absolute(Path::new(dep)))
                .or_insert_with_key(|path| fs::read(path).ok().map(|c| content_hash(&c)));
            if current.as_deref() == Some(stored.as_str()) {
                true
            } else {
                log::debug!("{file} references {dep}, which changed");
                false
            }
        })
    }

    /// Walk the project and bring the index up to date.
    ///
    /// Files whose content hash matches the indexed one, and whose referenced documents are
    /// unchanged too, are skipped; indexed files that vanished or stopped passing the
    /// filter are removed. Status is `Building` meanwhile.
    pub fn reindex_project(&self) -> ReindexSummary {
        let _building = self.begin_build();
        log::info!("indexing spec documents under {}", self.root.display());

        let mut summary = ReindexSummary::default();
        let mut seen = HashSet::new();
        let mut on_disk = HashMap::new();

        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && self.filter.is_excluded(e.path())));
        for entry in walker
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && self.filter.accepts(e.path()))
        {
            let path = entry.path();
            let content = match fs::read(path) {
                Ok(content) => content,
                Err(e) => {
                    log::debug!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            let file = self.file_id(path);
            let hash = content_hash(&content);
            seen.insert(file.clone());

            if self.is_current(&file, &hash, &mut on_disk) {
                summary.unchanged += 1;
                continue;
            }
            self.index_content(path, hash);
            summary.indexed += 1;
        }

        for stale in self.files().into_iter().filter(|f| !seen.contains(f)) {
            if self.remove_file(Path::new(&stale)) {
                summary.removed += 1;
            }
        }

        log::info!(
            "index ready: {} files indexed, {} unchanged, {} removed",
            summary.indexed,
            summary.unchanged,
            summary.removed
        );
        summary
    }

    /// Write the index to `path` as versioned JSON.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), IndexError> {
        let snapshot = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let mut files = BTreeMap::new();
            for (file, entry) in &state.files {
                let records = entry
                    .records
                    .iter()
                    .map(|(_, json)| serde_json::from_str(json))
                    .collect::<Result<Vec<serde_json::Value>, _>>()?;
                files.insert(
                    file.clone(),
                    SnapshotFile {
                        content_hash: entry.content_hash.clone(),
                        records,
                        dependencies: entry.dependencies.clone(),
                    },
                );
            }
            Snapshot {
                version: INDEX_VERSION,
                files,
            }
        };

        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, serde_json::to_string_pretty(&snapshot)?).map_err(io_err)?;
        log::info!("saved index snapshot to {}", path.display());
        Ok(())
    }

    /// Replace the index with the snapshot at `path`. Returns the number of records loaded.
    ///
    /// A snapshot written with another [`INDEX_VERSION`] is rejected with
    /// [`IndexError::VersionMismatch`] and leaves the index untouched.
    pub fn load_snapshot(&self, path: &Path) -> Result<usize, IndexError> {
        let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;
        let found = raw
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        if found != u64::from(INDEX_VERSION) {
            return Err(IndexError::VersionMismatch {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                expected: INDEX_VERSION,
            });
        }
        let snapshot: Snapshot = serde_json::from_value(raw)?;

        let mut state = IndexState::default();
        let mut loaded = 0;
        for (file, stored) in snapshot.files {
            let mut records = Vec::with_capacity(stored.records.len());
            for value in stored.records {
                match serde_json::from_value::<IndexRecord>(value.clone()) {
                    Ok(record) => records.push((record.key().to_string(), value.to_string())),
                    Err(e) => log::warn!("skipping unreadable snapshot record in {file}: {e}"),
                }
            }
            loaded += records.len();
            state.replace(
                &file,
                FileEntry {
                    content_hash: stored.content_hash,
                    records,
                    dependencies: stored.dependencies,
                },
            );
        }

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
        log::info!("loaded {loaded} records from {}", path.display());
        Ok(loaded)
    }
}

fn serialize_records(file: &str, elements: Vec<SpecElement>) -> Vec<(String, String)> {
    elements
        .into_iter()
        .map(|element| IndexRecord::new(element, file))
        .filter_map(|record| match serde_json::to_string(&record) {
            Ok(json) => Some((record.key().to_string(), json)),
            Err(e) => {
                log::warn!("cannot serialize {} from {file}: {e}", record.key());
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiOperation, ApiTag, HttpMethod};

    const PETS: &str = r#"
openapi: 3.0.3
info: { title: Pets, version: "1" }
tags:
  - name: pets
paths:
  /pets/{id}:
    get:
      operationId: getPetById
      tags: [pets]
components:
  schemas:
    Pet:
      type: object
"#;

    fn project() -> (tempfile::TempDir, SpecIndex) {
        let dir = tempfile::tempdir().unwrap();
        let index = SpecIndex::new(dir.path(), &IndexConfig::default());
        (dir, index)
    }

    #[test]
    fn test_index_file_and_lookup() {
        let (dir, index) = project();
        fs::write(dir.path().join("pets.yaml"), PETS).unwrap();

        assert_eq!(index.index_file(Path::new("pets.yaml")), 3);
        let records = index.lookup(ElementKind::Operation, "getPetById");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_path, "pets.yaml");
        let SpecElement::Operation(op) = &records[0].element else {
            panic!("expected operation");
        };
        assert_eq!(op.path, "/pets/{id}");
        assert_eq!(op.method, HttpMethod::Get);

        assert_eq!(index.lookup(ElementKind::Tag, "pets").len(), 1);
        assert_eq!(index.lookup(ElementKind::Component, "Pet").len(), 1);
        assert!(index.lookup(ElementKind::Component, "Owner").is_empty());
    }

    #[test]
    fn test_reindexing_is_idempotent() {
        let (dir, index) = project();
        fs::write(dir.path().join("pets.yaml"), PETS).unwrap();
        index.index_file(Path::new("pets.yaml"));
        let keys = index.keys();
        index.index_file(Path::new("pets.yaml"));
        assert_eq!(index.keys(), keys);
        assert_eq!(index.record_count(), 3);
    }

    #[test]
    fn test_edit_replaces_previous_records() {
        let (dir, index) = project();
        let file = dir.path().join("pets.yaml");
        fs::write(&file, PETS).unwrap();
        index.index_file(&file);
        fs::write(&file, PETS.replace("getPetById", "fetchPet")).unwrap();
        index.index_file(&file);

        assert!(index.lookup(ElementKind::Operation, "getPetById").is_empty());
        assert_eq!(index.lookup(ElementKind::Operation, "fetchPet").len(), 1);
    }

    #[test]
    fn test_deleted_file_is_dropped() {
        let (dir, index) = project();
        let file = dir.path().join("pets.yaml");
        fs::write(&file, PETS).unwrap();
        index.index_file(&file);
        fs::remove_file(&file).unwrap();
        assert_eq!(index.index_file(&file), 0);
        assert!(index.files().is_empty());
    }

    #[test]
    fn test_duplicate_identifiers_return_every_record() {
        let (_dir, index) = project();
        let op = || SpecElement::Operation(ApiOperation::new("/a", HttpMethod::Get, "dup"));
        index.index_elements(Path::new("a.yaml"), vec![op()]);
        index.index_elements(Path::new("b.yaml"), vec![op()]);

        let files: Vec<String> = index
            .lookup(ElementKind::Operation, "dup")
            .into_iter()
            .map(|r| r.file_path)
            .collect();
        assert_eq!(files, vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_unreadable_record_is_skipped() {
        let (_dir, index) = project();
        index.index_elements(
            Path::new("a.yaml"),
            vec![SpecElement::Tag(ApiTag {
                name: "pets".to_string(),
            })],
        );
        index.state.write().unwrap().replace(
            "b.yaml",
            FileEntry {
                records: vec![("tags:pets".to_string(), "{\"kind\":\"bogus\"}".to_string())],
                ..FileEntry::default()
            },
        );
        let records = index.lookup(ElementKind::Tag, "pets");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_path, "a.yaml");
    }

    #[test]
    fn test_reindex_project_skips_unchanged_and_excluded() {
        let (dir, index) = project();
        fs::write(dir.path().join("pets.yaml"), PETS).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a spec").unwrap();
        fs::create_dir_all(dir.path().join("node_modules/lib")).unwrap();
        fs::write(dir.path().join("node_modules/lib/api.yaml"), PETS).unwrap();

        let first = index.reindex_project();
        assert_eq!(first.indexed, 1);
        assert_eq!(index.files(), vec!["pets.yaml"]);
        assert_eq!(index.status(), IndexStatus::Ready);

        let second = index.reindex_project();
        assert_eq!(second.indexed, 0);
        assert_eq!(second.unchanged, 1);

        fs::remove_file(dir.path().join("pets.yaml")).unwrap();
        let third = index.reindex_project();
        assert_eq!(third.removed, 1);
        assert_eq!(index.record_count(), 0);
    }

    #[test]
    fn test_referenced_file_edit_reindexes_the_referencing_file() {
        let (dir, index) = project();
        fs::write(
            dir.path().join("root.yaml"),
            "openapi: 3.0.0\ninfo: {title: t, version: '1'}\npaths:\n  /x:\n    $ref: 'other.yaml#/opName'\n",
        )
        .unwrap();
        let other = dir.path().join("other.yaml");
        fs::write(&other, "opName:\n  get:\n    operationId: opX\n").unwrap();
        index.reindex_project();
        assert_eq!(index.lookup(ElementKind::Operation, "opX").len(), 1);

        let unchanged = index.reindex_project();
        assert_eq!(unchanged.indexed, 0);

        fs::write(&other, "opName:\n  get:\n    operationId: opRenamed\n").unwrap();
        let summary = index.reindex_project();
        assert_eq!(summary.indexed, 2);
        assert!(index.lookup(ElementKind::Operation, "opX").is_empty());
        assert_eq!(index.lookup(ElementKind::Operation, "opRenamed").len(), 1);
    }

    #[test]
    fn test_removed_file_releases_its_lock() {
        let (dir, index) = project();
        let file = dir.path().join("pets.yaml");
        fs::write(&file, PETS).unwrap();
        index.index_file(&file);
        assert!(index.file_locks.lock().unwrap().contains_key("pets.yaml"));
        assert!(!index.store().is_empty());

        assert!(index.remove_file(&file));
        assert!(index.file_locks.lock().unwrap().is_empty());
        assert!(index.store().is_empty());
    }

    #[test]
    fn test_status_reports_building() {
        let (_dir, index) = project();
        assert_eq!(index.status(), IndexStatus::Ready);
        {
            let _building = index.begin_build();
            assert_eq!(index.status(), IndexStatus::Building);
        }
        assert_eq!(index.status(), IndexStatus::Ready);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (dir, index) = project();
        fs::write(dir.path().join("pets.yaml"), PETS).unwrap();
        index.reindex_project();
        let snapshot = dir.path().join(".oalink/index.json");
        index.save_snapshot(&snapshot).unwrap();

        let restored = SpecIndex::new(dir.path(), &IndexConfig::default());
        assert_eq!(restored.load_snapshot(&snapshot).unwrap(), 3);
        assert_eq!(restored.keys(), index.keys());
        // Hashes survive the snapshot, so nothing needs re-parsing.
        assert_eq!(restored.reindex_project().unchanged, 1);
        // The snapshot itself lives under an excluded directory.
        assert_eq!(restored.files(), vec!["pets.yaml"]);
    }

    #[test]
    fn test_snapshot_version_mismatch_is_rejected() {
        let (dir, index) = project();
        let snapshot = dir.path().join("index.json");
        fs::write(&snapshot, r#"{"version": 0, "files": {}}"#).unwrap();
        index.index_elements(
            Path::new("a.yaml"),
            vec![SpecElement::Tag(ApiTag {
                name: "kept".to_string(),
            })],
        );

        let err = index.load_snapshot(&snapshot).unwrap_err();
        assert!(matches!(
            err,
            IndexError::VersionMismatch {
                found: 0,
                expected: INDEX_VERSION
            }
        ));
        assert_eq!(index.lookup(ElementKind::Tag, "kept").len(), 1);
    }

    #[test]
    fn test_concurrent_updates_to_different_files() {
        let (dir, index) = project();
        for i in 0..8 {
            fs::write(
                dir.path().join(format!("api{i}.yaml")),
                PETS.replace("getPetById", &format!("op{i}")),
            )
            .unwrap();
        }
        std::thread::scope(|scope| {
            for i in 0..8 {
                let index = &index;
                scope.spawn(move || index.index_file(Path::new(&format!("api{i}.yaml"))));
            }
        });
        assert_eq!(index.files().len(), 8);
        assert_eq!(index.lookup(ElementKind::Tag, "pets").len(), 8);
        assert_eq!(index.lookup(ElementKind::Operation, "op3").len(), 1);
    }
}
