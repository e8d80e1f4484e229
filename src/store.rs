use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use thiserror::Error;

pub type Fields = Map<String, Value>;

pub const PUBLIC_DATA: [&str; 2] = ["public", "data"];
pub const ADMINS_COLLECTION: &str = "admins";
pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Fixed sub-collections under a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DivisionCollection {
    Rankings,
    Fixtures,
    Teams,
}

impl DivisionCollection {
    pub fn segment(self) -> &'static str {
        match self {
            DivisionCollection::Rankings => "Rankings",
            DivisionCollection::Fixtures => "Fixtures",
            DivisionCollection::Teams => "Teams",
        }
    }
}

/// Slash-free path segments addressing one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(Vec<String>);

impl CollectionPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// `artifacts/{app}/public/data/{name}`
    pub fn app_data(app_id: &str, name: &str) -> Self {
        Self::new(["artifacts", app_id, PUBLIC_DATA[0], PUBLIC_DATA[1], name])
    }

    /// `artifacts/{app}/public/data/{state}/{division}/{kind}`; the state is
    /// stored lowercased.
    pub fn division(app_id: &str, state: &str, division: &str, kind: DivisionCollection) -> Self {
        let state = state.to_lowercase();
        Self::new([
            "artifacts",
            app_id,
            PUBLIC_DATA[0],
            PUBLIC_DATA[1],
            state.as_str(),
            division,
            kind.segment(),
        ])
    }

    pub fn admins() -> Self {
        Self::new([ADMINS_COLLECTION])
    }

    pub fn users() -> Self {
        Self::new([USERS_COLLECTION])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not signed in")]
    Unauthenticated,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("store closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Snapshot(Vec<Document>),
    Failed(StoreError),
}

/// Cancellation token for a store watch. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct WatchHandle {
    cancelled: Arc<AtomicBool>,
}

impl WatchHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The capabilities the app needs from a hierarchical document store.
pub trait DocumentStore: Send + Sync {
    fn list(&self, path: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Document>, StoreError>;

    /// Creates a document, generating an id when `id` is `None`. Returns the id.
    fn create(
        &self,
        path: &CollectionPath,
        id: Option<&str>,
        fields: Fields,
    ) -> Result<String, StoreError>;

    /// Writes the given fields, keeping any others (creates when missing).
    fn merge(&self, path: &CollectionPath, id: &str, fields: Fields) -> Result<(), StoreError>;

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError>;

    /// Pushes the current documents into `tx`, then a fresh snapshot on every
    /// change until the handle is cancelled or the receiver hangs up. A
    /// failure is sent once as [`WatchEvent::Failed`] and ends the watch.
    fn watch(
        &self,
        path: &CollectionPath,
        tx: Sender<WatchEvent>,
    ) -> Result<WatchHandle, StoreError>;

    /// Identity token for subsequent requests. Stores without access control
    /// ignore it.
    fn set_session_token(&self, _token: Option<String>) {}
}

struct Watcher {
    path: CollectionPath,
    tx: Sender<WatchEvent>,
    handle: WatchHandle,
}

/// In-process store. Backs sample mode and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<CollectionPath, Vec<Document>>>,
    watchers: Mutex<Vec<Watcher>>,
    fail_next: Mutex<Option<StoreError>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a whole collection and notifies its watchers.
    pub fn publish(&self, path: &CollectionPath, docs: Vec<Document>) {
        {
            let mut guard = self.collections.lock().expect("memory store lock poisoned");
            guard.insert(path.clone(), docs);
        }
        self.notify(path);
    }

    pub fn insert(&self, path: &CollectionPath, doc: Document) {
        {
            let mut guard = self.collections.lock().expect("memory store lock poisoned");
            let docs = guard.entry(path.clone()).or_default();
            match docs.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => *existing = doc,
                None => docs.push(doc),
            }
        }
        self.notify(path);
    }

    /// The next `list`, `get` or `watch` call fails with `err`.
    pub fn fail_next(&self, err: StoreError) {
        let mut guard = self.fail_next.lock().expect("memory store lock poisoned");
        *guard = Some(err);
    }

    /// Ends every live watch on `path` with a failure.
    pub fn break_watchers(&self, path: &CollectionPath, err: StoreError) {
        let mut guard = self.watchers.lock().expect("memory store lock poisoned");
        guard.retain(|w| {
            if w.handle.is_cancelled() {
                return false;
            }
            if w.path != *path {
                return true;
            }
            let _ = w.tx.send(WatchEvent::Failed(err.clone()));
            false
        });
    }

    pub fn watcher_count(&self) -> usize {
        let mut guard = self.watchers.lock().expect("memory store lock poisoned");
        guard.retain(|w| !w.handle.is_cancelled());
        guard.len()
    }

    fn take_failure(&self) -> Option<StoreError> {
        self.fail_next
            .lock()
            .expect("memory store lock poisoned")
            .take()
    }

    fn snapshot(&self, path: &CollectionPath) -> Vec<Document> {
        self.collections
            .lock()
            .expect("memory store lock poisoned")
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Lock order is watchers, then collections, as in `watch`. Taking the
    /// snapshot under the watcher lock keeps sends in commit order.
    fn notify(&self, path: &CollectionPath) {
        let mut guard = self.watchers.lock().expect("memory store lock poisoned");
        let docs = self.snapshot(path);
        guard.retain(|w| {
            if w.handle.is_cancelled() {
                return false;
            }
            if w.path != *path {
                return true;
            }
            w.tx.send(WatchEvent::Snapshot(docs.clone())).is_ok()
        });
    }

    fn generate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("doc{n:06}")
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self, path: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(self.snapshot(path))
    }

    fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Document>, StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(self.snapshot(path).into_iter().find(|d| d.id == id))
    }

    fn create(
        &self,
        path: &CollectionPath,
        id: Option<&str>,
        fields: Fields,
    ) -> Result<String, StoreError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.generate_id(),
        };
        self.insert(path, Document::new(id.clone(), fields));
        Ok(id)
    }

    fn merge(&self, path: &CollectionPath, id: &str, fields: Fields) -> Result<(), StoreError> {
        let merged = {
            let guard = self.collections.lock().expect("memory store lock poisoned");
            let mut base = guard
                .get(path)
                .and_then(|docs| docs.iter().find(|d| d.id == id))
                .map(|d| d.fields.clone())
                .unwrap_or_default();
            base.extend(fields);
            base
        };
        self.insert(path, Document::new(id, merged));
        Ok(())
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError> {
        {
            let mut guard = self.collections.lock().expect("memory store lock poisoned");
            if let Some(docs) = guard.get_mut(path) {
                docs.retain(|d| d.id != id);
            }
        }
        self.notify(path);
        Ok(())
    }

    fn watch(
        &self,
        path: &CollectionPath,
        tx: Sender<WatchEvent>,
    ) -> Result<WatchHandle, StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let handle = WatchHandle::new();
        let mut guard = self.watchers.lock().expect("memory store lock poisoned");
        // Initial snapshot is sent under the watcher lock so no mutation can
        // slip in between it and registration.
        if tx.send(WatchEvent::Snapshot(self.snapshot(path))).is_err() {
            return Err(StoreError::Closed);
        }
        guard.push(Watcher {
            path: path.clone(),
            tx,
            handle: handle.clone(),
        });
        Ok(handle)
    }
}
