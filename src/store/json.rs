//! JSON-backed cookie store.
//!
//! `JsonCookieStore` persists **all documents'** cookie state in a single JSON
//! file on disk. It implements the [`CookieStore`] trait and returns documents
//! wrapped in [`PersistentCookieDocument`], so that **every mutation** to a
//! document triggers a snapshot write back to this store.
//!
//! ### Design
//! - One file for all documents
//!   (`CookieStoreFile { documents: HashMap<DocumentId, DefaultCookieDocument> }`).
//! - In-memory cache: `documents: RwLock<HashMap<DocumentId, DocumentHandle>>`
//!   for quick reuse.
//! - The store keeps a self handle (`store_self`) so the persistent documents
//!   can call back into `persist_document_from_snapshot`.
//!
//! ### Concurrency
//! - This type is internally synchronized via `RwLock`s and is `Send + Sync`
//!   behind a `CookieStoreHandle = Arc<dyn CookieStore + Send + Sync>`.
//! - Returned documents are `Arc<RwLock<_>>` and safe to share across threads.
//!
//! ### I/O characteristics & caveats
//! - `persist_document_from_snapshot` and `remove_document` **read then
//!   rewrite** the entire JSON file. For large datasets, consider the
//!   SQLite-backed store.
//! - File writes are not atomic.
//! - A file that fails to deserialize is treated as empty; I/O failures are
//!   logged and the affected operation becomes a no-op.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::document::{
    CookieDocument, CookieStoreHandle, DefaultCookieDocument, DocumentHandle, DocumentId,
    PersistentCookieDocument,
};
use crate::errors::CookieStoreError;
use crate::store::CookieStore;

/// On-disk representation of all documents' cookie state.
///
/// This is the JSON payload stored at `JsonCookieStore::path`.
#[derive(Debug, Serialize, Deserialize)]
struct CookieStoreFile {
    documents: HashMap<DocumentId, DefaultCookieDocument>,
}

impl CookieStoreFile {
    fn empty() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }
}

/// A JSON-based cookie store that persists cookies across sessions.
///
/// The store caches per-document state in memory and loads/saves it to a
/// single JSON file. Documents returned by this store are wrapped in
/// [`PersistentCookieDocument`], so that writes automatically trigger
/// persistence to disk.
pub struct JsonCookieStore {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,

    config: StoreConfig,

    /// Actual list of cookie documents per id
    documents: RwLock<HashMap<DocumentId, DocumentHandle>>,

    /// Self handle, so `PersistentCookieDocument` can call back into this store.
    ///
    /// This is initialized in [`new`](Self::new) and then read-only thereafter.
    store_self: RwLock<Option<CookieStoreHandle>>,
}

impl JsonCookieStore {
    /// Creates (or opens) a JSON cookie store at `path`.
    ///
    /// If the file does not exist, an empty structure is written to disk;
    /// failure to do so is logged and deferred to the first persist.
    pub fn new(path: PathBuf) -> Arc<Self> {
        Self::with_config(path, StoreConfig::default())
    }

    /// Creates (or opens) a JSON cookie store at `path` with a custom config.
    pub fn with_config(path: PathBuf, config: StoreConfig) -> Arc<Self> {
        if !path.exists() {
            if let Err(err) = serde_json::to_vec(&CookieStoreFile::empty())
                .map_err(CookieStoreError::from)
                .and_then(|contents| fs::write(&path, contents).map_err(CookieStoreError::from))
            {
                log::warn!("cannot seed cookie store file {}: {err}", path.display());
            }
        }

        let store = Arc::new(Self {
            path,
            config,
            documents: RwLock::new(HashMap::new()),
            store_self: RwLock::new(None),
        });

        {
            let mut self_ref = store.store_self.write().unwrap();
            *self_ref = Some(store.clone() as CookieStoreHandle);
        }

        store
    }

    /// Loads and deserializes the full cookie store file.
    ///
    /// Returns an empty structure if deserialization fails; only I/O errors
    /// are surfaced.
    fn load_file(&self) -> Result<CookieStoreFile, CookieStoreError> {
        let contents = fs::read_to_string(&self.path)?;

        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            log::warn!(
                "cookie store file {} is not valid JSON ({err}); starting empty",
                self.path.display()
            );
            CookieStoreFile::empty()
        }))
    }

    /// Serializes and writes the full cookie store file (pretty-printed).
    fn save_file(&self, store_file: &CookieStoreFile) -> Result<(), CookieStoreError> {
        let contents = serde_json::to_string_pretty(store_file)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl CookieStore for JsonCookieStore {
    /// Returns the cookie document handle for `document_id`, creating it if
    /// needed.
    ///
    /// Behavior:
    /// - If a document for `document_id` exists in the in-memory cache, it is
    ///   returned.
    /// - Otherwise, a serialized document is loaded from disk (if present) or
    ///   an empty [`DefaultCookieDocument`] is created.
    /// - That document is wrapped in a [`PersistentCookieDocument`] bound to
    ///   this store (via `store_self`) so that subsequent mutations persist
    ///   automatically.
    fn document_for(&self, document_id: DocumentId) -> Option<DocumentHandle> {
        {
            // Fast path: already in memory
            let documents = self.documents.read().unwrap();
            if let Some(document) = documents.get(&document_id) {
                return Some(document.clone());
            }

            if documents.len() >= self.config.max_documents {
                log::warn!(
                    "cookie document {document_id} not minted (store holds {}): {}",
                    documents.len(),
                    CookieStoreError::DocumentLimitExceeded
                );
                return None;
            }
        }

        // Load from disk
        let document = match self.load_file() {
            Ok(mut file) => file.documents.remove(&document_id).unwrap_or_default(),
            Err(err) => {
                log::warn!(
                    "cannot read cookie store file {}: {err}; starting {document_id} empty",
                    self.path.display()
                );
                DefaultCookieDocument::new()
            }
        };
        let inner: DocumentHandle = Arc::new(RwLock::new(document));

        let store_ref = self.store_self.read().unwrap();
        let store = store_ref.as_ref().expect("store_self not initialized").clone();

        // Wrap in PersistentCookieDocument
        let persistent: DocumentHandle = Arc::new(RwLock::new(PersistentCookieDocument::new(
            document_id,
            inner,
            store,
        )));

        self.documents
            .write()
            .unwrap()
            .insert(document_id, persistent.clone());

        Some(persistent)
    }

    /// Persists a snapshot of `document_id`'s state to disk.
    ///
    /// Called by [`PersistentCookieDocument`] after each mutation. This method
    /// reads the current file, updates/replaces the document entry, and writes
    /// the file back. Failures are logged, never raised.
    fn persist_document_from_snapshot(
        &self,
        document_id: DocumentId,
        snapshot: &DefaultCookieDocument,
    ) {
        let result = self.load_file().and_then(|mut file| {
            file.documents.insert(document_id, snapshot.clone());
            self.save_file(&file)
        });

        if let Err(err) = result {
            log::warn!("cannot persist cookie document {document_id}: {err}");
        }
    }

    /// Removes `document_id` from both the in-memory cache and the on-disk
    /// file.
    fn remove_document(&self, document_id: DocumentId) {
        self.documents.write().unwrap().remove(&document_id);

        let result = self.load_file().and_then(|mut file| {
            file.documents.remove(&document_id);
            self.save_file(&file)
        });

        if let Err(err) = result {
            log::warn!("cannot remove cookie document {document_id} from disk: {err}");
        }
    }

    /// Persists **all** in-memory documents to disk by snapshotting them.
    ///
    /// Only documents of type [`PersistentCookieDocument`] that wrap a
    /// [`DefaultCookieDocument`] are snapshotted here. This avoids
    /// double-wrapping and keeps the format stable.
    fn persist_all(&self) {
        let documents = self.documents.read().unwrap();

        let mut file = match self.load_file() {
            Ok(file) => file,
            Err(err) => {
                log::warn!(
                    "cannot read cookie store file {}: {err}; rewriting from memory",
                    self.path.display()
                );
                CookieStoreFile::empty()
            }
        };

        for (document_id, handle) in documents.iter() {
            if let Ok(document) = handle.read() {
                if let Some(persistent) =
                    document.as_any().downcast_ref::<PersistentCookieDocument>()
                {
                    if let Ok(inner) = persistent.inner.read() {
                        if let Some(default) = inner.as_any().downcast_ref::<DefaultCookieDocument>()
                        {
                            file.documents.insert(*document_id, default.clone());
                        }
                    }
                }
            }
        }

        if let Err(err) = self.save_file(&file) {
            log::warn!("cannot persist cookie store file {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CookieDocument;
    use crate::script::ScriptCookies;
    use tempfile::TempDir;

    #[test]
    fn cookies_survive_a_store_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        let id = DocumentId::new();

        {
            let store = JsonCookieStore::new(path.clone());
            let document = store.document_for(id).unwrap();
            let cookies = ScriptCookies::new(document);
            cookies.set_cookie("theme", "dark", 24.0);
        }

        let store = JsonCookieStore::new(path);
        let document = store.document_for(id).unwrap();
        let cookies = ScriptCookies::new(document);

        assert_eq!(cookies.get_cookie("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn documents_are_isolated_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();

        {
            let store = JsonCookieStore::new(path.clone());
            ScriptCookies::new(store.document_for(id1).unwrap()).set_cookie("a", "1", 1.0);
            ScriptCookies::new(store.document_for(id2).unwrap()).set_cookie("b", "2", 1.0);
        }

        let store = JsonCookieStore::new(path);
        let cookies = ScriptCookies::new(store.document_for(id1).unwrap());

        assert_eq!(cookies.get_cookie("a").as_deref(), Some("1"));
        assert_eq!(cookies.get_cookie("b"), None);
    }

    #[test]
    fn remove_document_purges_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        let id = DocumentId::new();

        {
            let store = JsonCookieStore::new(path.clone());
            ScriptCookies::new(store.document_for(id).unwrap()).set_cookie("theme", "dark", 24.0);
            store.remove_document(id);
        }

        let store = JsonCookieStore::new(path);
        let cookies = ScriptCookies::new(store.document_for(id).unwrap());

        assert_eq!(cookies.get_cookie("theme"), None);
    }

    #[test]
    fn persist_all_recreates_a_deleted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        let id = DocumentId::new();

        let store = JsonCookieStore::new(path.clone());
        ScriptCookies::new(store.document_for(id).unwrap()).set_cookie("theme", "dark", 24.0);

        std::fs::remove_file(&path).unwrap();
        store.persist_all();

        let reopened = JsonCookieStore::new(path);
        let cookies = ScriptCookies::new(reopened.document_for(id).unwrap());
        assert_eq!(cookies.get_cookie("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn a_corrupt_file_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "definitely { not json").unwrap();

        let store = JsonCookieStore::new(path);
        let document = store.document_for(DocumentId::new()).unwrap();

        assert_eq!(document.read().unwrap().cookie_string(), "");
    }
}
