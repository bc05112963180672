//! SQLite-backed cookie store.
//!
//! `SqliteCookieStore` persists **all documents'** cookie state in a single
//! SQLite database. It implements the [`CookieStore`] trait and returns
//! documents wrapped in a [`PersistentCookieDocument`], so that **every
//! mutation** to a document triggers a snapshot write back to this store.
//!
//! ## Design
//! - One **table** (`cookies`) for all documents; each row is a single cookie.
//! - In-memory cache: `documents: RwLock<HashMap<DocumentId, DocumentHandle>>`
//!   for quick reuse.
//! - The store keeps a self handle (`store_self`) so persistent documents can
//!   call back into `persist_document_from_snapshot`.
//! - Database access is via an `r2d2` pool for safe multi-threaded use.
//!
//! ## Concurrency
//! - The store is internally synchronized with `RwLock` and intended to be
//!   used behind a `CookieStoreHandle = Arc<dyn CookieStore + Send + Sync>`.
//! - Each document handle returned is an `Arc<RwLock<...>>` and may be shared
//!   safely across threads.
//!
//! ## I/O characteristics & caveats
//! - `save_document` **rewrites** the set of cookies for a document
//!   (DELETE + INSERT) in one transaction.
//! - Trait-level operations are best-effort: database errors are logged and
//!   the operation becomes a no-op.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::params;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::StoreConfig;
use crate::document::{
    Cookie, CookieDocument, CookieStoreHandle, DefaultCookieDocument, DocumentHandle, DocumentId,
    PersistentCookieDocument,
};
use crate::errors::CookieStoreError;
use crate::store::CookieStore;

fn db_err(err: impl std::fmt::Display) -> CookieStoreError {
    CookieStoreError::Database(err.to_string())
}

/// A SQLite-based cookie store that persists cookies across sessions.
///
/// Creates per-document state on demand, caches it in memory, and snapshots it
/// back to SQLite after each mutation (via [`PersistentCookieDocument`]).
pub struct SqliteCookieStore {
    /// Connection pool for SQLite database (so it can run multithreaded)
    pool: Pool<SqliteConnectionManager>,

    config: StoreConfig,

    /// Cookie documents per id
    documents: RwLock<HashMap<DocumentId, DocumentHandle>>,

    /// Self handle provided to persistent documents for callback persistence.
    store_self: RwLock<Option<CookieStoreHandle>>,
}

impl SqliteCookieStore {
    /// Opens (or creates) a SQLite database at `path` and ensures the schema
    /// exists.
    ///
    /// Returns an `Arc<Self>` ready to be used as a `CookieStoreHandle`.
    ///
    /// # Errors
    /// Fails when the pool cannot be created or the `cookies` table cannot be
    /// set up.
    pub fn new(path: PathBuf) -> Result<Arc<Self>, CookieStoreError> {
        Self::with_config(path, StoreConfig::default())
    }

    /// Like [`new`](Self::new), with a custom store config.
    pub fn with_config(
        path: PathBuf,
        config: StoreConfig,
    ) -> Result<Arc<Self>, CookieStoreError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager).map_err(db_err)?;

        {
            let conn = pool.get().map_err(db_err)?;
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS cookies (
                    document_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    value TEXT NOT NULL,
                    expires TEXT,
                    PRIMARY KEY (document_id, name)
                );",
            )
            .map_err(db_err)?;
        }

        let store = Arc::new(Self {
            pool,
            config,
            documents: RwLock::new(HashMap::new()),
            store_self: RwLock::new(None),
        });

        {
            let mut self_ref = store.store_self.write().unwrap();
            *self_ref = Some(store.clone() as CookieStoreHandle);
        }

        Ok(store)
    }

    /// Borrows a pooled SQLite connection.
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, CookieStoreError> {
        self.pool.get().map_err(db_err)
    }

    /// Loads all cookies for `document_id` from the database into a new
    /// [`DefaultCookieDocument`].
    fn load_document(
        &self,
        document_id: DocumentId,
    ) -> Result<DefaultCookieDocument, CookieStoreError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT name, value, expires FROM cookies
                 WHERE document_id = ?1 ORDER BY name",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map([document_id.to_string()], |row| {
                let expires: Option<String> = row.get(2)?;
                Ok(Cookie {
                    name: row.get(0)?,
                    value: row.get(1)?,
                    expires: expires
                        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                        .map(|at| at.with_timezone(&Utc)),
                })
            })
            .map_err(db_err)?;

        let mut document = DefaultCookieDocument::new();
        for row in rows {
            match row {
                Ok(cookie) => document.entries.push(cookie),
                Err(err) => log::warn!("skipping unreadable cookie row: {err}"),
            }
        }

        Ok(document)
    }

    /// Replaces all cookies for `document_id` with the contents of `document`
    /// in a transaction (DELETE the existing rows, INSERT the new set).
    fn save_document(
        &self,
        document_id: DocumentId,
        document: &DefaultCookieDocument,
    ) -> Result<(), CookieStoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;

        tx.execute(
            "DELETE FROM cookies WHERE document_id = ?1",
            [document_id.to_string()],
        )
        .map_err(db_err)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO cookies (document_id, name, value, expires)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(db_err)?;

            for cookie in &document.entries {
                stmt.execute(params![
                    document_id.to_string(),
                    cookie.name,
                    cookie.value,
                    cookie.expires.map(|at| at.to_rfc3339()),
                ])
                .map_err(db_err)?;
            }
        }

        tx.commit().map_err(db_err)?;
        Ok(())
    }

    /// Deletes all cookies for `document_id` from the database.
    fn remove_document_from_db(&self, document_id: DocumentId) -> Result<(), CookieStoreError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM cookies WHERE document_id = ?1",
            [document_id.to_string()],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

impl CookieStore for SqliteCookieStore {
    /// Returns the cookie document handle for `document_id`, creating it if
    /// needed.
    ///
    /// Behavior:
    /// - If a document for `document_id` exists in the in-memory cache, it is
    ///   returned.
    /// - Otherwise, its cookies are loaded from SQLite (if present) or an
    ///   empty [`DefaultCookieDocument`] is created.
    /// - That document is wrapped in a [`PersistentCookieDocument`] bound to
    ///   this store (via `store_self`) so that subsequent mutations persist
    ///   automatically.
    fn document_for(&self, document_id: DocumentId) -> Option<DocumentHandle> {
        {
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

        let document = match self.load_document(document_id) {
            Ok(document) => document,
            Err(err) => {
                log::warn!("cannot load cookie document {document_id}: {err}; starting empty");
                DefaultCookieDocument::new()
            }
        };
        let inner: DocumentHandle = Arc::new(RwLock::new(document));

        let store_ref = self.store_self.read().unwrap();
        let store = store_ref
            .as_ref()
            .expect("store_self not initialized")
            .clone();

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

    /// Persists a snapshot of `document_id`'s state to SQLite.
    ///
    /// Called by [`PersistentCookieDocument`] after each mutation.
    fn persist_document_from_snapshot(
        &self,
        document_id: DocumentId,
        snapshot: &DefaultCookieDocument,
    ) {
        if let Err(err) = self.save_document(document_id, snapshot) {
            log::warn!("cannot persist cookie document {document_id}: {err}");
        }
    }

    /// Removes `document_id` from both the in-memory cache and the database.
    fn remove_document(&self, document_id: DocumentId) {
        self.documents.write().unwrap().remove(&document_id);

        if let Err(err) = self.remove_document_from_db(document_id) {
            log::warn!("cannot remove cookie document {document_id} from database: {err}");
        }
    }

    /// Persists **all** in-memory documents to SQLite by snapshotting them.
    ///
    /// Only documents of type [`PersistentCookieDocument`] that wrap a
    /// [`DefaultCookieDocument`] are snapshotted here to keep the on-disk
    /// format stable.
    fn persist_all(&self) {
        let documents = self.documents.read().unwrap();

        for (document_id, handle) in documents.iter() {
            if let Ok(document) = handle.read() {
                if let Some(persistent) =
                    document.as_any().downcast_ref::<PersistentCookieDocument>()
                {
                    if let Ok(inner) = persistent.inner.read() {
                        if let Some(default) = inner.as_any().downcast_ref::<DefaultCookieDocument>()
                        {
                            if let Err(err) = self.save_document(*document_id, default) {
                                log::warn!(
                                    "cannot persist cookie document {document_id}: {err}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptCookies;
    use tempfile::TempDir;

    #[test]
    fn cookies_survive_a_store_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.sqlite");
        let id = DocumentId::new();

        {
            let store = SqliteCookieStore::new(path.clone()).unwrap();
            let cookies = ScriptCookies::new(store.document_for(id).unwrap());
            cookies.set_cookie("theme", "dark", 24.0);
            cookies.set_cookie("lang", "en", 24.0);
        }

        let store = SqliteCookieStore::new(path).unwrap();
        let cookies = ScriptCookies::new(store.document_for(id).unwrap());

        assert_eq!(cookies.get_cookie("theme").as_deref(), Some("dark"));
        assert_eq!(cookies.get_cookie("lang").as_deref(), Some("en"));
    }

    #[test]
    fn same_document_is_cached() {
        let dir = TempDir::new().unwrap();
        let store = SqliteCookieStore::new(dir.path().join("cookies.sqlite")).unwrap();
        let id = DocumentId::new();

        let a = store.document_for(id).unwrap();
        let b = store.document_for(id).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn deleted_cookies_stay_deleted_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.sqlite");
        let id = DocumentId::new();

        {
            let store = SqliteCookieStore::new(path.clone()).unwrap();
            let cookies = ScriptCookies::new(store.document_for(id).unwrap());
            cookies.set_cookie("theme", "dark", 24.0);
            cookies.delete_cookie("theme");
        }

        let store = SqliteCookieStore::new(path).unwrap();
        let cookies = ScriptCookies::new(store.document_for(id).unwrap());

        assert_eq!(cookies.get_cookie("theme"), None);
    }

    #[test]
    fn remove_document_purges_the_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.sqlite");
        let id = DocumentId::new();

        {
            let store = SqliteCookieStore::new(path.clone()).unwrap();
            ScriptCookies::new(store.document_for(id).unwrap()).set_cookie("theme", "dark", 24.0);
            store.remove_document(id);
        }

        let store = SqliteCookieStore::new(path).unwrap();
        let cookies = ScriptCookies::new(store.document_for(id).unwrap());

        assert_eq!(cookies.get_cookie("theme"), None);
    }
}
