use crate::document::cookie_document::{CookieDocument, DefaultCookieDocument};
use crate::document::cookies::{Cookie, CookieStoreHandle, DocumentHandle, DocumentId};
use anyhow::{bail, Result};

/// A `CookieDocument` decorator that persists changes after each mutation.
///
/// This type is *transparent* for reads but *eagerly* persists after writes.
pub struct PersistentCookieDocument {
    /// Document ID associated with this state (used to address the store).
    document_id: DocumentId,
    /// Inner cookie document that holds the actual cookie state.
    pub inner: DocumentHandle,
    /// Handle to the cookie store responsible for persistence.
    store_handle: CookieStoreHandle,
}

impl PersistentCookieDocument {
    /// Creates a new persistence-enabled wrapper around an existing document.
    ///
    /// The store will be used to persist snapshots after each mutation.
    pub fn new(
        document_id: DocumentId,
        document: DocumentHandle,
        store_handle: CookieStoreHandle,
    ) -> Self {
        Self {
            document_id,
            inner: document,
            store_handle,
        }
    }

    /// Snapshots the inner document and persists it to the backing store.
    ///
    /// Persistence is best-effort: if the inner document is not a
    /// [`DefaultCookieDocument`] (or its lock is poisoned), the snapshot is
    /// skipped and a warning is logged.
    fn persist(&self) {
        let snapshot = {
            let Ok(inner) = self.inner.read() else {
                log::warn!(
                    "cookie document {} lock poisoned; skipping persistence",
                    self.document_id
                );
                return;
            };
            match inner.as_any().downcast_ref::<DefaultCookieDocument>() {
                Some(document) => document.clone(),
                None => {
                    log::warn!(
                        "cookie document {} is not snapshot-capable; skipping persistence",
                        self.document_id
                    );
                    return;
                }
            }
        };

        self.store_handle
            .persist_document_from_snapshot(self.document_id, &snapshot);
    }
}

impl CookieDocument for PersistentCookieDocument {
    /// Returns a type-erased reference to this document (the wrapper itself).
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    /// Applies one serialized entry, then persists the updated state.
    fn write(&mut self, entry: &str) -> Result<()> {
        {
            let Ok(mut inner) = self.inner.write() else {
                bail!("cookie document {} lock poisoned", self.document_id);
            };
            inner.write(entry)?;
        }
        self.persist();
        Ok(())
    }

    /// Serializes the live cookies without persisting.
    fn cookie_string(&self) -> String {
        match self.inner.read() {
            Ok(inner) => inner.cookie_string(),
            Err(_) => String::new(),
        }
    }

    /// Returns all live cookies (for debugging/inspection) without persisting.
    fn cookies(&self) -> Vec<Cookie> {
        match self.inner.read() {
            Ok(inner) => inner.cookies(),
            Err(_) => Vec::new(),
        }
    }

    /// Removes a single cookie by name, then persists the updated state.
    fn remove_cookie(&mut self, name: &str) {
        if let Ok(mut inner) = self.inner.write() {
            inner.remove_cookie(name);
        }
        self.persist();
    }

    /// Clears all cookies in the document, then persists the updated state.
    fn clear(&mut self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.clear();
        }
        self.persist();
    }
}
