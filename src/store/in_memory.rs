use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::StoreConfig;
use crate::document::{DefaultCookieDocument, DocumentHandle, DocumentId};
use crate::errors::CookieStoreError;
use crate::store::CookieStore;

pub struct InMemoryCookieStore {
    config: StoreConfig,
    /// Cookie documents per id
    documents: RwLock<HashMap<DocumentId, DocumentHandle>>,
}

impl InMemoryCookieStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieStore for InMemoryCookieStore {
    fn document_for(&self, document_id: DocumentId) -> Option<DocumentHandle> {
        let mut documents = self.documents.write().unwrap();

        if let Some(handle) = documents.get(&document_id) {
            return Some(handle.clone());
        }

        if documents.len() >= self.config.max_documents {
            log::warn!(
                "cookie document {document_id} not minted (store holds {}): {}",
                documents.len(),
                CookieStoreError::DocumentLimitExceeded
            );
            return None;
        }

        let handle: DocumentHandle = Arc::new(RwLock::new(DefaultCookieDocument::new()));
        documents.insert(document_id, handle.clone());
        Some(handle)
    }

    fn persist_document_from_snapshot(
        &self,
        _document_id: DocumentId,
        _snapshot: &DefaultCookieDocument,
    ) {
    }

    fn remove_document(&self, document_id: DocumentId) {
        self.documents.write().unwrap().remove(&document_id);
    }

    fn persist_all(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CookieDocument;

    #[test]
    fn same_document_returns_same_handle() {
        let store = InMemoryCookieStore::new();
        let id = DocumentId::new();

        let a = store.document_for(id).unwrap();
        let b = store.document_for(id).unwrap();

        // Same Arc target
        assert!(Arc::ptr_eq(&a, &b));

        // A cookie written through one handle is visible through the other
        a.write().unwrap().write("theme=dark").unwrap();
        assert_eq!(b.read().unwrap().cookie_string(), "theme=dark");
    }

    #[test]
    fn different_documents_get_different_handles() {
        let store = InMemoryCookieStore::new();
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();

        let a = store.document_for(id1).unwrap();
        let b = store.document_for(id2).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));

        a.write().unwrap().write("theme=dark").unwrap();
        assert_eq!(b.read().unwrap().cookie_string(), "");
    }

    #[test]
    fn remove_document_drops_only_that_document() {
        let store = InMemoryCookieStore::new();
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();

        let a = store.document_for(id1).unwrap();
        let _b = store.document_for(id2).unwrap();

        store.remove_document(id1);

        // id1 should allocate a fresh document now
        let a2 = store.document_for(id1).unwrap();
        assert!(!Arc::ptr_eq(&a, &a2));
    }

    #[test]
    fn minting_beyond_the_configured_limit_is_refused() {
        let store = InMemoryCookieStore::with_config(StoreConfig { max_documents: 2 });

        let id1 = DocumentId::new();
        let id2 = DocumentId::new();

        assert!(store.document_for(id1).is_some());
        assert!(store.document_for(id2).is_some());
        assert!(store.document_for(DocumentId::new()).is_none());

        // Existing documents are still served at capacity.
        assert!(store.document_for(id1).is_some());

        // Removing one frees a slot.
        store.remove_document(id2);
        assert!(store.document_for(DocumentId::new()).is_some());
    }
}
