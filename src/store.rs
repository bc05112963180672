//! Cookie store infrastructure.
//!
//! A **cookie store** is a provisioner and persistence layer for per-document
//! cookie state.
//! - A scripting surface only *holds a [`DocumentHandle`]*, never a store.
//! - A **CookieStore** can *mint* a document for a given [`DocumentId`] and
//!   optionally persist/flush all documents in one place (e.g., a single JSON
//!   file or SQLite DB).
//!
//! Typical usage patterns:
//! - Mint a document at build time and hand the handle to
//!   [`ScriptCookies`](crate::ScriptCookies).
//! - For ephemeral/private documents, use [`InMemoryCookieStore`] (or skip
//!   stores entirely and build a
//!   [`DefaultCookieDocument`](crate::DefaultCookieDocument) directly).
//!
//! This module exports three reference implementations:
//! - [`InMemoryCookieStore`]: cache only, nothing touches disk.
//! - [`JsonCookieStore`]: file-backed JSON store (good for simple setups).
//! - [`SqliteCookieStore`]: SQLite-backed store (good for concurrency and
//!   scale; behind the `sqlite_cookie_store` feature).
//!
//! ## Design notes
//! - Stores are *only used at provisioning time* to obtain a document handle.
//! - Implementations should be `Send + Sync` and safe for concurrent access.
//! - `CookieStore::document_for(document_id)` should return the *same logical
//!   document instance* for an id for the lifetime of the store, so all
//!   handles observe consistent state.
//!
//! ## Example: persistent cookies for one document
//! ```rust,no_run
//! use document_cookies::{DocumentId, JsonCookieStore, ScriptCookies};
//! use document_cookies::store::CookieStore;
//!
//! let store = JsonCookieStore::new("cookies.json".into());
//! let document_id = DocumentId::new();
//!
//! let document = store.document_for(document_id).expect("document");
//! let cookies = ScriptCookies::new(document);
//! cookies.set_cookie("theme", "dark", 24.0);
//! ```

mod in_memory;
mod json;
#[cfg(feature = "sqlite_cookie_store")]
mod sqlite;

use crate::document::{DefaultCookieDocument, DocumentHandle, DocumentId};

/// Cache-only cookie store (nothing is persisted).
pub use in_memory::InMemoryCookieStore;
/// File-backed JSON cookie store (one file for all documents).
pub use json::JsonCookieStore;
/// SQLite-backed cookie store (one database for all documents).
#[cfg(feature = "sqlite_cookie_store")]
pub use sqlite::SqliteCookieStore;

/// A cookie **store** mints per-document cookie state and (optionally)
/// persists it.
///
/// Scripting surfaces never hold a `CookieStore`; they only hold a
/// [`DocumentHandle`]. The store exists to:
/// 1) provide the document for a given [`DocumentId`], and
/// 2) write/read cookie state to/from durable storage.
///
/// Implementations must be `Send + Sync` and safe for concurrent use.
pub trait CookieStore: Send + Sync {
    /// Returns (or creates and returns) the cookie document handle for
    /// `document_id`.
    ///
    /// ### Expectations
    /// - Should return the *same logical document instance* for a given
    ///   `document_id` across calls, so all holders observe consistent state.
    /// - May create the document lazily on first request.
    /// - Return `None` if the store refuses provisioning (e.g., the
    ///   configured document limit is reached) or a document was removed.
    fn document_for(&self, document_id: DocumentId) -> Option<DocumentHandle>;

    /// Persists the cookie state for `document_id` from a provided snapshot.
    ///
    /// This allows callers to push the current in-memory state (captured in
    /// a [`DefaultCookieDocument`] snapshot) into the store without requiring
    /// the store to hold a direct reference to the live document.
    ///
    /// This should be **best-effort** and must not panic.
    fn persist_document_from_snapshot(
        &self,
        document_id: DocumentId,
        snapshot: &DefaultCookieDocument,
    );

    /// Removes all persisted cookie data for `document_id` from the store.
    ///
    /// Implementations should also drop any internal cache for this document
    /// so that subsequent calls to [`CookieStore::document_for`] can recreate
    /// a fresh, empty document.
    ///
    /// This operation should be **idempotent** and must not panic.
    fn remove_document(&self, document_id: DocumentId);

    /// Persists all known documents to durable storage.
    ///
    /// Called during graceful shutdown or at explicit flush points.
    /// Implementations should make a **best-effort** to write all dirty state
    /// and avoid panicking.
    fn persist_all(&self);
}
