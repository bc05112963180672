//! Cookie core types.
//!
//! This module defines the **type-erased handles** used throughout the crate,
//! the serializable [`Cookie`] data structure and the cookie-date helpers.
//!
//! # Concurrency model
//! - [`DocumentHandle`] is `Arc<RwLock<dyn CookieDocument + Send + Sync>>`.
//!   - Callers take a **read lock** for non-mutating operations and a **write lock**
//!     for mutating operations on the underlying document.
//! - [`CookieStoreHandle`] is `Arc<dyn CookieStore + Send + Sync>`.
//!   - Stores are expected to manage their **own internal synchronization** (e.g. via
//!     `RwLock`, connection pools, etc.). The trait methods take `&self`.
//!
//! # Typical usage
//! ```ignore
//! // Serialize the live cookies of a document
//! let document = store.document_for(document_id)?; // -> DocumentHandle
//! let cookie_string = {
//!     let guard = document.read().unwrap();
//!     guard.cookie_string()
//! };
//!
//! // Apply one serialized entry
//! {
//!     let mut guard = document.write().unwrap();
//!     guard.write("theme=dark; expires=Fri, 01 Jan 2027 00:00:00 GMT")?;
//! }
//! ```
//!
//! The [`Cookie`] struct is used for persistence/inspection and can be (de)serialized
//! via `serde` to JSON or other formats.

use crate::document::cookie_document::CookieDocument;
use crate::store::CookieStore;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// A handle to a cookie document trait.
///
/// This is a reference-counted, read/write-locked pointer to a type-erased
/// [`CookieDocument`]. Obtain a **read lock** for queries and a **write lock**
/// for mutations.
pub type DocumentHandle = Arc<RwLock<dyn CookieDocument + Send + Sync>>;

/// A handle to a cookie store trait.
///
/// This is a reference-counted pointer to a type-erased [`CookieStore`].
/// Store implementations must be **`Send + Sync` and internally synchronized**,
/// since callers hold only `&self` when invoking trait methods.
///
/// Typical use is at **build/initialization time** to mint a per-document
/// cookie document.
pub type CookieStoreHandle = Arc<dyn CookieStore + Send + Sync>;

/// A unique identifier for a cookie document, represented as a UUID.
///
/// One `DocumentId` addresses one document's cookie state inside a store,
/// so an embedder can hand the same document to multiple scripting surfaces
/// and get back the same ambient state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(Uuid::parse_str(s).unwrap_or_else(|_| Uuid::new_v4()))
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cookie as stored/serialized by a document.
///
/// This structure captures the attributes of a document cookie and is
/// suitable for persistence (e.g., JSON, SQLite) via `serde`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Expiration timestamp, if any. Session cookies have `None`.
    pub expires: Option<DateTime<Utc>>,
}

impl Cookie {
    /// Returns `true` when the cookie has an expiry at or before `now`.
    ///
    /// Session cookies (`expires == None`) never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}

/// Timestamp format used in serialized cookie entries, e.g.
/// `Thu, 01 Jan 1970 00:00:01 GMT`.
const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formats a timestamp the way cookie entries carry it (`expires=...`).
pub fn format_cookie_date(at: DateTime<Utc>) -> String {
    at.format(COOKIE_DATE_FORMAT).to_string()
}

/// Parses an `expires` attribute value.
///
/// Accepts RFC 2822 dates as well as the `GMT`-suffixed form browsers emit.
/// Returns `None` when the value is not a recognizable date.
pub fn parse_cookie_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc2822(s) {
        return Some(at.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, COOKIE_DATE_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_date_round_trip() {
        let at = Utc.with_ymd_and_hms(2027, 1, 1, 12, 30, 45).unwrap();
        let formatted = format_cookie_date(at);
        assert_eq!(formatted, "Fri, 01 Jan 2027 12:30:45 GMT");
        assert_eq!(parse_cookie_date(&formatted), Some(at));
    }

    #[test]
    fn parses_the_epoch_deletion_timestamp() {
        let at = parse_cookie_date("Thu, 01 Jan 1970 00:00:01 GMT").expect("parseable");
        assert_eq!(at, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 1).unwrap());
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_cookie_date("tomorrow-ish").is_none());
        assert!(parse_cookie_date("").is_none());
    }

    #[test]
    fn session_cookies_never_expire() {
        let cookie = Cookie {
            name: "sid".into(),
            value: "abc".into(),
            expires: None,
        };
        assert!(!cookie.is_expired(Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let at = Utc.with_ymd_and_hms(2027, 6, 1, 0, 0, 0).unwrap();
        let cookie = Cookie {
            name: "sid".into(),
            value: "abc".into(),
            expires: Some(at),
        };
        assert!(cookie.is_expired(at));
        assert!(!cookie.is_expired(at - chrono::Duration::seconds(1)));
    }

    #[test]
    fn document_id_from_invalid_string_falls_back_to_random() {
        let a = DocumentId::from("not-a-uuid");
        let b = DocumentId::from("not-a-uuid");
        assert_ne!(a, b);
    }

    #[test]
    fn document_id_from_uuid_string_is_stable() {
        let raw = "a9c10c54-2bd7-4a16-8ba2-6ecb2f32b3e5";
        assert_eq!(DocumentId::from(raw), DocumentId::from(raw));
        assert_eq!(DocumentId::from(raw).to_string(), raw);
    }
}
