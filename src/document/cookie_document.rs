//! Cookie document abstraction and a simple in-memory implementation.
//!
//! A **cookie document** represents the ambient cookie string of one document:
//! the single semicolon-separated `name=value` sequence a script sees, plus the
//! write surface that accepts one serialized cookie entry at a time.
//!
//! This module defines the [`CookieDocument`] trait and a reference
//! implementation, [`DefaultCookieDocument`], which keeps cookies **in memory
//! only** (no persistence) and applies browser-style set semantics.
//!
//! ## Notes & limitations
//! - Entry parsing is intentionally **minimal**: the `expires` attribute is
//!   handled; `Max-Age`, `Path`, `Domain`, `Secure` and other attributes are
//!   ignored, since a document's cookies are not scoped below the document.
//! - Writing an entry whose expiry lies in the past **removes** the named
//!   cookie; this is how deletion works.
//! - Expired cookies are purged on write and filtered on every read, so a
//!   read never observes a dead cookie even if nothing was written since it
//!   lapsed.
//! - This module is **not** internally synchronized. Use it via a
//!   `DocumentHandle = Arc<RwLock<dyn CookieDocument + Send + Sync>>`.

use crate::clock::ClockHandle;
use crate::document::cookies::{parse_cookie_date, Cookie};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;

/// The ambient cookie state of one document.
///
/// Types implementing this trait own the live cookie string: they interpret
/// serialized entry writes and serialize the current state back out, the way
/// a host environment does for its documents.
///
/// ### Type erasure
/// `as_any` / `as_any_mut` enable downcasting when callers need access to
/// concrete implementations (e.g., for snapshotting/persistence).
pub trait CookieDocument: Send + Sync {
    /// Returns a type-erased reference to the document.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable type-erased reference to the document.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Applies one serialized cookie entry, e.g.
    /// `theme=dark; expires=Fri, 01 Jan 2027 00:00:00 GMT`.
    ///
    /// Implementations update existing entries with "last write wins"
    /// semantics when names collide, and treat an already-expired entry as a
    /// removal of the named cookie.
    ///
    /// # Errors
    /// Returns an error for entries that carry no `=` or an empty name.
    fn write(&mut self, entry: &str) -> Result<()>;

    /// Serializes all live cookies as `name=value; name2=value2`.
    ///
    /// Returns an empty string when no live cookies exist. Expired cookies
    /// are filtered out on every call.
    fn cookie_string(&self) -> String;

    /// Returns all live cookies, for diagnostics/inspection.
    fn cookies(&self) -> Vec<Cookie>;

    /// Removes the cookie named `name`, if present.
    fn remove_cookie(&mut self, name: &str);

    /// Removes all cookies from the document.
    fn clear(&mut self);
}

/// Default cookie document, holding the cookies of a single document.
///
/// This implementation is **in-memory only** and performs **no persistence**.
/// Cookies are kept in insertion order; an overwrite keeps the original slot.
///
/// ### Parsing behavior
/// - The first `=` splits the entry into name and remainder; the value runs
///   up to the first `;`. Whitespace around name, value and attributes is
///   trimmed.
/// - `expires` is matched case-insensitively; an unparseable date is ignored
///   and the entry becomes a session cookie.
/// - Unknown attributes are skipped.
#[derive(Clone, Serialize, Deserialize)]
pub struct DefaultCookieDocument {
    /// Live cookie records, in insertion order.
    pub entries: Vec<Cookie>,

    /// Clock used for expiry decisions. Not persisted; deserialized
    /// documents fall back to the wall clock.
    #[serde(skip, default = "crate::clock::system_clock")]
    clock: ClockHandle,
}

impl DefaultCookieDocument {
    /// Creates an empty in-memory cookie document using the wall clock.
    pub fn new() -> Self {
        Self::with_clock(crate::clock::system_clock())
    }

    /// Creates an empty in-memory cookie document with an injected clock.
    pub fn with_clock(clock: ClockHandle) -> Self {
        DefaultCookieDocument {
            entries: Vec::new(),
            clock,
        }
    }
}

impl Default for DefaultCookieDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for DefaultCookieDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultCookieDocument")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl CookieDocument for DefaultCookieDocument {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn write(&mut self, entry: &str) -> Result<()> {
        let Some((name, rest)) = entry.split_once('=') else {
            bail!("cookie entry has no '=': {entry:?}");
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("cookie entry has an empty name: {entry:?}");
        }

        let mut cookie = Cookie {
            name: name.to_string(),
            value: String::new(),
            expires: None,
        };

        let mut parts = rest.split(';');
        if let Some(value) = parts.next() {
            cookie.value = value.trim().to_string();
        }
        for part in parts {
            let part = part.trim();
            if let Some((k, v)) = part.split_once('=') {
                if k.trim().eq_ignore_ascii_case("expires") {
                    cookie.expires = parse_cookie_date(v.trim());
                }
            }
        }

        let now = self.clock.now();
        self.entries.retain(|c| !c.is_expired(now));

        if cookie.is_expired(now) {
            // An entry that arrives already expired evicts the named cookie.
            self.entries.retain(|c| c.name != cookie.name);
            return Ok(());
        }

        // Replace existing cookie with same name
        if let Some(existing) = self.entries.iter_mut().find(|c| c.name == cookie.name) {
            *existing = cookie;
        } else {
            self.entries.push(cookie);
        }

        Ok(())
    }

    fn cookie_string(&self) -> String {
        let now = self.clock.now();

        self.entries
            .iter()
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn cookies(&self) -> Vec<Cookie> {
        let now = self.clock.now();

        self.entries
            .iter()
            .filter(|c| !c.is_expired(now))
            .cloned()
            .collect()
    }

    fn remove_cookie(&mut self, name: &str) {
        self.entries.retain(|c| c.name != name);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
