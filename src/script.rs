//! Script-facing cookie helpers.
//!
//! [`ScriptCookies`] is the surface a scripting layer uses to set, read and
//! delete cookies on an ambient [`CookieDocument`](crate::CookieDocument).
//! It holds no cookie state of its own: every read re-parses the live cookie
//! string, and every write goes straight to the document.
//!
//! Values are percent-encoded on write and decoded on read, so a value may
//! contain `;`, `=` or whitespace without corrupting the cookie string.
//! Names are passed through untouched; callers must not put `;` or `=` in a
//! cookie name.
//!
//! Failure to write (a rejected entry, a poisoned document lock) is absorbed
//! and logged, the way a host environment swallows a denied cookie write.

use crate::clock::{system_clock, ClockHandle};
use crate::document::{format_cookie_date, CookieDocument, DocumentHandle};
use chrono::Duration;
use std::borrow::Cow;

/// Expiry written by [`ScriptCookies::delete_cookie`]; any moment in the past
/// makes the document evict the entry.
const EXPIRED_TIMESTAMP: &str = "Thu, 01 Jan 1970 00:00:01 GMT";

/// Cookie helpers for one ambient document.
pub struct ScriptCookies {
    /// The ambient cookie document all three operations go through.
    document: DocumentHandle,
    /// Clock used to compute absolute expiry timestamps.
    clock: ClockHandle,
}

impl ScriptCookies {
    /// Creates helpers over `document`, using the wall clock for expiries.
    pub fn new(document: DocumentHandle) -> Self {
        Self::with_clock(document, system_clock())
    }

    /// Creates helpers over `document` with an injected clock.
    pub fn with_clock(document: DocumentHandle, clock: ClockHandle) -> Self {
        Self { document, clock }
    }

    /// Sets a cookie that expires `hours_to_expire` hours from now.
    ///
    /// The value is percent-encoded before it is written. A non-positive
    /// `hours_to_expire` produces an already-expired entry, which deletes
    /// the cookie.
    pub fn set_cookie(&self, name: &str, value: &str, hours_to_expire: f64) {
        let expires = self.clock.now() + Duration::milliseconds((hours_to_expire * 3_600_000.0) as i64);
        let entry = format!(
            "{}={}; expires={}",
            name,
            urlencoding::encode(value),
            format_cookie_date(expires)
        );
        self.write_entry(name, &entry);
    }

    /// Returns the value of the cookie named `name`, or `None` when absent.
    ///
    /// The live cookie string is re-parsed on every call, scanning entry by
    /// entry: `name` is compared as a literal, so names containing pattern
    /// metacharacters match only themselves, and a name never matches a
    /// longer stored name it happens to be a suffix of.
    pub fn get_cookie(&self, name: &str) -> Option<String> {
        let cookie_string = match self.document.read() {
            Ok(document) => document.cookie_string(),
            Err(_) => {
                log::error!("cookie document lock poisoned; get_cookie({name:?}) returns None");
                return None;
            }
        };

        for pair in cookie_string.split(';') {
            if let Some((key, value)) = pair.split_once('=') {
                if key.trim() == name {
                    let raw = value.trim();
                    return Some(match urlencoding::decode(raw) {
                        Ok(decoded) => Cow::into_owned(decoded),
                        // Not valid percent-encoded UTF-8; hand back the raw value.
                        Err(_) => raw.to_string(),
                    });
                }
            }
        }

        None
    }

    /// Deletes the cookie named `name`.
    ///
    /// Writes an entry with an expiry in the past so the document evicts it.
    /// Deleting a name that was never set is a no-op.
    pub fn delete_cookie(&self, name: &str) {
        let entry = format!("{name}=; expires={EXPIRED_TIMESTAMP}");
        self.write_entry(name, &entry);
    }

    fn write_entry(&self, name: &str, entry: &str) {
        match self.document.write() {
            Ok(mut document) => {
                if let Err(err) = document.write(entry) {
                    log::warn!("cookie write for {name:?} rejected: {err}");
                }
            }
            Err(_) => {
                log::error!("cookie document lock poisoned; dropping write for {name:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::document::{CookieDocument, DefaultCookieDocument, DocumentHandle};
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, RwLock};

    fn setup() -> (ScriptCookies, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
        ));
        let document: DocumentHandle = Arc::new(RwLock::new(DefaultCookieDocument::with_clock(
            clock.clone(),
        )));
        (ScriptCookies::with_clock(document, clock.clone()), clock)
    }

    #[test]
    fn set_then_get_returns_the_value() {
        let (cookies, _) = setup();

        cookies.set_cookie("theme", "dark", 24.0);

        assert_eq!(cookies.get_cookie("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn get_before_any_set_returns_none() {
        let (cookies, _) = setup();

        assert_eq!(cookies.get_cookie("nonexistent"), None);
    }

    #[test]
    fn set_delete_get_returns_none() {
        let (cookies, _) = setup();

        cookies.set_cookie("a", "1", 1.0);
        cookies.delete_cookie("a");

        assert_eq!(cookies.get_cookie("a"), None);
    }

    #[test]
    fn deleting_a_never_set_cookie_is_a_noop() {
        let (cookies, _) = setup();

        cookies.delete_cookie("ghost");

        assert_eq!(cookies.get_cookie("ghost"), None);
    }

    #[test]
    fn values_round_trip_through_encoding() {
        let (cookies, _) = setup();

        // Printable ASCII that would corrupt a raw cookie string.
        for value in ["dark", "hello world", "a=b&c", "semi;colon", "100%", "x\ty"] {
            cookies.set_cookie("v", value, 1.0);
            assert_eq!(cookies.get_cookie("v").as_deref(), Some(value));
        }

        // Non-ASCII survives as well.
        cookies.set_cookie("v", "café", 1.0);
        assert_eq!(cookies.get_cookie("v").as_deref(), Some("café"));
    }

    #[test]
    fn names_match_as_literals_not_patterns() {
        let (cookies, _) = setup();

        cookies.set_cookie("axb", "wildcard-bait", 1.0);
        assert_eq!(cookies.get_cookie("a.b"), None);

        cookies.set_cookie("a.b", "dotted", 1.0);
        assert_eq!(cookies.get_cookie("a.b").as_deref(), Some("dotted"));
    }

    #[test]
    fn a_name_does_not_match_a_longer_stored_name() {
        let (cookies, _) = setup();

        cookies.set_cookie("mytheme", "light", 1.0);

        assert_eq!(cookies.get_cookie("theme"), None);
        assert_eq!(cookies.get_cookie("mytheme").as_deref(), Some("light"));
    }

    #[test]
    fn overwriting_a_cookie_replaces_its_value() {
        let (cookies, _) = setup();

        cookies.set_cookie("theme", "dark", 24.0);
        cookies.set_cookie("theme", "light", 24.0);

        assert_eq!(cookies.get_cookie("theme").as_deref(), Some("light"));
    }

    #[test]
    fn cookies_lapse_once_the_clock_passes_their_expiry() {
        let (cookies, clock) = setup();

        cookies.set_cookie("sid", "abc123", 2.0);
        assert_eq!(cookies.get_cookie("sid").as_deref(), Some("abc123"));

        clock.advance(chrono::Duration::hours(3));
        assert_eq!(cookies.get_cookie("sid"), None);
    }

    #[test]
    fn fractional_hours_are_respected() {
        let (cookies, clock) = setup();

        cookies.set_cookie("sid", "abc123", 0.5);

        clock.advance(chrono::Duration::minutes(20));
        assert_eq!(cookies.get_cookie("sid").as_deref(), Some("abc123"));

        clock.advance(chrono::Duration::minutes(20));
        assert_eq!(cookies.get_cookie("sid"), None);
    }

    #[test]
    fn non_positive_hours_delete_the_cookie() {
        let (cookies, _) = setup();

        cookies.set_cookie("sid", "abc123", 24.0);
        cookies.set_cookie("sid", "abc123", 0.0);

        assert_eq!(cookies.get_cookie("sid"), None);
    }

    #[test]
    fn reads_observe_writes_made_directly_on_the_document() {
        // No helper-side caching: state written behind the facade's back is
        // visible on the next read.
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
        ));
        let document: DocumentHandle = Arc::new(RwLock::new(DefaultCookieDocument::with_clock(
            clock.clone(),
        )));
        let cookies = ScriptCookies::with_clock(document.clone(), clock);
        assert_eq!(cookies.get_cookie("side"), None);

        document.write().unwrap().write("side=channel").unwrap();
        assert_eq!(cookies.get_cookie("side").as_deref(), Some("channel"));
    }
}
