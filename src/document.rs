// src/document.rs
//! Cookie documents: [`CookieDocument`], its handles, and backends.

mod cookie_document;
mod cookies;
mod persistent_cookie_document;

pub use cookies::format_cookie_date;
pub use cookies::parse_cookie_date;
pub use cookies::Cookie;
pub use cookies::CookieStoreHandle;
pub use cookies::DocumentHandle;
pub use cookies::DocumentId;

pub use cookie_document::CookieDocument;
pub use cookie_document::DefaultCookieDocument;
pub use persistent_cookie_document::PersistentCookieDocument;
