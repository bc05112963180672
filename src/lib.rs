pub mod clock;
pub mod config;
pub mod document;
pub mod errors;
pub mod script;
pub mod store;

pub use clock::{Clock, ClockHandle, FixedClock, SystemClock};
pub use config::StoreConfig;
pub use document::{
    Cookie, CookieDocument, DefaultCookieDocument, DocumentHandle, DocumentId,
    PersistentCookieDocument,
};
pub use errors::CookieStoreError;
pub use script::ScriptCookies;
pub use store::{CookieStore, InMemoryCookieStore, JsonCookieStore};
#[cfg(feature = "sqlite_cookie_store")]
pub use store::SqliteCookieStore;
