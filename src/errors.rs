#[derive(Debug, thiserror::Error)]
pub enum CookieStoreError {
    #[error("Cookie store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cookie store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cookie database error: {0}")]
    Database(String),

    #[error("Document limit exceeded")]
    DocumentLimitExceeded,
}
