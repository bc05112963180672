/// Store configuration shared by all cookie store backends.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How many documents a store will provision concurrently. Minting a
    /// document beyond this limit is refused.
    pub max_documents: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_documents: 32,      // Default max live documents per store
        }
    }
}
