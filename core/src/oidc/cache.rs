//! Public key cache
//!
//! Keys are cached by URL for the life of the process. Entries never expire
//! and are never replaced by anything but an identical fetch, so a signer
//! that rotates a key without changing its `kid` is not noticed.
//!
//! Concurrent misses on one URL each fetch independently; there is no
//! request coalescing.

use std::sync::Arc;

use p256::PublicKey;

/// Shared, unbounded URL -> public key map. Cloning yields another handle to
/// the same cache.
#[derive(Clone)]
pub struct KeyCache {
    keys: moka::future::Cache<String, Arc<PublicKey>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self {
            keys: moka::future::Cache::builder().build(),
        }
    }

    pub async fn get(&self, url: &str) -> Option<Arc<PublicKey>> {
        self.keys.get(url).await
    }

    /// Store a key. Last write wins.
    pub async fn put(&self, url: &str, key: Arc<PublicKey>) {
        self.keys.insert(url.to_string(), key).await;
    }

    pub fn contains(&self, url: &str) -> bool {
        self.keys.contains_key(url)
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCache")
            .field("entries", &self.keys.entry_count())
            .finish()
    }
}
