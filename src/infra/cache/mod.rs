//! Fetch-side content cache.
//!
//! [`FetchCache`] returns decoded source bytes for a URL, memoizing them in an external
//! [`CacheStore`] recompressed with the fast codec. The cache never affects correctness:
//! store failures are logged and the decoded payload is still returned.

pub mod codec;
pub mod memory;

use async_trait::async_trait;

use crate::core::{CacheStore, ContentSource, RemeshError, RemoteFetcher};

pub use codec::SourceEncoding;
pub use memory::InMemoryCacheStore;

/// Read-through cache in front of a [`RemoteFetcher`].
pub struct FetchCache<F, S> {
    fetcher: F,
    store: S,
}

impl<F, S> FetchCache<F, S>
where
    F: RemoteFetcher,
    S: CacheStore,
{
    /// Combine a fetcher with a cache store.
    pub const fn new(fetcher: F, store: S) -> Self {
        Self { fetcher, store }
    }

    /// The backing cache store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    async fn lookup(&self, url: &str) -> Option<Vec<u8>> {
        let compressed = match self.store.get(url).await {
            Ok(Some(compressed)) => compressed,
            Ok(None) => {
                tracing::debug!(url, "not in cache, downloading");
                return None;
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "cache lookup failed, downloading");
                return None;
            }
        };

        match codec::decompress_fast(&compressed) {
            Ok(decoded) => {
                tracing::debug!(url, bytes = decoded.len(), "retrieved from cache");
                Some(decoded)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "cached value unreadable, downloading");
                None
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RemeshError> {
        let raw = self.fetcher.get(url).await?;
        tracing::debug!(url, bytes = raw.len(), "downloaded");

        let encoding = SourceEncoding::from_url(url);
        if encoding == SourceEncoding::Identity {
            return Ok(raw);
        }
        tokio::task::spawn_blocking(move || encoding.decode(raw))
            .await
            .map_err(|e| RemeshError::Fetch(format!("decode task failed: {e}")))?
    }

    async fn remember(&self, url: &str, decoded: &[u8]) {
        let compressed = match codec::compress_fast(decoded) {
            Ok(compressed) => compressed,
            Err(e) => {
                tracing::warn!(url, error = %e, "caching failed");
                return;
            }
        };
        #[allow(clippy::cast_precision_loss)]
        let ratio = 100.0 * compressed.len() as f64 / decoded.len().max(1) as f64;
        match self.store.set(url, compressed).await {
            Ok(()) => tracing::debug!(url, ratio = %format!("{ratio:.2}%"), "sent to cache"),
            Err(e) => tracing::warn!(url, error = %e, "caching failed"),
        }
    }
}

#[async_trait]
impl<F, S> ContentSource for FetchCache<F, S>
where
    F: RemoteFetcher,
    S: CacheStore,
{
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RemeshError> {
        if let Some(decoded) = self.lookup(url).await {
            return Ok(decoded);
        }
        let decoded = self.download(url).await?;
        self.remember(url, &decoded).await;
        Ok(decoded)
    }
}
