//! Infrastructure adapters for queues, caches, storage and notification.

pub mod cache;
pub mod fetch;
pub mod notify;
pub mod queue;
pub mod storage;

pub use cache::{FetchCache, InMemoryCacheStore};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
#[cfg(feature = "http")]
pub use notify::{ConfiguredNotifier, HttpNotifier};
pub use notify::NoopNotifier;
pub use queue::InMemoryQueue;
pub use storage::{FileBlobStore, InMemoryBlobStore};
