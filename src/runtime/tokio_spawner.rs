//! Tokio runtime spawner implementation.

use std::future::Future;

use crate::core::{RemeshError, Spawn};

/// Tokio-based spawner that runs attempts on a tokio runtime.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Spawner bound to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Config`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, RemeshError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| RemeshError::Config(format!("no tokio runtime: {e}")))
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(self.handle.spawn(fut));
    }
}
