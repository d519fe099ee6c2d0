//! Remote retrieval of source volumes.

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::core::{RemeshError, RemoteFetcher};

    /// [`RemoteFetcher`] backed by a shared `reqwest` client.
    #[derive(Clone)]
    pub struct HttpFetcher {
        client: reqwest::Client,
    }

    impl HttpFetcher {
        /// Build a fetcher whose requests give up after `timeout`.
        ///
        /// # Errors
        ///
        /// [`RemeshError::Config`] if the HTTP client cannot be constructed.
        pub fn new(timeout: Duration) -> Result<Self, RemeshError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| RemeshError::Config(format!("failed to create HTTP client: {e}")))?;
            Ok(Self { client })
        }

        /// Wrap an existing client.
        #[must_use]
        pub const fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl RemoteFetcher for HttpFetcher {
        async fn get(&self, url: &str) -> Result<Vec<u8>, RemeshError> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| RemeshError::Fetch(format!("acquiring {url} failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RemeshError::Fetch(format!("HTTP {status} from {url}")));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| RemeshError::Fetch(format!("reading {url} failed: {e}")))
        }
    }
}
