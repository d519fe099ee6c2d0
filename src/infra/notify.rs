//! Completion notifiers.

use async_trait::async_trait;

use crate::core::{CompletionNotifier, RemeshError};
use crate::util::serde::TaskId;

#[cfg(feature = "http")]
pub use http::{ConfiguredNotifier, HttpNotifier};

/// Notifier used when no completion endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl CompletionNotifier for NoopNotifier {
    async fn notify(&self, task_id: TaskId) -> Result<(), RemeshError> {
        tracing::trace!(task_id, "no completion endpoint configured");
        Ok(())
    }
}

/// Expand `{task_id}` in a notification URL template.
#[must_use]
pub fn render_notify_url(template: &str, task_id: TaskId) -> String {
    template.replace("{task_id}", &task_id.to_string())
}

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;

    use super::{render_notify_url, NoopNotifier};
    use crate::core::{CompletionNotifier, RemeshError};
    use crate::util::serde::TaskId;

    /// POSTs to a templated URL when a task publishes.
    #[derive(Clone)]
    pub struct HttpNotifier {
        client: reqwest::Client,
        url_template: String,
    }

    impl HttpNotifier {
        /// Create a notifier for `url_template`, which may contain `{task_id}`.
        #[must_use]
        pub fn new(client: reqwest::Client, url_template: impl Into<String>) -> Self {
            Self {
                client,
                url_template: url_template.into(),
            }
        }
    }

    #[async_trait]
    impl CompletionNotifier for HttpNotifier {
        async fn notify(&self, task_id: TaskId) -> Result<(), RemeshError> {
            let url = render_notify_url(&self.url_template, task_id);
            let response = self
                .client
                .post(&url)
                .send()
                .await
                .map_err(|e| RemeshError::Notify(format!("POST {url} failed: {e}")))?;
            if !response.status().is_success() {
                return Err(RemeshError::Notify(format!(
                    "HTTP {} from {url}",
                    response.status()
                )));
            }
            Ok(())
        }
    }

    /// Notifier chosen from configuration: HTTP when a URL template is set, no-op otherwise.
    #[derive(Clone)]
    pub enum ConfiguredNotifier {
        /// No completion endpoint.
        Noop(NoopNotifier),
        /// POST to the configured endpoint.
        Http(HttpNotifier),
    }

    impl ConfiguredNotifier {
        /// Select a notifier for an optional URL template.
        #[must_use]
        pub fn from_template(client: reqwest::Client, url_template: Option<&str>) -> Self {
            match url_template {
                Some(template) => Self::Http(HttpNotifier::new(client, template)),
                None => Self::Noop(NoopNotifier),
            }
        }
    }

    #[async_trait]
    impl CompletionNotifier for ConfiguredNotifier {
        async fn notify(&self, task_id: TaskId) -> Result<(), RemeshError> {
            match self {
                Self::Noop(inner) => inner.notify(task_id).await,
                Self::Http(inner) => inner.notify(task_id).await,
            }
        }
    }
}
