use super::{FetchError, PostsSource};
use crate::model::Post;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches posts with a `GET` against the configured posts URL.
#[derive(Clone, Debug)]
pub struct HttpPostsSource {
    client: reqwest::Client,
    url: String,
    timeout: Option<Duration>,
}

impl HttpPostsSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: None,
        }
    }

    /// Applies a per-request timeout. The client itself stays timeout-free so it
    /// can be shared with the long-lived reload stream.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PostsSource for HttpPostsSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch_posts(&self) -> Result<Vec<Post>, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Server {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let posts: Vec<Post> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        debug!(posts = posts.len(), bytes = body.len(), "Fetched");
        Ok(posts)
    }
}
