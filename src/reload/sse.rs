use super::{EventStreamDecoder, ReloadConnection, ReloadError, ReloadEvent, ReloadSource};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::collections::VecDeque;
use std::time::Duration;

/// Opens the reload stream with a plain `GET`.
#[derive(Clone, Debug)]
pub struct SseReloadSource {
    client: reqwest::Client,
    url: String,
}

impl SseReloadSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReloadSource for SseReloadSource {
    async fn connect(&self) -> Result<Box<dyn ReloadConnection>, ReloadError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| ReloadError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReloadError::Status(status.as_u16()));
        }

        Ok(Box::new(SseConnection {
            response,
            decoder: EventStreamDecoder::new(),
            pending: VecDeque::new(),
        }))
    }
}

struct SseConnection {
    response: reqwest::Response,
    decoder: EventStreamDecoder,
    pending: VecDeque<ReloadEvent>,
}

#[async_trait]
impl ReloadConnection for SseConnection {
    async fn next_event(&mut self) -> Result<Option<ReloadEvent>, ReloadError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            match self.response.chunk().await {
                Ok(Some(chunk)) => self.pending.extend(self.decoder.feed(&chunk)),
                Ok(None) => return Ok(None),
                Err(e) => return Err(ReloadError::Stream(e.to_string())),
            }
        }
    }

    fn retry_hint(&self) -> Option<Duration> {
        self.decoder.retry().map(Duration::from_millis)
    }
}
