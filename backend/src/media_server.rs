//! Client for the external media server's HTTP status API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use restream_types::MediaStreamList;
use std::time::Duration;
use tracing::trace;

/// Number of streams requested per stream list query.
const STREAM_LIST_LIMIT: usize = 1000;

/// Error talking to the media server.
#[derive(Debug, thiserror::Error)]
pub enum MediaServerError {
    #[error("request to media server failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media server returned HTTP {0}")]
    Status(StatusCode),

    #[error("media server reported error code {0}")]
    Api(i32),

    #[error("media server did not answer within {0:?}")]
    Timeout(Duration),
}

/// Source of the media server's active stream list.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Fetch every stream the media server currently knows about.
    async fn list_streams(&self) -> Result<MediaStreamList, MediaServerError>;
}

/// Media server reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpMediaServer {
    base_url: String,
    client: Client,
}

impl HttpMediaServer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MediaServer for HttpMediaServer {
    async fn list_streams(&self) -> Result<MediaStreamList, MediaServerError> {
        let url = format!(
            "{}/api/v1/streams/?start=0&count={}",
            self.base_url, STREAM_LIST_LIMIT
        );
        trace!("Querying media server stream list: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MediaServerError::Status(response.status()));
        }

        let list: MediaStreamList = response.json().await?;
        if list.code != 0 {
            return Err(MediaServerError::Api(list.code));
        }
        Ok(list)
    }
}
