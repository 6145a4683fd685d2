//! Content stream fetcher: one outbound request per open, no retries,
//! no deduplication. Overlap and cancellation policy live in the
//! navigation controller, not here.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, StatusCode};
use shared::location::Location;
use thiserror::Error;
use url::Url;

/// Route segment prefixed to every location when building the request URL.
pub const DEFAULT_CONTENT_ROUTE: &str = "/ui";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to reach content endpoint for {location}: {source}")]
    Transport {
        location: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("content endpoint returned {status} for {location}")]
    Status {
        location: String,
        status: StatusCode,
    },
    #[error("content stream for {location} failed mid-body: {source}")]
    Body {
        location: String,
        #[source]
        source: reqwest::Error,
    },
}

/// An open handle to an in-flight content response body.
pub struct ContentStream {
    location: Location,
    bytes: BoxStream<'static, Result<Bytes, FetchError>>,
}

impl ContentStream {
    pub fn new(location: Location, bytes: BoxStream<'static, Result<Bytes, FetchError>>) -> Self {
        Self { location, bytes }
    }

    /// A stream backed by a single in-memory chunk, used by tests and
    /// non-HTTP fetchers.
    pub fn from_bytes(location: Location, payload: impl Into<Bytes>) -> Self {
        let payload: Bytes = payload.into();
        Self::new(
            location,
            stream::once(async move { Ok::<Bytes, FetchError>(payload) }).boxed(),
        )
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Drains the remaining chunks into one buffer.
    pub async fn collect_bytes(mut self) -> Result<Vec<u8>, FetchError> {
        let mut buffer = Vec::new();
        while let Some(chunk) = self.bytes.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer)
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Opens a streamed UI description for the given location. A non-success
    /// response surfaces as an error before any body bytes are handed out.
    async fn open(&self, location: &Location) -> Result<ContentStream, FetchError>;
}

/// Fetches UI descriptions over HTTP from a fixed route on one server.
pub struct HttpContentFetcher {
    http: Client,
    base_url: Url,
    route_prefix: String,
}

impl HttpContentFetcher {
    pub fn new(base_url: Url) -> Self {
        Self::with_route(base_url, DEFAULT_CONTENT_ROUTE)
    }

    pub fn with_route(base_url: Url, route_prefix: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            route_prefix: route_prefix.into(),
        }
    }

    fn request_url(&self, location: &Location) -> String {
        format!(
            "{}{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.route_prefix,
            location.as_str()
        )
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn open(&self, location: &Location) -> Result<ContentStream, FetchError> {
        let response = self
            .http
            .get(self.request_url(location))
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                location: location.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status,
            });
        }

        let stream_location = location.to_string();
        let bytes = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|source| FetchError::Body {
                    location: stream_location.clone(),
                    source,
                })
            })
            .boxed();

        Ok(ContentStream::new(location.clone(), bytes))
    }
}
