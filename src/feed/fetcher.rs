use crate::feed::parser::{decode_bytes, DecodeError};
use crate::model::DecodedFeed;
use futures::StreamExt;
use thiserror::Error;

/// Default cap on a feed response body.
pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors raised while retrieving feed bytes, before any XML is looked at.
///
/// These are the transient kind: a caller may reasonably try again later.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the client's configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err)
        }
    }
}

/// Any failure of a fetch-and-decode call.
///
/// `Fetch` and `Decode` stay separate so callers can tell a flaky network
/// apart from a feed that will never parse.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Feed decode failed: {0}")]
    Decode(#[from] DecodeError),
    /// The fetch address could not be built.
    #[error("Invalid feed address: {0}")]
    InvalidAddress(String),
}

impl FeedError {
    /// True for failures worth retrying later (network trouble, 5xx, timeouts).
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Fetch(FetchError::HttpStatus(status)) => *status >= 500 || *status == 429,
            FeedError::Fetch(FetchError::Network(_))
            | FeedError::Fetch(FetchError::Timeout)
            | FeedError::Fetch(FetchError::IncompleteResponse { .. }) => true,
            FeedError::Fetch(FetchError::ResponseTooLarge(_))
            | FeedError::Decode(_)
            | FeedError::InvalidAddress(_) => false,
        }
    }
}

/// Fetches a feed with a single GET and decodes it.
///
/// No retries happen here; retry policy belongs to the caller. The body is
/// read completely (up to `max_bytes`) and released before decoding starts.
///
/// # Errors
///
/// - [`FetchError::Network`] / [`FetchError::Timeout`] - request could not complete
/// - [`FetchError::HttpStatus`] - any non-2xx response
/// - [`FetchError::ResponseTooLarge`] - body exceeded `max_bytes`
/// - [`FetchError::IncompleteResponse`] - body shorter than its Content-Length
/// - [`DecodeError`] - body is not a well-formed RSS channel
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<DecodedFeed, FeedError> {
    tracing::debug!(url = %url, "Fetching feed");

    let response = client.get(url).send().await.map_err(FetchError::from)?;

    if !response.status().is_success() {
        tracing::warn!(url = %url, status = %response.status(), "Feed request rejected");
        return Err(FetchError::HttpStatus(response.status().as_u16()).into());
    }

    let bytes = read_limited_bytes(response, max_bytes).await?;
    let feed = decode_bytes(&bytes)?;

    tracing::info!(
        url = %url,
        bytes = bytes.len(),
        entries = feed.entries.len(),
        "Feed decoded"
    );
    Ok(feed)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
