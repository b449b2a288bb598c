//! HTTP connection establishment for the resumable stream.
//!
//! `HttpConnector` is the injection seam through which the stream acquires
//! every byte source, initial and reconnect alike. The production
//! implementation wraps a blocking reqwest client; tests substitute
//! scripted connectors.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{Proxy, Url};

use super::error::{StreamError, StreamResult};
use super::source::{ByteSource, HttpByteSource};

/// Default timeout for establishing a TCP connection.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// An established connection to the resource.
pub struct HttpConnection {
    /// Response body, readable exactly once.
    pub source: Box<dyn ByteSource>,
    /// Declared content length of this response, if the server sent one.
    /// For a partial response this is the length of the remaining range,
    /// not the entity total.
    pub declared_len: Option<u64>,
    /// Start offset of the honored byte range, parsed from `Content-Range`.
    /// `None` when the server sent the full entity or anything unparseable.
    pub range_start: Option<u64>,
    /// Response headers, kept for caller inspection.
    pub headers: HeaderMap,
}

/// Capability that opens (and re-opens) connections to a resource.
pub trait HttpConnector: Send {
    /// Open a connection, optionally hinting the server to start sending
    /// at byte `range_start`.
    ///
    /// The hint is advisory. Callers must inspect
    /// `HttpConnection::range_start` to learn whether it was honored.
    fn connect(&mut self, url: &Url, range_start: Option<u64>) -> StreamResult<HttpConnection>;
}

/// Production connector backed by a blocking reqwest client.
///
/// Applies a connect timeout but no whole-request timeout: response bodies
/// are streamed for as long as the caller keeps reading.
#[derive(Debug)]
pub struct ReqwestConnector {
    client: Client,
}

impl ReqwestConnector {
    /// Create a connector with default settings.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a connector that routes requests through the given proxy.
    pub fn with_proxy(proxy: Proxy) -> Self {
        Self::build(Some(proxy))
    }

    fn build(proxy: Option<Proxy>) -> Self {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .timeout(None::<Duration>);
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy);
        }
        let client = builder.build().expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for ReqwestConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpConnector for ReqwestConnector {
    fn connect(&mut self, url: &Url, range_start: Option<u64>) -> StreamResult<HttpConnection> {
        let mut request = self.client.get(url.clone());
        if let Some(start) = range_start {
            request = request.header(RANGE, format!("bytes={}-", start));
        }

        let response = request.send().map_err(|e| StreamError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Connection {
                url: url.to_string(),
                reason: format!("request failed with status {}", status),
            });
        }

        let headers = response.headers().clone();
        let declared_len = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let honored_start = parse_content_range(&headers);

        Ok(HttpConnection {
            source: Box::new(HttpByteSource::new(response)),
            declared_len,
            range_start: honored_start,
            headers,
        })
    }
}

/// Parse the start offset out of a `Content-Range` header.
///
/// Accepts the `bytes <start>-<end>/<total>` form. Anything else (absent
/// header, `bytes */<total>`, malformed values) yields `None`, which
/// callers treat as "range not honored".
pub fn parse_content_range(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let rest = value.strip_prefix("bytes ")?;
    let (start, _) = rest.split_once('-')?;
    start.trim().parse().ok()
}
