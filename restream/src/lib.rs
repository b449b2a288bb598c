//! Restream - resilient sequential byte streams over HTTP(S)
//!
//! This library wraps an HTTP(S) resource in a reader that transparently
//! reconnects when the transfer dies mid-entity and resumes at the exact
//! byte offset: through a `Range` request when the server honors one, by
//! discarding already-delivered bytes when it does not. Callers see an
//! ordinary blocking `std::io::Read` with exact byte accounting.
//!
//! # Example
//!
//! ```ignore
//! use std::io::Read;
//! use restream::ResumableHttpStream;
//!
//! let mut stream = ResumableHttpStream::open("https://example.com/archive.zip")?;
//! println!("entity length: {:?}", stream.total_len());
//!
//! let mut data = Vec::new();
//! stream.read_to_end(&mut data)?;
//! ```

pub mod stream;

pub use stream::{
    ByteSource, HttpByteSource, HttpConnection, HttpConnector, LimitedRetryPolicy,
    ReqwestConnector, ResumableHttpStream, RetryPolicy, SkipOutcome, StreamError, StreamResult,
    DEFAULT_MAX_RETRIES,
};

// Re-exported so downstream crates can build proxies and URLs without
// depending on reqwest directly.
pub use reqwest::{Proxy, Url};
