//! Resumable download stream and its collaborators.
//!
//! This module group holds the whole component: the stream itself, the
//! connection-acquisition seam, the byte-source abstraction and the retry
//! policy.
//!
//! # Architecture
//!
//! ```text
//! ResumableHttpStream (resumable)
//!         │
//!         ├── HttpConnector (http)      opens initial + reconnect connections
//!         │       └── ReqwestConnector  blocking reqwest implementation
//!         │
//!         ├── ByteSource (source)       sequential read + three-way skip
//!         │
//!         └── RetryPolicy (retry)       go / abort decision per attempt
//! ```

mod error;
mod http;
mod resumable;
mod retry;
mod source;

pub use error::{StreamError, StreamResult};
pub use http::{parse_content_range, HttpConnection, HttpConnector, ReqwestConnector};
pub use resumable::ResumableHttpStream;
pub use retry::{LimitedRetryPolicy, RetryPolicy, DEFAULT_MAX_RETRIES};
pub use source::{ByteSource, HttpByteSource, SkipOutcome};
