//! Resumable byte stream over an HTTP(S) resource.
//!
//! `ResumableHttpStream` behaves like an ordinary sequential reader, but
//! when the underlying connection dies mid-entity it transparently
//! reconnects and resumes at the current byte offset: through a `Range`
//! request when the server honors one, by discarding already-delivered
//! bytes when it does not. The caller observes nothing but a stall.
//!
//! # Architecture
//!
//! ```text
//! caller ──read──► ResumableHttpStream
//!                       │ exhaustion before total_len
//!                       ▼
//!                  reconnect loop ──► RetryPolicy (go / abort)
//!                       │
//!                       ▼
//!                  HttpConnector ──► fresh ByteSource
//!                       │ Content-Range start == bytes_consumed → adopt
//!                       │ anything else → fast-forward bytes_consumed bytes
//!                       ▼
//!                  back to the caller's read
//! ```

use std::io::{self, Read};

use reqwest::header::HeaderMap;
use reqwest::{Proxy, Url};

use super::error::{StreamError, StreamResult};
use super::http::{HttpConnector, ReqwestConnector};
use super::retry::{LimitedRetryPolicy, RetryPolicy};
use super::source::{ByteSource, SkipOutcome};

/// Where the stream is in its lifecycle.
enum Phase {
    /// Delivering bytes from the active source.
    Streaming(Box<dyn ByteSource>),
    /// All declared bytes delivered; end-of-stream is terminal.
    Finished,
    /// A terminal error was surfaced; the stream is unusable.
    Failed,
}

/// Outcome of aligning a full-entity resend with the current offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FastForward {
    /// Exactly the requested number of bytes were discarded.
    Aligned,
    /// The source ended before the resume offset was reached.
    SourceEnded,
}

/// Sequential byte stream over an HTTP(S) resource that survives dropped
/// connections.
///
/// The stream is strictly single-reader: every read takes `&mut self` and
/// exactly one underlying connection is live at a time. Reads are blocking
/// and may stall for the duration of an entire reconnect sequence.
///
/// # Unknown entity length
///
/// When the first response carries no `Content-Length`, the expected-end
/// check can never be satisfied: every exhaustion of the underlying source
/// is treated as premature and retried, so a stream over an unknown-length
/// resource only terminates through the retry ceiling. Supply a
/// known-length resource when a clean end-of-stream matters.
pub struct ResumableHttpStream {
    url: Url,
    connector: Box<dyn HttpConnector>,
    policy: Box<dyn RetryPolicy>,
    /// Declared entity length from the first response; `None` when unknown.
    total_len: Option<u64>,
    /// Bytes delivered to the caller so far; never decreases, never resets
    /// across reconnects.
    bytes_consumed: u64,
    /// Headers of the most recent response, for caller inspection.
    headers: HeaderMap,
    phase: Phase,
}

impl ResumableHttpStream {
    /// Open `url` with the default connector and retry policy.
    pub fn open(url: &str) -> StreamResult<Self> {
        let url = parse_url(url)?;
        Self::with_connector(
            url,
            Box::new(ReqwestConnector::new()),
            Box::new(LimitedRetryPolicy::default()),
        )
    }

    /// Open `url`, routing every connection through the given proxy.
    pub fn open_with_proxy(url: &str, proxy: Proxy) -> StreamResult<Self> {
        let url = parse_url(url)?;
        Self::with_connector(
            url,
            Box::new(ReqwestConnector::with_proxy(proxy)),
            Box::new(LimitedRetryPolicy::default()),
        )
    }

    /// Open `url` with injected connector and retry-policy capabilities.
    ///
    /// This is the seam for instrumentation and tests: the stream acquires
    /// every byte source through `connector` and consults `policy` before
    /// every reconnect attempt.
    pub fn with_connector(
        url: Url,
        mut connector: Box<dyn HttpConnector>,
        policy: Box<dyn RetryPolicy>,
    ) -> StreamResult<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(StreamError::InvalidResource {
                url: url.to_string(),
            });
        }

        let connection = connector.connect(&url, None)?;
        tracing::debug!(
            url = %url,
            total_len = ?connection.declared_len,
            "Opened initial connection"
        );

        Ok(Self {
            url,
            connector,
            policy,
            total_len: connection.declared_len,
            bytes_consumed: 0,
            headers: connection.headers,
            phase: Phase::Streaming(connection.source),
        })
    }

    /// The resource this stream downloads from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Declared entity length, or `None` when the server did not send one.
    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// Bytes delivered to the caller so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Headers of the most recent response, initial or reconnect.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Reconnect attempts made over the stream's lifetime.
    pub fn retry_attempts(&self) -> u32 {
        self.policy.attempts()
    }

    /// Read a single byte, or `None` at end-of-stream.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn is_fully_consumed(&self) -> bool {
        match self.total_len {
            Some(total) => self.bytes_consumed >= total,
            None => false,
        }
    }

    /// Re-open the resource at the current offset, retrying until the
    /// policy gives up.
    ///
    /// One loop iteration per attempt. Every failure inside counts as one
    /// attempt and re-enters the loop, including a resend that ends before
    /// the resume offset is reached.
    fn reconnect(&mut self) -> StreamResult<()> {
        loop {
            if !self.policy.approve_attempt() {
                let attempts = self.policy.attempts();
                tracing::warn!(url = %self.url, attempts, "Retry policy exhausted, aborting");
                return Err(StreamError::TooManyRetries { attempts });
            }
            let attempt = self.policy.attempts();
            tracing::info!(
                url = %self.url,
                attempt,
                resume_at = self.bytes_consumed,
                "Reconnecting"
            );

            let connection = match self.connector.connect(&self.url, Some(self.bytes_consumed)) {
                Ok(connection) => connection,
                Err(err) => {
                    tracing::warn!(url = %self.url, attempt, error = %err, "Reconnect attempt failed");
                    continue;
                }
            };
            self.headers = connection.headers;
            let mut source = connection.source;

            // Trust the range only when it starts exactly at our offset;
            // any other start, or no parseable range at all, is handled as
            // a full resend.
            if connection.range_start == Some(self.bytes_consumed) {
                tracing::debug!(resume_at = self.bytes_consumed, "Server honored range request");
                self.phase = Phase::Streaming(source);
                return Ok(());
            }

            match fast_forward(source.as_mut(), self.bytes_consumed) {
                Ok(FastForward::Aligned) => {
                    tracing::debug!(
                        discarded = self.bytes_consumed,
                        "Server resent full entity, fast-forward complete"
                    );
                    self.phase = Phase::Streaming(source);
                    return Ok(());
                }
                Ok(FastForward::SourceEnded) => {
                    tracing::warn!(
                        resume_at = self.bytes_consumed,
                        "Resend ended before the resume offset, retrying"
                    );
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Discard failed during fast-forward, retrying");
                }
            }
        }
    }
}

impl Read for ResumableHttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let read_result = match &mut self.phase {
                Phase::Streaming(source) => source.read(buf),
                Phase::Finished => return Ok(0),
                Phase::Failed => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotConnected,
                        "stream is unusable after a terminal failure",
                    ));
                }
            };

            match read_result {
                Ok(0) => {}
                Ok(n) => {
                    self.bytes_consumed += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // A connection cut mid-entity surfaces as a body read
                    // error, not a clean EOF; both resume the same way.
                    tracing::warn!(
                        url = %self.url,
                        bytes_consumed = self.bytes_consumed,
                        error = %e,
                        "Read failed mid-entity, attempting to resume"
                    );
                }
            }

            if self.is_fully_consumed() {
                tracing::debug!(
                    url = %self.url,
                    bytes_consumed = self.bytes_consumed,
                    "Entity fully delivered"
                );
                self.phase = Phase::Finished;
                return Ok(0);
            }

            if let Err(err) = self.reconnect() {
                self.phase = Phase::Failed;
                return Err(err.into());
            }
        }
    }
}

fn parse_url(url: &str) -> StreamResult<Url> {
    Url::parse(url).map_err(|_| StreamError::InvalidResource {
        url: url.to_string(),
    })
}

/// Discard exactly `offset` bytes from a freshly opened full-entity source.
fn fast_forward(source: &mut dyn ByteSource, offset: u64) -> io::Result<FastForward> {
    let mut remaining = offset;
    while remaining > 0 {
        match source.skip(remaining)? {
            SkipOutcome::Skipped(n) => remaining = remaining.saturating_sub(n),
            SkipOutcome::EndOfSource => return Ok(FastForward::SourceEnded),
        }
    }
    Ok(FastForward::Aligned)
}
