//! Sequential byte-source abstraction over a response body.

use std::io::{self, Read};

/// Scratch buffer size for discard reads (64KB).
const SKIP_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of a single discard attempt on a byte source.
///
/// Exhaustion gets its own variant so a zero-length discard request is
/// never mistaken for end-of-source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// This many bytes were discarded.
    Skipped(u64),
    /// The source ended before any byte could be discarded.
    EndOfSource,
}

/// A sequential, single-owner byte source.
///
/// Exactly one live source backs a stream at any time; it is replaced
/// wholesale on reconnect and released by dropping it. `read` returning
/// `Ok(0)` on a non-empty buffer signals exhaustion.
pub trait ByteSource: Read + Send {
    /// Discard up to `max` bytes from the source.
    ///
    /// Makes a single read attempt, so the discarded count may be less
    /// than `max`; callers loop until aligned. Requesting a zero-byte
    /// discard returns `Skipped(0)` without touching the source.
    fn skip(&mut self, max: u64) -> io::Result<SkipOutcome> {
        if max == 0 {
            return Ok(SkipOutcome::Skipped(0));
        }
        let len = max.min(SKIP_BUFFER_SIZE as u64) as usize;
        let mut scratch = vec![0u8; len];
        match self.read(&mut scratch) {
            Ok(0) => Ok(SkipOutcome::EndOfSource),
            Ok(n) => Ok(SkipOutcome::Skipped(n as u64)),
            Err(e) => Err(e),
        }
    }
}

/// Byte source backed by a blocking HTTP response body.
pub struct HttpByteSource {
    body: reqwest::blocking::Response,
}

impl HttpByteSource {
    /// Wrap a response whose body has not been read yet.
    pub fn new(response: reqwest::blocking::Response) -> Self {
        Self { body: response }
    }
}

impl Read for HttpByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

impl ByteSource for HttpByteSource {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct MemorySource(Cursor<Vec<u8>>);

    impl Read for MemorySource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl ByteSource for MemorySource {}

    #[test]
    fn test_skip_discards_bytes() {
        let mut source = MemorySource(Cursor::new(vec![1, 2, 3, 4, 5]));
        let outcome = source.skip(3).unwrap();
        assert_eq!(outcome, SkipOutcome::Skipped(3));

        let mut rest = Vec::new();
        source.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![4, 5]);
    }

    #[test]
    fn test_skip_zero_is_not_end_of_source() {
        let mut source = MemorySource(Cursor::new(vec![1, 2, 3]));
        assert_eq!(source.skip(0).unwrap(), SkipOutcome::Skipped(0));
    }

    #[test]
    fn test_skip_on_exhausted_source_reports_end() {
        let mut source = MemorySource(Cursor::new(Vec::new()));
        assert_eq!(source.skip(10).unwrap(), SkipOutcome::EndOfSource);
    }

    #[test]
    fn test_skip_never_discards_more_than_requested() {
        let mut source = MemorySource(Cursor::new(vec![0u8; 1000]));
        match source.skip(7).unwrap() {
            SkipOutcome::Skipped(n) => assert!(n <= 7),
            SkipOutcome::EndOfSource => panic!("source is not exhausted"),
        }
    }

    #[test]
    fn test_skip_caps_single_attempt_at_buffer_size() {
        let len = SKIP_BUFFER_SIZE * 2;
        let mut source = MemorySource(Cursor::new(vec![0u8; len]));
        match source.skip(len as u64).unwrap() {
            SkipOutcome::Skipped(n) => assert!(n <= SKIP_BUFFER_SIZE as u64),
            SkipOutcome::EndOfSource => panic!("source is not exhausted"),
        }
    }
}
