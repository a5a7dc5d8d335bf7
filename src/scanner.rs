//! Bounded line reader over an async byte stream

use crate::errors::ScanError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

pub type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Yields the lines of a stream, refusing any line longer than `max_line_bytes`.
///
/// Line terminators (`\n` or `\r\n`) are stripped and do not count toward the bound,
/// so a line of exactly `max_line_bytes` content bytes is accepted.
pub struct LineScanner {
    reader: LineReader,
    max_line_bytes: usize,
    line_number: usize,
    buf: Vec<u8>,
    done: bool,
}

impl LineScanner {
    pub fn new<R>(reader: R, max_line_bytes: usize) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            max_line_bytes,
            line_number: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Next line with its 1-based number, or `None` at end of stream.
    ///
    /// After an error the scanner is exhausted.
    pub async fn next_line(&mut self) -> Result<Option<(usize, &[u8])>, ScanError> {
        if self.done {
            return Ok(None);
        }

        self.buf.clear();
        // Room for the longest allowed line plus a "\r\n" terminator
        let limit = self.max_line_bytes as u64 + 2;
        let read = match (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await
        {
            Ok(read) => read,
            Err(e) => {
                self.done = true;
                return Err(ScanError::Io(e));
            }
        };

        if read == 0 {
            self.done = true;
            return Ok(None);
        }

        self.line_number += 1;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        if self.buf.len() > self.max_line_bytes {
            self.done = true;
            return Err(ScanError::LineTooLong {
                line: self.line_number,
                limit: self.max_line_bytes,
            });
        }

        Ok(Some((self.line_number, &self.buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(input: &'static [u8], max: usize) -> (Vec<(usize, String)>, Option<ScanError>) {
        let mut scanner = LineScanner::new(input, max);
        let mut lines = Vec::new();
        loop {
            match scanner.next_line().await {
                Ok(Some((n, line))) => lines.push((n, String::from_utf8_lossy(line).into_owned())),
                Ok(None) => return (lines, None),
                Err(e) => return (lines, Some(e)),
            }
        }
    }

    #[tokio::test]
    async fn test_splits_and_strips_terminators() {
        let (lines, err) = collect(b"one\r\ntwo\n\nthree", 64).await;

        assert!(err.is_none());
        assert_eq!(
            lines,
            vec![
                (1, "one".to_string()),
                (2, "two".to_string()),
                (3, String::new()),
                (4, "three".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (lines, err) = collect(b"", 8).await;
        assert!(lines.is_empty());
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let (lines, err) = collect(b"abcd\r\nefgh", 4).await;
        assert!(err.is_none());
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_line_over_limit_fails() {
        let (lines, err) = collect(b"ok\nabcdefgh\nnever", 4).await;

        assert_eq!(lines, vec![(1, "ok".to_string())]);
        match err {
            Some(ScanError::LineTooLong { line, limit }) => {
                assert_eq!(line, 2);
                assert_eq!(limit, 4);
            }
            other => panic!("expected LineTooLong, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unterminated_last_line_over_limit_fails() {
        let (_, err) = collect(b"abcde", 4).await;
        assert!(matches!(err, Some(ScanError::LineTooLong { line: 1, .. })));
    }

    #[tokio::test]
    async fn test_exhausted_after_error() {
        let mut scanner = LineScanner::new(&b"toolong\nfine\n"[..], 3);
        assert!(scanner.next_line().await.is_err());
        assert!(scanner.next_line().await.unwrap().is_none());
    }
}
