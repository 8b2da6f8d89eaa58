//! Streaming line reader for plain and gzipped logs
//!
//! The file is read on a blocking thread and lines are handed to the async
//! side through a bounded channel, so at most [`LINE_BUFFER`] lines are held
//! in memory no matter how large the log is. A single line is capped at
//! [`MAX_LINE_BYTES`]; the remainder of a longer line is skipped, so input
//! without newlines (a gzipped file read as plain text) cannot be buffered
//! whole. Dropping the stream stops the reader thread at its next send.
//!
//! # Examples
//!
//! ```no_run
//! use futures::StreamExt;
//! use logstat::log_reader::LogReader;
//!
//! # async fn example() -> logstat::Result<()> {
//! let reader = LogReader::open("log/nginx-access-ui.log-20170630.gz", true).await?;
//! let lines = reader.lines();
//! tokio::pin!(lines);
//! while let Some(line) = lines.next().await {
//!     println!("{}", line?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{LogstatError, Result};
use crate::log_finder::LogFile;
use flate2::read::MultiGzDecoder;
use futures::stream::{Stream, StreamExt};
use logstat_core::parser::parse_line;
use logstat_core::types::ParseResult;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Number of lines buffered between the reader thread and the consumer
pub const LINE_BUFFER: usize = 1024;

/// Longest line kept, in bytes
///
/// Far above any real access log line; a truncated line does not match the
/// log format and is counted as unparsed.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// An opened access log
pub struct LogReader {
    path: PathBuf,
    file: std::fs::File,
    compressed: bool,
}

impl LogReader {
    /// Open a log file, gzip-decoding it when `compressed` is set
    ///
    /// # Errors
    ///
    /// Returns [`LogstatError::SourceUnavailable`] when the file cannot be
    /// opened.
    pub async fn open(path: impl AsRef<Path>, compressed: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| LogstatError::source_unavailable(&path, e))?;
        debug!(
            "Opened {} ({})",
            path.display(),
            if compressed { "gzip" } else { "plain" }
        );

        Ok(Self {
            path,
            file: file.into_std().await,
            compressed,
        })
    }

    /// Open a log found by [`find_latest_log`](crate::log_finder::find_latest_log)
    pub async fn open_log(log: &LogFile) -> Result<Self> {
        Self::open(&log.path, log.compressed).await
    }

    /// Path of the opened file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream the lines of the log, without line terminators
    ///
    /// Invalid UTF-8 is replaced rather than rejected; such a line simply
    /// fails to parse later if it is damaged beyond the URL. A read or
    /// decompression failure is yielded once and ends the stream.
    pub fn lines(self) -> impl Stream<Item = Result<String>> {
        async_stream::stream! {
            let (tx, mut rx) = mpsc::channel::<Result<String>>(LINE_BUFFER);
            let LogReader { path, file, compressed } = self;

            tokio::task::spawn_blocking(move || {
                let reader: Box<dyn BufRead + Send> = if compressed {
                    Box::new(BufReader::new(MultiGzDecoder::new(file)))
                } else {
                    Box::new(BufReader::new(file))
                };
                read_lines(reader, &path, &tx);
            });

            while let Some(line) = rx.recv().await {
                yield line;
            }
        }
    }

    /// Stream the log as parse results, ready for aggregation
    pub fn parse_results(self) -> impl Stream<Item = Result<ParseResult>> {
        self.lines()
            .map(|line| line.map(|line| parse_line(&line)))
    }
}

fn read_lines(mut reader: impl BufRead, path: &Path, tx: &mpsc::Sender<Result<String>>) {
    let mut buf = Vec::new();
    let mut count = 0u64;

    loop {
        buf.clear();
        match read_capped_line(&mut reader, &mut buf) {
            Ok(false) => break,
            Ok(true) => {
                count += 1;
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.blocking_send(Ok(line)).is_err() {
                    trace!("Line consumer went away after {} lines", count);
                    return;
                }
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(LogstatError::source_unavailable(path, e)));
                return;
            }
        }
    }

    debug!("Read {} lines from {}", count, path.display());
}

/// Read one line into `buf` without its terminator, keeping at most
/// [`MAX_LINE_BYTES`]. Returns `false` at end of input.
fn read_capped_line(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> std::io::Result<bool> {
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES as u64)
        .read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(false);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if read == MAX_LINE_BYTES {
        let skipped = reader.skip_until(b'\n')?;
        trace!("Skipped {} bytes of an over-long line", skipped);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    async fn collect(reader: LogReader) -> Vec<Result<String>> {
        reader.lines().collect::<Vec<_>>().await
    }

    fn gzip(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn test_plain_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nginx-access-ui.log-20170630");
        std::fs::write(&path, "first\nsecond\r\n\nlast without newline").unwrap();

        let lines: Vec<String> = collect(LogReader::open(&path, false).await.unwrap())
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(lines, vec!["first", "second", "", "last without newline"]);
    }

    #[tokio::test]
    async fn test_gzip_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nginx-access-ui.log-20170630.gz");
        std::fs::write(&path, gzip(b"one\ntwo\nthree\n")).unwrap();

        let lines: Vec<String> = collect(LogReader::open(&path, true).await.unwrap())
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log");
        std::fs::write(&path, b"/caf\xe9\n").unwrap();

        let lines = collect(LogReader::open(&path, false).await.unwrap()).await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_ref().unwrap(), "/caf\u{fffd}");
    }

    #[tokio::test]
    async fn test_missing_file_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let result = LogReader::open(temp_dir.path().join("absent.log"), false).await;
        assert!(matches!(
            result,
            Err(LogstatError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_gzip_yields_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.gz");
        std::fs::write(&path, b"definitely not gzip data").unwrap();

        let lines = collect(LogReader::open(&path, true).await.unwrap()).await;
        assert_eq!(lines.len(), 1);
        assert!(matches!(
            lines[0],
            Err(LogstatError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_long_line_truncated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log");
        let mut content = "x".repeat(MAX_LINE_BYTES * 3);
        content.push_str("\nafter\n");
        std::fs::write(&path, content).unwrap();

        let lines: Vec<String> = collect(LogReader::open(&path, false).await.unwrap())
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES);
        assert_eq!(lines[1], "after");
    }

    #[tokio::test]
    async fn test_gzip_read_as_plain_is_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nginx-access-ui.log-20170630");
        let mut payload = Vec::new();
        for i in 0..50_000 {
            payload.extend_from_slice(format!("{i} ").as_bytes());
        }
        let mut compressed = gzip(&payload);
        compressed.retain(|&b| b != b'\n');
        compressed.extend(std::iter::repeat_n(b'z', MAX_LINE_BYTES * 2));
        std::fs::write(&path, &compressed).unwrap();

        let results: Vec<ParseResult> = LogReader::open(&path, false)
            .await
            .unwrap()
            .parse_results()
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(!results[0].is_parsed());
    }

    #[tokio::test]
    async fn test_early_drop_stops_reader() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.log");
        let content: String = (0..(LINE_BUFFER * 4)).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&path, content).unwrap();

        let reader = LogReader::open(&path, false).await.unwrap();
        let first: Vec<_> = reader.lines().take(3).collect().await;
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].as_ref().unwrap(), "line 0");
    }

    #[tokio::test]
    async fn test_parse_results() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log");
        std::fs::write(
            &path,
            concat!(
                r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "GET /api/v2/banner/25019354 HTTP/1.1" 200 927 "-" "Lynx/2.8.8dev.9" "-" "1498697422-2190034393-4708-9752759" "dc7161be3" 0.390"#,
                "\n",
                "garbage\n",
            ),
        )
        .unwrap();

        let results: Vec<ParseResult> = LogReader::open(&path, false)
            .await
            .unwrap()
            .parse_results()
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_parsed());
        assert!(!results[1].is_parsed());
    }
}
