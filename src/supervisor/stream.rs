use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;

use super::task::{LogEvent, LogLine, StreamSource};
use crate::ui::prelude::*;

/// Strip the line terminator and decode lossily
pub fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Read `reader` line by line as data arrives and forward every line.
///
/// A trailing line without newline is delivered at EOF. Reading continues
/// even if the receivers are gone so the child never blocks on a full pipe.
pub(super) async fn forward_lines<R>(
    reader: R,
    source: StreamSource,
    task: String,
    lines: UnboundedSender<LogLine>,
    events: Option<UnboundedSender<LogEvent>>,
) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(count);
        }

        let line = LogLine {
            source,
            text: decode_line(&buf),
        };
        count += 1;

        emit(
            Level::Debug,
            "supervisor.line",
            &format!("[{}] {}", task, line.text),
            None,
        );

        if let Some(events) = &events {
            let _ = events.send(LogEvent::Line {
                task: task.clone(),
                line: line.clone(),
            });
        }
        let _ = lines.send(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"abc\n"), "abc");
        assert_eq!(decode_line(b"abc\r\n"), "abc");
        assert_eq!(decode_line(b"partial"), "partial");
        assert_eq!(decode_line(b"\n"), "");
        assert_eq!(decode_line(b"bad \xff byte\n"), "bad \u{fffd} byte");
    }

    #[tokio::test]
    async fn test_forward_lines_flushes_partial_tail() {
        let input: &[u8] = b"one\ntwo\r\nthree";
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let count = forward_lines(input, StreamSource::Stdout, "t".into(), tx, Some(event_tx))
            .await
            .unwrap();
        assert_eq!(count, 3);

        let mut texts = Vec::new();
        while let Some(line) = rx.recv().await {
            assert_eq!(line.source, StreamSource::Stdout);
            texts.push(line.text);
        }
        assert_eq!(texts, vec!["one", "two", "three"]);

        let mut events = 0;
        while let Some(event) = event_rx.recv().await {
            assert!(matches!(event, LogEvent::Line { ref task, .. } if task == "t"));
            events += 1;
        }
        assert_eq!(events, 3);
    }

    #[tokio::test]
    async fn test_forward_lines_without_receiver_still_drains() {
        let input: &[u8] = b"a\nb\n";
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let count = forward_lines(input, StreamSource::Stderr, "t".into(), tx, None)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
