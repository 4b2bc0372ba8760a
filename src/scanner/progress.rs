//! Live progress lines for a single run
//!
//! The coordinator pushes one human-readable line per finished ID, in
//! completion order, followed by [`COMPLETION_LINE`]. The stream ends when
//! the run ends. A subscriber that goes away does not affect the run.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Final line of every progress stream
pub const COMPLETION_LINE: &str = "Processing complete.";

/// MIME type for server-sent events
pub const SSE_CONTENT_TYPE: &str = "text/event-stream";

/// Creates a connected sender/stream pair for one run
pub fn progress_channel() -> (ProgressSender, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSender { tx },
        ProgressStream {
            inner: UnboundedReceiverStream::new(rx),
        },
    )
}

/// Producer side, held by the coordinator
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<String>,
}

impl ProgressSender {
    /// Forwards a line; returns false once the subscriber has gone away
    pub fn send(&self, line: impl Into<String>) -> bool {
        self.tx.send(line.into()).is_ok()
    }

    /// Sends the completion line and closes this sender
    pub fn finish(self) {
        let _ = self.tx.send(COMPLETION_LINE.to_string());
    }
}

/// Subscriber side: a finite stream of outcome lines
#[derive(Debug)]
pub struct ProgressStream {
    inner: UnboundedReceiverStream<String>,
}

impl ProgressStream {
    /// Maps every line to a server-sent-events frame
    pub fn into_sse(self) -> impl Stream<Item = String> + Send + Unpin {
        self.map(|line| sse_frame(&line))
    }
}

impl Stream for ProgressStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Frames a line as a server-sent event: `data: <line>` plus a blank line
///
/// Embedded newlines become additional `data:` fields of the same event.
pub fn sse_frame(line: &str) -> String {
    let mut frame = String::with_capacity(line.len() + 8);
    for part in line.split('\n') {
        frame.push_str("data: ");
        frame.push_str(part.trim_end_matches('\r'));
        frame.push('\n');
    }
    frame.push('\n');
    frame
}
