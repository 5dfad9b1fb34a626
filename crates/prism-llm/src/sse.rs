//! Server-Sent Events framing
//!
//! [`SseDecoder`] is the I/O-free line parser. [`SseStream`] pulls bytes from
//! a transport body, feeds the decoder and honors cancellation between reads.

use std::collections::VecDeque;

use futures_util::StreamExt;

use crate::context::StreamContext;
use crate::error::LlmError;
use crate::transport::ByteStream;

/// One dispatched SSE event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the last `event:` field, if any
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
}

impl SseFrame {
    /// Frame with only a data payload
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }

    /// Event type, empty when unset
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or_default()
    }
}

/// Incremental SSE line parser
///
/// Bytes are buffered until a full line is available, so chunk boundaries
/// may fall anywhere, including inside a multi-byte character.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return every frame it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = self.process_line(&line[..pos]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush at end of input
    ///
    /// Processes an unterminated final line, then yields pending data as a
    /// last frame.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            if let Some(frame) = self.process_line(&line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<SseFrame> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);

        if line.is_empty() {
            let frame = self.dispatch();
            self.event = None;
            return frame;
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };

        match field {
            "data" => self.data.push(value.to_owned()),
            "event" => self.event = Some(value.to_owned()),
            "id" | "retry" => {}
            other => tracing::trace!(field = other, "ignoring unknown SSE field"),
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() {
            return None;
        }

        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: self.event.take(),
            data,
        })
    }
}

/// Lazily parsed frames from a response body
pub struct SseStream {
    body: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<SseFrame>,
    context: StreamContext,
    finished: bool,
    cancelled: bool,
}

impl SseStream {
    pub fn new(body: ByteStream, context: StreamContext) -> Self {
        Self {
            body,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            context,
            finished: false,
            cancelled: false,
        }
    }

    /// Next frame, or `None` once the body is exhausted or cancelled
    ///
    /// The cancellation predicate is checked before every read and before
    /// every buffered frame is handed out. Once it fires, buffered frames
    /// and partial data are dropped and the stream stays ended.
    ///
    /// # Errors
    ///
    /// Propagates the body's read error; the stream ends after it.
    pub async fn next_frame(&mut self) -> Option<Result<SseFrame, LlmError>> {
        loop {
            if self.cancelled {
                return None;
            }
            if self.context.is_cancelled() {
                tracing::debug!(buffered = self.pending.len(), "stream cancelled");
                self.cancel();
                return None;
            }
            if let Some(frame) = self.pending.pop_front() {
                return Some(Ok(frame));
            }
            if self.finished {
                return None;
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.feed(&chunk)),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    /// Whether cancellation was observed
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Stop reading and drop anything buffered
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.finished = true;
        self.pending.clear();
        self.decoder = SseDecoder::new();
    }
}
