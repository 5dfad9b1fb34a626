//! Pull-driven canonical event stream
//!
//! Vendor adapters only decode individual SSE frames. [`EventStream`] owns
//! everything else: reading, cancellation, tool call accumulation and the
//! closing `ToolCallsReady` / `StreamCompleted` pair.

use std::collections::VecDeque;

use futures_util::Stream;

use crate::accumulator::ToolCallAccumulator;
use crate::context::StreamContext;
use crate::error::LlmError;
use crate::sse::{SseFrame, SseStream};
use crate::transport::ByteStream;
use crate::types::{FinishReason, StreamEvent, UsageInfo};

/// Output of decoding one vendor frame
#[derive(Debug, Default)]
pub struct DecodedChunk {
    /// Canonical events in emission order
    pub events: Vec<StreamEvent>,
    /// Finish reason, if this frame reported one
    pub finish_reason: Option<FinishReason>,
    /// Usage so far, if this frame reported any
    pub usage: Option<UsageInfo>,
    /// Vendor signalled the end of the stream
    pub done: bool,
}

/// Per-vendor decoder of SSE frames
pub trait ChunkDecoder: Send {
    /// Decode one frame into `out`
    ///
    /// # Errors
    ///
    /// `LlmError::MalformedResponseBody` for undecodable payloads,
    /// `LlmError::Provider` for vendor-reported errors
    fn decode(&mut self, frame: &SseFrame, out: &mut DecodedChunk) -> Result<(), LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Streaming,
    Done,
}

/// Canonical events of one streaming call
///
/// Finite and consumed once. Every item is produced on demand by
/// [`EventStream::next`]; nothing runs in the background.
pub struct EventStream {
    frames: SseStream,
    decoder: Box<dyn ChunkDecoder>,
    context: StreamContext,
    accumulator: ToolCallAccumulator,
    pending: VecDeque<Result<StreamEvent, LlmError>>,
    finish_reason: Option<FinishReason>,
    usage: Option<UsageInfo>,
    phase: Phase,
}

impl EventStream {
    /// Wrap a response body with a vendor decoder
    pub fn new(body: ByteStream, decoder: impl ChunkDecoder + 'static, context: StreamContext) -> Self {
        Self {
            frames: SseStream::new(body, context.clone()),
            decoder: Box::new(decoder),
            context,
            accumulator: ToolCallAccumulator::new(),
            pending: VecDeque::new(),
            finish_reason: None,
            usage: None,
            phase: Phase::Streaming,
        }
    }

    /// Next event, or `None` when the stream has ended
    ///
    /// Ends silently once cancellation is observed. After an error the
    /// stream is ended; events already returned stand.
    pub async fn next(&mut self) -> Option<Result<StreamEvent, LlmError>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.phase == Phase::Done {
                return None;
            }
            if self.context.is_cancelled() {
                tracing::debug!("event stream cancelled");
                self.close();
                return None;
            }

            match self.frames.next_frame().await {
                Some(Ok(frame)) => self.handle_frame(&frame),
                Some(Err(e)) => {
                    self.phase = Phase::Done;
                    return Some(Err(e));
                }
                None if self.frames.is_cancelled() => {
                    self.close();
                    return None;
                }
                None => self.complete(),
            }
        }
    }

    /// Stop consuming; subsequent calls to `next` return `None`
    pub fn close(&mut self) {
        self.phase = Phase::Done;
        self.pending.clear();
        self.accumulator.clear();
        self.frames.cancel();
    }

    /// Adapt into a `futures` stream
    pub fn into_stream(self) -> impl Stream<Item = Result<StreamEvent, LlmError>> + Send {
        futures_util::stream::unfold(self, |mut events| async move {
            let item = events.next().await?;
            Some((item, events))
        })
    }

    fn handle_frame(&mut self, frame: &SseFrame) {
        tracing::trace!(event = frame.event_type(), len = frame.data.len(), "stream frame");

        let mut chunk = DecodedChunk::default();
        if let Err(e) = self.decoder.decode(frame, &mut chunk) {
            tracing::warn!(error = %e, "failed to decode stream frame");
            self.phase = Phase::Done;
            self.pending.push_back(Err(e));
            return;
        }

        for event in chunk.events {
            if let StreamEvent::ToolCallDelta(delta) = &event {
                self.accumulator.add(delta);
            }
            self.pending.push_back(Ok(event));
        }
        if chunk.finish_reason.is_some() {
            self.finish_reason = chunk.finish_reason;
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
        if chunk.done {
            self.complete();
        }
    }

    fn complete(&mut self) {
        self.phase = Phase::Done;

        if self.accumulator.has_tool_calls() {
            match self.accumulator.tool_calls() {
                Ok(tool_calls) => self.pending.push_back(Ok(StreamEvent::ToolCallsReady { tool_calls })),
                Err(e) => {
                    self.pending.push_back(Err(e));
                    return;
                }
            }
        }

        self.pending.push_back(Ok(StreamEvent::StreamCompleted {
            finish_reason: self.finish_reason.take(),
            usage: self.usage.take(),
        }));
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("phase", &self.phase)
            .field("pending", &self.pending.len())
            .field("tool_calls", &self.accumulator.len())
            .finish_non_exhaustive()
    }
}
