//! In-memory transport for adapter tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use super::{ByteStream, StreamTransport, Transport};
use crate::context::StreamContext;
use crate::error::LlmError;

/// Request seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
}

enum Reply {
    Json(Value),
    Chunks(Vec<Bytes>),
    Status(StatusCode, String),
}

/// Transport that replays canned replies in order
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    streaming: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            streaming: true,
            ..Self::default()
        }
    }

    /// Mock that only supports single-shot calls
    pub fn without_streaming() -> Self {
        Self::default()
    }

    pub fn reply_json(self, body: Value) -> Self {
        self.push(Reply::Json(body))
    }

    /// Queue a stream body delivered as the given chunks
    pub fn reply_chunks<I, C>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let chunks = chunks
            .into_iter()
            .map(|c| Bytes::copy_from_slice(c.as_ref()))
            .collect();
        self.push(Reply::Chunks(chunks))
    }

    pub fn reply_status(self, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(Reply::Status(status, body.to_owned()))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Body of the only request made
    pub fn last_body(&self) -> Value {
        self.requests.lock().unwrap().last().unwrap().body.clone()
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    fn record(&self, url: &str, headers: HeaderMap, body: &Value) -> Reply {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_owned(),
            headers,
            body: body.clone(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no reply queued")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<Value, LlmError> {
        match self.record(url, headers, body) {
            Reply::Json(value) => Ok(value),
            Reply::Status(status, body) => Err(LlmError::Transport { status, body }),
            Reply::Chunks(chunks) => {
                let raw: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
                serde_json::from_slice(&raw).map_err(|e| LlmError::MalformedResponseBody(e.to_string()))
            }
        }
    }

    fn as_stream_transport(&self) -> Option<&dyn StreamTransport> {
        self.streaming.then_some(self as &dyn StreamTransport)
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    async fn stream_post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Value,
        _context: &StreamContext,
    ) -> Result<ByteStream, LlmError> {
        match self.record(url, headers, body) {
            Reply::Chunks(chunks) => Ok(Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok)))),
            Reply::Status(status, body) => Err(LlmError::Transport { status, body }),
            Reply::Json(value) => {
                let bytes = Bytes::from(value.to_string());
                Ok(Box::pin(futures_util::stream::iter([Ok(bytes)])))
            }
        }
    }
}
