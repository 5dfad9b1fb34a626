//! In-process vendor API for integration tests
//!
//! Answers every POST with the next scripted reply and records what it
//! received, so one server can stand in for any of the vendors.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Scripted answer for one request
pub enum Reply {
    /// 200 with a JSON body
    Json(Value),
    /// 200 with a JSON body after a delay
    SlowJson(Duration, Value),
    /// Non-2xx with a text body
    Status(u16, String),
    /// Non-2xx whose body breaks off after a partial write
    BrokenStatus(u16),
    /// 200 `text/event-stream`, writing each chunk after `delay`
    Sse { chunks: Vec<String>, delay: Duration },
}

impl Reply {
    /// SSE reply with no delay between chunks
    pub fn sse<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Sse {
            chunks: chunks.into_iter().map(Into::into).collect(),
            delay: Duration::ZERO,
        }
    }
}

/// A request as received by the mock vendor
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// Path and query
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Mock vendor server bound to a random local port
pub struct MockVendor {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<VendorState>,
}

#[derive(Default)]
struct VendorState {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ReceivedRequest>>,
}

impl MockVendor {
    /// Start the server with replies consumed in order
    pub async fn start(replies: impl IntoIterator<Item = Reply>) -> anyhow::Result<Self> {
        let state = Arc::new(VendorState {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::default(),
        });

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL with a path prefix such as `/v1`
    pub fn url(&self, prefix: &str) -> String {
        format!("http://{}{prefix}", self.addr)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockVendor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<VendorState>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path_and_query().map_or_else(|| uri.path().to_owned(), ToString::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(ReceivedRequest { path, headers, body });

    let Some(reply) = state.replies.lock().unwrap().pop_front() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no reply scripted").into_response();
    };

    match reply {
        Reply::Json(value) => axum::Json(value).into_response(),
        Reply::SlowJson(delay, value) => {
            tokio::time::sleep(delay).await;
            axum::Json(value).into_response()
        }
        Reply::Status(status, body) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        }
        Reply::BrokenStatus(status) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = futures_util::stream::iter([
                Ok(Bytes::from_static(b"{\"error\": ")),
                Err(std::io::Error::other("connection dropped")),
            ]);
            (status, Body::from_stream(body)).into_response()
        }
        Reply::Sse { chunks, delay } => {
            let stream = futures_util::stream::iter(chunks).then(move |chunk| async move {
                tokio::time::sleep(delay).await;
                Ok::<_, Infallible>(Bytes::from(chunk))
            });
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
    }
}
