//! Recording HTTP server for exercising clients over real sockets.
//!
//! Every request, whatever its method or path, is recorded and answered with
//! the next enqueued `MockResponse` (or an empty 200 once the queue is
//! drained). Tests read the recorded requests back in arrival order.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use bytes::Bytes;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// A canned response.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
        }
    }
}

impl MockResponse {
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A request as the server saw it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_utf8(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Default)]
struct Queues {
    responses: VecDeque<MockResponse>,
    requests: VecDeque<RecordedRequest>,
}

/// Shared state between the handler and the test driving it.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Queues>>,
}

impl Recorder {
    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, response: MockResponse) {
        self.lock().responses.push_back(response);
    }

    /// Oldest request not yet taken.
    pub fn take_request(&self) -> Option<RecordedRequest> {
        self.lock().requests.pop_front()
    }

    /// Requests recorded and not yet taken.
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn record(&self, request: RecordedRequest) -> MockResponse {
        let mut queues = self.lock();
        queues.requests.push_back(request);
        queues.responses.pop_front().unwrap_or_default()
    }
}

pub fn app(recorder: Recorder) -> Router {
    Router::new().fallback(record).with_state(recorder)
}

pub async fn run(listener: TcpListener, recorder: Recorder) -> Result<(), std::io::Error> {
    axum::serve(listener, app(recorder)).await
}

async fn record(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(%method, path = %uri.path(), "recorded request");
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect(),
        body,
    };
    into_response(recorder.record(recorded))
}

fn into_response(mock: MockResponse) -> Response {
    let status = StatusCode::from_u16(mock.status).unwrap_or_else(|_| {
        warn!(status = mock.status, "invalid canned status, answering 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });
    let mut response = Response::new(Body::from(mock.body));
    *response.status_mut() = status;
    for (name, value) in &mock.headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => warn!(%name, "skipping invalid canned header"),
        }
    }
    response
}

/// A recording server on an ephemeral localhost port, served from a
/// background thread with its own runtime. Usable from sync and async tests.
#[derive(Debug)]
pub struct MockServer {
    addr: SocketAddr,
    recorder: Recorder,
}

impl MockServer {
    pub fn spawn() -> Result<Self, std::io::Error> {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = std_listener.local_addr()?;
        std_listener.set_nonblocking(true)?;

        let recorder = Recorder::default();
        let served = recorder.clone();
        std::thread::spawn(move || -> Result<(), std::io::Error> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(async {
                let listener = TcpListener::from_std(std_listener)?;
                run(listener, served).await
            })
        });

        Ok(Self { addr, recorder })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn enqueue(&self, response: MockResponse) {
        self.recorder.enqueue(response);
    }

    pub fn take_request(&self) -> Option<RecordedRequest> {
        self.recorder.take_request()
    }

    pub fn request_count(&self) -> usize {
        self.recorder.request_count()
    }
}
