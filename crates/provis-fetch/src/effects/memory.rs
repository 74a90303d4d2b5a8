use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;

use crate::effects::http::{HttpClient, HttpResponse};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MemoryError(pub String);

#[derive(Clone, Debug)]
enum Route {
    Body(Bytes),
    Status(u16),
    Unreachable,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, Route>,
    delays: HashMap<String, Duration>,
    requests: Vec<String>,
}

/// In-memory [`HttpClient`] serving canned responses and recording every
/// request. Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MemoryClient {
    state: Arc<Mutex<State>>,
}

impl MemoryClient {
    pub fn new() -> Self { Self::default() }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Serve `body` with status 200 at `url`.
    pub fn route(&self, url: impl Into<String>, body: impl Into<Bytes>) -> &Self {
        let body = body.into();
        self.with_state(|s| s.routes.insert(url.into(), Route::Body(body)));
        self
    }

    /// Answer `url` with a bare status code.
    pub fn status(&self, url: impl Into<String>, status: u16) -> &Self {
        self.with_state(|s| s.routes.insert(url.into(), Route::Status(status)));
        self
    }

    /// Fail `url` at the transport layer.
    pub fn unreachable(&self, url: impl Into<String>) -> &Self {
        self.with_state(|s| s.routes.insert(url.into(), Route::Unreachable));
        self
    }

    /// Hold every response for `url` back by `delay`.
    pub fn delay(&self, url: impl Into<String>, delay: Duration) -> &Self {
        self.with_state(|s| s.delays.insert(url.into(), delay));
        self
    }

    pub fn request_count(&self) -> usize {
        self.with_state(|s| s.requests.len())
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.with_state(|s| s.requests.iter().filter(|r| r.as_str() == url).count())
    }

    pub fn requests(&self) -> Vec<String> {
        self.with_state(|s| s.requests.clone())
    }

    pub fn clear_requests(&self) {
        self.with_state(|s| s.requests.clear());
    }
}

impl HttpClient for MemoryClient {
    type Error = MemoryError;

    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse<Self::Error>, Self::Error> {
        let (route, delay) = self.with_state(|s| {
            s.requests.push(url.to_string());
            (s.routes.get(url).cloned(), s.delays.get(url).copied())
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match route {
            Some(Route::Body(body)) => Ok(HttpResponse {
                status: 200,
                content_length: Some(body.len() as u64),
                body: Box::pin(stream::iter([Ok(body)])),
            }),
            Some(Route::Status(status)) => Ok(HttpResponse {
                status,
                content_length: Some(0),
                body: Box::pin(stream::empty()),
            }),
            Some(Route::Unreachable) => Err(MemoryError(format!("connection refused: {url}"))),
            None => Ok(HttpResponse {
                status: 404,
                content_length: Some(0),
                body: Box::pin(stream::empty()),
            }),
        }
    }
}
