//! In-memory transport and sample specifications for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Session, Transport};
use crate::types::Specification;

pub(crate) fn spec(name: &str) -> Specification {
    let raw = match name {
        "acl" => include_str!("../../specs/acl.json"),
        "core" => include_str!("../../specs/core.json"),
        other => panic!("no sample spec named {other}"),
    };
    Specification::from_json(raw).unwrap()
}

/// Replays queued replies (then a fallback reply) and records every request.
pub(crate) struct RecordingTransport {
    queued: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    fallback: Option<HttpResponse>,
    cookie: Option<(String, String)>,
    requests: Mutex<Vec<HttpRequest>>,
    sessions: Mutex<Vec<Session>>,
}

impl RecordingTransport {
    pub(crate) fn new(replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self {
            queued: Mutex::new(replies.into()),
            fallback: None,
            cookie: None,
            requests: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(status: u16, body: &str) -> Self {
        let mut transport = Self::new(Vec::new());
        transport.fallback = Some(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        });
        transport
    }

    /// Set this cookie on the session of every call, like a server would.
    pub(crate) fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookie = Some((name.to_string(), value.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub(crate) fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<HttpResponse, TransportError> {
        if let Some(reply) = self.queued.lock().unwrap().pop_front() {
            return reply;
        }
        self.fallback
            .clone()
            .ok_or_else(|| TransportError::Io("no reply queued".to_string()))
    }
}

impl Transport for RecordingTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        session: Session,
    ) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        // Suspend once so overlapping calls interleave like real I/O.
        tokio::task::yield_now().await;
        if let Some((name, value)) = &self.cookie {
            session.absorb_set_cookie(&url, &format!("{name}={value}; Path=/"));
        }
        self.sessions.lock().unwrap().push(session);
        self.next_reply()
    }
}
