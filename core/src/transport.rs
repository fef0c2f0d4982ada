//! Blocking ureq transport driven from tokio's blocking pool.
//!
//! Status codes are never treated as errors: every response, 4xx and 5xx
//! included, comes back as an `HttpResponse` for the envelope layer to judge.
//! Cookies the [`Session`] scopes to the request URL are sent with it and
//! every `Set-Cookie` response header is recorded back into the session.

use tracing::trace;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Session, Transport};

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a preconfigured agent. It should be built with
    /// `http_status_as_error(false)`.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        session: Session,
    ) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request, &session))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?
    }
}

fn execute_blocking(
    agent: &ureq::Agent,
    request: HttpRequest,
    session: &Session,
) -> Result<HttpResponse, TransportError> {
    let HttpRequest {
        method,
        url,
        mut headers,
        body,
        ..
    } = request;
    if let Some(cookie) = session.cookie_header(&url) {
        headers.push(("cookie".to_string(), cookie));
    }
    trace!(%method, %url, "sending request");

    let result = match method {
        HttpMethod::Get => with_headers(agent.get(&url), &headers).call(),
        HttpMethod::Delete => {
            let builder = with_headers(agent.delete(&url), &headers);
            match body {
                Some(body) => builder.force_send_body().send(body.as_bytes()),
                None => builder.call(),
            }
        }
        HttpMethod::Post => send(with_headers(agent.post(&url), &headers), body),
        HttpMethod::Put => send(with_headers(agent.put(&url), &headers), body),
        HttpMethod::Patch => send(with_headers(agent.patch(&url), &headers), body),
    };
    let mut response = result.map_err(map_error)?;

    let status = response.status().as_u16();
    let mut response_headers = Vec::new();
    for (name, value) in response.headers() {
        let Ok(value) = value.to_str() else {
            continue;
        };
        if name.as_str() == "set-cookie" {
            session.absorb_set_cookie(&url, value);
        }
        response_headers.push((name.as_str().to_string(), value.to_string()));
    }
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| TransportError::Io(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers: response_headers,
        body,
    })
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Io(e) => TransportError::Io(e.to_string()),
        other => TransportError::Connect(other.to_string()),
    }
}
