//! Request composition.
//!
//! Turns an operation, its interpolated path and the remaining parameters into
//! an [`HttpRequest`]. No I/O happens here.
//!
//! # Design
//! - Headers are layered: a fixed JSON baseline, then the client's configured
//!   headers, then `header` parameters, then per-call headers. Later layers
//!   win; names are compared case-insensitively and emitted lowercase. A name
//!   that is not an HTTP token, or a value with control characters, fails the
//!   call here instead of at send time.
//! - Parameters are routed by [`classify`]. Query pairs are encoded into the
//!   URL for every method, not only GET. A parameter explicitly declared
//!   `query` on a POST still reaches the server, and transports that ignore a
//!   separate query map still send it; the pairs are also kept on the request.
//! - Body parameters are serialized as one JSON object. No body is attached
//!   when no parameter lands there.

use serde_json::{Map, Value};
use tracing::info;

use crate::classify::{classify, Slot};
use crate::error::DispatchError;
use crate::http::HttpRequest;
use crate::types::{Operation, Specification};
use crate::{Headers, Params};

pub const DEFAULT_ACCEPT: &str = "application/json, text/plain";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Resource-level inputs shared by every call on one resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceConfig<'a> {
    pub spec: &'a Specification,
    pub headers: &'a Headers,
    pub debug: bool,
}

/// Compose the request for `operation`.
///
/// `path` is the already-interpolated path and `params` what is left of the
/// caller's parameters after interpolation.
pub fn compose(
    config: ResourceConfig<'_>,
    operation: &Operation,
    path: &str,
    params: Params,
    call_headers: Option<&Headers>,
) -> Result<HttpRequest, DispatchError> {
    let method = operation.http_method;
    let mut headers = baseline_headers();
    merge_headers(&mut headers, config.headers);

    let mut query = Vec::new();
    let mut body = Map::new();
    let mut header_params = Headers::new();

    for (name, value) in params {
        match classify(config.spec, operation, &name).slot(method) {
            Slot::Query => query.push((name, query_value(&value))),
            Slot::Body => {
                body.insert(name, value);
            }
            Slot::Header => {
                header_params.insert(name, query_value(&value));
            }
            // Declared as a path parameter but absent from the template.
            Slot::Path => {
                if method.is_mutating() {
                    body.insert(name, value);
                } else {
                    query.push((name, query_value(&value)));
                }
            }
        }
    }

    merge_headers(&mut headers, &header_params);
    if let Some(call_headers) = call_headers {
        merge_headers(&mut headers, call_headers);
    }

    for (name, value) in &headers {
        if !is_header_name(name) || !is_header_value(value) {
            return Err(DispatchError::InvalidHeader(name.clone()));
        }
    }

    let url = append_query(&format!("{}{}", config.spec.base_path, path), &query);
    let body = if body.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&Value::Object(body)).map_err(DispatchError::Serialization)?)
    };

    let request = HttpRequest {
        method,
        url,
        headers: headers.into_iter().collect(),
        query,
        body,
    };
    if config.debug {
        info!(
            operation = %operation.nickname,
            method = %request.method,
            url = %request.url,
            body = request.body.as_deref().unwrap_or(""),
            "composed request"
        );
    }
    Ok(request)
}

pub fn baseline_headers() -> Headers {
    Headers::from([
        ("accept".to_string(), DEFAULT_ACCEPT.to_string()),
        ("content-type".to_string(), DEFAULT_CONTENT_TYPE.to_string()),
    ])
}

/// Merge `overrides` into `headers`; overriding names win regardless of case.
pub fn merge_headers(headers: &mut Headers, overrides: &Headers) {
    for (name, value) in overrides {
        headers.insert(name.to_ascii_lowercase(), value.clone());
    }
}

/// RFC 9110 token characters.
fn is_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// Visible ASCII, spaces and tabs; no CR, LF or other controls.
fn is_header_value(value: &str) -> bool {
    value.bytes().all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
}

/// Text form of a parameter value for query strings and headers.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `key=urlencode(value)` pairs joined with `&`.
pub fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn append_query(url: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", encode_query(query))
}
