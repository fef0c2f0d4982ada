//! Normalized call results.
//!
//! Every completed round-trip becomes a [`ResponseEnvelope`]: `Success` for a
//! 200 response, `Failure` for any other status or a transport failure. An
//! empty 200 body is read as `{}`. A body that fails to parse leaves `obj` as
//! `None` without failing the call; callers treat that as the parse-failure
//! signal.

use serde_json::Value;
use tracing::{error, warn};

use crate::error::TransportError;
use crate::http::HttpResponse;
use crate::types::Operation;

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Success {
        status: u16,
        headers: Vec<(String, String)>,
        obj: Option<Value>,
    },
    Failure {
        /// `0` when the transport produced no response.
        status: u16,
        headers: Vec<(String, String)>,
        response: String,
        /// Message the operation documents for `status`, if any.
        message: Option<String>,
    },
}

impl ResponseEnvelope {
    pub fn success(status: u16, headers: Vec<(String, String)>, obj: Option<Value>) -> Self {
        ResponseEnvelope::Success {
            status,
            headers,
            obj,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ResponseEnvelope::Success { status, .. } | ResponseEnvelope::Failure { status, .. } => {
                *status
            }
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        match self {
            ResponseEnvelope::Success { headers, .. }
            | ResponseEnvelope::Failure { headers, .. } => headers,
        }
    }

    /// Parsed body of a success envelope.
    pub fn obj(&self) -> Option<&Value> {
        match self {
            ResponseEnvelope::Success { obj, .. } => obj.as_ref(),
            ResponseEnvelope::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    /// A 200 response whose body could not be parsed.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { obj: None, .. })
    }
}

/// Build the envelope for a response to `operation`.
pub fn normalize(operation: &Operation, response: HttpResponse, unescape: bool) -> ResponseEnvelope {
    let HttpResponse {
        status,
        headers,
        body,
    } = response;

    if status != 200 {
        let message = operation.response_message(status).map(str::to_string);
        error!(
            operation = %operation.nickname,
            status,
            message = message.as_deref().unwrap_or(""),
            body = %body,
            "API error"
        );
        return ResponseEnvelope::Failure {
            status,
            headers,
            response: body,
            message,
        };
    }

    let obj = if body.trim().is_empty() {
        Some(Value::Object(serde_json::Map::new()))
    } else {
        match serde_json::from_str::<Value>(&body) {
            Ok(mut value) => {
                if unescape {
                    unescape_strings(&mut value);
                }
                Some(value)
            }
            Err(e) => {
                warn!(operation = %operation.nickname, error = %e, "response body is not valid JSON");
                None
            }
        }
    };
    ResponseEnvelope::success(status, headers, obj)
}

/// Envelope for a call whose transport produced no response.
pub fn transport_failure(operation: &Operation, err: &TransportError) -> ResponseEnvelope {
    error!(operation = %operation.nickname, error = %err, "transport failure");
    ResponseEnvelope::Failure {
        status: 0,
        headers: Vec::new(),
        response: err.to_string(),
        message: None,
    }
}

/// Decode HTML entities in every string of `value`, in place.
pub fn unescape_strings(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains('&') {
                *s = unescape_entities(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(unescape_strings),
        Value::Object(map) => map.values_mut().for_each(unescape_strings),
        _ => {}
    }
}

fn unescape_entities(s: &str) -> String {
    // `&amp;` last so that `&amp;lt;` decodes to `&lt;`, not `<`.
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&amp;", "&")
}
