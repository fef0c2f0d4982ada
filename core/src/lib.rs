//! Spec-driven API client core.
//!
//! # Overview
//! Turns declarative resource specifications (API entries with path
//! templates, HTTP methods and parameter metadata) into callable operations.
//! A call classifies its parameters into path, query, body or header slots,
//! interpolates the path template, composes an `HttpRequest`, consults a TTL
//! cache for GETs, and hands the request to a [`Transport`].
//!
//! # Design
//! - The core never opens a socket itself. The [`Transport`] trait is the I/O
//!   boundary; [`UreqTransport`] is the bundled implementation.
//! - Errors that can be detected before a request exists (unknown names,
//!   unresolved path placeholders) are returned as [`DispatchError`]. Once a
//!   request has been sent, the result is a [`ResponseEnvelope`].
//! - The cache and the cookie [`Session`] are owned by the [`Client`] and
//!   shared by reference with each [`Resource`]; neither is global.
//!
//! ```no_run
//! use dispatch_core::{Client, ClientOptions, Specification, UreqTransport};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let core = Specification::from_json(
//!     r#"{"basePath": "https://api.example.com/core",
//!         "apis": [{"path": "/story/{id}",
//!                   "operations": [{"nickname": "getStory", "httpMethod": "GET"}]}]}"#,
//! )?;
//! let client = Client::from_specs([("core", core)], ClientOptions::default(), UreqTransport::new());
//! let story = client.call("core", "getStory", &json!({"id": "abc123"}), None).await?;
//! println!("{:?}", story.obj());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod classify;
pub mod client;
pub mod compose;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod path;
pub mod resource;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

use std::collections::BTreeMap;

/// Call-time parameters, by name.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Header name to value.
pub type Headers = BTreeMap<String, String>;

pub use cache::ResponseCache;
pub use classify::{classify, Placement, Slot};
pub use client::Client;
pub use config::{ClientOptions, TransportFailurePolicy};
pub use envelope::ResponseEnvelope;
pub use error::{DispatchError, SpecError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Session, Transport};
pub use resource::{OperationHandle, Resource};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{ApiEntry, ModelDef, Operation, ParamType, ParameterDecl, ResponseMessage, Specification};
