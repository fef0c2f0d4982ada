//! Per-resource operation registry and the dispatch pipeline.
//!
//! # Design
//! A [`Resource`] indexes one specification's operations by nickname and by
//! `(path, method)`. Each operation's `path` is stamped from its owning API
//! entry. A later operation with an already-used nickname replaces the
//! earlier one; nicknames are a caller contract and are not validated.
//!
//! A call runs interpolation, composition, the GET cache and the transport in
//! that order. Everything before the transport fails fast with a
//! [`DispatchError`]; everything after it resolves to a
//! [`ResponseEnvelope`], except transport failures under
//! [`TransportFailurePolicy::Reject`].
//!
//! Overlapping GETs for the same key both miss the cache and both reach the
//! transport. There is no in-flight coalescing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::cache::{cache_key, ResponseCache};
use crate::compose::{compose, ResourceConfig};
use crate::config::{ClientOptions, TransportFailurePolicy};
use crate::envelope::{normalize, transport_failure, ResponseEnvelope};
use crate::error::DispatchError;
use crate::http::{HttpMethod, Session, Transport};
use crate::path::interpolate;
use crate::types::{Operation, Specification};
use crate::{Headers, Params};

/// State shared by every resource of one client.
pub(crate) struct Shared<T> {
    pub(crate) transport: T,
    pub(crate) session: Session,
    pub(crate) cache: ResponseCache,
    pub(crate) options: ClientOptions,
}

pub struct Resource<T> {
    name: String,
    spec: Specification,
    operations: BTreeMap<String, Operation>,
    paths: HashMap<String, HashMap<HttpMethod, Operation>>,
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Resource<T> {
    pub(crate) fn build(name: String, spec: Specification, shared: Arc<Shared<T>>) -> Self {
        let mut operations = BTreeMap::new();
        let mut paths: HashMap<String, HashMap<HttpMethod, Operation>> = HashMap::new();

        for api in &spec.apis {
            for op in &api.operations {
                let mut op = op.clone();
                op.path = api.path.clone();
                paths
                    .entry(api.path.clone())
                    .or_default()
                    .insert(op.http_method, op.clone());
                if operations.insert(op.nickname.clone(), op).is_some() {
                    debug!(resource = %name, path = %api.path, "nickname registered twice, keeping the later operation");
                }
            }
        }

        Self {
            name,
            spec,
            operations,
            paths,
            shared,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &Specification {
        &self.spec
    }

    /// The operation currently registered under `nickname`.
    pub fn operation(&self, nickname: &str) -> Option<&Operation> {
        self.operations.get(nickname)
    }

    /// The operation declared for `method` under the API entry `path`.
    pub fn operation_for(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path).and_then(|methods| methods.get(&method))
    }

    pub fn nicknames(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// A callable bound to `nickname`.
    pub fn handle(&self, nickname: &str) -> Result<OperationHandle<'_, T>, DispatchError> {
        let operation = self
            .operations
            .get(nickname)
            .ok_or_else(|| DispatchError::UnknownOperation {
                resource: self.name.clone(),
                nickname: nickname.to_string(),
            })?;
        Ok(OperationHandle {
            resource: self,
            operation,
        })
    }

    /// Call the operation registered under `nickname`.
    ///
    /// `params` must be a JSON object (or `null` for no parameters); it is
    /// copied, never mutated.
    pub async fn call(
        &self,
        nickname: &str,
        params: &Value,
        headers: Option<&Headers>,
    ) -> Result<ResponseEnvelope, DispatchError> {
        self.handle(nickname)?.call_with_headers(params, headers).await
    }

    async fn dispatch(
        &self,
        operation: &Operation,
        params: &Value,
        headers: Option<&Headers>,
    ) -> Result<ResponseEnvelope, DispatchError> {
        let mut params: Params = match params {
            Value::Object(map) => map.clone(),
            Value::Null => Params::new(),
            _ => return Err(DispatchError::InvalidParams(operation.nickname.clone())),
        };
        let options = &self.shared.options;

        let path = interpolate(&operation.path, &mut params)?;
        let config = ResourceConfig {
            spec: &self.spec,
            headers: &options.headers,
            debug: options.debug,
        };
        let request = compose(config, operation, &path, params, headers)?;

        let key = (request.method == HttpMethod::Get).then(|| cache_key(&request));
        if let Some(cached) = key.as_deref().and_then(|k| self.shared.cache.lookup(k)) {
            return Ok(cached);
        }

        let result = self
            .shared
            .transport
            .execute(request, self.shared.session.clone())
            .await;
        let envelope = match result {
            Ok(response) => normalize(operation, response, options.unescape_entities),
            Err(err) => match options.transport_failure {
                TransportFailurePolicy::Resolve => transport_failure(operation, &err),
                TransportFailurePolicy::Reject => {
                    error!(operation = %operation.nickname, error = %err, "transport failure");
                    return Err(DispatchError::Transport(err));
                }
            },
        };

        if let Some(key) = key {
            if envelope.is_success() && !envelope.is_parse_failure() {
                self.shared.cache.store(key, envelope.clone());
            }
        }
        Ok(envelope)
    }
}

/// One operation bound to its resource.
pub struct OperationHandle<'a, T> {
    resource: &'a Resource<T>,
    operation: &'a Operation,
}

impl<T: Transport> OperationHandle<'_, T> {
    pub fn operation(&self) -> &Operation {
        self.operation
    }

    pub async fn call(&self, params: &Value) -> Result<ResponseEnvelope, DispatchError> {
        self.call_with_headers(params, None).await
    }

    pub async fn call_with_headers(
        &self,
        params: &Value,
        headers: Option<&Headers>,
    ) -> Result<ResponseEnvelope, DispatchError> {
        self.resource.dispatch(self.operation, params, headers).await
    }
}
