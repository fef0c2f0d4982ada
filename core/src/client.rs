//! Multi-resource client.
//!
//! # Design
//! `Client` owns one [`Resource`] per named specification plus the state they
//! share: the transport, the [`Session`] (so cookies set by an authentication
//! call on one resource ride along on every other resource), the GET
//! [`ResponseCache`], and the construction options. The session is an
//! explicit constructor argument when callers need to share it further.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::ResponseCache;
use crate::config::ClientOptions;
use crate::envelope::ResponseEnvelope;
use crate::error::DispatchError;
use crate::http::{Session, Transport};
use crate::resource::{Resource, Shared};
use crate::types::Specification;
use crate::Headers;

pub struct Client<T> {
    resources: BTreeMap<String, Resource<T>>,
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Client<T> {
    /// Build a client from `(resource name, specification)` pairs with a fresh
    /// session.
    pub fn from_specs<I, S>(specs: I, options: ClientOptions, transport: T) -> Self
    where
        I: IntoIterator<Item = (S, Specification)>,
        S: Into<String>,
    {
        Self::with_session(specs, options, transport, Session::new())
    }

    pub fn with_session<I, S>(
        specs: I,
        options: ClientOptions,
        transport: T,
        session: Session,
    ) -> Self
    where
        I: IntoIterator<Item = (S, Specification)>,
        S: Into<String>,
    {
        let shared = Arc::new(Shared {
            transport,
            session,
            cache: ResponseCache::new(options.cache_ttl()),
            options,
        });
        let resources = specs
            .into_iter()
            .map(|(name, spec)| {
                let name = name.into();
                let resource = Resource::build(name.clone(), spec, Arc::clone(&shared));
                (name, resource)
            })
            .collect();
        Self { resources, shared }
    }

    pub fn resource(&self, name: &str) -> Result<&Resource<T>, DispatchError> {
        self.resources
            .get(name)
            .ok_or_else(|| DispatchError::UnknownResource(name.to_string()))
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Call `nickname` on the resource `resource`.
    pub async fn call(
        &self,
        resource: &str,
        nickname: &str,
        params: &Value,
        headers: Option<&Headers>,
    ) -> Result<ResponseEnvelope, DispatchError> {
        self.resource(resource)?.call(nickname, params, headers).await
    }

    pub fn session(&self) -> &Session {
        &self.shared.session
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.shared.cache
    }

    pub fn options(&self) -> &ClientOptions {
        &self.shared.options
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Drop every cached response.
    pub fn destroy(&self) {
        self.shared.cache.clear();
    }
}
