//! Resource specification DTOs.
//!
//! # Design
//! These types mirror one resource document of a Swagger 1.x style API
//! description. They are deserialized once and treated as immutable for the
//! lifetime of the client. Field names follow the wire format via serde
//! renames so that documents can be loaded without a translation step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SpecError;
use crate::http::HttpMethod;

/// One resource document: a base path, its API entries, and its models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    pub base_path: String,
    #[serde(default)]
    pub resource_path: String,
    #[serde(default)]
    pub apis: Vec<ApiEntry>,
    #[serde(default)]
    pub models: BTreeMap<String, ModelDef>,
}

impl Specification {
    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        serde_json::from_str(raw).map_err(SpecError::Parse)
    }

    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        serde_json::from_value(value).map_err(SpecError::Parse)
    }

    /// Whether `model` names a model whose properties include `property`.
    pub fn model_has_property(&self, model: &str, property: &str) -> bool {
        self.models
            .get(model)
            .is_some_and(|m| m.properties.contains_key(property))
    }
}

/// A path template and the operations reachable under it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEntry {
    pub path: String,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// A single callable API action.
///
/// `path` is empty in the raw document; the resource builder stamps it from
/// the owning [`ApiEntry`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub nickname: String,
    #[serde(alias = "method")]
    pub http_method: HttpMethod,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    #[serde(default)]
    pub response_messages: Vec<ResponseMessage>,
}

impl Operation {
    pub fn parameter(&self, name: &str) -> Option<&ParameterDecl> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Message documented for `code`, if the operation declares one.
    pub fn response_message(&self, code: u16) -> Option<&str> {
        self.response_messages
            .iter()
            .find(|m| m.code == code)
            .map(|m| m.message.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<ParamType>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Declared placement of a parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Path,
    Query,
    Body,
    Header,
    /// Any placement this client does not route itself (e.g. `form`).
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseMessage {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Only the property names are consulted; their schemas are kept opaque.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "basePath": "http://api.example.com",
        "resourcePath": "/core",
        "apis": [{
            "path": "/story/{id}",
            "operations": [{
                "nickname": "getStory",
                "httpMethod": "GET",
                "parameters": [{"name": "id", "paramType": "path", "type": "string"}],
                "responseMessages": [{"code": 404, "message": "Story not found"}]
            }]
        }],
        "models": {"Story": {"properties": {"title": {"type": "string"}}}}
    }"#;

    #[test]
    fn parses_resource_document() {
        let spec = Specification::from_json(DOC).unwrap();
        assert_eq!(spec.base_path, "http://api.example.com");
        assert_eq!(spec.resource_path, "/core");
        let op = &spec.apis[0].operations[0];
        assert_eq!(op.nickname, "getStory");
        assert_eq!(op.http_method, HttpMethod::Get);
        assert_eq!(op.parameters[0].param_type, Some(ParamType::Path));
        assert_eq!(op.parameters[0].data_type.as_deref(), Some("string"));
        assert_eq!(op.response_message(404), Some("Story not found"));
        assert_eq!(op.response_message(500), None);
        assert!(spec.model_has_property("Story", "title"));
        assert!(!spec.model_has_property("Story", "body"));
        assert!(!spec.model_has_property("User", "title"));
    }

    #[test]
    fn optional_collections_default_to_empty() {
        let spec = Specification::from_json(
            r#"{"basePath":"","apis":[{"path":"/x","operations":[{"nickname":"x","httpMethod":"DELETE"}]}]}"#,
        )
        .unwrap();
        let op = &spec.apis[0].operations[0];
        assert!(op.parameters.is_empty());
        assert!(op.response_messages.is_empty());
        assert!(spec.models.is_empty());
    }

    #[test]
    fn method_is_accepted_as_alias() {
        let op: Operation =
            serde_json::from_str(r#"{"nickname":"patchIt","method":"PATCH"}"#).unwrap();
        assert_eq!(op.http_method, HttpMethod::Patch);
    }

    #[test]
    fn unknown_param_type_is_other() {
        let p: ParameterDecl =
            serde_json::from_str(r#"{"name":"file","paramType":"form"}"#).unwrap();
        assert_eq!(p.param_type, Some(ParamType::Other));
    }

    #[test]
    fn unknown_http_method_is_rejected() {
        let err = Specification::from_json(
            r#"{"basePath":"","apis":[{"path":"/x","operations":[{"nickname":"x","httpMethod":"TRACE"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::Parse(_)));
    }
}
