//! Parameter placement.
//!
//! Decides, for one parameter name on one operation, whether the value goes
//! into the path, the query string, the body, or a header. Lookup order:
//! an explicit `paramType` on the operation, then any operation parameter
//! whose `type` names a model carrying the name as a property. Anything else
//! is [`Placement::Undetermined`] and is routed by the HTTP method.

use tracing::warn;

use crate::http::HttpMethod;
use crate::types::{Operation, ParamType, Specification};

/// Where a parameter value ends up in the composed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Path,
    Query,
    Body,
    Header,
}

/// Outcome of classifying one parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Named directly in the operation's parameter list.
    Declared(Slot),
    /// Found as a property of the model named by `parameter`'s type.
    ViaModel {
        slot: Slot,
        model: String,
        parameter: String,
    },
    /// No declaration covers the name.
    Undetermined,
}

impl Placement {
    /// Slot the value is routed to for `method`. Undetermined names go to the
    /// query for GET and to the body for every mutating method.
    pub fn slot(&self, method: HttpMethod) -> Slot {
        match self {
            Placement::Declared(slot) | Placement::ViaModel { slot, .. } => *slot,
            Placement::Undetermined => method_default(method),
        }
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(self, Placement::Undetermined)
    }
}

pub fn method_default(method: HttpMethod) -> Slot {
    if method.is_mutating() {
        Slot::Body
    } else {
        Slot::Query
    }
}

fn declared_slot(param_type: ParamType) -> Option<Slot> {
    match param_type {
        ParamType::Path => Some(Slot::Path),
        ParamType::Query => Some(Slot::Query),
        ParamType::Body => Some(Slot::Body),
        ParamType::Header => Some(Slot::Header),
        ParamType::Other => None,
    }
}

/// Classify `name` against `operation`, consulting `spec` for model fallback.
/// Never fails; an undetermined outcome is logged.
pub fn classify(spec: &Specification, operation: &Operation, name: &str) -> Placement {
    if let Some(slot) = operation
        .parameter(name)
        .and_then(|p| p.param_type)
        .and_then(declared_slot)
    {
        return Placement::Declared(slot);
    }

    for decl in &operation.parameters {
        let Some(model) = decl.data_type.as_deref() else {
            continue;
        };
        if !spec.model_has_property(model, name) {
            continue;
        }
        if let Some(slot) = decl.param_type.and_then(declared_slot) {
            return Placement::ViaModel {
                slot,
                model: model.to_string(),
                parameter: decl.name.clone(),
            };
        }
    }

    warn!(
        operation = %operation.nickname,
        parameter = name,
        method = %operation.http_method,
        "parameter placement undetermined, using method default"
    );
    Placement::Undetermined
}
