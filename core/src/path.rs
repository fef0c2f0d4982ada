//! Path template interpolation.
//!
//! Substitutes `{name}` placeholders with parameter values and removes the
//! consumed names from the working parameter set so they are not emitted a
//! second time in the query or body. Values are inserted verbatim; path
//! segments are assumed to be URL-safe already.

use serde_json::Value;

use crate::error::DispatchError;
use crate::Params;

/// Names of the `{identifier}` placeholders in `template`, in order of first
/// appearance. Braces enclosing anything but word characters are left alone.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = template;
    while let Some(token) = next_placeholder(rest) {
        if let Some(name) = token.name {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        rest = token.rest;
    }
    names
}

/// One `{...}` span found by [`next_placeholder`].
struct Token<'a> {
    /// Text before the placeholder's opening brace.
    literal: &'a str,
    /// The placeholder name, or `None` when the braces hold no identifier and
    /// `literal` already covers the whole span.
    name: Option<&'a str>,
    rest: &'a str,
}

fn next_placeholder(text: &str) -> Option<Token<'_>> {
    let open = text.find('{')?;
    let after = &text[open + 1..];
    let close = after.find('}')?;
    let inner = &after[..close];
    let start = inner.rfind('{').map_or(0, |i| i + 1);
    let name = &inner[start..];
    let rest = &after[close + 1..];
    if is_identifier(name) {
        Some(Token {
            literal: &text[..open + start],
            name: Some(name),
            rest,
        })
    } else {
        Some(Token {
            literal: &text[..open + 1 + close + 1],
            name: None,
            rest,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render a parameter value as a path segment. Strings are used without
/// their JSON quotes; `null` and `""` count as missing.
fn segment(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Interpolate `template`, consuming the matched entries of `params`.
///
/// The template is walked once, left to right; inserted values are never
/// scanned for placeholders again. A value that itself reads as a
/// `{placeholder}` is rejected so none can reach the URL. On error `params`
/// is left untouched.
pub fn interpolate(template: &str, params: &mut Params) -> Result<String, DispatchError> {
    let mut path = String::with_capacity(template.len());
    let mut consumed: Vec<&str> = Vec::new();
    let mut rest = template;
    while let Some(token) = next_placeholder(rest) {
        path.push_str(token.literal);
        rest = token.rest;
        let Some(name) = token.name else {
            continue;
        };
        let value = params
            .get(name)
            .and_then(segment)
            .ok_or_else(|| DispatchError::UnresolvedPathParameter(name.to_string()))?;
        if !placeholders(&value).is_empty() {
            return Err(DispatchError::PlaceholderInPathValue(name.to_string()));
        }
        path.push_str(&value);
        if !consumed.contains(&name) {
            consumed.push(name);
        }
    }
    path.push_str(rest);

    for name in consumed {
        params.remove(name);
    }
    Ok(path)
}
