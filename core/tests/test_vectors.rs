//! Verify interpolation and composition against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each case names a sample specification, an operation and its parameters,
//! then either the expected request or the placeholder expected to be
//! unresolved. Bodies are compared as parsed JSON to avoid false negatives
//! from field ordering.

use dispatch_core::compose::{compose, ResourceConfig, DEFAULT_ACCEPT, DEFAULT_CONTENT_TYPE};
use dispatch_core::path::interpolate;
use dispatch_core::{DispatchError, Headers, HttpMethod, Specification};
use serde_json::Value;

fn load_spec(name: &str) -> Specification {
    let raw = match name {
        "acl" => include_str!("../../specs/acl.json"),
        "core" => include_str!("../../specs/core.json"),
        other => panic!("unknown spec: {other}"),
    };
    Specification::from_json(raw).unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    serde_json::from_value(Value::String(s.to_string()))
        .unwrap_or_else(|_| panic!("unknown method: {s}"))
}

fn find_operation<'a>(spec: &'a Specification, nickname: &str) -> (&'a str, &'a dispatch_core::Operation) {
    spec.apis
        .iter()
        .find_map(|api| {
            api.operations
                .iter()
                .find(|op| op.nickname == nickname)
                .map(|op| (api.path.as_str(), op))
        })
        .unwrap_or_else(|| panic!("no operation {nickname}"))
}

#[test]
fn compose_test_vectors() {
    let raw = include_str!("../../test-vectors/compose.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let no_headers = Headers::new();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let spec = load_spec(case["spec"].as_str().unwrap());
        let (template, operation) = find_operation(&spec, case["nickname"].as_str().unwrap());
        let mut params = case["params"].as_object().unwrap().clone();

        // Verify interpolation
        let interpolated = interpolate(template, &mut params);
        if let Some(expected) = case.get("expected_error") {
            let err = interpolated.unwrap_err();
            assert!(
                matches!(err, DispatchError::UnresolvedPathParameter(ref p) if p == expected.as_str().unwrap()),
                "{name}: unexpected error {err}"
            );
            continue;
        }
        let path = interpolated.unwrap();
        assert!(!path.contains('{'), "{name}: unresolved placeholder in {path}");

        // Verify composition
        let config = ResourceConfig {
            spec: &spec,
            headers: &no_headers,
            debug: false,
        };
        let req = compose(config, operation, &path, params, None).unwrap();
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(
            req.url,
            format!("{}{}", spec.base_path, expected_req["path"].as_str().unwrap()),
            "{name}: url"
        );

        let expected_query: Vec<(String, String)> = expected_req["query"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| {
                let arr = q.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.query, expected_query, "{name}: query");

        match &expected_req["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: body should be None"),
            expected => {
                let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&body, expected, "{name}: body");
            }
        }

        assert_eq!(req.header("accept"), Some(DEFAULT_ACCEPT), "{name}: accept");
        assert_eq!(req.header("content-type"), Some(DEFAULT_CONTENT_TYPE), "{name}: content-type");
    }
}
