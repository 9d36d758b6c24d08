//! Validators against a real JSON Schema: header token scenarios, missing body, idempotence.

use partcheck_core::{
    validate_body, validate_headers, validate_params, validate_query, DetailMode, JsonSchema,
    RequestContext, RequestPart, Response, Validator, MISSING_BODY_MESSAGE,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn token_schema() -> JsonSchema {
    JsonSchema::new(&json!({
        "type": "object",
        "properties": {
            "token": { "type": "string", "minLength": 24, "maxLength": 24 }
        },
        "required": ["token"]
    }))
    .unwrap()
}

#[test]
fn short_token_header_is_400_with_first_message() {
    let req = RequestContext::new("POST", "/example").with_header("token", "abc");
    let mut res = Response::new();

    assert_eq!(validate_headers(&req, &mut res, &token_schema()), None);
    assert!(res.is_sent());
    assert_eq!(res.status_code, 400);
    let body = res.body_json().unwrap();
    assert_eq!(body["status"], 400);
    let err = body["err"].as_str().unwrap();
    assert!(err.contains("abc"), "unexpected message: {err}");
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[test]
fn valid_token_header_is_returned_and_nothing_is_sent() {
    let req = RequestContext::new("POST", "/example")
        .with_header("token", "123456789012345678901234")
        .with_header("User-Agent", "test");
    let mut res = Response::new();

    let headers = validate_headers(&req, &mut res, &token_schema()).unwrap();
    assert_eq!(headers["token"], "123456789012345678901234");
    assert_eq!(headers["user-agent"], "test");
    assert!(!res.is_sent());
    assert!(res.body.is_empty());
}

#[test]
fn absent_body_is_500_whatever_the_schema() {
    let req = RequestContext::new("POST", "/example");
    let anything = JsonSchema::new(&json!(true)).unwrap();
    for schema in [token_schema(), anything] {
        let mut res = Response::new();
        assert_eq!(validate_body(&req, &mut res, &schema), None);
        assert_eq!(res.status_code, 500);
        assert_eq!(
            res.body_json(),
            Some(json!({ "err": MISSING_BODY_MESSAGE, "status": 500 }))
        );
    }
}

#[test]
fn params_and_query_use_their_own_part() {
    let numeric_id = JsonSchema::new(&json!({
        "type": "object",
        "properties": { "id": { "type": "string", "pattern": "^[0-9]+$" } },
        "required": ["id"]
    }))
    .unwrap();

    let req = RequestContext::new("GET", "/users/12")
        .with_params(json!({ "id": "12" }))
        .with_query(json!({ "id": "not-a-number" }));

    let mut res = Response::new();
    assert_eq!(
        validate_params(&req, &mut res, &numeric_id),
        Some(json!({ "id": "12" }))
    );
    assert!(!res.is_sent());

    let mut res = Response::new();
    assert_eq!(validate_query(&req, &mut res, &numeric_id), None);
    assert_eq!(res.status_code, 400);
}

#[test]
fn only_first_violation_by_default_all_on_request() {
    let schema = JsonSchema::new(&json!({
        "type": "object",
        "required": ["a", "b"]
    }))
    .unwrap();
    let req = RequestContext::new("POST", "/").with_body(json!({}));

    let mut first = Response::new();
    assert_eq!(validate_body(&req, &mut first, &schema), None);
    let first_err = first.body_json().unwrap()["err"].as_str().unwrap().to_owned();

    let mut all = Response::new();
    assert_eq!(Validator::new(DetailMode::All).body(&req, &mut all, &schema), None);
    let all_err = all.body_json().unwrap()["err"].as_str().unwrap().to_owned();

    assert!(all_err.starts_with(&first_err));
    assert!(all_err.len() > first_err.len());
    assert!(all_err.contains(". "));
}

fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z0-9]{0,30}", "[a-z0-9]{24}"]
}

proptest! {
    #[test]
    fn classification_is_stable_across_calls(token in arb_token(), with_body in any::<bool>()) {
        let schema = token_schema();
        let mut req = RequestContext::new("POST", "/example").with_header("token", &token);
        if with_body {
            req = req.with_body(json!({ "token": token }));
        }
        for part in RequestPart::ALL {
            let v = Validator::default();
            let mut first = Response::new();
            let mut second = Response::new();
            let a = v.part(part, &req, &mut first, &schema);
            let b = v.part(part, &req, &mut second, &schema);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(first.status_code, second.status_code);
            prop_assert_eq!(first.body_json(), second.body_json());

            let expect_ok = match part {
                RequestPart::Headers => token.len() == 24,
                RequestPart::Body => with_body && token.len() == 24,
                RequestPart::Params | RequestPart::Query => false,
            };
            prop_assert_eq!(a.is_some(), expect_ok);
            prop_assert_eq!(first.is_sent(), !expect_ok);
            if let Some(value) = a {
                prop_assert_eq!(value.get("token").and_then(Value::as_str), Some(token.as_str()));
            }
        }
    }
}
