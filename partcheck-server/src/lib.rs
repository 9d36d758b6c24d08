//! Example service wired with the partcheck validators. Nothing here runs until `main` calls
//! [`build_app`] and hands the result to the server.

use partcheck_core::{App, CoreError, JsonSchema, ServerConfig, Typed};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Body accepted by `POST /example`. Missing `tags` default to empty, `note` is dropped when null.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExampleBody {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// `token` header of exactly 24 characters; every other header is allowed through.
pub fn token_header_schema() -> Result<JsonSchema, CoreError> {
    JsonSchema::new(&json!({
        "type": "object",
        "properties": {
            "token": { "type": "string", "minLength": 24, "maxLength": 24 }
        },
        "required": ["token"]
    }))
}

fn user_params_schema() -> Result<JsonSchema, CoreError> {
    JsonSchema::new(&json!({
        "type": "object",
        "properties": { "id": { "type": "string", "pattern": "^[0-9]+$" } },
        "required": ["id"]
    }))
}

fn user_query_schema() -> Result<JsonSchema, CoreError> {
    JsonSchema::new(&json!({
        "type": "object",
        "properties": { "verbose": { "enum": ["true", "false"] } },
        "additionalProperties": false
    }))
}

pub fn build_app(config: &ServerConfig) -> Result<App, CoreError> {
    let mut app = App::new()
        .with_json_body(config.json_body)
        .with_detail_mode(config.detail_mode);
    let v = app.validator();

    let headers = token_header_schema()?;
    let body = Typed::<ExampleBody>::new();
    app.route("POST", "/example", move |req, res| {
        let Some(h) = v.headers(req, res, &headers) else { return };
        let Some(b) = v.body(req, res, &body) else { return };
        tracing::info!(name = b["name"].as_str().unwrap_or(""), "example accepted");
        res.json(200, &json!({ "token": h["token"], "body": b }));
    });

    let params = user_params_schema()?;
    let query = user_query_schema()?;
    app.route("GET", "/users/:id", move |req, res| {
        let Some(p) = v.params(req, res, &params) else { return };
        let Some(q) = v.query(req, res, &query) else { return };
        let verbose = q.get("verbose").and_then(|x| x.as_str()) == Some("true");
        let mut user = json!({ "id": p["id"] });
        if verbose {
            user["lookup"] = json!({ "params": p, "query": q });
        }
        res.json(200, &user);
    });

    Ok(app)
}
