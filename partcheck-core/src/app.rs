//! App: routes, optional JSON body parsing, dispatch to handlers. Server-independent, so tests
//! drive it directly and `http::run` only converts hyper requests into `handle` calls.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::request::{headers_from_pairs, query_from_str, RequestContext};
use crate::response::{ErrorPayload, Response};
use crate::router::{RouteId, Router};
use crate::validate::{DetailMode, Validator};

/// Route handler. Writes its answer to the response; returning without a write is a 500.
pub type Handler = Box<dyn Fn(&RequestContext, &mut Response) + Send + Sync>;

pub struct App {
    router: Router,
    handlers: HashMap<RouteId, Handler>,
    next_route_id: u32,
    json_body: bool,
    validator: Validator,
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            handlers: HashMap::new(),
            next_route_id: 0,
            json_body: true,
            validator: Validator::default(),
        }
    }

    /// Turn the JSON body parser on or off (on by default).
    pub fn with_json_body(mut self, enabled: bool) -> Self {
        self.json_body = enabled;
        self
    }

    pub fn with_detail_mode(mut self, mode: DetailMode) -> Self {
        self.validator = Validator::new(mode);
        self
    }

    /// Validator carrying this app's options, for use inside handlers.
    pub fn validator(&self) -> Validator {
        self.validator
    }

    /// Register a handler for `method` + `path` (`:name` segments become params).
    pub fn route<F>(&mut self, method: &str, path: &str, handler: F) -> RouteId
    where
        F: Fn(&RequestContext, &mut Response) + Send + Sync + 'static,
    {
        let id = RouteId(self.next_route_id);
        self.next_route_id += 1;
        self.router.add(method, path, id);
        self.handlers.insert(id, Box::new(handler));
        id
    }

    /// Handle one request. `target` is the request target (path plus optional `?query`).
    pub fn handle(&self, method: &str, target: &str, headers: &[(String, String)], body: &[u8]) -> Response {
        let mut res = Response::new();
        let (path, qs) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };

        let Some(matched) = self.router.match_route(method, path) else {
            let path = format!("/{}", path.trim_start_matches('/'));
            tracing::debug!(%method, %path, "no route");
            ErrorPayload::new(404, format!("Cannot {} {}", method.to_uppercase(), path)).write_to(&mut res);
            return res;
        };

        let mut ctx = RequestContext::new(method, path)
            .with_headers(headers_from_pairs(headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))))
            .with_params(matched.params)
            .with_query(query_from_str(qs));

        if self.json_body {
            match parse_body(ctx.header("content-type"), body) {
                Ok(v) => ctx.body = Some(v),
                Err(e) => {
                    tracing::debug!(error = %e, "malformed JSON body");
                    ErrorPayload::new(400, format!("invalid JSON body: {e}")).write_to(&mut res);
                    return res;
                }
            }
        }

        match self.handlers.get(&matched.id) {
            Some(handler) => handler(&ctx, &mut res),
            None => {
                ErrorPayload::new(500, format!("no handler for route {:?}", matched.id)).write_to(&mut res);
                return res;
            }
        }

        if !res.is_sent() {
            tracing::warn!(method = %ctx.method, path = %ctx.path, "handler returned without sending a response");
            ErrorPayload::new(500, "handler did not send a response").write_to(&mut res);
        }
        res
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON body parser: only JSON content types are read; anything else, and an empty body,
/// leaves `{}` so that routes ignoring the body still run.
fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, serde_json::Error> {
    if !content_type.is_some_and(is_json) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
}

/// `application/json` or any `application/*+json`, parameters ignored.
fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
