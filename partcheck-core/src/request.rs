//! Read-only request view handed to the validators.

use serde_json::{Map, Value};
use std::fmt;

/// Which part of the request a validator reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RequestPart {
    Headers,
    Params,
    Query,
    Body,
}

impl RequestPart {
    pub const ALL: [RequestPart; 4] = [
        RequestPart::Headers,
        RequestPart::Params,
        RequestPart::Query,
        RequestPart::Body,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestPart::Headers => "headers",
            RequestPart::Params => "params",
            RequestPart::Query => "query",
            RequestPart::Body => "body",
        }
    }
}

impl fmt::Display for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request as seen by a handler: method, path and the four named parts.
///
/// `headers`, `params` and `query` are empty objects when nothing was supplied.
/// `body` is `None` when no body parser ran, which the body validator reports as a host
/// misconfiguration rather than as invalid input.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub headers: Value,
    pub params: Value,
    pub query: Value,
    pub body: Option<Value>,
}

impl RequestContext {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_owned(),
            headers: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            body: None,
        }
    }

    /// Set one header. Names are stored lowercased; a repeated name replaces the earlier value.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        insert(&mut self.headers, name.to_ascii_lowercase(), Value::String(value.to_owned()));
        self
    }

    pub fn with_headers(mut self, headers: Value) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The selected part. `None` only for an absent body.
    pub fn part(&self, part: RequestPart) -> Option<&Value> {
        match part {
            RequestPart::Headers => Some(&self.headers),
            RequestPart::Params => Some(&self.params),
            RequestPart::Query => Some(&self.query),
            RequestPart::Body => self.body.as_ref(),
        }
    }

    /// Single header lookup, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name.to_ascii_lowercase())
            .and_then(Value::as_str)
    }
}

/// Build a headers object from raw pairs. Names are lowercased; a repeated header has its
/// values joined with `", "` in arrival order (`set-cookie` included, unlike Node's array).
pub fn headers_from_pairs<'a, I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut map = Map::new();
    for (k, v) in pairs {
        let name = k.to_ascii_lowercase();
        match map.get_mut(&name) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(v);
            }
            _ => {
                map.insert(name, Value::String(v.to_owned()));
            }
        }
    }
    Value::Object(map)
}

/// Decode a query string (`a=1&b=x%20y&a=2`) into an object.
/// Values stay strings; a repeated key collects its values into an array.
pub fn query_from_str(qs: &str) -> Value {
    let mut map = Map::new();
    for (k, v) in url::form_urlencoded::parse(qs.trim_start_matches('?').as_bytes()) {
        if k.is_empty() {
            continue;
        }
        let v = Value::String(v.into_owned());
        match map.get_mut(&*k) {
            Some(Value::Array(items)) => items.push(v),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, v]);
            }
            None => {
                map.insert(k.into_owned(), v);
            }
        }
    }
    Value::Object(map)
}

fn insert(target: &mut Value, key: String, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        map.insert(key, value);
    }
}
