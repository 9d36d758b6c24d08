//! Router: method + path pattern. `:name` segments capture path parameters.

use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RouteId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Clone, Debug)]
struct Pattern {
    method: String,
    segments: Vec<Segment>,
    id: RouteId,
}

/// Matched route plus captured parameters (always an object, possibly empty).
#[derive(Clone, Debug, PartialEq)]
pub struct RouteMatch {
    pub id: RouteId,
    pub params: Value,
}

/// Routes are tried in registration order; the first match wins.
pub struct Router {
    patterns: Vec<Pattern>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Register `path` for `method`, e.g. `("GET", "/users/:id")`.
    pub fn add(&mut self, method: &str, path: &str, id: RouteId) {
        let segments = split(path)
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_owned()),
                _ => Segment::Literal(s.to_owned()),
            })
            .collect();
        self.patterns.push(Pattern {
            method: method.to_uppercase(),
            segments,
            id,
        });
    }

    pub fn match_route(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let method = method.to_uppercase();
        let parts: Vec<&str> = split(path).collect();
        self.patterns
            .iter()
            .filter(|p| p.method == method && p.segments.len() == parts.len())
            .find_map(|p| {
                let mut params = Map::new();
                for (seg, part) in p.segments.iter().zip(&parts) {
                    match seg {
                        Segment::Literal(lit) if lit.as_str() == *part => {}
                        Segment::Literal(_) => return None,
                        Segment::Param(name) => {
                            // '+' and '&' are literal in a path segment.
                            let raw = format!("v={}", part.replace('+', "%2B").replace('&', "%26"));
                            let decoded = url::form_urlencoded::parse(raw.as_bytes())
                                .next()
                                .map(|(_, v)| v.into_owned())
                                .unwrap_or_default();
                            params.insert(name.clone(), Value::String(decoded));
                        }
                    }
                }
                Some(RouteMatch {
                    id: p.id,
                    params: Value::Object(params),
                })
            })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
