//! Response side: the two-step sink the validators write to, and a concrete buffered response.

use bytes::Bytes;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability to finish a response: set the status, then send a structured payload.
/// The validators call this at most once per validation.
pub trait ResponseSink {
    fn set_status(&mut self, code: u16);
    fn send(&mut self, payload: Value);
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn set_status(&mut self, code: u16) {
        (**self).set_status(code)
    }

    fn send(&mut self, payload: Value) {
        (**self).send(payload)
    }
}

/// Failure body on the wire: exactly `{"err": ..., "status": ...}`, in that order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub err: String,
    pub status: u16,
}

impl ErrorPayload {
    pub fn new(status: u16, err: impl Into<String>) -> Self {
        Self {
            err: err.into(),
            status,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("err".into(), Value::String(self.err.clone()));
        map.insert("status".into(), Value::from(self.status));
        Value::Object(map)
    }

    /// Set status and send self on `res`.
    pub fn write_to<S: ResponseSink + ?Sized>(&self, res: &mut S) {
        res.set_status(self.status);
        res.send(self.to_value());
    }
}

/// Buffered HTTP response. Write-once: after the first `send`, later sends are dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    sent: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status_code: 200,
            body: Vec::new(),
            content_type: None,
            sent: false,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Status plus JSON body in one call, for handlers.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: u16, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(v) => {
                self.set_status(status);
                self.send(v);
            }
            Err(e) => {
                tracing::warn!(error = %e, "response payload is not serializable");
                ErrorPayload::new(500, "response payload is not serializable").write_to(self);
            }
        }
    }

    /// Parsed JSON body, if any.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn into_hyper_response(self) -> http::Response<Full<Bytes>> {
        let status = http::StatusCode::from_u16(self.status_code)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = http::Response::builder().status(status);
        if let Some(ct) = &self.content_type {
            builder = builder.header(http::header::CONTENT_TYPE, ct.as_str());
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| {
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for Response {
    fn set_status(&mut self, code: u16) {
        if self.sent {
            tracing::warn!(code, "status change after response was sent; ignored");
            return;
        }
        self.status_code = code;
    }

    fn send(&mut self, payload: Value) {
        if self.sent {
            tracing::warn!(status = self.status_code, "response already sent; payload dropped");
            return;
        }
        self.sent = true;
        match payload {
            Value::String(s) => {
                self.body = s.into_bytes();
                self.content_type = Some("text/plain; charset=utf-8".into());
            }
            other => {
                self.body = other.to_string().into_bytes();
                self.content_type = Some("application/json".into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_payload_field_order_is_err_then_status() {
        let p = ErrorPayload::new(400, "bad");
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"err":"bad","status":400}"#);
        assert_eq!(p.to_value(), json!({ "err": "bad", "status": 400 }));
    }

    #[test]
    fn second_send_is_dropped() {
        let mut res = Response::new();
        res.set_status(400);
        res.send(json!({ "err": "first", "status": 400 }));
        res.set_status(200);
        res.send(json!({ "ok": true }));
        assert!(res.is_sent());
        assert_eq!(res.status_code, 400);
        assert_eq!(res.body_json(), Some(json!({ "err": "first", "status": 400 })));
        assert_eq!(res.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn string_payload_is_plain_text() {
        let mut res = Response::new();
        res.send(Value::String("hello".into()));
        assert_eq!(res.body, b"hello");
        assert_eq!(res.content_type.as_deref(), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn hyper_response_carries_status_and_content_type() {
        let mut res = Response::new();
        ErrorPayload::new(500, "boom").write_to(&mut res);
        let hyper_res = res.into_hyper_response();
        assert_eq!(hyper_res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            hyper_res.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
