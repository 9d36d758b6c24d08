//! Partcheck core: validate one part of a request (headers, params, query, body) against a schema.
//! On failure the response is written here (400, or 500 when no body parser ran) and the caller gets `None`.

pub mod app;
pub mod config;
pub mod http;
pub mod request;
pub mod response;
pub mod router;
pub mod schema;
pub mod validate;

pub use app::{App, Handler};
pub use config::ServerConfig;
pub use request::{RequestContext, RequestPart};
pub use response::{ErrorPayload, Response, ResponseSink};
pub use router::{RouteId, RouteMatch, Router};
pub use schema::{JsonSchema, Schema, Typed, ValidationDetail, ValidationError, ValidationResult};
pub use validate::{
    validate_body, validate_headers, validate_params, validate_part, validate_query, DetailMode,
    Rejection, Validator, MISSING_BODY_MESSAGE,
};

use thiserror::Error;

/// Errors from setup paths (schema compilation, server startup). Request-time failures are
/// answered on the response instead and never show up here.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid schema: {0}")]
    Schema(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Hyper(#[from] hyper::Error),
}
