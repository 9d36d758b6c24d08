//! Request part validators.
//!
//! Each call reads one part of the request, runs the schema over it and either returns the
//! validated value or finishes the response with an error payload and returns `None`.
//! On `None` the response is already sent, so the caller must stop handling the request:
//!
//! ```
//! use partcheck_core::{validate_headers, JsonSchema, RequestContext, Response};
//! use serde_json::json;
//!
//! let schema = JsonSchema::new(&json!({
//!     "type": "object",
//!     "properties": { "token": { "type": "string", "minLength": 24, "maxLength": 24 } },
//!     "required": ["token"]
//! }))
//! .unwrap();
//! let req = RequestContext::new("POST", "/example").with_header("token", "abc");
//! let mut res = Response::new();
//!
//! let Some(headers) = validate_headers(&req, &mut res, &schema) else {
//!     assert_eq!(res.status_code, 400);
//!     return;
//! };
//! # unreachable!("{headers}");
//! ```

use serde_json::Value;

use crate::request::{RequestContext, RequestPart};
use crate::response::{ErrorPayload, ResponseSink};
use crate::schema::{Schema, ValidationError};

/// Sent with 500 when the body validator runs but no body parser filled the body.
pub const MISSING_BODY_MESSAGE: &str =
    "Request doesn't seem to have a body - are you sure you are using a body-parsing middleware?";

/// How many violation messages end up in `err`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DetailMode {
    /// Only the first violation.
    #[default]
    First,
    /// Every violation, joined with `". "`.
    All,
}

/// Why a part was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Body selected but absent: the host never ran a body parser.
    MissingBody,
    /// The schema refused the value.
    Invalid(ValidationError),
}

impl Rejection {
    /// HTTP status for this rejection: 500 for a missing body, 400 otherwise.
    pub fn status(&self) -> u16 {
        match self {
            Rejection::MissingBody => 500,
            Rejection::Invalid(_) => 400,
        }
    }

    /// Wire body `{err, status}`; `mode` decides how many violation messages go into `err`.
    pub fn payload(&self, mode: DetailMode) -> ErrorPayload {
        let err = match self {
            Rejection::MissingBody => MISSING_BODY_MESSAGE.to_owned(),
            Rejection::Invalid(e) => match mode {
                DetailMode::First => e.first().message.clone(),
                DetailMode::All => e.to_string(),
            },
        };
        ErrorPayload::new(self.status(), err)
    }
}

/// Validator with its reporting options. The free functions use `Validator::default()`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Validator {
    pub detail_mode: DetailMode,
}

impl Validator {
    /// Validator reporting violations according to `detail_mode`.
    pub fn new(detail_mode: DetailMode) -> Self {
        Self { detail_mode }
    }

    /// Check `part` without touching any response.
    pub fn check<S>(&self, part: RequestPart, req: &RequestContext, schema: &S) -> Result<Value, Rejection>
    where
        S: Schema + ?Sized,
    {
        let input = req.part(part).ok_or(Rejection::MissingBody)?;
        schema.validate(input).map_err(Rejection::Invalid)
    }

    /// Validate `part`; on failure write the error response and return `None`.
    pub fn part<R, S>(&self, part: RequestPart, req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
    where
        R: ResponseSink + ?Sized,
        S: Schema + ?Sized,
    {
        match self.check(part, req, schema) {
            Ok(value) => Some(value),
            Err(rejection) => {
                let payload = rejection.payload(self.detail_mode);
                tracing::debug!(
                    part = %part,
                    method = %req.method,
                    path = %req.path,
                    status = payload.status,
                    err = %payload.err,
                    "request part rejected"
                );
                payload.write_to(res);
                None
            }
        }
    }

    /// Same as [`validate_headers`] with this validator's options.
    pub fn headers<R, S>(&self, req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
    where
        R: ResponseSink + ?Sized,
        S: Schema + ?Sized,
    {
        self.part(RequestPart::Headers, req, res, schema)
    }

    /// Same as [`validate_params`] with this validator's options.
    pub fn params<R, S>(&self, req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
    where
        R: ResponseSink + ?Sized,
        S: Schema + ?Sized,
    {
        self.part(RequestPart::Params, req, res, schema)
    }

    /// Same as [`validate_query`] with this validator's options.
    pub fn query<R, S>(&self, req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
    where
        R: ResponseSink + ?Sized,
        S: Schema + ?Sized,
    {
        self.part(RequestPart::Query, req, res, schema)
    }

    /// Same as [`validate_body`] with this validator's options.
    pub fn body<R, S>(&self, req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
    where
        R: ResponseSink + ?Sized,
        S: Schema + ?Sized,
    {
        self.part(RequestPart::Body, req, res, schema)
    }
}

/// Validate `part` of `req` with the default options.
pub fn validate_part<R, S>(part: RequestPart, req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
where
    R: ResponseSink + ?Sized,
    S: Schema + ?Sized,
{
    Validator::default().part(part, req, res, schema)
}

/// Validate request headers (names lowercased). Let the schema allow headers it does not list,
/// otherwise every standard header counts as a violation.
pub fn validate_headers<R, S>(req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
where
    R: ResponseSink + ?Sized,
    S: Schema + ?Sized,
{
    validate_part(RequestPart::Headers, req, res, schema)
}

/// Validate path parameters.
pub fn validate_params<R, S>(req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
where
    R: ResponseSink + ?Sized,
    S: Schema + ?Sized,
{
    validate_part(RequestPart::Params, req, res, schema)
}

/// Validate the decoded query string.
pub fn validate_query<R, S>(req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
where
    R: ResponseSink + ?Sized,
    S: Schema + ?Sized,
{
    validate_part(RequestPart::Query, req, res, schema)
}

/// Validate the parsed body. An absent body answers 500 before the schema is consulted.
pub fn validate_body<R, S>(req: &RequestContext, res: &mut R, schema: &S) -> Option<Value>
where
    R: ResponseSink + ?Sized,
    S: Schema + ?Sized,
{
    validate_part(RequestPart::Body, req, res, schema)
}
