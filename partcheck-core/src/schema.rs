//! Schema capability: anything that can check a JSON value and hand back the (possibly coerced) value.
//! Adapters for JSON Schema (`jsonschema` crate), serde types and plain closures.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::CoreError;

/// Outcome of one schema check: the validated value or the violations.
pub type ValidationResult = Result<Value, ValidationError>;

/// Validation engine seam. Implement this to plug in any engine.
pub trait Schema {
    fn validate(&self, input: &Value) -> ValidationResult;
}

impl<S: Schema + ?Sized> Schema for &S {
    fn validate(&self, input: &Value) -> ValidationResult {
        (**self).validate(input)
    }
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    fn validate(&self, input: &Value) -> ValidationResult {
        (**self).validate(input)
    }
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn validate(&self, input: &Value) -> ValidationResult {
        (**self).validate(input)
    }
}

/// One violation reported by a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationDetail {
    pub message: String,
    /// Location inside the validated value, e.g. `/token`.
    pub path: Option<String>,
}

impl ValidationDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Ordered, never-empty list of violations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    details: Vec<ValidationDetail>,
}

impl ValidationError {
    pub fn new(first: ValidationDetail) -> Self {
        Self {
            details: vec![first],
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ValidationDetail::new(message))
    }

    /// `None` when `details` is empty.
    pub fn from_details(details: Vec<ValidationDetail>) -> Option<Self> {
        if details.is_empty() {
            None
        } else {
            Some(Self { details })
        }
    }

    pub fn with_detail(mut self, detail: ValidationDetail) -> Self {
        self.details.push(detail);
        self
    }

    pub fn details(&self) -> &[ValidationDetail] {
        &self.details
    }

    pub fn first(&self) -> &ValidationDetail {
        &self.details[0]
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.details.iter();
        if let Some(d) = iter.next() {
            f.write_str(&d.message)?;
        }
        for d in iter {
            write!(f, ". {}", d.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// JSON Schema backed by a compiled `jsonschema::Validator`. Returns the input unchanged on success.
/// Each error keeps its instance path (`/token`); errors on the root value carry no path.
#[derive(Clone)]
pub struct JsonSchema {
    validator: jsonschema::Validator,
}

impl JsonSchema {
    /// Compile `schema` (draft detected from `$schema`, default 2020-12).
    pub fn new(schema: &Value) -> Result<Self, CoreError> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| CoreError::Schema(e.to_string()))?;
        Ok(Self { validator })
    }

    pub fn from_validator(validator: jsonschema::Validator) -> Self {
        Self { validator }
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema").finish_non_exhaustive()
    }
}

impl Schema for JsonSchema {
    fn validate(&self, input: &Value) -> ValidationResult {
        let details: Vec<ValidationDetail> = self
            .validator
            .iter_errors(input)
            .map(|e| {
                let detail = ValidationDetail::new(e.to_string());
                let path = e.instance_path().to_string();
                if path.is_empty() {
                    detail
                } else {
                    detail.at(path)
                }
            })
            .collect();
        match ValidationError::from_details(details) {
            Some(err) => Err(err),
            None => Ok(input.clone()),
        }
    }
}

/// Serde-typed schema: the input must deserialize into `T`; the returned value is `T`
/// serialized back, so defaults, renames and skipped fields shape the result.
pub struct Typed<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Typed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Typed<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned + Serialize> Schema for Typed<T> {
    fn validate(&self, input: &Value) -> ValidationResult {
        let typed: T = serde_json::from_value(input.clone())
            .map_err(|e| ValidationError::message(e.to_string()))?;
        serde_json::to_value(&typed).map_err(|e| ValidationError::message(e.to_string()))
    }
}

/// Closure-backed schema, see [`from_fn`].
#[derive(Clone)]
pub struct FnSchema<F> {
    f: F,
}

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSchema")
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(&Value) -> ValidationResult,
{
    fn validate(&self, input: &Value) -> ValidationResult {
        (self.f)(input)
    }
}

/// Wrap a closure as a schema.
pub fn from_fn<F>(f: F) -> FnSchema<F>
where
    F: Fn(&Value) -> ValidationResult,
{
    FnSchema { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn validation_error_is_never_empty() {
        assert!(ValidationError::from_details(vec![]).is_none());
        let err = ValidationError::message("a").with_detail(ValidationDetail::new("b").at("/b"));
        assert_eq!(err.details().len(), 2);
        assert_eq!(err.first().message, "a");
        assert_eq!(err.details()[1].path.as_deref(), Some("/b"));
        assert_eq!(err.to_string(), "a. b");
    }

    #[test]
    fn json_schema_reports_every_violation() {
        let schema = JsonSchema::new(&json!({
            "type": "object",
            "properties": {
                "token": { "type": "string", "minLength": 24, "maxLength": 24 },
                "count": { "type": "integer" }
            },
            "required": ["token", "count"]
        }))
        .unwrap();

        let ok = json!({ "token": "123456789012345678901234", "count": 1 });
        assert_eq!(schema.validate(&ok).unwrap(), ok);

        let err = schema.validate(&json!({ "token": "abc", "count": "x" })).unwrap_err();
        assert_eq!(err.details().len(), 2);
        assert!(err.details().iter().any(|d| d.message.contains("\"abc\"")));
    }

    #[test]
    fn json_schema_details_carry_instance_path() {
        let schema = JsonSchema::new(&json!({
            "type": "object",
            "properties": { "token": { "type": "string", "minLength": 24 } },
            "required": ["token"]
        }))
        .unwrap();

        let err = schema.validate(&json!({ "token": "abc" })).unwrap_err();
        assert_eq!(err.first().path.as_deref(), Some("/token"));

        let err = schema.validate(&json!({})).unwrap_err();
        assert_eq!(err.first().path, None);
    }

    fn takes_schema<S: Schema>(schema: S, input: &Value) -> ValidationResult {
        schema.validate(input)
    }

    #[test]
    fn references_are_schemas() {
        let schema = JsonSchema::new(&json!({ "type": "string" })).unwrap();
        assert!(takes_schema(&schema, &json!("x")).is_ok());
        assert!(takes_schema(&schema, &json!(1)).is_err());
        let dynamic: &dyn Schema = &schema;
        assert!(takes_schema(dynamic, &json!("y")).is_ok());
    }

    #[test]
    fn json_schema_rejects_invalid_schema() {
        let err = JsonSchema::new(&json!({ "type": 12 })).unwrap_err();
        assert!(matches!(err, CoreError::Schema(_)));
    }

    #[derive(Serialize, Deserialize)]
    struct Page {
        #[serde(default = "default_size")]
        size: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        cursor: Option<String>,
    }

    fn default_size() -> u32 {
        20
    }

    #[test]
    fn typed_schema_returns_the_coerced_value() {
        let schema = Typed::<Page>::new();
        let out = schema.validate(&json!({ "extra": true })).unwrap();
        assert_eq!(out, json!({ "size": 20 }));
    }

    #[test]
    fn typed_schema_reports_serde_error() {
        let schema = Typed::<Page>::new();
        let err = schema.validate(&json!({ "size": "big" })).unwrap_err();
        assert_eq!(err.details().len(), 1);
        assert!(err.first().message.contains("invalid type"));
    }

    #[test]
    fn closures_and_smart_pointers_are_schemas() {
        let upper = from_fn(|v: &Value| match v.as_str() {
            Some(s) => Ok(Value::String(s.to_uppercase())),
            None => Err(ValidationError::message("must be a string")),
        });
        assert_eq!(upper.validate(&json!("abc")).unwrap(), json!("ABC"));

        let boxed: Box<dyn Schema> = Box::new(upper);
        assert!(boxed.validate(&json!(1)).is_err());

        let shared: Arc<dyn Schema + Send + Sync> = Arc::new(Typed::<Page>::new());
        assert!(shared.validate(&json!({})).is_ok());
    }
}
