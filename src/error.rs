//! # Error Module
//!
//! Error types that flow through the dispatch pipeline.
//!
//! Interceptors and handlers return [`HandlerError`]; the dispatcher hands every
//! error to an [`ExceptionHandler`](crate::exception::ExceptionHandler), which
//! resolves the most specific registered [`ErrorKind`] by walking the explicit
//! supertype table below:
//!
//! ```text
//! Error (root)
//! └── Runtime
//!     ├── IllegalArgument
//!     ├── IllegalState
//!     ├── NotImplemented
//!     └── Api
//!         ├── BadRequest
//!         │   └── Validation
//!         ├── Forbidden
//!         ├── NotFound
//!         ├── InternalServerError
//!         └── ApiNotImplemented
//! ```
//!
//! Build-time problems (malformed route patterns, bad regexes) are reported as
//! [`ConfigError`] from the builders instead.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Error category used for exception-handler resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Root of the hierarchy. Catches everything.
    Error,
    Runtime,
    IllegalArgument,
    IllegalState,
    /// A business operation the integrator never implemented.
    NotImplemented,
    /// An [`ApiError`] created with a free-form status.
    Api,
    BadRequest,
    Validation,
    Forbidden,
    NotFound,
    InternalServerError,
    /// HTTP 501 raised explicitly as an API error.
    ApiNotImplemented,
}

impl ErrorKind {
    /// Direct supertype, `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Error => None,
            ErrorKind::Runtime => Some(ErrorKind::Error),
            ErrorKind::IllegalArgument
            | ErrorKind::IllegalState
            | ErrorKind::NotImplemented
            | ErrorKind::Api => Some(ErrorKind::Runtime),
            ErrorKind::BadRequest
            | ErrorKind::Forbidden
            | ErrorKind::NotFound
            | ErrorKind::InternalServerError
            | ErrorKind::ApiNotImplemented => Some(ErrorKind::Api),
            ErrorKind::Validation => Some(ErrorKind::BadRequest),
        }
    }

    /// This kind followed by every ancestor up to [`ErrorKind::Error`].
    pub fn lineage(self) -> impl Iterator<Item = ErrorKind> {
        std::iter::successors(Some(self), |k| k.parent())
    }

    /// Whether `self` is `other` or one of its descendants.
    #[must_use]
    pub fn is_a(self, other: ErrorKind) -> bool {
        self.lineage().any(|k| k == other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::Runtime => "Runtime",
            ErrorKind::IllegalArgument => "IllegalArgument",
            ErrorKind::IllegalState => "IllegalState",
            ErrorKind::NotImplemented => "NotImplemented",
            ErrorKind::Api => "Api",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Validation => "Validation",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InternalServerError => "InternalServerError",
            ErrorKind::ApiNotImplemented => "ApiNotImplemented",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error carrying an HTTP status code.
///
/// Use the named constructors for the fixed-status variants; [`ApiError::new`]
/// accepts any status and is classified as [`ErrorKind::Api`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    status: u16,
    message: String,
    cause: Option<anyhow::Error>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Api, status, message)
    }

    fn with_kind(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            cause: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::BadRequest, 400, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Forbidden, 403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::NotFound, 404, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InternalServerError, 500, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::ApiNotImplemented, 501, message)
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }
}

/// Constraint that a parameter value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Constraint {
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "minLength")]
    MinLength,
    #[serde(rename = "maxLength")]
    MaxLength,
    #[serde(rename = "pattern")]
    Pattern,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "minimum")]
    Minimum,
    #[serde(rename = "maximum")]
    Maximum,
    #[serde(rename = "type")]
    Type,
}

impl Constraint {
    pub fn as_str(self) -> &'static str {
        match self {
            Constraint::Required => "required",
            Constraint::MinLength => "minLength",
            Constraint::MaxLength => "maxLength",
            Constraint::Pattern => "pattern",
            Constraint::Enum => "enum",
            Constraint::Minimum => "minimum",
            Constraint::Maximum => "maximum",
            Constraint::Type => "type",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violated parameter constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub parameter: String,
    /// Offending value, `None` when the parameter was missing.
    pub value: Option<Value>,
    pub constraint: Constraint,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        parameter: impl Into<String>,
        value: Option<Value>,
        constraint: Constraint,
        message: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            value,
            constraint,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.parameter, self.constraint, self.message)
    }
}

/// Aggregated parameter validation failure (HTTP 400).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationException {
    errors: Box<[ValidationError]>,
    message: String,
}

impl ValidationException {
    pub const STATUS: u16 = 400;

    pub fn new(errors: &[ValidationError]) -> Self {
        let message = match errors {
            [] => "Validation failed".to_string(),
            [only] => only.message.clone(),
            many => format!("Validation failed with {} error(s)", many.len()),
        };
        Self {
            errors: errors.into(),
            message,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        Self::STATUS
    }
}

impl From<Vec<ValidationError>> for ValidationException {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::new(&errors)
    }
}

/// Error raised by interceptors and handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationException),

    #[error("{0}")]
    IllegalArgument(String),

    #[error("{0}")]
    IllegalState(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("{0}")]
    Runtime(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Business operation `operation` has no implementation.
    pub fn not_implemented(operation: impl Into<String>) -> Self {
        HandlerError::NotImplemented(operation.into())
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandlerError::Api(e) => e.kind(),
            HandlerError::Validation(_) => ErrorKind::Validation,
            HandlerError::IllegalArgument(_) => ErrorKind::IllegalArgument,
            HandlerError::IllegalState(_) => ErrorKind::IllegalState,
            HandlerError::NotImplemented(_) => ErrorKind::NotImplemented,
            HandlerError::Runtime(_) => ErrorKind::Runtime,
            HandlerError::Other(_) => ErrorKind::Error,
        }
    }

    /// Status carried by API-style errors, `None` for everything else.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            HandlerError::Api(e) => Some(e.status()),
            HandlerError::Validation(e) => Some(e.status()),
            _ => None,
        }
    }

    #[must_use]
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            HandlerError::Validation(e) => Some(e.errors()),
            _ => None,
        }
    }
}

/// Invalid configuration detected while building the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported HTTP method '{method}' for route '{pattern}'")]
    UnsupportedMethod { method: String, pattern: String },

    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid validation pattern '{pattern}' for parameter '{parameter}': {reason}")]
    InvalidRegex {
        parameter: String,
        pattern: String,
        reason: String,
    },
}
