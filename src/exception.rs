//! # Exception Handling Module
//!
//! Maps every [`HandlerError`] raised in the pipeline to a [`Response`].
//!
//! [`CompositeExceptionHandler`] keeps one mapping function per [`ErrorKind`].
//! For an error of kind `K` it uses the mapping registered for `K` itself, else
//! the nearest registered ancestor (see the hierarchy in [`crate::error`]),
//! else [`default_response`].
//!
//! ```rust
//! use http::Method;
//! use waypoint::dispatcher::{Request, Response};
//! use waypoint::error::{ErrorKind, HandlerError};
//! use waypoint::exception::{CompositeExceptionHandler, ExceptionHandler};
//!
//! let handler = CompositeExceptionHandler::new()
//!     .on(ErrorKind::Runtime, |_, _| Response::error(503, "try later"))
//!     .on(ErrorKind::IllegalArgument, |e, _| Response::error(422, &e.to_string()));
//!
//! let req = Request::from_url(Method::GET, "/").unwrap();
//! let res = handler.handle(&HandlerError::IllegalArgument("bad id".into()), &req);
//! assert_eq!(res.status, 422);
//! let res = handler.handle(&HandlerError::IllegalState("closed".into()), &req);
//! assert_eq!(res.status, 503);
//! ```

use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::dispatcher::{Request, Response};
use crate::error::{ErrorKind, HandlerError};

/// Converts a pipeline error into the response sent to the client.
pub trait ExceptionHandler: Send + Sync {
    fn handle(&self, error: &HandlerError, request: &Request) -> Response;
}

/// A mapping function registered for one [`ErrorKind`].
pub type ErrorMapper = Arc<dyn Fn(&HandlerError, &Request) -> Response + Send + Sync>;

/// Type-keyed exception handler resolving along the [`ErrorKind`] hierarchy.
#[derive(Clone, Default)]
pub struct CompositeExceptionHandler {
    mappers: HashMap<ErrorKind, ErrorMapper>,
}

impl CompositeExceptionHandler {
    /// A handler with no registrations; every error gets [`default_response`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mapper` for `kind` and all its descendants without a closer registration.
    pub fn register<F>(&mut self, kind: ErrorKind, mapper: F)
    where
        F: Fn(&HandlerError, &Request) -> Response + Send + Sync + 'static,
    {
        if self.mappers.insert(kind, Arc::new(mapper)).is_some() {
            warn!(kind = %kind, "Replaced existing exception mapping");
        }
    }

    /// Chaining form of [`register`](Self::register).
    #[must_use]
    pub fn on<F>(mut self, kind: ErrorKind, mapper: F) -> Self
    where
        F: Fn(&HandlerError, &Request) -> Response + Send + Sync + 'static,
    {
        self.register(kind, mapper);
        self
    }

    /// The most specific kind in `kind`'s lineage that has a mapping.
    #[must_use]
    pub fn resolve(&self, kind: ErrorKind) -> Option<ErrorKind> {
        kind.lineage().find(|k| self.mappers.contains_key(k))
    }
}

impl ExceptionHandler for CompositeExceptionHandler {
    fn handle(&self, error: &HandlerError, request: &Request) -> Response {
        let kind = error.kind();
        match self.resolve(kind).and_then(|k| self.mappers.get(&k)) {
            Some(mapper) => {
                debug!(
                    request_id = %request.request_id,
                    error_kind = %kind,
                    "Custom exception mapping applied"
                );
                mapper(error, request)
            }
            None => default_response(error, request),
        }
    }
}

impl fmt::Debug for CompositeExceptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeExceptionHandler")
            .field("kinds", &self.mappers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Built-in mapping used when nothing more specific is registered.
///
/// - API errors and validation failures keep their status and message;
///   validation failures add the `errors` list
/// - everything else becomes a 500 whose body does not reveal the message
#[must_use]
pub fn default_response(error: &HandlerError, request: &Request) -> Response {
    let kind = error.kind();
    let Some(status) = error.status() else {
        error!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            error_kind = %kind,
            error = %error,
            "Unhandled error while dispatching request"
        );
        return Response::error(500, "Internal Server Error");
    };

    if status >= 500 {
        error!(
            request_id = %request.request_id,
            path = %request.path,
            status = status,
            error_kind = %kind,
            error = %error,
            "Server error response"
        );
    } else {
        debug!(
            request_id = %request.request_id,
            path = %request.path,
            status = status,
            error_kind = %kind,
            error = %error,
            "Client error response"
        );
    }

    let message = error.to_string();
    match error.validation_errors() {
        Some(errors) => Response::json(
            status,
            json!({ "error": message, "status": status, "errors": errors }),
        ),
        None => Response::error(status, &message),
    }
}
