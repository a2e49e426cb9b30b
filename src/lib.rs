//! # Waypoint
//!
//! **Waypoint** is a synchronous request dispatch pipeline: it resolves an
//! `(HTTP method, path)` pair to a registered handler, enforces cross-cutting
//! policies before and after the handler runs, and turns every failure into a
//! structured response.
//!
//! The embedding transport owns the sockets. It builds a
//! [`Request`](dispatcher::Request) per incoming request and hands it to
//! [`Dispatcher::handle`](dispatcher::Dispatcher::handle).
//!
//! ## Architecture
//!
//! - **[`router`]** - Segment trie plus exact, prefix, contains and fallback strategies, with a concurrent match cache
//! - **[`validator`]** - Parameter constraint checks that report every violation
//! - **[`interceptor`]** - Before/after hooks: CORS origin checks, parameter validation, tracing
//! - **[`exception`]** - Maps errors to responses along an explicit error-kind hierarchy
//! - **[`dispatcher`]** - The pipeline itself and its builder
//! - **[`config`]** / **[`runtime_config`]** - YAML pipeline policy and environment tuning
//! - **[`telemetry`]** - `tracing-subscriber` setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant R as RouteTree
//!     participant I as Interceptors
//!     participant H as Handler
//!     participant E as ExceptionHandler
//!
//!     T->>D: handle(request)
//!     D->>D: origin filter (reject: None)
//!     D->>R: match_route(method, path)
//!     R-->>D: Option<Arc<MatchResult>>
//!     D->>I: before_handle (registration order)
//!     I-->>D: Err -> E
//!     D->>H: handler(&request)
//!     H-->>D: Result<Response, HandlerError>
//!     D->>I: after_handle (registration order)
//!     D-->>T: Some(response) / None
//! ```
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use waypoint::dispatcher::{Dispatcher, Request, Response};
//! use waypoint::error::ApiError;
//! use waypoint::interceptor::{CorsInterceptor, ParamSpec, ParamType, ValidationInterceptor};
//!
//! let validation = ValidationInterceptor::builder()
//!     .operation(
//!         Method::GET,
//!         "/pets",
//!         vec![ParamSpec::query("limit").of_type(ParamType::Integer).minimum(1.0)],
//!     )
//!     .build()
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::builder()
//!     .interceptor(CorsInterceptor::new(Some(vec!["https://app.example.com".into()])))
//!     .interceptor(validation)
//!     .route("/pets", Method::GET, |_req: &Request| {
//!         Ok(Response::json(200, serde_json::json!([])))
//!     })
//!     .route("/pets/{id}", Method::GET, |req: &Request| {
//!         Err(ApiError::not_found(format!("Pet {} not found", req.get_path_param("id").unwrap_or("?"))).into())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let res = dispatcher.handle(Request::from_url(Method::GET, "/pets?limit=0").unwrap()).unwrap();
//! assert_eq!(res.status, 400);
//! assert_eq!(res.body["error"], "limit must be at least 1 (got 0)");
//!
//! let res = dispatcher.handle(Request::from_url(Method::GET, "/pets/9").unwrap()).unwrap();
//! assert_eq!(res.status, 404);
//!
//! assert!(dispatcher.handle(Request::from_url(Method::GET, "/owners").unwrap()).is_none());
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod exception;
pub mod ids;
pub mod interceptor;
pub mod router;
pub mod runtime_config;
pub mod telemetry;
pub mod validator;
pub mod validator_cache;

pub use config::PipelineConfig;
pub use dispatcher::{Dispatcher, DispatcherBuilder, Request, Response};
pub use error::{ApiError, ConfigError, ErrorKind, HandlerError, ValidationError, ValidationException};
pub use router::{RouteTree, RouteTreeBuilder};
