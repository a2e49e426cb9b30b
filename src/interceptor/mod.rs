//! # Interceptor Module
//!
//! Cross-cutting policies that run around every dispatched request.
//!
//! An [`Interceptor`] gets a `before_handle` call for every request that passes
//! the origin filter (matched or not) and an `after_handle` call once a handler
//! produced a response. Either hook may fail with a
//! [`HandlerError`](crate::error::HandlerError); the dispatcher then stops the
//! chain and hands the error to the exception handler.
//!
//! Both hooks run in registration order.
//!
//! ## Built-in Interceptors
//!
//! - [`CorsInterceptor`] - rejects requests from origins outside an allow-list
//! - [`ValidationInterceptor`] - checks path, query and header parameters
//!   against declared [`ParamSpec`]s
//! - [`TracingInterceptor`] - records status and latency on the request span

mod core;
mod cors;
mod tracing;
mod validation;

pub use self::core::Interceptor;
pub use self::cors::CorsInterceptor;
pub use self::tracing::TracingInterceptor;
pub use self::validation::{
    ParamLocation, ParamSpec, ParamType, ValidationInterceptor, ValidationInterceptorBuilder,
};
