//! # Dispatcher Module
//!
//! Entry point of the request pipeline.
//!
//! ## Request Flow
//!
//! 1. Origin filter: requests whose URL is outside the configured prefixes get no response
//! 2. Route lookup (trie, exact, prefix, contains, fallback)
//! 3. Interceptor before-hooks, in registration order
//! 4. No route matched: no response
//! 5. Handler invocation (panics are caught)
//! 6. Interceptor after-hooks, in registration order
//!
//! Any error raised in steps 3, 5 or 6 is converted into a [`Response`] by the
//! configured [`ExceptionHandler`](crate::exception::ExceptionHandler).
//!
//! ## Error Handling
//!
//! - Interceptor and handler errors go to the exception handler
//! - Handler panics become `HandlerError::Runtime` and are mapped like any other error
//! - A request that matches nothing is not an error: `handle` returns `None`

mod builder;
mod core;
mod request;
mod response;

pub use self::builder::DispatcherBuilder;
pub use self::core::{Dispatcher, Handler, OriginFilter};
pub use self::request::{HeaderVec, Request, MAX_INLINE_HEADERS};
pub use self::response::Response;
