//! Dispatcher core module - hot path for request dispatch.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, field, info_span};

use super::builder::DispatcherBuilder;
use super::request::Request;
use super::response::Response;
use crate::error::HandlerError;
use crate::exception::ExceptionHandler;
use crate::interceptor::Interceptor;
use crate::router::RouteTree;

/// A registered request handler.
pub type Handler = Arc<dyn Fn(&Request) -> Result<Response, HandlerError> + Send + Sync>;

/// Coarse allow-list applied to the full request URL before anything else runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginFilter {
    /// No filter configured: every request is admitted
    #[default]
    Unrestricted,
    /// The URL must start with one of the prefixes. An empty list admits nothing.
    Prefixes(Vec<String>),
}

impl OriginFilter {
    #[must_use]
    pub fn admits(&self, url: &str) -> bool {
        match self {
            OriginFilter::Unrestricted => true,
            OriginFilter::Prefixes(prefixes) => prefixes.iter().any(|p| url.starts_with(p.as_str())),
        }
    }
}

/// Immutable request pipeline: origin filter, interceptors, routing, handler,
/// exception mapping.
///
/// Built once through [`DispatcherBuilder`] and shared freely across threads.
pub struct Dispatcher {
    pub(super) routes: RouteTree<Handler>,
    pub(super) interceptors: Vec<Arc<dyn Interceptor>>,
    pub(super) exception_handler: Arc<dyn ExceptionHandler>,
    pub(super) origin_filter: OriginFilter,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Run `request` through the pipeline.
    ///
    /// Returns `None` when the origin filter rejects the request, or when no
    /// route (and no fallback) matches and no before-hook failed. Every error
    /// raised along the way is turned into a response by the exception handler.
    ///
    /// Before-hooks run for every admitted request, in registration order. The
    /// first failure skips the remaining hooks and the handler. After-hooks
    /// also run in registration order, only after the handler succeeded; the
    /// first failure skips the remaining after-hooks. A panic in a hook or the
    /// handler counts as a failure of that stage.
    #[must_use]
    pub fn handle(&self, mut request: Request) -> Option<Response> {
        if !self.origin_filter.admits(&request.url) {
            debug!(
                request_id = %request.request_id,
                url = %request.url,
                "Request rejected by origin filter"
            );
            return None;
        }

        let span = info_span!(
            "dispatch",
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            status = field::Empty,
            latency_ms = field::Empty,
        );
        let _entered = span.enter();

        // Lookup has no side effects, so it can run first and expose the
        // matched route to the before-hooks.
        let matched = self.routes.match_route(&request.method, &request.path);
        if let Some(m) = &matched {
            request.path_params = m.path_params.clone();
            request.route_pattern = Some(Arc::clone(&m.route.pattern));
        }

        // D4: Interceptor before execution
        for (idx, interceptor) in self.interceptors.iter().enumerate() {
            let outcome = guarded(&request, interceptor.name(), || interceptor.before_handle(&request));
            if let Err(err) = outcome {
                debug!(
                    request_id = %request.request_id,
                    interceptor_idx = idx,
                    interceptor_name = interceptor.name(),
                    error = %err,
                    "Interceptor rejected request"
                );
                return Some(self.exception_handler.handle(&err, &request));
            }
        }

        let Some(matched) = matched else {
            debug!(
                request_id = %request.request_id,
                method = %request.method,
                path = %request.path,
                "No route found - no response"
            );
            return None;
        };

        // D3: Request dispatched to handler
        let start = Instant::now();
        let mut response = match guarded(&request, "Handler", || (matched.handler())(&request)) {
            Ok(response) => response,
            Err(err) => return Some(self.exception_handler.handle(&err, &request)),
        };
        let latency = start.elapsed();

        // D5: Interceptor after execution
        for (idx, interceptor) in self.interceptors.iter().enumerate() {
            let outcome = guarded(&request, interceptor.name(), || {
                interceptor.after_handle(&request, &mut response, latency)
            });
            if let Err(err) = outcome {
                debug!(
                    request_id = %request.request_id,
                    interceptor_idx = idx,
                    interceptor_name = interceptor.name(),
                    error = %err,
                    "Interceptor after-hook failed"
                );
                return Some(self.exception_handler.handle(&err, &request));
            }
        }

        Some(response)
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTree<Handler> {
        &self.routes
    }

    #[must_use]
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn origin_filter(&self) -> &OriginFilter {
        &self.origin_filter
    }
}

/// Run one pipeline stage, converting a panic into [`HandlerError::Runtime`].
///
/// `stage` is `"Handler"` or the interceptor's name.
fn guarded<T>(
    request: &Request,
    stage: &str,
    f: impl FnOnce() -> Result<T, HandlerError>,
) -> Result<T, HandlerError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let panic_message = panic_message(payload.as_ref());
            error!(
                request_id = %request.request_id,
                route = request.route_pattern.as_deref().unwrap_or("-"),
                stage = %stage,
                panic_message = %panic_message,
                "Pipeline stage panicked - CRITICAL"
            );
            Err(HandlerError::Runtime(format!("{stage} panicked: {panic_message}")))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
