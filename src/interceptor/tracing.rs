use std::time::Duration;

use tracing::{info, Span};

use super::Interceptor;
use crate::dispatcher::{Request, Response};
use crate::error::HandlerError;

/// Records the outcome of each handled request.
///
/// The dispatcher opens a `dispatch` span per request with empty `status` and
/// `latency_ms` fields; this interceptor fills them in and emits one
/// completion event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn after_handle(
        &self,
        req: &Request,
        res: &mut Response,
        latency: Duration,
    ) -> Result<(), HandlerError> {
        let latency_ms = latency.as_millis() as u64;
        let span = Span::current();
        span.record("status", res.status);
        span.record("latency_ms", latency_ms);
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            route = req.route_pattern.as_deref().unwrap_or("-"),
            status = res.status,
            latency_ms = latency_ms,
            "Request completed"
        );
        Ok(())
    }
}
