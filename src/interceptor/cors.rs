use std::time::Duration;

use tracing::{debug, warn};

use super::Interceptor;
use crate::dispatcher::{Request, Response};
use crate::error::{ApiError, HandlerError};

/// Origin allow-list check for cross-origin requests.
///
/// Requests without an `Origin` header are never rejected. With an allow-list
/// configured, the header must equal one of the entries exactly: the comparison
/// is case-sensitive and `https://a.com/` does not match `https://a.com`.
/// Rejected requests fail with [`ApiError::forbidden`] (403).
///
/// An absent or empty allow-list accepts every origin.
///
/// After a successful handler call the accepted origin is echoed back in
/// `Access-Control-Allow-Origin` together with `Vary: Origin`.
///
/// ```rust
/// use waypoint::interceptor::CorsInterceptor;
///
/// let cors = CorsInterceptor::new(Some(vec!["https://app.example.com".to_string()]));
/// assert!(cors.is_allowed("https://app.example.com"));
/// assert!(!cors.is_allowed("https://APP.example.com"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CorsInterceptor {
    allowed_origins: Option<Vec<String>>,
}

impl CorsInterceptor {
    pub fn new(allowed_origins: Option<Vec<String>>) -> Self {
        Self { allowed_origins }
    }

    /// Accept every origin.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.allowed_origins.as_ref().map_or(true, Vec::is_empty)
    }

    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        match &self.allowed_origins {
            Some(list) if !list.is_empty() => list.iter().any(|allowed| allowed == origin),
            _ => true,
        }
    }
}

impl Interceptor for CorsInterceptor {
    fn before_handle(&self, req: &Request) -> Result<(), HandlerError> {
        let Some(origin) = req.get_header("origin") else {
            return Ok(());
        };
        if self.is_allowed(origin) {
            debug!(request_id = %req.request_id, origin = %origin, "CORS: origin accepted");
            return Ok(());
        }
        warn!(
            request_id = %req.request_id,
            origin = %origin,
            path = %req.path,
            "CORS: origin rejected"
        );
        Err(ApiError::forbidden(format!("Origin not allowed: {origin}")).into())
    }

    fn after_handle(
        &self,
        req: &Request,
        res: &mut Response,
        _latency: Duration,
    ) -> Result<(), HandlerError> {
        if let Some(origin) = req.get_header("origin") {
            if self.is_allowed(origin) {
                res.set_header("access-control-allow-origin", origin.to_string());
                res.set_header("vary", "Origin".to_string());
            }
        }
        Ok(())
    }
}
