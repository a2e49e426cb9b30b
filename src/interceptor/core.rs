use std::time::Duration;

use crate::dispatcher::{Request, Response};
use crate::error::HandlerError;

pub trait Interceptor: Send + Sync {
    /// Name used in log fields. Defaults to the implementing type's path.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runs before the handler. An error aborts the remaining hooks and routing.
    fn before_handle(&self, _req: &Request) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Runs after the handler returned successfully. `latency` is the handler's execution time.
    fn after_handle(
        &self,
        _req: &Request,
        _res: &mut Response,
        _latency: Duration,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}
