use http::Method;
use std::sync::Arc;
use tracing::info;

use super::core::{Dispatcher, Handler, OriginFilter};
use super::request::Request;
use super::response::Response;
use crate::config::PipelineConfig;
use crate::error::{ConfigError, HandlerError};
use crate::exception::{CompositeExceptionHandler, ExceptionHandler};
use crate::interceptor::{CorsInterceptor, Interceptor};
use crate::router::RouteTreeBuilder;
use crate::runtime_config::RuntimeConfig;

/// Step-by-step configuration of a [`Dispatcher`].
///
/// Registration methods chain by value. The first registration error is kept
/// and reported by [`build`](Self::build), so a chain never has to be broken
/// up to handle errors.
///
/// ```rust
/// use http::Method;
/// use waypoint::dispatcher::{Dispatcher, Request, Response};
///
/// let dispatcher = Dispatcher::builder()
///     .route("/pets/{id}", Method::GET, |req: &Request| {
///         let id = req.get_path_param("id").unwrap_or_default();
///         Ok(Response::json(200, serde_json::json!({ "id": id })))
///     })
///     .build()
///     .unwrap();
///
/// let req = Request::from_url(Method::GET, "/pets/7").unwrap();
/// let res = dispatcher.handle(req).unwrap();
/// assert_eq!(res.body["id"], "7");
/// ```
pub struct DispatcherBuilder {
    routes: RouteTreeBuilder<Handler>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    exception_handler: Option<Arc<dyn ExceptionHandler>>,
    origin_filter: OriginFilter,
    runtime_config: RuntimeConfig,
    error: Option<ConfigError>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    /// Empty builder; runtime tuning is read from the environment.
    pub fn new() -> Self {
        Self {
            routes: RouteTreeBuilder::new(),
            interceptors: Vec::new(),
            exception_handler: None,
            origin_filter: OriginFilter::Unrestricted,
            runtime_config: RuntimeConfig::from_env(),
            error: None,
        }
    }

    /// Only admit requests whose full URL starts with one of `prefixes`.
    ///
    /// An empty list admits nothing.
    #[must_use]
    pub fn allowed_origins<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origin_filter = OriginFilter::Prefixes(prefixes.into_iter().map(Into::into).collect());
        self
    }

    /// Append an interceptor. Hooks run in the order interceptors were added.
    #[must_use]
    pub fn interceptor<I: Interceptor + 'static>(self, interceptor: I) -> Self {
        self.shared_interceptor(Arc::new(interceptor))
    }

    #[must_use]
    pub fn shared_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Template route; `{name}` segments bind path variables.
    #[must_use]
    pub fn route<F>(self, pattern: &str, method: Method, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.register(|routes, h| routes.add_route(pattern, method, h), handler)
    }

    #[must_use]
    pub fn exact_route<F>(self, path: &str, method: Method, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.register(|routes, h| routes.add_exact_route(path, method, h), handler)
    }

    #[must_use]
    pub fn prefix_route<F>(self, prefix: &str, method: Method, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.register(|routes, h| routes.add_prefix_route(prefix, method, h), handler)
    }

    #[must_use]
    pub fn contains_route<F>(self, needle: &str, method: Method, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.register(|routes, h| routes.add_contains_route(needle, method, h), handler)
    }

    /// Handler for `method` when nothing else matches.
    #[must_use]
    pub fn fallback<F>(self, method: Method, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.register(|routes, h| routes.set_fallback(method, h), handler)
    }

    fn register<F>(
        mut self,
        add: impl FnOnce(&mut RouteTreeBuilder<Handler>, Handler) -> Result<(), ConfigError>,
        handler: F,
    ) -> Self
    where
        F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        if let Err(e) = add(&mut self.routes, handler) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Replace the default [`CompositeExceptionHandler`].
    #[must_use]
    pub fn exception_handler<E: ExceptionHandler + 'static>(mut self, handler: E) -> Self {
        self.exception_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Apply a loaded [`PipelineConfig`]: a `cors` section appends a
    /// [`CorsInterceptor`], an `origin_filter.prefixes` list sets the origin filter.
    #[must_use]
    pub fn with_config(mut self, config: &PipelineConfig) -> Self {
        if let Some(cors) = &config.cors {
            self = self.interceptor(CorsInterceptor::new(cors.allowed_origins.clone()));
        }
        if let Some(prefixes) = &config.origin_filter.prefixes {
            self = self.allowed_origins(prefixes.iter().cloned());
        }
        self
    }

    /// Freeze the configuration. Fails with the first registration error.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let exception_handler = self
            .exception_handler
            .unwrap_or_else(|| Arc::new(CompositeExceptionHandler::new()));

        info!(
            interceptors = self.interceptors.len(),
            origin_filter = ?self.origin_filter,
            "Dispatcher built"
        );

        Ok(Dispatcher {
            routes: self.routes.build(&self.runtime_config),
            interceptors: self.interceptors,
            exception_handler,
            origin_filter: self.origin_filter,
        })
    }
}
