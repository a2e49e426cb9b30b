use http::Method;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use std::sync::Arc;
use url::Url;

use crate::ids::RequestId;
use crate::router::ParamVec;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for the hot path; names are shared `Arc<str>`.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Base used to resolve origin-relative request targets such as `/users?page=2`.
const LOCAL_BASE: &str = "http://localhost";

/// An incoming request as seen by interceptors, handlers and exception handlers.
///
/// The embedding transport builds one per request. `path_params` and
/// `route_pattern` are filled in by the dispatcher once the route is known.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Normalised absolute request URL: scheme and host lowercased, dot
    /// segments resolved, origin-relative targets resolved against
    /// `http://localhost`. The origin filter checks this form.
    pub url: String,
    /// Raw (still percent-encoded) path component of `url`
    pub path: String,
    /// Decoded query string parameters in order of appearance
    pub query_params: ParamVec,
    /// Path variables bound by the matched template route
    pub path_params: ParamVec,
    /// Pattern of the matched route, `None` until a route matched
    pub route_pattern: Option<Arc<str>>,
    pub headers: HeaderVec,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Build a request from a method and an absolute or origin-relative URL.
    ///
    /// ```rust
    /// use http::Method;
    /// use waypoint::dispatcher::Request;
    ///
    /// let req = Request::from_url(Method::GET, "/pets?limit=10&tag=a%20b").unwrap();
    /// assert_eq!(req.path, "/pets");
    /// assert_eq!(req.get_query_param("tag"), Some("a b"));
    /// assert_eq!(req.url, "http://localhost/pets?limit=10&tag=a%20b");
    /// ```
    pub fn from_url(method: Method, url: &str) -> Result<Self, url::ParseError> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(LOCAL_BASE)?.join(url)?,
            Err(e) => return Err(e),
        };

        let query_params = parsed
            .query_pairs()
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect();

        Ok(Self {
            request_id: RequestId::new(),
            method,
            path: parsed.path().to_string(),
            url: parsed.into(),
            query_params,
            path_params: ParamVec::new(),
            route_pattern: None,
            headers: HeaderVec::new(),
            body: None,
        })
    }

    /// Append a header. A valid ULID in `x-request-id` becomes the request ID.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("x-request-id") {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a pattern repeats a variable name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: for `?limit=10&limit=20` this returns `20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Deserialize the raw body as JSON. `Ok(None)` when there is no body.
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.body
            .as_deref()
            .map(serde_json::from_slice)
            .transpose()
    }
}
