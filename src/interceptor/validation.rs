//! Declarative parameter validation keyed by operation.
//!
//! Each operation (HTTP method + route template, exactly as registered with the
//! router) owns an ordered list of [`ParamSpec`]s. When a request matches that
//! route, every spec is checked and all violations across all parameters are
//! reported together as one [`ValidationException`].

use http::Method;
use std::collections::HashMap;
use tracing::{debug, info};

use super::Interceptor;
use crate::dispatcher::Request;
use crate::error::{ConfigError, HandlerError, ValidationError, ValidationException};
use crate::validator::{validate_and_parse_integer, validate_and_parse_number, validate_string};
use crate::validator_cache::PatternCache;

/// Where a parameter value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    /// Looked up case-insensitively
    Header,
}

/// Declared type of a parameter; selects the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    String,
    Integer,
    Number,
}

/// Validation metadata for one parameter.
///
/// ```rust
/// use waypoint::interceptor::{ParamSpec, ParamType};
///
/// let limit = ParamSpec::query("limit")
///     .of_type(ParamType::Integer)
///     .minimum(1.0)
///     .maximum(100.0);
/// assert!(!limit.required);
/// assert!(ParamSpec::path("id").required);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub param_type: ParamType,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// For integer parameters, rounded up to the nearest integer
    pub minimum: Option<f64>,
    /// For integer parameters, rounded down to the nearest integer
    pub maximum: Option<f64>,
    pub pattern: Option<String>,
    pub enum_values: Vec<String>,
}

impl ParamSpec {
    /// Optional string parameter at `location`.
    pub fn new(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
            param_type: ParamType::String,
            required: false,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            pattern: None,
            enum_values: Vec::new(),
        }
    }

    /// Path variables are always required.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path).required(true)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Query)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Header)
    }

    #[must_use]
    pub fn of_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    #[must_use]
    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Pull this parameter's raw value out of `req`.
    #[must_use]
    pub fn extract<'r>(&self, req: &'r Request) -> Option<&'r str> {
        match self.location {
            ParamLocation::Path => req.get_path_param(&self.name),
            ParamLocation::Query => req.get_query_param(&self.name),
            ParamLocation::Header => req.get_header(&self.name),
        }
    }

    /// Check a raw value against every declared constraint.
    #[must_use]
    pub fn validate(&self, raw: Option<&str>) -> Vec<ValidationError> {
        match self.param_type {
            ParamType::String => validate_string(
                &self.name,
                raw,
                self.required,
                self.min_length,
                self.max_length,
                self.pattern.as_deref(),
                self.enum_values.as_slice(),
            ),
            ParamType::Integer => validate_and_parse_integer(
                &self.name,
                raw,
                self.required,
                self.minimum.map(|m| m.ceil() as i64),
                self.maximum.map(|m| m.floor() as i64),
            ),
            ParamType::Number => validate_and_parse_number(
                &self.name,
                raw,
                self.required,
                self.minimum,
                self.maximum,
            ),
        }
    }
}

type OperationSpecs = HashMap<Method, HashMap<String, Vec<ParamSpec>>>;

/// Rejects requests whose parameters violate the declared [`ParamSpec`]s.
///
/// Requests that matched no route, or a route without declared parameters,
/// pass through untouched.
#[derive(Debug, Clone, Default)]
pub struct ValidationInterceptor {
    operations: OperationSpecs,
}

impl ValidationInterceptor {
    pub fn builder() -> ValidationInterceptorBuilder {
        ValidationInterceptorBuilder::default()
    }

    /// Specs declared for `(method, route_pattern)`.
    #[must_use]
    pub fn specs_for(&self, method: &Method, route_pattern: &str) -> Option<&[ParamSpec]> {
        self.operations
            .get(method)?
            .get(route_pattern)
            .map(Vec::as_slice)
    }

    /// Every violation for `req` against `specs`, in declaration order.
    fn collect_errors(specs: &[ParamSpec], req: &Request) -> Vec<ValidationError> {
        specs
            .iter()
            .flat_map(|spec| spec.validate(spec.extract(req)))
            .collect()
    }
}

impl Interceptor for ValidationInterceptor {
    fn before_handle(&self, req: &Request) -> Result<(), HandlerError> {
        let Some(route_pattern) = req.route_pattern.as_deref() else {
            return Ok(());
        };
        let Some(specs) = self.specs_for(&req.method, route_pattern) else {
            return Ok(());
        };

        let errors = Self::collect_errors(specs, req);
        if errors.is_empty() {
            return Ok(());
        }
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            route = %route_pattern,
            error_count = errors.len(),
            "Parameter validation failed"
        );
        Err(ValidationException::from(errors).into())
    }
}

/// Collects operation specs; [`build`](Self::build) pre-compiles every pattern.
#[derive(Debug, Default)]
pub struct ValidationInterceptorBuilder {
    operations: OperationSpecs,
}

impl ValidationInterceptorBuilder {
    /// Declare the parameters of one operation. Replaces an earlier declaration.
    #[must_use]
    pub fn operation(
        mut self,
        method: Method,
        route_pattern: impl Into<String>,
        specs: Vec<ParamSpec>,
    ) -> Self {
        self.operations
            .entry(method)
            .or_default()
            .insert(route_pattern.into(), specs);
        self
    }

    /// Fails on the first pattern that is not a valid regex.
    pub fn build(self) -> Result<ValidationInterceptor, ConfigError> {
        let cache = PatternCache::global();
        let mut param_count = 0usize;
        for spec in self.operations.values().flat_map(HashMap::values).flatten() {
            param_count += 1;
            if let Some(pattern) = &spec.pattern {
                cache
                    .get_or_compile(pattern)
                    .map_err(|e| ConfigError::InvalidRegex {
                        parameter: spec.name.clone(),
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
            }
        }
        info!(
            operations = self.operations.values().map(HashMap::len).sum::<usize>(),
            parameters = param_count,
            "Parameter validation rules loaded"
        );
        Ok(ValidationInterceptor {
            operations: self.operations,
        })
    }
}
