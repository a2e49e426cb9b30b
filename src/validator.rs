//! # Parameter Validator Module
//!
//! Stateless checks for path, query and header parameter values.
//!
//! Every function returns the full list of violated constraints for one
//! parameter instead of stopping at the first failure, so a single response can
//! report everything that is wrong with a request. The two exceptions are a
//! missing required value (nothing else can be checked) and a numeric value
//! that does not parse (bounds make no sense against an unparsed string).
//!
//! Regex patterns are compiled through the process-wide
//! [`PatternCache`](crate::validator_cache::PatternCache).
//!
//! ```rust
//! use waypoint::error::Constraint;
//! use waypoint::validator::validate_string;
//!
//! let errors = validate_string(
//!     "field",
//!     Some("a"),
//!     false,
//!     Some(3),
//!     Some(10),
//!     Some("^[a-z]{3,}$"),
//!     &["valid", "allowed"],
//! );
//! assert_eq!(errors.len(), 3);
//! assert_eq!(errors[0].constraint, Constraint::MinLength);
//! ```

use serde_json::Value;

use crate::error::{Constraint, ValidationError};
use crate::validator_cache::PatternCache;

/// Convenience for callers without an allowed-values list.
pub const NO_ENUM: &[&str] = &[];

fn required_error(name: &str) -> ValidationError {
    ValidationError::new(
        name,
        None,
        Constraint::Required,
        format!("{name} is required"),
    )
}

/// Validate a string parameter.
///
/// - missing or empty and `required`: one `required` error, nothing else
/// - missing and not required: no errors
/// - otherwise `minLength`, `maxLength`, `pattern` and `enum` are checked
///   independently and every failure is reported
///
/// Length counts Unicode scalar values. `pattern` uses unanchored search
/// semantics, so anchor it (`^...$`) to constrain the whole value. An empty
/// `enum_values` slice disables the enum check.
pub fn validate_string<S: AsRef<str>>(
    name: &str,
    value: Option<&str>,
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<&str>,
    enum_values: &[S],
) -> Vec<ValidationError> {
    let value = match value {
        None => return if required { vec![required_error(name)] } else { Vec::new() },
        Some("") if required => return vec![required_error(name)],
        Some(v) => v,
    };

    let mut errors = Vec::new();
    let offending = || Some(Value::String(value.to_string()));
    let len = value.chars().count();

    if let Some(min) = min_length {
        if len < min {
            errors.push(ValidationError::new(
                name,
                offending(),
                Constraint::MinLength,
                format!("{name} must be at least {min} characters (got {len})"),
            ));
        }
    }

    if let Some(max) = max_length {
        if len > max {
            errors.push(ValidationError::new(
                name,
                offending(),
                Constraint::MaxLength,
                format!("{name} must be at most {max} characters (got {len})"),
            ));
        }
    }

    if let Some(pattern) = pattern {
        match PatternCache::global().get_or_compile(pattern) {
            Ok(re) if re.is_match(value) => {}
            Ok(_) => errors.push(ValidationError::new(
                name,
                offending(),
                Constraint::Pattern,
                format!("{name} must match pattern {pattern}"),
            )),
            Err(_) => errors.push(ValidationError::new(
                name,
                offending(),
                Constraint::Pattern,
                format!("{name} cannot be checked against invalid pattern {pattern}"),
            )),
        }
    }

    if !enum_values.is_empty() && !enum_values.iter().any(|allowed| allowed.as_ref() == value) {
        let allowed = enum_values
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(", ");
        errors.push(ValidationError::new(
            name,
            offending(),
            Constraint::Enum,
            format!("{name} must be one of: {allowed}"),
        ));
    }

    errors
}

/// Validate an already-typed integer parameter against its bounds.
pub fn validate_integer(
    name: &str,
    value: Option<i64>,
    required: bool,
    minimum: Option<i64>,
    maximum: Option<i64>,
) -> Vec<ValidationError> {
    match value {
        None if required => vec![required_error(name)],
        None => Vec::new(),
        Some(v) => check_bounds(name, v, Value::from(v), minimum, maximum),
    }
}

/// Validate an already-typed floating point parameter against its bounds.
pub fn validate_number(
    name: &str,
    value: Option<f64>,
    required: bool,
    minimum: Option<f64>,
    maximum: Option<f64>,
) -> Vec<ValidationError> {
    match value {
        None if required => vec![required_error(name)],
        None => Vec::new(),
        Some(v) => check_bounds(name, v, Value::from(v), minimum, maximum),
    }
}

/// Parse `raw` as a strict integer, then validate its bounds.
///
/// Decimal points, exponents and surrounding whitespace are rejected with a
/// single `type` error.
pub fn validate_and_parse_integer(
    name: &str,
    raw: Option<&str>,
    required: bool,
    minimum: Option<i64>,
    maximum: Option<i64>,
) -> Vec<ValidationError> {
    let raw = match present(name, raw, required) {
        Ok(raw) => raw,
        Err(errors) => return errors,
    };
    match raw.parse::<i64>() {
        Ok(v) => validate_integer(name, Some(v), required, minimum, maximum),
        Err(_) => vec![type_error(name, raw, "integer")],
    }
}

/// Parse `raw` as a finite number (exponents allowed), then validate its bounds.
pub fn validate_and_parse_number(
    name: &str,
    raw: Option<&str>,
    required: bool,
    minimum: Option<f64>,
    maximum: Option<f64>,
) -> Vec<ValidationError> {
    let raw = match present(name, raw, required) {
        Ok(raw) => raw,
        Err(errors) => return errors,
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => validate_number(name, Some(v), required, minimum, maximum),
        _ => vec![type_error(name, raw, "number")],
    }
}

/// `Ok(raw)` when there is a non-empty value to parse, otherwise the errors to report.
fn present<'a>(
    name: &str,
    raw: Option<&'a str>,
    required: bool,
) -> Result<&'a str, Vec<ValidationError>> {
    match raw {
        Some(raw) if !raw.is_empty() => Ok(raw),
        _ if required => Err(vec![required_error(name)]),
        _ => Err(Vec::new()),
    }
}

fn type_error(name: &str, raw: &str, type_name: &str) -> ValidationError {
    ValidationError::new(
        name,
        Some(Value::String(raw.to_string())),
        Constraint::Type,
        format!("{name} must be a valid {type_name}"),
    )
}

fn check_bounds<T>(
    name: &str,
    value: T,
    json: Value,
    minimum: Option<T>,
    maximum: Option<T>,
) -> Vec<ValidationError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    let mut errors = Vec::new();
    if let Some(min) = minimum {
        if value < min {
            errors.push(ValidationError::new(
                name,
                Some(json.clone()),
                Constraint::Minimum,
                format!("{name} must be at least {min} (got {value})"),
            ));
        }
    }
    if let Some(max) = maximum {
        if value > max {
            errors.push(ValidationError::new(
                name,
                Some(json),
                Constraint::Maximum,
                format!("{name} must be at most {max} (got {value})"),
            ));
        }
    }
    errors
}
