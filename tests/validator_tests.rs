use serde_json::json;
use std::sync::Arc;
use std::thread;
use waypoint::error::{Constraint, ValidationError, ValidationException};
use waypoint::validator::{
    validate_and_parse_integer, validate_and_parse_number, validate_integer, validate_string,
    NO_ENUM,
};
use waypoint::validator_cache::PatternCache;

fn constraints(errors: &[ValidationError]) -> Vec<Constraint> {
    errors.iter().map(|e| e.constraint).collect()
}

#[test]
fn test_all_string_violations_are_reported() {
    let errors = validate_string(
        "field",
        Some("a"),
        false,
        Some(3),
        Some(10),
        Some("^[a-z]{3,}$"),
        &["valid", "allowed"],
    );
    assert!(errors.len() >= 2);
    assert!(errors.iter().any(|e| e.constraint == Constraint::MinLength));
    assert!(errors.iter().all(|e| e.parameter == "field"));
}

#[test]
fn test_valid_string_passes_every_check() {
    let errors = validate_string(
        "status",
        Some("valid"),
        true,
        Some(3),
        Some(10),
        Some("^[a-z]+$"),
        &["valid", "allowed"],
    );
    assert!(errors.is_empty());
}

#[test]
fn test_pattern_is_a_search_not_a_full_match() {
    assert!(validate_string("code", Some("xx42yy"), true, None, None, Some(r"\d+"), NO_ENUM).is_empty());
    let errors = validate_string("code", Some("xx42yy"), true, None, None, Some(r"^\d+$"), NO_ENUM);
    assert_eq!(errors[0].message, r"code must match pattern ^\d+$");
}

#[test]
fn test_required_missing_value() {
    let errors = validate_integer("limit", None, true, Some(1), Some(10));
    assert_eq!(constraints(&errors), vec![Constraint::Required]);
    assert_eq!(errors[0].value, None);
}

#[test]
fn test_parsed_integer_value_is_reported_as_number() {
    let errors = validate_and_parse_integer("limit", Some("500"), true, Some(1), Some(100));
    assert_eq!(constraints(&errors), vec![Constraint::Maximum]);
    assert_eq!(errors[0].value, Some(json!(500)));
}

#[test]
fn test_unparseable_value_is_reported_as_string() {
    let errors = validate_and_parse_number("price", Some("12,50"), true, None, None);
    assert_eq!(constraints(&errors), vec![Constraint::Type]);
    assert_eq!(errors[0].value, Some(json!("12,50")));
}

#[test]
fn test_exception_message_derivation() {
    let one = validate_string("name", None, true, None, None, None, NO_ENUM);
    let two = validate_string("code", Some("!"), true, Some(2), None, Some("^[a-z]+$"), NO_ENUM);
    assert_eq!(ValidationException::new(&[]).message(), "Validation failed");
    assert_eq!(ValidationException::new(&one).message(), "name is required");
    assert_eq!(
        ValidationException::new(&two).message(),
        "Validation failed with 2 error(s)"
    );
    assert_eq!(ValidationException::new(&two).status(), 400);
}

#[test]
fn test_shared_pattern_cache_under_concurrency() {
    let pattern = r"^[A-Z]{2}-\d{4}$";
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let value = if i % 2 == 0 { "AB-1234" } else { "nope" };
                validate_string("ticket", Some(value), true, None, None, Some(pattern), NO_ENUM).len()
            })
        })
        .collect();
    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counts, vec![0, 1, 0, 1, 0, 1, 0, 1]);
    assert!(PatternCache::global().contains(pattern));

    let a = PatternCache::global().get_or_compile(pattern).unwrap();
    let b = PatternCache::global().get_or_compile(pattern).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
