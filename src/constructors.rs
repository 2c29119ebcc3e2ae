//! Factory functions producing raw issues with canonical property shapes.
//!
//! Every constructor leaves the path empty (except `invalid_element`, which
//! points at its own index); the check engine prepends the current path.

use serde_json::{Map, Value};

use crate::issue::{props, PropertyValue, RawIssue};
use crate::types::{parsed_type_name, IssueCode, PathSegment};

/// Largest `values` list that is deduplicated.
pub const VALUES_DEDUP_LIMIT: usize = 10;

/// Largest `keys` list that is deduplicated.
pub const KEYS_DEDUP_LIMIT: usize = 5;

/// Input value did not have the expected type.
pub fn invalid_type(expected: &str, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::InvalidType)
        .with_property(props::EXPECTED, Value::String(expected.to_string()))
        .with_property(
            props::RECEIVED,
            Value::String(parsed_type_name(&input).to_string()),
        )
        .with_input(input)
}

/// Input was not one of the allowed values.
pub fn invalid_value(valid_values: Vec<Value>, input: Value) -> RawIssue {
    let values = if valid_values.len() <= VALUES_DEDUP_LIMIT {
        dedup(valid_values)
    } else {
        valid_values
    };
    RawIssue::new(IssueCode::InvalidValue)
        .with_property(props::VALUES, Value::Array(values))
        .with_input(input)
}

/// Input exceeded an upper bound.
pub fn too_big(maximum: impl Into<Value>, inclusive: bool, origin: &str, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::TooBig)
        .with_property(props::MAXIMUM, maximum.into())
        .with_property(props::INCLUSIVE, Value::Bool(inclusive))
        .with_property(props::ORIGIN, Value::String(origin.to_string()))
        .with_input(input)
}

/// Input fell below a lower bound.
pub fn too_small(
    minimum: impl Into<Value>,
    inclusive: bool,
    origin: &str,
    input: Value,
) -> RawIssue {
    RawIssue::new(IssueCode::TooSmall)
        .with_property(props::MINIMUM, minimum.into())
        .with_property(props::INCLUSIVE, Value::Bool(inclusive))
        .with_property(props::ORIGIN, Value::String(origin.to_string()))
        .with_input(input)
}

/// Tuple or fixed-size array of the wrong length.
///
/// The code is chosen by `is_too_small` alone; the actual length is not
/// cross-checked against it.
pub fn fixed_length_array(
    expected_len: usize,
    _actual_len: usize,
    input: Value,
    is_too_small: bool,
) -> RawIssue {
    let code = if is_too_small {
        IssueCode::TooSmall
    } else {
        IssueCode::TooBig
    };
    RawIssue::new(code)
        .with_property(props::MINIMUM, Value::from(expected_len))
        .with_property(props::MAXIMUM, Value::from(expected_len))
        .with_property(props::INCLUSIVE, Value::Bool(true))
        .with_property(props::ORIGIN, Value::String("array".to_string()))
        .with_input(input)
}

/// String did not match a named format. `extras` carries format details such
/// as `pattern`, `prefix` or `algorithm`.
pub fn invalid_format(format: &str, input: Value, extras: Map<String, Value>) -> RawIssue {
    let mut issue = RawIssue::new(IssueCode::InvalidFormat)
        .with_property(props::FORMAT, Value::String(format.to_string()))
        .with_input(input);
    for (key, value) in extras {
        issue.set_property(key, value);
    }
    issue
}

pub fn not_multiple_of(divisor: impl Into<Value>, origin: &str, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::NotMultipleOf)
        .with_property(props::DIVISOR, divisor.into())
        .with_property(props::ORIGIN, Value::String(origin.to_string()))
        .with_input(input)
}

/// Object carried keys the schema does not know.
pub fn unrecognized_keys(keys: Vec<String>, input: Value) -> RawIssue {
    let keys = if keys.len() <= KEYS_DEDUP_LIMIT {
        dedup(keys)
    } else {
        keys
    };
    RawIssue::new(IssueCode::UnrecognizedKeys)
        .with_property(
            props::KEYS,
            Value::Array(keys.into_iter().map(Value::String).collect()),
        )
        .with_input(input)
}

/// A map or record key failed validation.
pub fn invalid_key(key: impl Into<Value>, origin: &str, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::InvalidKey)
        .with_property(props::KEY, key.into())
        .with_property(props::ORIGIN, Value::String(origin.to_string()))
        .with_input(input)
}

/// Like [`invalid_key`], also carrying the key schema's own issues.
pub fn invalid_key_with_issues(
    key: impl Into<Value>,
    origin: &str,
    input: Value,
    issues: Vec<RawIssue>,
) -> RawIssue {
    invalid_key(key, origin, input).with_property(props::ISSUES, PropertyValue::Issues(issues))
}

/// A collection element failed validation.
pub fn invalid_element(
    index: usize,
    origin: &str,
    input: Value,
    element_error: RawIssue,
) -> RawIssue {
    RawIssue::new(IssueCode::InvalidElement)
        .with_path([PathSegment::Index(index)])
        .with_property(props::INDEX, Value::from(index))
        .with_property(props::ORIGIN, Value::String(origin.to_string()))
        .with_property(
            props::ELEMENT_ERROR,
            PropertyValue::Issue(Box::new(element_error)),
        )
        .with_input(input)
}

/// No union member accepted the input. One inner list per attempted branch.
pub fn invalid_union(branch_errors: Vec<Vec<RawIssue>>, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::InvalidUnion)
        .with_property(props::ERRORS, PropertyValue::Branches(branch_errors))
        .with_input(input)
}

/// Exclusive union where the number of matching members was not exactly one.
pub fn invalid_union_xor(
    branch_errors: Vec<Vec<RawIssue>>,
    match_count: usize,
    input: Value,
) -> RawIssue {
    invalid_union(branch_errors, input)
        .with_property(props::INCLUSIVE, Value::Bool(false))
        .with_property(props::MATCH_COUNT, Value::from(match_count))
}

/// Caller-defined failure.
pub fn custom(message: &str, properties: Map<String, Value>, input: Value) -> RawIssue {
    let mut issue = RawIssue::new(IssueCode::Custom)
        .with_message(message)
        .with_input(input);
    for (key, value) in properties {
        issue.set_property(key, value);
    }
    issue
}

/// A required value was absent.
pub fn non_optional(input: Value) -> RawIssue {
    invalid_type("nonoptional", input)
}

pub fn missing_required(field_name: &str, field_type: &str) -> RawIssue {
    RawIssue::new(IssueCode::MissingRequired)
        .with_property(props::FIELD_NAME, Value::String(field_name.to_string()))
        .with_property(props::FIELD_TYPE, Value::String(field_type.to_string()))
}

pub fn type_conversion(from: &str, to: &str, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::TypeConversion)
        .with_property(props::FROM, Value::String(from.to_string()))
        .with_property(props::TO, Value::String(to.to_string()))
        .with_input(input)
}

pub fn invalid_schema(reason: &str) -> RawIssue {
    RawIssue::new(IssueCode::InvalidSchema)
        .with_property(props::REASON, Value::String(reason.to_string()))
}

pub fn invalid_discriminator(field: &str, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::InvalidDiscriminator)
        .with_property(props::FIELD, Value::String(field.to_string()))
        .with_input(input)
}

/// Two intersected values could not be merged.
pub fn incompatible_types(conflict: &str, input: Value) -> RawIssue {
    RawIssue::new(IssueCode::IncompatibleTypes)
        .with_property(props::CONFLICT, Value::String(conflict.to_string()))
        .with_input(input)
}

pub fn nil_pointer() -> RawIssue {
    RawIssue::new(IssueCode::NilPointer).with_input(Value::Null)
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}
