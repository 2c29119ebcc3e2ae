//! Default English rendering of issues.
//!
//! [`format_issue`] is total: every raw issue yields a non-empty message,
//! whatever properties it is missing.

use serde_json::Value;

use crate::issue::{props, RawIssue};
use crate::types::{parsed_type_name, IssueCode};

/// Turns a raw issue into a human-readable message.
pub trait MessageFormatter: Send + Sync {
    fn format(&self, issue: &RawIssue) -> String;
}

/// The built-in English formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl MessageFormatter for DefaultFormatter {
    fn format(&self, issue: &RawIssue) -> String {
        format_issue(issue)
    }
}

/// Human-readable nouns for `invalid_format` formats.
const FORMAT_NOUNS: &[(&str, &str)] = &[
    ("regex", "input"),
    ("email", "email address"),
    ("url", "URL"),
    ("emoji", "emoji"),
    ("uuid", "UUID"),
    ("uuidv4", "UUIDv4"),
    ("uuidv6", "UUIDv6"),
    ("nanoid", "nanoid"),
    ("guid", "GUID"),
    ("cuid", "cuid"),
    ("cuid2", "cuid2"),
    ("ulid", "ULID"),
    ("xid", "XID"),
    ("ksuid", "KSUID"),
    ("datetime", "ISO datetime"),
    ("date", "ISO date"),
    ("time", "ISO time"),
    ("duration", "ISO duration"),
    ("ipv4", "IPv4 address"),
    ("ipv6", "IPv6 address"),
    ("cidrv4", "IPv4 range"),
    ("cidrv6", "IPv6 range"),
    ("base64", "base64-encoded string"),
    ("base64url", "base64url-encoded string"),
    ("json_string", "JSON string"),
    ("e164", "E.164 number"),
    ("jwt", "JWT"),
    ("template_literal", "input"),
];

/// Unit used when describing sizes of a given origin.
fn sizing_unit(origin: &str) -> Option<&'static str> {
    match origin {
        "string" => Some("characters"),
        "file" => Some("bytes"),
        "array" | "slice" | "set" => Some("items"),
        "object" | "map" => Some("keys"),
        _ => None,
    }
}

fn format_noun(format: &str) -> &str {
    FORMAT_NOUNS
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, noun)| *noun)
        .unwrap_or(format)
}

/// Render a value inside a message: strings bare, everything else as JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render an issue with the default English messages.
pub fn format_issue(issue: &RawIssue) -> String {
    match issue.code {
        IssueCode::InvalidType => format_invalid_type(issue),
        IssueCode::InvalidValue => format_invalid_value(issue),
        IssueCode::TooBig => format_size(issue, false),
        IssueCode::TooSmall => format_size(issue, true),
        IssueCode::InvalidFormat => format_invalid_format(issue),
        IssueCode::NotMultipleOf => match issue.get_value(props::DIVISOR) {
            Some(divisor) => format!(
                "Invalid number: must be a multiple of {}",
                display_value(divisor)
            ),
            None => "Invalid number".to_string(),
        },
        IssueCode::UnrecognizedKeys => format_unrecognized_keys(issue),
        IssueCode::InvalidKey => format!(
            "Invalid key in {}",
            issue.get_str(props::ORIGIN).unwrap_or("value")
        ),
        IssueCode::InvalidUnion => format_invalid_union(issue),
        IssueCode::InvalidElement => format_invalid_element(issue),
        IssueCode::MissingRequired => {
            let field_type = issue.get_str(props::FIELD_TYPE).unwrap_or("field");
            match issue.get_str(props::FIELD_NAME).filter(|n| !n.is_empty()) {
                Some(name) => format!("Missing required {}: {}", field_type, name),
                None => format!("Missing required {}", field_type),
            }
        }
        IssueCode::TypeConversion => format!(
            "Type conversion failed: cannot convert {} to {}",
            issue.get_str(props::FROM).unwrap_or("unknown"),
            issue.get_str(props::TO).unwrap_or("unknown")
        ),
        IssueCode::InvalidSchema => match issue.get_str(props::REASON).filter(|r| !r.is_empty()) {
            Some(reason) => format!("Invalid schema: {}", reason),
            None => "Invalid schema definition".to_string(),
        },
        IssueCode::InvalidDiscriminator => {
            match issue.get_str(props::FIELD).filter(|f| !f.is_empty()) {
                Some(field) => format!("Invalid or missing discriminator field: {}", field),
                None => "Invalid or missing discriminator field".to_string(),
            }
        }
        IssueCode::IncompatibleTypes => format!(
            "Cannot merge {}: incompatible types",
            issue.get_str(props::CONFLICT).unwrap_or("values")
        ),
        IssueCode::NilPointer => "Nil pointer encountered".to_string(),
        IssueCode::Custom => {
            if !issue.message.is_empty() {
                issue.message.clone()
            } else {
                issue
                    .get_str(props::MESSAGE)
                    .filter(|m| !m.is_empty())
                    .unwrap_or("Invalid input")
                    .to_string()
            }
        }
    }
}

fn format_invalid_type(issue: &RawIssue) -> String {
    let expected = match issue.get_str(props::EXPECTED).unwrap_or("unknown") {
        "stringbool" => "boolean",
        "complex64" | "complex128" => "complex",
        other => other,
    };
    let received = issue
        .get_str(props::RECEIVED)
        .or_else(|| issue.input.as_ref().map(parsed_type_name))
        .unwrap_or("unknown");

    if expected == "object" && matches!(received, "string" | "map") {
        return format!(
            "Type conversion failed: cannot convert {} to {}",
            received, expected
        );
    }
    format!("Invalid input: expected {}, received {}", expected, received)
}

fn format_invalid_value(issue: &RawIssue) -> String {
    match issue.get_values(props::VALUES) {
        Some(values) if !values.is_empty() => {
            let joined = values
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join("|");
            format!("Invalid option: expected one of {}", joined)
        }
        _ => "Invalid value".to_string(),
    }
}

fn format_size(issue: &RawIssue, too_small: bool) -> String {
    let origin = issue.get_str(props::ORIGIN).unwrap_or("value");
    let minimum = issue.get_value(props::MINIMUM);
    let maximum = issue.get_value(props::MAXIMUM);
    let bound = if too_small { minimum } else { maximum };
    let header = if too_small { "Too small" } else { "Too big" };

    let Some(bound) = bound.map(display_value) else {
        return header.to_string();
    };

    if origin == "array" {
        if let (Some(min), Some(max)) = (minimum, maximum) {
            if min == max {
                return format!("expected exactly {}", bound);
            }
        }
    }

    if issue.get_bool(props::IS_REST_PARAM) == Some(true) {
        return if too_small {
            format!("expected at least {}", bound)
        } else {
            format!("expected at most {}", bound)
        };
    }

    let inclusive = issue.get_bool(props::INCLUSIVE).unwrap_or(true);
    let adj = match (inclusive, too_small) {
        (true, true) => "at least ",
        (false, true) => "more than ",
        (true, false) => "at most ",
        (false, false) => "less than ",
    };

    if origin == "file" {
        return format!("File size must be {}{} bytes", adj, bound);
    }

    match sizing_unit(origin) {
        Some(unit) => format!(
            "{}: expected {} to have {}{} {}",
            header, origin, adj, bound, unit
        ),
        None => format!("{}: expected {} to be {}{}", header, origin, adj, bound),
    }
}

fn format_invalid_format(issue: &RawIssue) -> String {
    let format = issue.get_str(props::FORMAT).unwrap_or("");
    if format.is_empty() {
        return "Invalid format".to_string();
    }

    let detail = match format {
        "starts_with" => issue
            .get_str(props::PREFIX)
            .map(|p| format!("Invalid string: must start with \"{}\"", p)),
        "ends_with" => issue
            .get_str(props::SUFFIX)
            .map(|s| format!("Invalid string: must end with \"{}\"", s)),
        "includes" => issue
            .get_str(props::INCLUDES)
            .map(|s| format!("Invalid string: must include \"{}\"", s)),
        "regex" => issue
            .get_str(props::PATTERN)
            .map(|p| format!("Invalid string: must match pattern {}", p)),
        _ => None,
    };

    detail.unwrap_or_else(|| format!("Invalid {}", format_noun(format)))
}

fn format_unrecognized_keys(issue: &RawIssue) -> String {
    let keys = issue.get_strings(props::KEYS).unwrap_or_default();
    let label = if keys.len() == 1 {
        "Unrecognized key"
    } else {
        "Unrecognized keys"
    };
    if keys.is_empty() {
        return label.to_string();
    }
    let quoted = keys
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}: {}", label, quoted)
}

fn format_invalid_union(issue: &RawIssue) -> String {
    let exclusive = issue.get_bool(props::INCLUSIVE) == Some(false);
    let matched = issue.get_int(props::MATCH_COUNT).unwrap_or(0);
    if exclusive && matched > 0 {
        "Invalid input: expected exactly one union member to match".to_string()
    } else {
        "Invalid input: no union member matched".to_string()
    }
}

fn format_invalid_element(issue: &RawIssue) -> String {
    let origin = issue.get_str(props::ORIGIN).unwrap_or("array");
    let index = issue
        .get_value(props::INDEX)
        .or_else(|| issue.get_value(props::KEY))
        .map(display_value)
        .unwrap_or_else(|| "?".to_string());

    match issue.element_error() {
        Some(element) => {
            let inner = if element.message.is_empty() {
                format_issue(element)
            } else {
                element.message.clone()
            };
            let kind = if origin == "array rest" {
                "rest element"
            } else {
                "element"
            };
            format!("{} ({} at index {})", inner, kind, index)
        }
        None => format!("Invalid value in {}: element at index {}", origin, index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::*;
    use crate::issue::PropertyValue;
    use crate::types::ISSUE_CODES;
    use serde_json::{json, Map};

    fn raw(code: IssueCode, properties: Value) -> RawIssue {
        let mut issue = RawIssue::new(code);
        if let Value::Object(map) = properties {
            for (k, v) in map {
                issue.set_property(k, v);
            }
        }
        issue
    }

    #[test]
    fn every_code_formats_non_empty() {
        for code in ISSUE_CODES {
            let message = format_issue(&RawIssue::new(*code));
            assert!(!message.is_empty(), "{} rendered empty", code);
        }
    }

    #[test]
    fn invalid_type_messages() {
        let issue = raw(
            IssueCode::InvalidType,
            json!({"expected": "string", "received": "number"}),
        );
        assert_eq!(
            format_issue(&issue),
            "Invalid input: expected string, received number"
        );

        assert_eq!(
            format_issue(&invalid_type("stringbool", json!(3))),
            "Invalid input: expected boolean, received number"
        );
        assert_eq!(
            format_issue(&invalid_type("complex128", json!("x"))),
            "Invalid input: expected complex, received string"
        );
        assert_eq!(
            format_issue(&invalid_type("object", json!("x"))),
            "Type conversion failed: cannot convert string to object"
        );
    }

    #[test]
    fn invalid_type_falls_back_to_input() {
        let issue = raw(IssueCode::InvalidType, json!({"expected": "array"})).with_input(json!(true));
        assert_eq!(
            format_issue(&issue),
            "Invalid input: expected array, received bool"
        );
    }

    #[test]
    fn invalid_value_is_always_plural() {
        assert_eq!(
            format_issue(&invalid_value(vec![json!("a")], json!("b"))),
            "Invalid option: expected one of \"a\""
        );
        assert_eq!(
            format_issue(&invalid_value(vec![json!("a"), json!(2)], json!("b"))),
            "Invalid option: expected one of \"a\"|2"
        );
        assert_eq!(
            format_issue(&invalid_value(vec![], json!("b"))),
            "Invalid value"
        );
    }

    #[test]
    fn size_messages_with_units() {
        assert_eq!(
            format_issue(&too_small(3, true, "string", json!("ab"))),
            "Too small: expected string to have at least 3 characters"
        );
        assert_eq!(
            format_issue(&too_big(5, false, "array", json!([]))),
            "Too big: expected array to have less than 5 items"
        );
        assert_eq!(
            format_issue(&too_big(2, true, "map", json!({}))),
            "Too big: expected map to have at most 2 keys"
        );
    }

    #[test]
    fn size_messages_without_units() {
        assert_eq!(
            format_issue(&too_small(18, true, "number", json!(3))),
            "Too small: expected number to be at least 18"
        );
        assert_eq!(
            format_issue(&too_small(0, false, "number", json!(0))),
            "Too small: expected number to be more than 0"
        );
    }

    #[test]
    fn missing_inclusive_reads_as_inclusive() {
        let issue = raw(IssueCode::TooBig, json!({"maximum": 9, "origin": "number"}));
        assert_eq!(
            format_issue(&issue),
            "Too big: expected number to be at most 9"
        );
    }

    #[test]
    fn fixed_length_and_rest_params() {
        assert_eq!(
            format_issue(&fixed_length_array(3, 1, json!([1]), true)),
            "expected exactly 3"
        );
        let rest = raw(
            IssueCode::TooSmall,
            json!({"minimum": 2, "origin": "array", "is_rest_param": true}),
        );
        assert_eq!(format_issue(&rest), "expected at least 2");
    }

    #[test]
    fn file_sizes() {
        assert_eq!(
            format_issue(&too_big(1024, true, "file", json!(null))),
            "File size must be at most 1024 bytes"
        );
        assert_eq!(
            format_issue(&too_small(1, true, "file", json!(null))),
            "File size must be at least 1 bytes"
        );
    }

    #[test]
    fn format_messages() {
        let with = |format: &str, key: &str, value: &str| {
            let mut extras = Map::new();
            extras.insert(key.to_string(), json!(value));
            format_issue(&invalid_format(format, json!("x"), extras))
        };
        assert_eq!(
            with("starts_with", "prefix", "ab"),
            "Invalid string: must start with \"ab\""
        );
        assert_eq!(
            with("ends_with", "suffix", "yz"),
            "Invalid string: must end with \"yz\""
        );
        assert_eq!(
            with("includes", "includes", "mid"),
            "Invalid string: must include \"mid\""
        );
        assert_eq!(
            with("regex", "pattern", "^a+$"),
            "Invalid string: must match pattern ^a+$"
        );
        assert_eq!(
            format_issue(&invalid_format("email", json!("x"), Map::new())),
            "Invalid email address"
        );
        assert_eq!(
            format_issue(&invalid_format("zipcode", json!("x"), Map::new())),
            "Invalid zipcode"
        );
        assert_eq!(
            format_issue(&invalid_format("", json!("x"), Map::new())),
            "Invalid format"
        );
    }

    #[test]
    fn unrecognized_keys_singular_and_plural() {
        assert_eq!(
            format_issue(&unrecognized_keys(vec!["extra".into()], json!({}))),
            "Unrecognized key: \"extra\""
        );
        assert_eq!(
            format_issue(&unrecognized_keys(vec!["a".into(), "b".into()], json!({}))),
            "Unrecognized keys: \"a\", \"b\""
        );
    }

    #[test]
    fn element_messages() {
        let inner = raw(
            IssueCode::InvalidType,
            json!({"expected": "string", "received": "number"}),
        );
        let issue = invalid_element(0, "array", json!([1]), inner.clone());
        assert_eq!(
            format_issue(&issue),
            "Invalid input: expected string, received number (element at index 0)"
        );

        let rest = invalid_element(3, "array rest", json!([1]), inner);
        assert_eq!(
            format_issue(&rest),
            "Invalid input: expected string, received number (rest element at index 3)"
        );

        let bare = raw(IssueCode::InvalidElement, json!({"index": 1, "origin": "set"}));
        assert_eq!(format_issue(&bare), "Invalid value in set: element at index 1");
    }

    #[test]
    fn element_message_prefers_inner_message() {
        let inner = RawIssue::new(IssueCode::Custom).with_message("must be even");
        let issue = RawIssue::new(IssueCode::InvalidElement)
            .with_property(props::INDEX, json!(2))
            .with_property(props::ELEMENT_ERROR, PropertyValue::Issue(Box::new(inner)));
        assert_eq!(format_issue(&issue), "must be even (element at index 2)");
    }

    #[test]
    fn union_messages() {
        assert_eq!(
            format_issue(&invalid_union(vec![], json!(1))),
            "Invalid input: no union member matched"
        );
        assert_eq!(
            format_issue(&invalid_union_xor(vec![], 2, json!(1))),
            "Invalid input: expected exactly one union member to match"
        );
        assert_eq!(
            format_issue(&invalid_union_xor(vec![], 0, json!(1))),
            "Invalid input: no union member matched"
        );
    }

    #[test]
    fn leaf_code_messages() {
        assert_eq!(
            format_issue(&not_multiple_of(5, "number", json!(7))),
            "Invalid number: must be a multiple of 5"
        );
        assert_eq!(
            format_issue(&invalid_key("k", "record", json!({}))),
            "Invalid key in record"
        );
        assert_eq!(
            format_issue(&missing_required("email", "field")),
            "Missing required field: email"
        );
        assert_eq!(
            format_issue(&type_conversion("string", "int", json!("x"))),
            "Type conversion failed: cannot convert string to int"
        );
        assert_eq!(
            format_issue(&invalid_schema("cyclic reference")),
            "Invalid schema: cyclic reference"
        );
        assert_eq!(
            format_issue(&invalid_discriminator("kind", json!({}))),
            "Invalid or missing discriminator field: kind"
        );
        assert_eq!(
            format_issue(&incompatible_types("objects", json!({}))),
            "Cannot merge objects: incompatible types"
        );
        assert_eq!(format_issue(&nil_pointer()), "Nil pointer encountered");
    }

    #[test]
    fn custom_message_fallbacks() {
        assert_eq!(
            format_issue(&custom("explicit", Map::new(), json!(1))),
            "explicit"
        );
        let issue = raw(IssueCode::Custom, json!({"message": "from properties"}));
        assert_eq!(format_issue(&issue), "from properties");
        assert_eq!(format_issue(&RawIssue::new(IssueCode::Custom)), "Invalid input");
    }

    #[test]
    fn default_formatter_delegates() {
        let formatter = DefaultFormatter;
        assert_eq!(
            formatter.format(&nil_pointer()),
            "Nil pointer encountered"
        );
    }
}
