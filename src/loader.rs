//! Issue loading from files and strings.
//!
//! An issue document is a JSON array of raw issue records:
//!
//! ```json
//! [
//!   {
//!     "code": "invalid_element",
//!     "path": ["tags", 0],
//!     "input": ["a", 5],
//!     "properties": {
//!       "index": 0,
//!       "origin": "array",
//!       "element_error": { "code": "invalid_type", "properties": { "expected": "string" } }
//!     }
//!   }
//! ]
//! ```
//!
//! Every field except `code` is optional. Under `properties`,
//! `element_error` holds one record, `issues` a list of records and `errors`
//! a list of lists of records; every other property is kept as plain JSON.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{IssueError, LoadError};
use crate::issue::{props, PropertyValue, RawIssue};
use crate::types::{IssueCode, PathSegment};

/// Load raw issues from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// `LoadError::InvalidJson` if the file isn't valid JSON, or
/// `LoadError::Issue` if a record is malformed.
pub fn load_issues(path: &Path) -> Result<Vec<RawIssue>, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let issues = load_issues_str(&content)?;
    debug!(path = %path.display(), count = issues.len(), "loaded issues");
    Ok(issues)
}

/// Load raw issues from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON, or
/// `LoadError::Issue` if a record is malformed.
pub fn load_issues_str(content: &str) -> Result<Vec<RawIssue>, LoadError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    Ok(issues_from_value(&value)?)
}

/// Decode an already-parsed issue document.
pub fn issues_from_value(value: &Value) -> Result<Vec<RawIssue>, IssueError> {
    let records = value.as_array().ok_or_else(|| IssueError::InvalidRecord {
        path: "/".to_string(),
        message: "expected an array of issue records".to_string(),
    })?;
    decode_records(records, "")
}

/// Decode a single issue record.
pub fn issue_from_value(value: &Value) -> Result<RawIssue, IssueError> {
    decode_record(value, "/")
}

fn decode_records(records: &[Value], base: &str) -> Result<Vec<RawIssue>, IssueError> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| decode_record(record, &format!("{}/{}", base, i)))
        .collect()
}

fn decode_record(value: &Value, at: &str) -> Result<RawIssue, IssueError> {
    let record = value.as_object().ok_or_else(|| invalid_record(at, "expected an object"))?;

    let code = record
        .get("code")
        .ok_or_else(|| invalid_record(at, "missing \"code\""))?
        .as_str()
        .ok_or_else(|| invalid_record(at, "\"code\" must be a string"))?
        .parse::<IssueCode>()?;

    let mut issue = RawIssue::new(code);

    if let Some(message) = record.get("message") {
        issue.message = message
            .as_str()
            .ok_or_else(|| invalid_record(at, "\"message\" must be a string"))?
            .to_string();
    }

    issue.input = record.get("input").cloned();

    if let Some(path) = record.get("path") {
        issue.path = path
            .as_array()
            .ok_or_else(|| invalid_record(at, "\"path\" must be an array"))?
            .iter()
            .map(PathSegment::from_value)
            .collect::<Result<_, _>>()?;
    }

    if let Some(continue_) = record.get("continue") {
        issue.continue_ = continue_
            .as_bool()
            .ok_or_else(|| invalid_record(at, "\"continue\" must be a boolean"))?;
    }

    if let Some(properties) = record.get("properties") {
        let properties = properties
            .as_object()
            .ok_or_else(|| invalid_record(at, "\"properties\" must be an object"))?;
        decode_properties(&mut issue, properties, &format!("{}/properties", at))?;
    }

    Ok(issue)
}

fn decode_properties(
    issue: &mut RawIssue,
    properties: &Map<String, Value>,
    at: &str,
) -> Result<(), IssueError> {
    for (key, value) in properties {
        let here = format!("{}/{}", at, key);
        let property = match key.as_str() {
            props::ELEMENT_ERROR => PropertyValue::Issue(Box::new(decode_record(value, &here)?)),
            props::ISSUES => {
                let records = value
                    .as_array()
                    .ok_or_else(|| invalid_property(at, key, "expected an array of issue records"))?;
                PropertyValue::Issues(decode_records(records, &here)?)
            }
            props::ERRORS => {
                let branches = value.as_array().ok_or_else(|| {
                    invalid_property(at, key, "expected an array of arrays of issue records")
                })?;
                let branches = branches
                    .iter()
                    .enumerate()
                    .map(|(i, branch)| {
                        let records = branch.as_array().ok_or_else(|| {
                            invalid_property(at, key, "expected an array of arrays of issue records")
                        })?;
                        decode_records(records, &format!("{}/{}", here, i))
                    })
                    .collect::<Result<_, _>>()?;
                PropertyValue::Branches(branches)
            }
            _ => PropertyValue::Value(value.clone()),
        };
        issue.set_property(key.clone(), property);
    }
    Ok(())
}

fn invalid_record(at: &str, message: &str) -> IssueError {
    IssueError::InvalidRecord {
        path: at.to_string(),
        message: message.to_string(),
    }
}

fn invalid_property(at: &str, key: &str, message: &str) -> IssueError {
    IssueError::InvalidProperty {
        path: at.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_issues_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[{{"code": "invalid_type", "path": ["user", "name"], "properties": {{"expected": "string"}}}}]"#
        )
        .unwrap();

        let issues = load_issues(file.path()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::InvalidType);
        assert_eq!(issues[0].path, vec![PathSegment::from("user"), PathSegment::from("name")]);
        assert_eq!(issues[0].get_str(props::EXPECTED), Some("string"));
    }

    #[test]
    fn load_issues_file_not_found() {
        let result = load_issues(Path::new("/nonexistent/issues.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_issues_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_issues(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_issues_str_rejects_non_array() {
        let result = load_issues_str(r#"{"code": "custom"}"#);
        assert!(matches!(
            result,
            Err(LoadError::Issue(IssueError::InvalidRecord { .. }))
        ));
    }

    #[test]
    fn unknown_code_is_an_issue_error() {
        let result = load_issues_str(r#"[{"code": "bogus"}]"#);
        assert!(matches!(
            result,
            Err(LoadError::Issue(IssueError::UnknownCode { .. }))
        ));
    }

    #[test]
    fn record_fields_are_optional() {
        let issue = issue_from_value(&json!({"code": "nil_pointer"})).unwrap();
        assert!(issue.message.is_empty());
        assert!(issue.path.is_empty());
        assert!(issue.input.is_none());
        assert!(!issue.continue_);
    }

    #[test]
    fn null_input_is_present() {
        let issue = issue_from_value(&json!({"code": "custom", "input": null})).unwrap();
        assert_eq!(issue.input, Some(Value::Null));
    }

    #[test]
    fn nested_records_decode() {
        let issues = issues_from_value(&json!([
            {
                "code": "invalid_element",
                "path": [0],
                "properties": {
                    "index": 0,
                    "origin": "array",
                    "element_error": {"code": "invalid_type", "properties": {"expected": "string", "received": "number"}}
                }
            },
            {
                "code": "invalid_union",
                "properties": {
                    "errors": [
                        [{"code": "invalid_type", "properties": {"expected": "string"}}],
                        [{"code": "nil_pointer"}, {"code": "custom", "message": "no"}]
                    ]
                }
            },
            {
                "code": "invalid_key",
                "properties": {"key": "k", "issues": [{"code": "too_small", "properties": {"minimum": 3}}]}
            }
        ]))
        .unwrap();

        assert_eq!(issues[0].element_error().unwrap().code, IssueCode::InvalidType);
        let branches = issues[1].branch_errors().unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[1][1].message, "no");
        assert_eq!(issues[2].nested_issues().unwrap()[0].get_int(props::MINIMUM), Some(3));
    }

    #[test]
    fn malformed_nested_records_report_their_location() {
        let err = issues_from_value(&json!([
            {"code": "invalid_union", "properties": {"errors": [[{"code": "custom"}, {"message": "x"}]]}}
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid issue record at /0/properties/errors/0/1: missing \"code\""
        );

        let err = issues_from_value(&json!([
            {"code": "invalid_union", "properties": {"errors": [{"code": "custom"}]}}
        ]))
        .unwrap_err();
        assert!(matches!(err, IssueError::InvalidProperty { ref key, .. } if key == "errors"));
    }

    #[test]
    fn bad_path_segments_are_rejected() {
        let err = issue_from_value(&json!({"code": "custom", "path": [-1]})).unwrap_err();
        assert!(matches!(err, IssueError::InvalidPathSegment { .. }));

        let err = issue_from_value(&json!({"code": "custom", "path": [true]})).unwrap_err();
        assert!(matches!(err, IssueError::InvalidPathSegment { .. }));
    }

    #[test]
    fn huge_path_indices_are_rejected() {
        for index in [1_000_000_000_000_000u64, u64::MAX] {
            let err = issue_from_value(&json!({"code": "custom", "path": ["list", index]}))
                .unwrap_err();
            assert!(matches!(err, IssueError::InvalidPathSegment { .. }));
        }
    }

    #[test]
    fn wrong_field_types_are_rejected() {
        for record in [
            json!({"code": 5}),
            json!({"code": "custom", "message": 1}),
            json!({"code": "custom", "path": "a.b"}),
            json!({"code": "custom", "continue": "yes"}),
            json!({"code": "custom", "properties": []}),
        ] {
            assert!(matches!(
                issue_from_value(&record),
                Err(IssueError::InvalidRecord { .. })
            ));
        }
    }
}
