//! issuekit
//!
//! Validation issue pipeline: construct raw issues, run checks, finalize
//! messages and render the result.
//!
//! Validators emit [`RawIssue`]s through the constructor family. A schema's
//! checks run over a [`ParsePayload`] via [`run_checks`]. Finalization
//! resolves a message for every issue and promotes canonical properties to
//! typed fields on [`FinalIssue`]. A [`ValidationError`] wraps the final
//! issues and offers four projections.
//!
//! # Example
//!
//! ```
//! use issuekit::{too_small, unrecognized_keys, ValidationError};
//! use serde_json::json;
//!
//! let raws = vec![
//!     unrecognized_keys(vec!["extra".into()], json!({"extra": 1})),
//!     too_small(18, true, "number", json!(3)).with_path(["user", "age"]),
//! ];
//!
//! let err = ValidationError::from_raw(&raws, None, None);
//! assert_eq!(
//!     err.prettify(),
//!     "Unrecognized key: \"extra\"; user.age: Too small: expected number to be at least 18"
//! );
//! assert_eq!(err.flatten().field_errors["user"].len(), 1);
//! ```
//!
//! # Message Resolution
//!
//! | Order | Source | Set with |
//! |-------|--------|----------|
//! | 1 | Issue | [`RawIssue::with_message`] |
//! | 2 | Schema or check | [`RawIssue::with_inst`], [`CheckInternals::error`] |
//! | 3 | Parse call | [`ParseContext::error`] |
//! | 4 | Library | [`Config::custom_error`] |
//! | 5 | Locale | [`Config::locale_error`] |
//! | 6 | Default | [`format_issue`] |
//!
//! A tier answering `None` or an empty string defers to the next.
//!
//! # Projections
//!
//! | Projection | Shape |
//! |------------|-------|
//! | [`format_error`] | `{"_errors": [..], "user": {"_errors": [..]}}` |
//! | [`treeify_error`] | `{"errors": [..], "properties": {..}, "items": [..]}` |
//! | [`flatten_error`] | `{"form_errors": [..], "field_errors": {"user": [..]}}` |
//! | [`prettify_error`] | `user.age: Too small: ...; ...` |

mod check;
mod constructors;
mod error;
mod finalize;
mod formatter;
mod issue;
mod loader;
mod projection;
mod types;
mod validation;

pub use check::{
    check_aborted, run_checks, run_checks_on_value, Check, CheckDef, CheckFn, CheckInternals,
    ParsePayload, WhenFn,
};
pub use constructors::{
    custom, fixed_length_array, incompatible_types, invalid_discriminator, invalid_element,
    invalid_format, invalid_key, invalid_key_with_issues, invalid_schema, invalid_type,
    invalid_union, invalid_union_xor, invalid_value, missing_required, nil_pointer, non_optional,
    not_multiple_of, too_big, too_small, type_conversion, unrecognized_keys,
};
pub use error::{IssueError, LoadError};
pub use finalize::{
    convert_raw_issues_to_issues, finalize_issue, finalize_issues, resolve_message, Config,
    ErrorMap, ParseContext, SchemaInternals,
};
pub use formatter::{format_issue, DefaultFormatter, MessageFormatter};
pub use issue::{
    message_fn, props, FinalIssue, IssueSource, MessageFn, MessageSource, Properties,
    PropertyValue, RawIssue,
};
pub use loader::{issue_from_value, issues_from_value, load_issues, load_issues_str};
pub use projection::{
    default_issue_mapper, flatten_error, flatten_error_with_mapper, format_error,
    format_error_with_mapper, prettify_error, prettify_error_with_mapper, prettify_issues,
    to_dot_path, treeify_error, treeify_error_with_mapper, FlattenedError, FormattedError,
    TreeNode,
};
pub use types::{
    parsed_type_name, IssueCode, ParsedType, Path, PathSegment, ISSUE_CODES, MAX_PATH_INDEX,
};
pub use validation::{as_validation_error, is_validation_error, ValidationError};
