//! Raw and finalized issue records.
//!
//! Validators produce [`RawIssue`]s: a code, a relative path and an untyped
//! property bag. Finalization turns them into [`FinalIssue`]s, whose canonical
//! properties are promoted to typed fields for consumers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::types::{IssueCode, Path, PathSegment};

/// Canonical property keys.
pub mod props {
    pub const EXPECTED: &str = "expected";
    pub const RECEIVED: &str = "received";
    pub const MINIMUM: &str = "minimum";
    pub const MAXIMUM: &str = "maximum";
    pub const INCLUSIVE: &str = "inclusive";
    pub const DIVISOR: &str = "divisor";
    pub const FORMAT: &str = "format";
    pub const PATTERN: &str = "pattern";
    pub const PREFIX: &str = "prefix";
    pub const SUFFIX: &str = "suffix";
    pub const INCLUDES: &str = "includes";
    pub const ALGORITHM: &str = "algorithm";
    pub const ORIGIN: &str = "origin";
    pub const KEY: &str = "key";
    pub const KEYS: &str = "keys";
    pub const VALUES: &str = "values";
    pub const PARAMS: &str = "params";
    pub const ISSUES: &str = "issues";
    pub const ERRORS: &str = "errors";
    pub const INDEX: &str = "index";
    pub const ELEMENT_ERROR: &str = "element_error";
    pub const IS_REST_PARAM: &str = "is_rest_param";
    pub const MATCH_COUNT: &str = "match_count";
    pub const MESSAGE: &str = "message";
    pub const FIELD_NAME: &str = "field_name";
    pub const FIELD_TYPE: &str = "field_type";
    pub const FROM: &str = "from";
    pub const TO: &str = "to";
    pub const REASON: &str = "reason";
    pub const FIELD: &str = "field";
    pub const CONFLICT: &str = "conflict";

    /// Keys promoted to a dedicated [`FinalIssue`](crate::FinalIssue) field.
    pub const TYPED: &[&str] = &[
        EXPECTED, RECEIVED, MINIMUM, MAXIMUM, INCLUSIVE, DIVISOR, FORMAT, PATTERN, PREFIX,
        SUFFIX, INCLUDES, ALGORITHM, ORIGIN, KEY, KEYS, VALUES, ISSUES, ERRORS,
    ];
}

/// Hook that may supply a message for an issue. `None` or an empty string
/// defers to the next resolver.
pub type MessageFn = Arc<dyn Fn(&RawIssue) -> Option<String> + Send + Sync>;

/// Wrap a closure as a [`MessageFn`].
pub fn message_fn<F>(f: F) -> MessageFn
where
    F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Something that produced an issue and can name it.
pub trait MessageSource: Send + Sync {
    fn error_for(&self, issue: &RawIssue) -> Option<String>;
}

impl<F> MessageSource for F
where
    F: Fn(&RawIssue) -> Option<String> + Send + Sync,
{
    fn error_for(&self, issue: &RawIssue) -> Option<String> {
        self(issue)
    }
}

/// Shared handle to the schema or check that produced an issue.
#[derive(Clone)]
pub struct IssueSource(Arc<dyn MessageSource>);

impl IssueSource {
    pub fn new<S: MessageSource + 'static>(source: S) -> Self {
        Self(Arc::new(source))
    }

    pub fn from_arc(source: Arc<dyn MessageSource>) -> Self {
        Self(source)
    }

    /// Ask the source for a message; empty strings count as no answer.
    pub fn error_for(&self, issue: &RawIssue) -> Option<String> {
        self.0.error_for(issue).filter(|m| !m.is_empty())
    }
}

impl fmt::Debug for IssueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IssueSource(..)")
    }
}

/// A property value. Nested issues stay typed instead of being flattened
/// into JSON.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Value(Value),
    Issue(Box<RawIssue>),
    Issues(Vec<RawIssue>),
    Branches(Vec<Vec<RawIssue>>),
}

impl PropertyValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PropertyValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Value(value)
    }
}

/// Property bag of a raw issue.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Issue as produced by validators and check bodies.
#[derive(Debug, Clone)]
pub struct RawIssue {
    pub code: IssueCode,
    /// Empty means "resolve later".
    pub message: String,
    pub input: Option<Value>,
    pub path: Path,
    pub properties: Properties,
    /// Whether downstream stages may keep running after this issue.
    pub continue_: bool,
    pub inst: Option<IssueSource>,
}

impl RawIssue {
    pub fn new(code: IssueCode) -> Self {
        Self {
            code,
            message: String::new(),
            input: None,
            path: Path::new(),
            properties: Properties::new(),
            continue_: false,
            inst: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_continue(mut self, continue_: bool) -> Self {
        self.continue_ = continue_;
        self
    }

    pub fn with_inst(mut self, inst: IssueSource) -> Self {
        self.inst = Some(inst);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Raw JSON property, if present and not a nested issue.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).and_then(PropertyValue::as_value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_value(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_value(key).and_then(Value::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get_value(key).and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        })
    }

    /// String list property; non-string members are skipped.
    pub fn get_strings(&self, key: &str) -> Option<Vec<String>> {
        self.get_values(key).map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
    }

    pub fn get_values(&self, key: &str) -> Option<&[Value]> {
        self.get_value(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    /// The failing element of an `invalid_element` issue.
    pub fn element_error(&self) -> Option<&RawIssue> {
        match self.properties.get(props::ELEMENT_ERROR) {
            Some(PropertyValue::Issue(issue)) => Some(issue),
            _ => None,
        }
    }

    /// Nested issues carried under `issues`.
    pub fn nested_issues(&self) -> Option<&[RawIssue]> {
        match self.properties.get(props::ISSUES) {
            Some(PropertyValue::Issues(issues)) => Some(issues),
            _ => None,
        }
    }

    /// Per-branch issues of a union failure.
    pub fn branch_errors(&self) -> Option<&[Vec<RawIssue>]> {
        match self.properties.get(props::ERRORS) {
            Some(PropertyValue::Branches(branches)) => Some(branches),
            _ => None,
        }
    }

    /// Prepend `prefix` to this issue's path.
    pub fn prefix_path(&mut self, prefix: &[PathSegment]) {
        if prefix.is_empty() {
            return;
        }
        let mut path = prefix.to_vec();
        path.append(&mut self.path);
        self.path = path;
    }
}

/// Issue handed to users, with canonical properties as typed fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalIssue {
    pub code: IssueCode,
    pub message: String,
    pub path: Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisor: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
    /// Properties without a dedicated field.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FinalIssue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Vec<FinalIssue>>,
}

impl FinalIssue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Path::new(),
            input: None,
            expected: None,
            received: None,
            minimum: None,
            maximum: None,
            inclusive: None,
            divisor: None,
            format: None,
            pattern: None,
            prefix: None,
            suffix: None,
            includes: None,
            algorithm: None,
            origin: None,
            key: None,
            keys: Vec::new(),
            values: Vec::new(),
            params: BTreeMap::new(),
            issues: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    fn gated<T>(&self, codes: &[IssueCode], value: Option<T>) -> Option<T> {
        if codes.contains(&self.code) {
            value
        } else {
            None
        }
    }

    pub fn expected(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidType], self.expected.as_deref())
    }

    pub fn received(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidType], self.received.as_deref())
    }

    pub fn minimum(&self) -> Option<&Value> {
        self.gated(&[IssueCode::TooSmall], self.minimum.as_ref())
    }

    pub fn maximum(&self) -> Option<&Value> {
        self.gated(&[IssueCode::TooBig], self.maximum.as_ref())
    }

    pub fn inclusive(&self) -> Option<bool> {
        self.gated(
            &[IssueCode::TooBig, IssueCode::TooSmall, IssueCode::InvalidUnion],
            self.inclusive,
        )
    }

    /// Bound inclusivity; a missing flag means inclusive.
    pub fn is_inclusive(&self) -> bool {
        self.inclusive.unwrap_or(true)
    }

    pub fn divisor(&self) -> Option<&Value> {
        self.gated(&[IssueCode::NotMultipleOf], self.divisor.as_ref())
    }

    pub fn format(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidFormat], self.format.as_deref())
    }

    pub fn pattern(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidFormat], self.pattern.as_deref())
    }

    pub fn prefix(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidFormat], self.prefix.as_deref())
    }

    pub fn suffix(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidFormat], self.suffix.as_deref())
    }

    pub fn includes(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidFormat], self.includes.as_deref())
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.gated(&[IssueCode::InvalidFormat], self.algorithm.as_deref())
    }

    pub fn origin(&self) -> Option<&str> {
        self.gated(
            &[
                IssueCode::TooBig,
                IssueCode::TooSmall,
                IssueCode::NotMultipleOf,
                IssueCode::InvalidKey,
                IssueCode::InvalidElement,
            ],
            self.origin.as_deref(),
        )
    }

    pub fn key(&self) -> Option<&Value> {
        self.gated(
            &[IssueCode::InvalidKey, IssueCode::InvalidElement],
            self.key.as_ref(),
        )
    }

    pub fn keys(&self) -> Option<&[String]> {
        self.gated(&[IssueCode::UnrecognizedKeys], Some(self.keys.as_slice()))
    }

    pub fn values(&self) -> Option<&[Value]> {
        self.gated(&[IssueCode::InvalidValue], Some(self.values.as_slice()))
    }

    pub fn nested_issues(&self) -> Option<&[FinalIssue]> {
        self.gated(
            &[IssueCode::InvalidKey, IssueCode::InvalidElement],
            Some(self.issues.as_slice()),
        )
    }

    pub fn union_errors(&self) -> Option<&[Vec<FinalIssue>]> {
        self.gated(&[IssueCode::InvalidUnion], Some(self.errors.as_slice()))
    }

    /// Rebuild a raw issue carrying the same code, message, input and
    /// properties. The path is left empty for the caller to set.
    pub fn to_raw(&self) -> RawIssue {
        let mut raw = RawIssue::new(self.code).with_message(self.message.clone());
        raw.input = self.input.clone();

        for (key, value) in &self.params {
            raw.set_property(key.clone(), value.clone());
        }

        let strings = [
            (props::EXPECTED, &self.expected),
            (props::RECEIVED, &self.received),
            (props::FORMAT, &self.format),
            (props::PATTERN, &self.pattern),
            (props::PREFIX, &self.prefix),
            (props::SUFFIX, &self.suffix),
            (props::INCLUDES, &self.includes),
            (props::ALGORITHM, &self.algorithm),
            (props::ORIGIN, &self.origin),
        ];
        for (key, value) in strings {
            if let Some(s) = value {
                raw.set_property(key, Value::String(s.clone()));
            }
        }

        let values = [
            (props::MINIMUM, &self.minimum),
            (props::MAXIMUM, &self.maximum),
            (props::DIVISOR, &self.divisor),
            (props::KEY, &self.key),
        ];
        for (key, value) in values {
            if let Some(v) = value {
                raw.set_property(key, v.clone());
            }
        }

        if let Some(inclusive) = self.inclusive {
            raw.set_property(props::INCLUSIVE, Value::Bool(inclusive));
        }
        if !self.keys.is_empty() {
            raw.set_property(
                props::KEYS,
                Value::Array(self.keys.iter().cloned().map(Value::String).collect()),
            );
        }
        if !self.values.is_empty() {
            raw.set_property(props::VALUES, Value::Array(self.values.clone()));
        }

        if self.code == IssueCode::InvalidElement {
            if let Some(key) = &self.key {
                if !raw.properties.contains_key(props::INDEX) {
                    raw.set_property(props::INDEX, key.clone());
                }
            }
            if let [element] = self.issues.as_slice() {
                raw.set_property(
                    props::ELEMENT_ERROR,
                    PropertyValue::Issue(Box::new(element.to_raw())),
                );
            }
        }
        if !self.issues.is_empty() && !raw.properties.contains_key(props::ELEMENT_ERROR) {
            raw.set_property(
                props::ISSUES,
                PropertyValue::Issues(self.issues.iter().map(FinalIssue::to_raw).collect()),
            );
        }
        if !self.errors.is_empty() {
            raw.set_property(
                props::ERRORS,
                PropertyValue::Branches(
                    self.errors
                        .iter()
                        .map(|branch| branch.iter().map(FinalIssue::to_raw).collect())
                        .collect(),
                ),
            );
        }

        raw
    }
}
