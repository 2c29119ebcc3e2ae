//! Turning raw issues into final issues.
//!
//! Messages are resolved by the first tier that answers:
//!
//! | Tier | Source |
//! |------|--------|
//! | issue | the raw issue's own non-empty `message` |
//! | schema | the producing schema or check (`inst`) |
//! | context | [`ParseContext::error`] |
//! | custom | [`Config::custom_error`] |
//! | locale | [`Config::locale_error`] |
//! | default | [`format_issue`] |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::formatter::format_issue;
use crate::issue::{props, FinalIssue, MessageFn, MessageSource, PropertyValue, RawIssue};
use crate::types::IssueCode;

/// Per-call parse options.
#[derive(Clone)]
pub struct ParseContext {
    /// Copy the offending input onto finalized issues. Defaults to true.
    pub report_input: bool,
    pub error: Option<MessageFn>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self {
            report_input: true,
            error: None,
        }
    }

    pub fn report_input(mut self, report_input: bool) -> Self {
        self.report_input = report_input;
        self
    }

    pub fn error<F>(mut self, error: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(error));
        self
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("report_input", &self.report_input)
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Library-wide message hooks. Read-only while parsing.
#[derive(Clone, Default)]
pub struct Config {
    pub custom_error: Option<MessageFn>,
    pub locale_error: Option<MessageFn>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custom_error<F>(mut self, error: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.custom_error = Some(Arc::new(error));
        self
    }

    pub fn locale_error<F>(mut self, error: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.locale_error = Some(Arc::new(error));
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("custom_error", &self.custom_error.is_some())
            .field("locale_error", &self.locale_error.is_some())
            .finish()
    }
}

/// Schema-side internals carrying the schema's own error hook.
#[derive(Clone, Default)]
pub struct SchemaInternals {
    pub error: Option<MessageFn>,
}

impl SchemaInternals {
    pub fn with_error<F>(error: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            error: Some(Arc::new(error)),
        }
    }
}

impl MessageSource for SchemaInternals {
    fn error_for(&self, issue: &RawIssue) -> Option<String> {
        self.error.as_ref().and_then(|error| error(issue))
    }
}

/// Fixed messages keyed by issue code.
#[derive(Debug, Clone, Default)]
pub struct ErrorMap {
    messages: HashMap<IssueCode, String>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: IssueCode, message: impl Into<String>) -> Self {
        self.messages.insert(code, message.into());
        self
    }

    pub fn get(&self, code: IssueCode) -> Option<&str> {
        self.messages.get(&code).map(String::as_str)
    }
}

impl MessageSource for ErrorMap {
    fn error_for(&self, issue: &RawIssue) -> Option<String> {
        self.get(issue.code).map(String::from)
    }
}

type Resolver = fn(&RawIssue, Option<&ParseContext>, Option<&Config>) -> Option<String>;

const RESOLVERS: &[(&str, Resolver)] = &[
    ("issue", from_issue),
    ("schema", from_schema),
    ("context", from_context),
    ("custom", from_custom),
    ("locale", from_locale),
];

fn from_issue(raw: &RawIssue, _: Option<&ParseContext>, _: Option<&Config>) -> Option<String> {
    Some(raw.message.clone())
}

fn from_schema(raw: &RawIssue, _: Option<&ParseContext>, _: Option<&Config>) -> Option<String> {
    raw.inst.as_ref().and_then(|inst| inst.error_for(raw))
}

fn from_context(raw: &RawIssue, ctx: Option<&ParseContext>, _: Option<&Config>) -> Option<String> {
    ctx.and_then(|ctx| ctx.error.as_ref())
        .and_then(|error| error(raw))
}

fn from_custom(raw: &RawIssue, _: Option<&ParseContext>, config: Option<&Config>) -> Option<String> {
    config
        .and_then(|config| config.custom_error.as_ref())
        .and_then(|error| error(raw))
}

fn from_locale(raw: &RawIssue, _: Option<&ParseContext>, config: Option<&Config>) -> Option<String> {
    config
        .and_then(|config| config.locale_error.as_ref())
        .and_then(|error| error(raw))
}

/// Resolve the message for `raw`. Never returns an empty string.
pub fn resolve_message(
    raw: &RawIssue,
    ctx: Option<&ParseContext>,
    config: Option<&Config>,
) -> String {
    RESOLVERS
        .iter()
        .find_map(|(tier, resolve)| {
            let message = resolve(raw, ctx, config).filter(|m| !m.is_empty())?;
            trace!(tier = *tier, code = %raw.code, "message resolved");
            Some(message)
        })
        .unwrap_or_else(|| format_issue(raw))
}

/// Finalize one raw issue.
pub fn finalize_issue(
    raw: &RawIssue,
    ctx: Option<&ParseContext>,
    config: Option<&Config>,
) -> FinalIssue {
    let mut issue = FinalIssue::new(raw.code, resolve_message(raw, ctx, config));
    issue.path = raw.path.clone();

    if ctx.map_or(true, |ctx| ctx.report_input) {
        issue.input = raw.input.clone();
    }

    let mut index = None;
    for (key, value) in &raw.properties {
        match value {
            PropertyValue::Value(value) => match key.as_str() {
                props::EXPECTED => issue.expected = string_of(value),
                props::RECEIVED => issue.received = string_of(value),
                props::FORMAT => issue.format = string_of(value),
                props::PATTERN => issue.pattern = string_of(value),
                props::PREFIX => issue.prefix = string_of(value),
                props::SUFFIX => issue.suffix = string_of(value),
                props::INCLUDES => issue.includes = string_of(value),
                props::ALGORITHM => issue.algorithm = string_of(value),
                props::ORIGIN => issue.origin = string_of(value),
                props::MINIMUM => issue.minimum = Some(value.clone()),
                props::MAXIMUM => issue.maximum = Some(value.clone()),
                props::DIVISOR => issue.divisor = Some(value.clone()),
                props::KEY => issue.key = Some(value.clone()),
                props::INCLUSIVE => issue.inclusive = value.as_bool(),
                props::KEYS => {
                    issue.keys = value
                        .as_array()
                        .map(|keys| {
                            keys.iter()
                                .filter_map(|k| k.as_str().map(String::from))
                                .collect()
                        })
                        .unwrap_or_default()
                }
                props::VALUES => {
                    issue.values = value.as_array().cloned().unwrap_or_default();
                }
                props::INDEX => index = Some(value.clone()),
                props::PARAMS => match value {
                    Value::Object(params) => issue
                        .params
                        .extend(params.iter().map(|(k, v)| (k.clone(), v.clone()))),
                    other => {
                        issue.params.insert(key.clone(), other.clone());
                    }
                },
                _ => {
                    issue.params.insert(key.clone(), value.clone());
                }
            },
            PropertyValue::Issue(element) if key == props::ELEMENT_ERROR => {
                issue.issues = vec![finalize_issue(element, ctx, config)];
            }
            PropertyValue::Issues(nested) if key == props::ISSUES => {
                issue.issues = finalize_issues(nested, ctx, config);
            }
            PropertyValue::Branches(branches) if key == props::ERRORS => {
                issue.errors = branches
                    .iter()
                    .map(|branch| finalize_issues(branch, ctx, config))
                    .collect();
            }
            nested => match nested_params_value(nested, ctx, config) {
                Some(value) => {
                    issue.params.insert(key.clone(), value);
                }
                None => trace!(key = %key, "nested issues could not be rendered as JSON"),
            },
        }
    }

    if issue.key.is_none() {
        issue.key = index;
    }

    issue
}

/// Nested issues under a key with no typed field, finalized and kept as JSON.
fn nested_params_value(
    value: &PropertyValue,
    ctx: Option<&ParseContext>,
    config: Option<&Config>,
) -> Option<Value> {
    let rendered = match value {
        PropertyValue::Value(value) => return Some(value.clone()),
        PropertyValue::Issue(nested) => serde_json::to_value(finalize_issue(nested, ctx, config)),
        PropertyValue::Issues(nested) => {
            serde_json::to_value(finalize_issues(nested, ctx, config))
        }
        PropertyValue::Branches(branches) => serde_json::to_value(
            branches
                .iter()
                .map(|branch| finalize_issues(branch, ctx, config))
                .collect::<Vec<_>>(),
        ),
    };
    rendered.ok()
}

/// Finalize a sequence of raw issues, preserving order.
pub fn finalize_issues(
    raws: &[RawIssue],
    ctx: Option<&ParseContext>,
    config: Option<&Config>,
) -> Vec<FinalIssue> {
    raws.iter()
        .map(|raw| finalize_issue(raw, ctx, config))
        .collect()
}

/// Finalize raw issues without library config.
pub fn convert_raw_issues_to_issues(
    raws: &[RawIssue],
    ctx: Option<&ParseContext>,
) -> Vec<FinalIssue> {
    finalize_issues(raws, ctx, None)
}

fn string_of(value: &Value) -> Option<String> {
    value.as_str().map(String::from)
}
