//! Structured renderings of a [`ValidationError`].
//!
//! Four shapes are offered, each with a `_with_mapper` variant that replaces
//! the message step while keeping structure and path handling:
//!
//! - [`FormattedError`]: nested map keyed by path segment, `_errors` at every node.
//! - [`TreeNode`]: `errors` plus `properties` for keys and `items` for indices.
//! - [`FlattenedError`]: form-level errors and errors keyed by the first segment.
//! - pretty text: `"<dotpath>: <message>"` joined by `"; "`.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::formatter::MessageFormatter;
use crate::issue::FinalIssue;
use crate::types::{IssueCode, PathSegment, MAX_PATH_INDEX};
use crate::validation::ValidationError;

/// Render a path as `user.contacts[0].email`.
///
/// Keys made only of `[A-Za-z0-9_$]` appear bare; anything else is quoted as
/// `["first name"]`. Indices always use brackets. An empty path renders empty.
pub fn to_dot_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) if is_bare_key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Key(key) => {
                out.push('[');
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(']');
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Mapper used when none is supplied: the issue's own message, or the
/// formatter's rendering when that is empty.
pub fn default_issue_mapper(
    formatter: &dyn MessageFormatter,
) -> impl Fn(&FinalIssue) -> String + '_ {
    move |issue| {
        if issue.message.is_empty() {
            formatter.format(&issue.to_raw())
        } else {
            issue.message.clone()
        }
    }
}

const ERRORS_KEY: &str = "_errors";

/// Nested map projection.
///
/// Serializes as `{"_errors": [..], <segment>: {..}}`. A child whose path
/// key is itself `_errors` is written as `["_errors"]` so the object never
/// carries the key twice; `children` keeps the raw key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedError {
    pub errors: Vec<String>,
    pub children: BTreeMap<String, FormattedError>,
}

impl Serialize for FormattedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len() + 1))?;
        map.serialize_entry(ERRORS_KEY, &self.errors)?;
        for (key, child) in &self.children {
            if key == ERRORS_KEY {
                map.serialize_entry(&format!("[\"{}\"]", ERRORS_KEY), child)?;
            } else {
                map.serialize_entry(key, child)?;
            }
        }
        map.end()
    }
}

impl FormattedError {
    pub fn from_issues<M>(issues: &[FinalIssue], mapper: M) -> Self
    where
        M: Fn(&FinalIssue) -> String,
    {
        let mut root = FormattedError::default();
        for issue in issues {
            root.insert(issue, &[], &mapper);
        }
        root
    }

    /// Node at `path`, if any issue created it.
    pub fn get(&self, path: &[PathSegment]) -> Option<&FormattedError> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(&segment.stringify()))
    }

    fn node_mut(&mut self, path: &[PathSegment]) -> &mut FormattedError {
        path.iter().fold(self, |node, segment| {
            node.children.entry(segment.stringify()).or_default()
        })
    }

    fn insert<M>(&mut self, issue: &FinalIssue, prefix: &[PathSegment], mapper: &M)
    where
        M: Fn(&FinalIssue) -> String,
    {
        let path: Vec<PathSegment> = prefix.iter().chain(&issue.path).cloned().collect();
        match issue.code {
            IssueCode::InvalidUnion if issue.errors.iter().any(|branch| !branch.is_empty()) => {
                for nested in issue.errors.iter().flatten() {
                    self.insert(nested, &path, mapper);
                }
            }
            IssueCode::InvalidKey | IssueCode::InvalidElement if !issue.issues.is_empty() => {
                for nested in &issue.issues {
                    self.insert(nested, &path, mapper);
                }
            }
            _ => self.node_mut(&path).errors.push(mapper(issue)),
        }
    }
}

pub fn format_error(err: &ValidationError) -> FormattedError {
    format_error_with_mapper(err, default_issue_mapper(err.formatter()))
}

pub fn format_error_with_mapper<M>(err: &ValidationError, mapper: M) -> FormattedError
where
    M: Fn(&FinalIssue) -> String,
{
    FormattedError::from_issues(err.issues(), mapper)
}

/// Tree projection: keys under `properties`, indices under `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeNode {
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, TreeNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TreeNode>,
}

impl TreeNode {
    pub fn from_issues<M>(issues: &[FinalIssue], mapper: M) -> Self
    where
        M: Fn(&FinalIssue) -> String,
    {
        let mut root = TreeNode::default();
        for issue in issues {
            root.node_mut(&issue.path).errors.push(mapper(issue));
        }
        root
    }

    pub fn get(&self, path: &[PathSegment]) -> Option<&TreeNode> {
        path.iter().try_fold(self, |node, segment| match segment {
            PathSegment::Key(key) => node.properties.get(key),
            PathSegment::Index(index) => node.items.get(*index),
        })
    }

    /// Indices above [`MAX_PATH_INDEX`] stop the descent; the message stays
    /// on the deepest node that could be reached.
    fn node_mut(&mut self, path: &[PathSegment]) -> &mut TreeNode {
        let mut node = self;
        for segment in path {
            node = match segment {
                PathSegment::Key(key) => node.properties.entry(key.clone()).or_default(),
                PathSegment::Index(index) if *index <= MAX_PATH_INDEX => {
                    if node.items.len() <= *index {
                        node.items.resize_with(*index + 1, TreeNode::default);
                    }
                    &mut node.items[*index]
                }
                PathSegment::Index(_) => break,
            };
        }
        node
    }
}

pub fn treeify_error(err: &ValidationError) -> TreeNode {
    treeify_error_with_mapper(err, default_issue_mapper(err.formatter()))
}

pub fn treeify_error_with_mapper<M>(err: &ValidationError, mapper: M) -> TreeNode
where
    M: Fn(&FinalIssue) -> String,
{
    TreeNode::from_issues(err.issues(), mapper)
}

/// Flat projection for form rendering. Only the first path segment is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedError {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl FlattenedError {
    pub fn from_issues<M>(issues: &[FinalIssue], mapper: M) -> Self
    where
        M: Fn(&FinalIssue) -> String,
    {
        let mut flattened = FlattenedError::default();
        for issue in issues {
            let message = mapper(issue);
            match issue.path.first() {
                Some(field) => flattened
                    .field_errors
                    .entry(field.stringify())
                    .or_default()
                    .push(message),
                None => flattened.form_errors.push(message),
            }
        }
        flattened
    }
}

pub fn flatten_error(err: &ValidationError) -> FlattenedError {
    flatten_error_with_mapper(err, default_issue_mapper(err.formatter()))
}

pub fn flatten_error_with_mapper<M>(err: &ValidationError, mapper: M) -> FlattenedError
where
    M: Fn(&FinalIssue) -> String,
{
    FlattenedError::from_issues(err.issues(), mapper)
}

/// One line per issue, joined by `"; "`.
pub fn prettify_issues<M>(issues: &[FinalIssue], mapper: M) -> String
where
    M: Fn(&FinalIssue) -> String,
{
    issues
        .iter()
        .map(|issue| {
            let message = mapper(issue);
            if issue.path.is_empty() {
                message
            } else {
                format!("{}: {}", to_dot_path(&issue.path), message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn prettify_error(err: &ValidationError) -> String {
    prettify_error_with_mapper(err, default_issue_mapper(err.formatter()))
}

pub fn prettify_error_with_mapper<M>(err: &ValidationError, mapper: M) -> String
where
    M: Fn(&FinalIssue) -> String,
{
    prettify_issues(err.issues(), mapper)
}
