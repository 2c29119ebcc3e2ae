//! The error value handed back when a parse fails.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::finalize::{finalize_issues, Config, ParseContext};
use crate::formatter::{DefaultFormatter, MessageFormatter};
use crate::issue::{FinalIssue, RawIssue};
use crate::projection::{
    flatten_error, format_error, prettify_error, treeify_error, FlattenedError, FormattedError,
    TreeNode,
};

/// Finalized issues of a failed parse, plus the formatter projections fall
/// back to for empty messages.
#[derive(Clone)]
pub struct ValidationError {
    issues: Vec<FinalIssue>,
    formatter: Arc<dyn MessageFormatter>,
}

impl ValidationError {
    pub fn new(issues: Vec<FinalIssue>) -> Self {
        Self::with_formatter(issues, Arc::new(DefaultFormatter))
    }

    pub fn with_formatter(issues: Vec<FinalIssue>, formatter: Arc<dyn MessageFormatter>) -> Self {
        Self { issues, formatter }
    }

    /// Finalize `raws` and wrap the result.
    pub fn from_raw(raws: &[RawIssue], ctx: Option<&ParseContext>, config: Option<&Config>) -> Self {
        Self::new(finalize_issues(raws, ctx, config))
    }

    pub fn issues(&self) -> &[FinalIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<FinalIssue> {
        self.issues
    }

    pub fn formatter(&self) -> &dyn MessageFormatter {
        self.formatter.as_ref()
    }

    pub fn format(&self) -> FormattedError {
        format_error(self)
    }

    pub fn treeify(&self) -> TreeNode {
        treeify_error(self)
    }

    pub fn flatten(&self) -> FlattenedError {
        flatten_error(self)
    }

    pub fn prettify(&self) -> String {
        prettify_error(self)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("validation failed");
        }
        f.write_str(&self.prettify())
    }
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationError")
            .field("issues", &self.issues)
            .finish_non_exhaustive()
    }
}

impl Error for ValidationError {}

/// Find a [`ValidationError`] in `err` or anywhere down its source chain.
pub fn as_validation_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a ValidationError> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(validation) = err.downcast_ref::<ValidationError>() {
            return Some(validation);
        }
        current = err.source();
    }
    None
}

pub fn is_validation_error(err: &(dyn Error + 'static)) -> bool {
    as_validation_error(err).is_some()
}
