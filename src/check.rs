//! Sequential check execution.
//!
//! A schema runs its checks over a [`ParsePayload`]. Checks may append
//! issues, overwrite the value, be gated by a `when` predicate, or abort the
//! remaining checks.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::issue::{IssueSource, MessageFn, MessageSource, RawIssue};
use crate::types::Path;

/// Body of a check. May mutate `value` and append to `issues`.
pub type CheckFn = Arc<dyn Fn(&mut ParsePayload) + Send + Sync>;

/// Gate deciding whether a check runs for the current payload.
pub type WhenFn = Arc<dyn Fn(&ParsePayload) -> bool + Send + Sync>;

/// State threaded through a parse: the current value, where it sits in the
/// input, and the issues found so far.
#[derive(Debug, Clone, Default)]
pub struct ParsePayload {
    pub value: Value,
    pub path: Path,
    pub issues: Vec<RawIssue>,
}

impl ParsePayload {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            path: Path::new(),
            issues: Vec::new(),
        }
    }

    pub fn at(value: Value, path: Path) -> Self {
        Self {
            value,
            path,
            issues: Vec::new(),
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn push_issue(&mut self, issue: RawIssue) {
        self.issues.push(issue);
    }
}

/// Static definition of a check.
#[derive(Clone, Default)]
pub struct CheckDef {
    /// Stop running further checks once this one has run.
    pub abort: bool,
    /// Replaces the message of every issue this check produces.
    pub error: Option<MessageFn>,
}

impl MessageSource for CheckDef {
    fn error_for(&self, issue: &RawIssue) -> Option<String> {
        self.error.as_ref().and_then(|error| error(issue))
    }
}

impl fmt::Debug for CheckDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDef")
            .field("abort", &self.abort)
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Runtime parts of a check.
#[derive(Clone, Default)]
pub struct CheckInternals {
    pub check: Option<CheckFn>,
    pub when: Option<WhenFn>,
    pub def: CheckDef,
}

impl CheckInternals {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&mut ParsePayload) + Send + Sync + 'static,
    {
        Self {
            check: Some(Arc::new(check)),
            when: None,
            def: CheckDef::default(),
        }
    }

    pub fn when<F>(mut self, when: F) -> Self
    where
        F: Fn(&ParsePayload) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(when));
        self
    }

    pub fn abort(mut self, abort: bool) -> Self {
        self.def.abort = abort;
        self
    }

    pub fn error<F>(mut self, error: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.def.error = Some(Arc::new(error));
        self
    }
}

impl fmt::Debug for CheckInternals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckInternals")
            .field("check", &self.check.is_some())
            .field("when", &self.when.is_some())
            .field("def", &self.def)
            .finish()
    }
}

/// Anything the engine can run. Returning `None` marks a check with no
/// internals, which the engine skips.
pub trait Check: Send + Sync {
    fn internals(&self) -> Option<&CheckInternals>;
}

impl Check for CheckInternals {
    fn internals(&self) -> Option<&CheckInternals> {
        Some(self)
    }
}

/// Run `checks` in order over `payload`.
///
/// Issues produced by a check get the payload path prepended. Once any issue
/// in the payload is fatal (`continue_ == false`), checks with a `when` gate
/// are skipped; ungated checks still run. A check whose definition sets
/// `abort` ends the loop.
pub fn run_checks(mut payload: ParsePayload, checks: &[Arc<dyn Check>]) -> ParsePayload {
    if checks.is_empty() {
        return payload;
    }

    payload.issues.reserve(checks.len());
    let mut value = std::mem::take(&mut payload.value);
    let path = payload.path.clone();
    let mut fatal = payload.issues.iter().any(|issue| !issue.continue_);

    for (position, check) in checks.iter().enumerate() {
        let Some(internals) = check.internals() else {
            trace!(position, "skipping check without internals");
            continue;
        };
        let Some(body) = internals.check.as_ref() else {
            trace!(position, "skipping check without body");
            continue;
        };

        let mut sub = ParsePayload::at(value, path.clone());

        if let Some(when) = &internals.when {
            if fatal {
                trace!(position, "skipping conditional check after fatal issue");
                value = sub.value;
                continue;
            }
            if !when(&sub) {
                trace!(position, "conditional check not applicable");
                value = sub.value;
                continue;
            }
        }

        body(&mut sub);
        value = sub.value;

        if !sub.issues.is_empty() {
            for issue in &mut sub.issues {
                issue.prefix_path(&path);
                if let Some(error) = &internals.def.error {
                    if let Some(message) = error(&*issue).filter(|m| !m.is_empty()) {
                        issue.message = message;
                    }
                    issue.inst = Some(IssueSource::new(internals.def.clone()));
                }
            }
            fatal |= sub.issues.iter().any(|issue| !issue.continue_);
            trace!(position, count = sub.issues.len(), "check produced issues");
            payload.issues.append(&mut sub.issues);
        }

        if internals.def.abort {
            debug!(position, "check aborted remaining checks");
            break;
        }
    }

    payload.value = value;
    payload
}

/// Replace the payload value with `value`, then run `checks`.
pub fn run_checks_on_value(
    value: Value,
    checks: &[Arc<dyn Check>],
    mut payload: ParsePayload,
) -> ParsePayload {
    payload.value = value;
    run_checks(payload, checks)
}

/// True if any issue from `start_index` onwards is fatal.
pub fn check_aborted(payload: &ParsePayload, start_index: usize) -> bool {
    payload
        .issues
        .get(start_index..)
        .map(|issues| issues.iter().any(|issue| !issue.continue_))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::{custom, too_small};
    use crate::types::{IssueCode, PathSegment};
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Hollow;

    impl Check for Hollow {
        fn internals(&self) -> Option<&CheckInternals> {
            None
        }
    }

    fn failing(message: &'static str) -> CheckInternals {
        CheckInternals::new(move |p: &mut ParsePayload| {
            let input = p.value.clone();
            p.push_issue(custom(message, Map::new(), input));
        })
    }

    fn soft_failing(message: &'static str) -> CheckInternals {
        CheckInternals::new(move |p: &mut ParsePayload| {
            let input = p.value.clone();
            p.push_issue(custom(message, Map::new(), input).with_continue(true));
        })
    }

    fn messages(payload: &ParsePayload) -> Vec<&str> {
        payload.issues.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn empty_checks_return_payload_unchanged() {
        let payload = run_checks(ParsePayload::new(json!(1)), &[]);
        assert_eq!(payload.value, json!(1));
        assert!(payload.issues.is_empty());
    }

    #[test]
    fn hollow_checks_are_skipped() {
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(Hollow),
            Arc::new(CheckInternals::default()),
            Arc::new(failing("ran")),
        ];
        let payload = run_checks(ParsePayload::new(json!("x")), &checks);
        assert_eq!(messages(&payload), vec!["ran"]);
    }

    #[test]
    fn issues_accumulate_in_order() {
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(failing("first")),
            Arc::new(failing("second")),
        ];
        let payload = run_checks(ParsePayload::new(json!(0)), &checks);
        assert_eq!(messages(&payload), vec!["first", "second"]);
    }

    #[test]
    fn overwrite_threads_value() {
        let seen = Arc::new(std::sync::Mutex::new(Value::Null));
        let seen_in_check = Arc::clone(&seen);
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(CheckInternals::new(|p: &mut ParsePayload| {
                if let Some(s) = p.value.as_str() {
                    p.value = json!(s.trim());
                }
            })),
            Arc::new(CheckInternals::new(move |p: &mut ParsePayload| {
                *seen_in_check.lock().unwrap() = p.value.clone();
            })),
        ];
        let payload = run_checks(ParsePayload::new(json!("  hi  ")), &checks);
        assert_eq!(payload.value, json!("hi"));
        assert_eq!(*seen.lock().unwrap(), json!("hi"));
    }

    #[test]
    fn abort_stops_remaining_checks() {
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(failing("first").abort(true)),
            Arc::new(failing("second")),
        ];
        let payload = run_checks(ParsePayload::new(json!(0)), &checks);
        assert_eq!(messages(&payload), vec!["first"]);
    }

    #[test]
    fn when_skipped_after_fatal_issue() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(failing("fatal")),
            Arc::new(
                CheckInternals::new(move |_: &mut ParsePayload| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .when(|_| true),
            ),
            Arc::new(failing("ungated still runs")),
        ];
        let payload = run_checks(ParsePayload::new(json!(0)), &checks);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(messages(&payload), vec!["fatal", "ungated still runs"]);
    }

    #[test]
    fn when_runs_after_continuable_issue() {
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(soft_failing("soft")),
            Arc::new(failing("gated").when(|p| p.value == json!(5))),
        ];
        let payload = run_checks(ParsePayload::new(json!(5)), &checks);
        assert_eq!(messages(&payload), vec!["soft", "gated"]);
    }

    #[test]
    fn when_false_skips_check() {
        let checks: Vec<Arc<dyn Check>> = vec![Arc::new(failing("gated").when(|_| false))];
        let payload = run_checks(ParsePayload::new(json!(5)), &checks);
        assert!(payload.issues.is_empty());
        assert_eq!(payload.value, json!(5));
    }

    #[test]
    fn prior_fatal_issue_blocks_when() {
        let mut payload = ParsePayload::new(json!(1));
        payload.push_issue(RawIssue::new(IssueCode::InvalidType));
        let checks: Vec<Arc<dyn Check>> = vec![Arc::new(failing("gated").when(|_| true))];
        let payload = run_checks(payload, &checks);
        assert_eq!(payload.issues.len(), 1);
    }

    #[test]
    fn def_error_overrides_message_and_sets_inst() {
        let check = CheckInternals::new(|p: &mut ParsePayload| {
            let input = p.value.clone();
            p.push_issue(too_small(3, true, "string", input));
        })
        .error(|issue| Some(format!("MY: {}", issue.code)));
        let checks: Vec<Arc<dyn Check>> = vec![Arc::new(check)];

        let payload = run_checks(ParsePayload::new(json!("ab")), &checks);
        assert_eq!(messages(&payload), vec!["MY: too_small"]);
        let inst = payload.issues[0].inst.as_ref().unwrap();
        assert_eq!(
            inst.error_for(&payload.issues[0]),
            Some("MY: too_small".to_string())
        );
    }

    #[test]
    fn payload_path_is_prepended() {
        let checks: Vec<Arc<dyn Check>> = vec![Arc::new(failing("nested"))];
        let payload = ParsePayload::at(json!(1), vec!["user".into(), PathSegment::Index(2)]);
        let payload = run_checks(payload, &checks);
        assert_eq!(
            payload.issues[0].path,
            vec![PathSegment::from("user"), PathSegment::Index(2)]
        );
    }

    #[test]
    fn run_checks_on_value_replaces_value() {
        let checks: Vec<Arc<dyn Check>> =
            vec![Arc::new(failing("seen").when(|p| p.value == json!("new")))];
        let payload = run_checks_on_value(json!("new"), &checks, ParsePayload::new(json!("old")));
        assert_eq!(payload.value, json!("new"));
        assert_eq!(messages(&payload), vec!["seen"]);
    }

    #[test]
    fn check_aborted_looks_from_start_index() {
        let mut payload = ParsePayload::new(Value::Null);
        payload.push_issue(RawIssue::new(IssueCode::Custom));
        payload.push_issue(RawIssue::new(IssueCode::Custom).with_continue(true));

        assert!(check_aborted(&payload, 0));
        assert!(!check_aborted(&payload, 1));
        assert!(!check_aborted(&payload, 5));
    }
}
