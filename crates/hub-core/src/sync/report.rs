//! Per-resource results of a sync invocation

use serde::Serialize;

use crate::Error;
use crate::resource::{CodeType, ResourceId};

/// Why a resource was deliberately left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Not in the manifest and not eligible for automatic creation
    Untracked,
    /// Source is tracked by a vendored git checkout
    Vendored,
}

impl SkipReason {
    pub fn describe(self) -> &'static str {
        match self {
            SkipReason::Untracked => "not tracked; use install",
            SkipReason::Vendored => "externally tracked",
        }
    }
}

/// What happened to a resource that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// A new local file and manifest entry were created
    Created,
    /// The local file was rewritten from the hub
    Updated,
    /// Already in sync
    Unchanged,
    /// Local source was saved to the hub
    Pushed { version: u64 },
    /// Manifest entry was dropped
    Forgotten,
    Skipped { reason: SkipReason },
}

/// Classification of a per-resource failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Validation,
    InvalidResource,
    NotFound,
    Transport,
    /// The hub rejected the source
    Rejected,
    UncommittedChanges,
    OutOfDate,
    MissingLocal,
    MissingRemote,
    /// Local filesystem or git failure
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceAction {
    pub kind: CodeType,
    pub id: ResourceId,
    pub filename: String,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceFailure {
    pub kind: CodeType,
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub reason: FailureReason,
    pub message: String,
}

/// Aggregated outcome of a pull, push or install
///
/// Failures here are isolated to their resource; they never abort the
/// invocation that produced the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub actions: Vec<ResourceAction>,
    pub failures: Vec<ResourceFailure>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: CodeType, id: ResourceId, filename: impl Into<String>, action: Action) {
        self.actions.push(ResourceAction {
            kind,
            id,
            filename: filename.into(),
            action,
        });
    }

    pub fn fail(&mut self, kind: CodeType, id: ResourceId, filename: Option<String>, error: &Error) {
        self.failures.push(ResourceFailure {
            kind,
            id,
            filename,
            reason: error.failure_reason(),
            message: error.to_string(),
        });
    }

    /// True when no resource failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of actions matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Action) -> bool) -> usize {
        self.actions.iter().filter(|a| predicate(&a.action)).count()
    }

    /// The action recorded for a resource, if any.
    pub fn action_for(&self, kind: CodeType, id: ResourceId) -> Option<Action> {
        self.actions
            .iter()
            .find(|a| a.kind == kind && a.id == id)
            .map(|a| a.action)
    }

    /// The failure recorded for a resource, if any.
    pub fn failure_for(&self, kind: CodeType, id: ResourceId) -> Option<&ResourceFailure> {
        self.failures.iter().find(|f| f.kind == kind && f.id == id)
    }

    /// Order entries by type then id; task completion order is arbitrary.
    pub(crate) fn sort(&mut self) {
        self.actions.sort_by_key(|a| (a.kind, a.id));
        self.failures.sort_by_key(|f| (f.kind, f.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serializes_flat_actions_and_reasons() {
        let mut report = SyncReport::new();
        report.record(CodeType::Driver, 7, "acme-door.groovy", Action::Pushed { version: 3 });
        report.record(
            CodeType::App,
            2,
            "x.groovy",
            Action::Skipped {
                reason: SkipReason::Vendored,
            },
        );
        report.fail(
            CodeType::App,
            4,
            None,
            &Error::NotFound {
                kind: CodeType::App,
                id: 4,
            },
        );

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["actions"][0],
            json!({"kind": "driver", "id": 7, "filename": "acme-door.groovy", "action": "pushed", "version": 3})
        );
        assert_eq!(value["actions"][1]["reason"], json!("vendored"));
        assert_eq!(value["failures"][0]["reason"], json!("not_found"));
        assert!(value["failures"][0].get("filename").is_none());
    }

    #[test]
    fn sort_orders_by_kind_then_id() {
        let mut report = SyncReport::new();
        report.record(CodeType::Driver, 1, "d", Action::Unchanged);
        report.record(CodeType::App, 9, "b", Action::Unchanged);
        report.record(CodeType::App, 3, "a", Action::Unchanged);
        report.sort();

        let order: Vec<_> = report.actions.iter().map(|a| (a.kind, a.id)).collect();
        assert_eq!(order, vec![(CodeType::App, 3), (CodeType::App, 9), (CodeType::Driver, 1)]);
    }
}
