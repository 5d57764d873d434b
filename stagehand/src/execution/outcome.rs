//! Immutable audit records of what hooks did.
//!
//! The outcome tree (stage -> groups -> invocations) is the only public
//! record of hook execution; it drives the exchange's debug output and the
//! module metrics. Outcomes are plain data: hooks never see them and the
//! executor only appends.

use crate::analytics::Analytics;
use crate::plan::HookId;
use crate::stage::{Entity, Stage};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Terminal status of one hook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookStatus {
    /// The hook ran and its requested action was honored.
    Success,

    /// The hook misbehaved: it panicked, returned an unexpected error, or
    /// requested a mutation that could not be applied.
    ExecutionFailure,

    /// The hook reported that it could not do its job.
    Failure,

    /// The group deadline fired before the hook finished.
    Timeout,
}

impl HookStatus {
    /// Returns the status tag as it appears in serialized outcomes.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookStatus::Success => "success",
            HookStatus::ExecutionFailure => "execution-failure",
            HookStatus::Failure => "failure",
            HookStatus::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for HookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful hook asked the engine to do.
///
/// Invocations that did not succeed carry no action; in serialized
/// outcomes that renders as an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookAction {
    /// The hook requested nothing.
    None,

    /// The hook requested payload mutations.
    Update,

    /// The hook rejected the auction.
    Reject,
}

impl HookAction {
    /// Returns the action tag as it appears in serialized outcomes.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookAction::None => "none",
            HookAction::Update => "update",
            HookAction::Reject => "reject",
        }
    }
}

impl std::fmt::Display for HookAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn serialize_action<S: Serializer>(
    action: &Option<HookAction>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(action.map(|a| a.as_str()).unwrap_or(""))
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// The audit record of one hook invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookOutcome {
    /// Which hook ran.
    pub hook_id: HookId,

    /// Terminal status.
    pub status: HookStatus,

    /// Requested action, absent for failed or timed-out invocations.
    #[serde(serialize_with = "serialize_action")]
    pub action: Option<HookAction>,

    /// Hook-provided note.
    pub message: String,

    /// One entry per successfully applied mutation.
    pub debug_messages: Vec<String>,

    /// Fatal problems, surfaced to debug output.
    pub errors: Vec<String>,

    /// Non-fatal problems, e.g. mutation misses.
    pub warnings: Vec<String>,

    /// Analytics tags the hook attached.
    pub analytics_tags: Analytics,

    /// Wall-clock duration of the invocation.
    #[serde(rename = "execution_time_millis", serialize_with = "serialize_millis")]
    pub execution_time: Duration,
}

/// The audit record of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupOutcome {
    /// Wall-clock duration of the group, bounded by its timeout plus
    /// scheduling slack.
    #[serde(rename = "execution_time_millis", serialize_with = "serialize_millis")]
    pub execution_time: Duration,

    /// Hook outcomes in plan order.
    pub invocation_results: Vec<HookOutcome>,
}

/// The audit record of one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutcome {
    /// What was being processed.
    pub entity: Entity,

    /// Which stage ran.
    pub stage: Stage,

    /// Wall-clock duration of the stage.
    #[serde(rename = "execution_time_millis", serialize_with = "serialize_millis")]
    pub execution_time: Duration,

    /// Group outcomes in execution order; groups cut off by a rejection
    /// are absent.
    pub groups: Vec<GroupOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tags() {
        assert_eq!(HookStatus::Success.as_str(), "success");
        assert_eq!(HookStatus::ExecutionFailure.as_str(), "execution-failure");
        assert_eq!(HookStatus::Failure.as_str(), "failure");
        assert_eq!(HookStatus::Timeout.as_str(), "timeout");
    }

    #[test]
    fn test_status_serializes_to_tag() {
        let json = serde_json::to_string(&HookStatus::ExecutionFailure).unwrap();
        assert_eq!(json, "\"execution-failure\"");
    }

    #[test]
    fn test_action_tags() {
        assert_eq!(HookAction::None.as_str(), "none");
        assert_eq!(HookAction::Update.as_str(), "update");
        assert_eq!(HookAction::Reject.as_str(), "reject");
    }

    #[test]
    fn test_missing_action_serializes_to_empty_string() {
        let outcome = HookOutcome {
            hook_id: HookId::new("foobar", "foo"),
            status: HookStatus::Timeout,
            action: None,
            message: String::new(),
            debug_messages: Vec::new(),
            errors: vec!["Hook execution timeout".to_string()],
            warnings: Vec::new(),
            analytics_tags: Analytics::default(),
            execution_time: Duration::from_millis(3),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "");
        assert_eq!(json["status"], "timeout");
        assert_eq!(json["execution_time_millis"], 3);
    }
}
