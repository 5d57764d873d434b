//! Execution plans: which hooks run at a stage, and in what shape.
//!
//! A plan is an ordered list of groups; hooks inside one group run
//! concurrently under a shared timeout, groups run one after another. How
//! hooks are assigned to groups for a given account is a policy question
//! answered by an [`ExecutionPlanBuilder`] implementation outside this
//! crate.

use crate::config::Account;
use crate::hook::Hook;
use crate::payload::{
    EntrypointPayload, ProcessedAuctionPayload, RawAuctionPayload, StagePayload,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Identifies a hook instance within a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct HookId {
    /// The module owning the hook.
    pub module_code: String,

    /// The hook implementation within the module.
    pub hook_impl_code: String,
}

impl HookId {
    /// Creates a hook ID from module and implementation codes.
    pub fn new(module_code: impl Into<String>, hook_impl_code: impl Into<String>) -> Self {
        Self {
            module_code: module_code.into(),
            hook_impl_code: hook_impl_code.into(),
        }
    }
}

/// A hook bound into a plan, paired with its identity.
pub struct HookEntry<P: StagePayload> {
    /// Module code, e.g. `ortb2-blocking`.
    pub module: String,

    /// Hook implementation code within the module.
    pub code: String,

    /// The callable itself.
    pub hook: Arc<dyn Hook<P>>,
}

impl<P: StagePayload> HookEntry<P> {
    /// Creates an entry binding `hook` under the given identity.
    pub fn new(
        module: impl Into<String>,
        code: impl Into<String>,
        hook: Arc<dyn Hook<P>>,
    ) -> Self {
        Self {
            module: module.into(),
            code: code.into(),
            hook,
        }
    }

    /// Returns the identity of this binding.
    pub fn hook_id(&self) -> HookId {
        HookId::new(self.module.clone(), self.code.clone())
    }
}

impl<P: StagePayload> Clone for HookEntry<P> {
    fn clone(&self) -> Self {
        Self {
            module: self.module.clone(),
            code: self.code.clone(),
            hook: Arc::clone(&self.hook),
        }
    }
}

impl<P: StagePayload> std::fmt::Debug for HookEntry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookEntry")
            .field("module", &self.module)
            .field("code", &self.code)
            .field("hook", &"<dyn Hook>")
            .finish()
    }
}

/// A set of hooks executed concurrently under one shared deadline.
#[derive(Debug, Clone)]
pub struct Group<P: StagePayload> {
    /// Deadline for the whole group.
    pub timeout: Duration,

    /// Hooks in declared order; this order fixes mutation application.
    pub hooks: Vec<HookEntry<P>>,
}

impl<P: StagePayload> Group<P> {
    /// Creates a group with the given timeout and hooks.
    pub fn new(timeout: Duration, hooks: Vec<HookEntry<P>>) -> Self {
        Self { timeout, hooks }
    }
}

/// The ordered groups for one stage. An empty plan is valid and makes the
/// stage a no-op.
#[derive(Debug, Clone)]
pub struct Plan<P: StagePayload> {
    groups: Vec<Group<P>>,
}

impl<P: StagePayload> Plan<P> {
    /// Creates a plan from groups in execution order.
    pub fn new(groups: Vec<Group<P>>) -> Self {
        Self { groups }
    }

    /// Returns true if the plan schedules no hooks.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Iterates groups in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Group<P>> {
        self.groups.iter()
    }
}

impl<P: StagePayload> Default for Plan<P> {
    fn default() -> Self {
        Self { groups: Vec::new() }
    }
}

impl<P: StagePayload> From<Vec<Group<P>>> for Plan<P> {
    fn from(groups: Vec<Group<P>>) -> Self {
        Self::new(groups)
    }
}

/// Supplies the hook plan for each stage of a request.
///
/// Implementations hold the account/host configuration policy; every
/// method has an empty-plan default so builders only override the stages
/// they schedule hooks for.
pub trait ExecutionPlanBuilder: Send + Sync {
    /// Plan for the entrypoint stage. Runs before account resolution, so
    /// it is selected by endpoint only.
    fn plan_for_entrypoint_stage(&self, endpoint: &str) -> Plan<EntrypointPayload> {
        let _ = endpoint;
        Plan::default()
    }

    /// Plan for the raw auction stage.
    fn plan_for_raw_auction_stage(
        &self,
        endpoint: &str,
        account: Option<&Account>,
    ) -> Plan<RawAuctionPayload> {
        let _ = (endpoint, account);
        Plan::default()
    }

    /// Plan for the processed auction stage.
    fn plan_for_processed_auction_stage(
        &self,
        endpoint: &str,
        account: Option<&Account>,
    ) -> Plan<ProcessedAuctionPayload> {
        let _ = (endpoint, account);
        Plan::default()
    }
}

/// Plan builder that schedules nothing, for hosts with no hooks configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPlanBuilder;

impl ExecutionPlanBuilder for EmptyPlanBuilder {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_id_new() {
        let id = HookId::new("foobar", "foo");
        assert_eq!(id.module_code, "foobar");
        assert_eq!(id.hook_impl_code, "foo");
    }

    #[test]
    fn test_empty_plan_builder_returns_empty_plans() {
        let builder = EmptyPlanBuilder;
        assert!(builder.plan_for_entrypoint_stage("/openrtb2/auction").is_empty());
        assert!(builder
            .plan_for_raw_auction_stage("/openrtb2/auction", None)
            .is_empty());
        assert!(builder
            .plan_for_processed_auction_stage("/openrtb2/auction", None)
            .is_empty());
    }

    #[test]
    fn test_plan_iterates_in_order() {
        let plan: Plan<EntrypointPayload> = Plan::new(vec![
            Group::new(Duration::from_millis(5), Vec::new()),
            Group::new(Duration::from_millis(10), Vec::new()),
        ]);
        let timeouts: Vec<Duration> = plan.iter().map(|g| g.timeout).collect();
        assert_eq!(
            timeouts,
            vec![Duration::from_millis(5), Duration::from_millis(10)]
        );
    }
}
