//! Concurrent execution of one hook group.
//!
//! All hooks of a group run in parallel against the same payload snapshot
//! and the same deadline. Once every invocation has completed (or timed
//! out), results are walked in **plan order** - not completion order - and
//! only then are mutations applied and contexts merged. Concurrent
//! completions therefore cannot reorder mutations: the final payload is
//! the same for every interleaving of hook finishes.

use super::context::ModuleContextStore;
use super::error::RejectError;
use super::invoker::{invoke_hook, HookInvocation};
use super::outcome::{GroupOutcome, HookAction, HookOutcome, HookStatus};
use crate::config::Account;
use crate::hook::InvocationContext;
use crate::metrics::{ModuleLabels, ModuleMetrics};
use crate::payload::{PayloadMutation, StagePayload};
use crate::plan::Group;
use crate::stage::Stage;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What one group run produced.
pub(super) struct GroupExecution {
    pub outcome: GroupOutcome,
    pub reject: Option<RejectError>,
}

/// Runs one group under a single shared deadline.
pub(super) async fn execute_group<P: StagePayload>(
    group: &Group<P>,
    payload: &mut P,
    endpoint: &str,
    account: Option<&Arc<Account>>,
    contexts: &ModuleContextStore,
    metrics: &dyn ModuleMetrics,
) -> GroupExecution {
    let started = Instant::now();
    let deadline = tokio::time::Instant::now() + group.timeout;

    // Every hook sees the payload and its module context as they were when
    // the group started; merges from sibling hooks land only afterwards.
    let invocations = group.hooks.iter().map(|entry| {
        let invocation = InvocationContext {
            endpoint: endpoint.to_string(),
            stage: P::STAGE,
            account: account.cloned(),
            module_context: contexts.snapshot(&entry.module),
            cancellation: CancellationToken::new(),
        };
        invoke_hook(entry, invocation, payload.clone(), deadline)
    });
    let results = join_all(invocations).await;

    let mut invocation_results = Vec::with_capacity(results.len());
    let mut reject = None;

    for mut invocation in results {
        if invocation.outcome.status == HookStatus::Success
            && invocation.outcome.action == Some(HookAction::Update)
        {
            apply_change_set(payload, &mut invocation);
        }

        contexts.merge(
            &invocation.outcome.hook_id.module_code,
            std::mem::take(&mut invocation.module_context),
        );
        record_hook_metrics(metrics, P::STAGE, &invocation.outcome);

        let rejected = invocation.reject.is_some();
        if let Some(r) = invocation.reject.take() {
            reject = Some(r);
        }
        invocation_results.push(invocation.outcome);

        // A rejection ends the result pass; later hooks of this group are
        // dropped from the record and their mutations never apply.
        if rejected {
            break;
        }
    }

    let execution_time = started.elapsed();
    debug!(
        stage = %P::STAGE,
        hooks = group.hooks.len(),
        recorded = invocation_results.len(),
        rejected = reject.is_some(),
        duration_ms = execution_time.as_millis() as u64,
        "Hook group complete"
    );

    GroupExecution {
        outcome: GroupOutcome {
            execution_time,
            invocation_results,
        },
        reject,
    }
}

/// Replays a hook's mutation log against the payload, commit-as-you-go.
///
/// Every applied mutation appends a debug message; any failure downgrades
/// the hook to `execution-failure` and appends a warning, without rolling
/// back or stopping the remaining mutations.
fn apply_change_set<P: StagePayload>(payload: &mut P, invocation: &mut HookInvocation<P::Mutation>) {
    for mutation in invocation.change_set.iter() {
        match payload.apply(mutation) {
            Ok(()) => invocation.outcome.debug_messages.push(format!(
                "Hook mutation successfully applied, affected key: {}, mutation type: {}",
                mutation.key(),
                mutation.kind()
            )),
            Err(err) => {
                invocation.outcome.status = HookStatus::ExecutionFailure;
                invocation
                    .outcome
                    .warnings
                    .push(format!("failed to apply hook mutation: {err}"));
                warn!(
                    module = %invocation.outcome.hook_id.module_code,
                    hook = %invocation.outcome.hook_id.hook_impl_code,
                    key = %mutation.key(),
                    error = %err,
                    "Failed to apply hook mutation"
                );
            }
        }
    }
}

fn record_hook_metrics(metrics: &dyn ModuleMetrics, stage: Stage, outcome: &HookOutcome) {
    let labels = ModuleLabels::new(outcome.hook_id.module_code.clone(), stage.as_str());
    metrics.record_module_called(&labels, outcome.execution_time);
    match (outcome.status, outcome.action) {
        (HookStatus::Success, Some(HookAction::Update)) => {
            metrics.record_module_success_updated(&labels)
        }
        (HookStatus::Success, Some(HookAction::Reject)) => {
            metrics.record_module_success_rejected(&labels)
        }
        (HookStatus::Success, _) => metrics.record_module_success_nooped(&labels),
        (HookStatus::Timeout, _) => metrics.record_module_timeout(&labels),
        (HookStatus::ExecutionFailure, _) => metrics.record_module_execution_error(&labels),
        (HookStatus::Failure, _) => metrics.record_module_failed(&labels),
    }
}
