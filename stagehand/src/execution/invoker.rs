//! Single-hook invocation under a group deadline.
//!
//! The invoker spawns the hook future on its own task and races it against
//! the shared group deadline. Spawning buys two guarantees: a panicking
//! hook surfaces as a `JoinError` instead of unwinding the group, and a
//! hook that overruns its deadline is simply abandoned - the task keeps
//! running detached, its late result is never read.

use super::error::{RejectError, TIMEOUT_ERROR};
use super::outcome::{HookAction, HookOutcome, HookStatus};
use crate::analytics::Analytics;
use crate::hook::{ChangeSet, HookError, HookResponse, InvocationContext, ModuleContext};
use crate::payload::StagePayload;
use crate::plan::{HookEntry, HookId};
use crate::stage::Stage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::warn;

/// Everything the group runner needs from one finished invocation: the
/// outcome under construction, plus the side effects still to be applied.
pub(super) struct HookInvocation<M> {
    pub outcome: HookOutcome,
    pub change_set: ChangeSet<M>,
    pub module_context: ModuleContext,
    pub reject: Option<RejectError>,
}

/// Runs one hook to completion or to the group deadline, whichever comes
/// first. Never fails: every way a hook can misbehave maps to a status.
pub(super) async fn invoke_hook<P: StagePayload>(
    entry: &HookEntry<P>,
    invocation: InvocationContext,
    payload: P,
    deadline: tokio::time::Instant,
) -> HookInvocation<P::Mutation> {
    let hook_id = entry.hook_id();
    let stage = invocation.stage;
    let cancellation = invocation.cancellation.clone();
    let hook = Arc::clone(&entry.hook);

    let start = Instant::now();
    let mut task = tokio::spawn(async move { hook.call(invocation, payload).await });

    tokio::select! {
        biased;

        joined = &mut task => {
            let execution_time = start.elapsed();
            match joined {
                Ok(Ok(response)) => completed(hook_id, stage, response, execution_time),
                Ok(Err(err)) => failed(hook_id, err, execution_time),
                Err(join_err) => panicked(hook_id, stage, join_err, execution_time),
            }
        }

        _ = tokio::time::sleep_until(deadline) => {
            cancellation.cancel();
            timed_out(hook_id, start.elapsed())
        }
    }
}

fn completed<M>(
    hook_id: HookId,
    stage: Stage,
    response: HookResponse<M>,
    execution_time: Duration,
) -> HookInvocation<M> {
    let HookResponse {
        reject,
        message,
        change_set,
        module_context,
        analytics,
        warnings,
    } = response;

    if let Some(code) = reject {
        let reject = RejectError {
            nbr_code: code,
            hook_id: hook_id.clone(),
            stage,
        };
        return HookInvocation {
            outcome: HookOutcome {
                hook_id,
                status: HookStatus::Success,
                action: Some(HookAction::Reject),
                message,
                debug_messages: Vec::new(),
                errors: vec![reject.to_string()],
                warnings,
                analytics_tags: analytics,
                execution_time,
            },
            // A rejecting hook's mutations are never applied.
            change_set: ChangeSet::new(),
            module_context,
            reject: Some(reject),
        };
    }

    let action = if change_set.is_empty() {
        HookAction::None
    } else {
        HookAction::Update
    };
    HookInvocation {
        outcome: HookOutcome {
            hook_id,
            status: HookStatus::Success,
            action: Some(action),
            message,
            debug_messages: Vec::new(),
            errors: Vec::new(),
            warnings,
            analytics_tags: analytics,
            execution_time,
        },
        change_set,
        module_context,
        reject: None,
    }
}

fn failed<M>(hook_id: HookId, err: HookError, execution_time: Duration) -> HookInvocation<M> {
    let status = match err {
        HookError::Failure(_) => HookStatus::Failure,
        HookError::Unexpected(_) => HookStatus::ExecutionFailure,
    };
    HookInvocation {
        outcome: HookOutcome {
            hook_id,
            status,
            action: None,
            message: String::new(),
            debug_messages: Vec::new(),
            errors: vec![err.to_string()],
            warnings: Vec::new(),
            analytics_tags: Analytics::default(),
            execution_time,
        },
        change_set: ChangeSet::new(),
        module_context: ModuleContext::new(),
        reject: None,
    }
}

fn panicked<M>(
    hook_id: HookId,
    stage: Stage,
    join_err: JoinError,
    execution_time: Duration,
) -> HookInvocation<M> {
    let message = panic_message(join_err);
    warn!(
        module = %hook_id.module_code,
        hook = %hook_id.hook_impl_code,
        stage = %stage,
        error = %message,
        "Hook panicked"
    );
    HookInvocation {
        outcome: HookOutcome {
            hook_id,
            status: HookStatus::ExecutionFailure,
            action: None,
            message: String::new(),
            debug_messages: Vec::new(),
            errors: vec![message],
            warnings: Vec::new(),
            analytics_tags: Analytics::default(),
            execution_time,
        },
        change_set: ChangeSet::new(),
        module_context: ModuleContext::new(),
        reject: None,
    }
}

fn timed_out<M>(hook_id: HookId, execution_time: Duration) -> HookInvocation<M> {
    HookInvocation {
        outcome: HookOutcome {
            hook_id,
            status: HookStatus::Timeout,
            action: None,
            message: String::new(),
            debug_messages: Vec::new(),
            errors: vec![TIMEOUT_ERROR.to_string()],
            warnings: Vec::new(),
            analytics_tags: Analytics::default(),
            execution_time,
        },
        change_set: ChangeSet::new(),
        module_context: ModuleContext::new(),
        reject: None,
    }
}

fn panic_message(join_err: JoinError) -> String {
    if !join_err.is_panic() {
        return "hook task cancelled".to_string();
    }
    let panic = join_err.into_panic();
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "hook panicked".to_string()
    }
}
