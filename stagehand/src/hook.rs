//! The hook contract: what a module implements and what it returns.
//!
//! A hook never mutates the payload it is shown. It receives a read-only
//! snapshot plus its module's context bucket, and returns a
//! [`HookResponse`] describing what it wants: payload mutations, a
//! rejection of the whole auction, analytics tags, and context updates for
//! later stages. The engine applies the response after the hook returns.

use crate::analytics::Analytics;
use crate::config::Account;
use crate::payload::StagePayload;
use crate::stage::Stage;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Per-module cross-stage state: plain key/value pairs.
pub type ModuleContext = HashMap<String, Value>;

/// The read-only view handed to a hook invocation.
///
/// `module_context` is a snapshot of the module's bucket taken when the
/// hook's group started; updates merged by other hooks of the same group
/// are not visible until the next group.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Endpoint the request arrived on, e.g. `/openrtb2/auction`.
    pub endpoint: String,

    /// The stage being executed.
    pub stage: Stage,

    /// The account the request is attributed to, once known.
    pub account: Option<Arc<Account>>,

    /// Snapshot of this module's cross-stage context.
    pub module_context: ModuleContext,

    /// Advisory deadline signal: cancelled when the group deadline fires.
    ///
    /// The engine never aborts a running hook; a hook that outlives its
    /// deadline keeps running detached and its result is discarded.
    pub cancellation: CancellationToken,
}

/// The ordered log of mutations a hook asks for.
///
/// The log itself never touches the payload. The group runner replays it
/// against the stage carrier in plan order once the hook has returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<M> {
    mutations: Vec<M>,
}

impl<M> ChangeSet<M> {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self {
            mutations: Vec::new(),
        }
    }

    /// Appends a mutation to the log.
    pub fn push(&mut self, mutation: M) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    /// Returns true if the hook requested no mutations.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Number of mutations in the log.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Iterates mutations in the order the hook requested them.
    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.mutations.iter()
    }
}

impl<M> Default for ChangeSet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> From<Vec<M>> for ChangeSet<M> {
    fn from(mutations: Vec<M>) -> Self {
        Self { mutations }
    }
}

/// What a hook returns on a successful call.
#[derive(Debug)]
pub struct HookResponse<M> {
    /// `Some(code)` terminates the auction with the given no-bid code.
    pub reject: Option<i32>,

    /// Optional human-readable note, carried into the outcome.
    pub message: String,

    /// Mutations to apply to the stage payload.
    pub change_set: ChangeSet<M>,

    /// Keys to merge into this module's cross-stage context.
    pub module_context: ModuleContext,

    /// Analytics tags for the outcome record.
    pub analytics: Analytics,

    /// Non-fatal notes surfaced in the outcome.
    pub warnings: Vec<String>,
}

impl<M> HookResponse<M> {
    /// A response that requests nothing.
    pub fn noop() -> Self {
        Self::default()
    }

    /// A response carrying only mutations.
    pub fn updates(change_set: ChangeSet<M>) -> Self {
        Self {
            change_set,
            ..Self::default()
        }
    }

    /// A response rejecting the auction with `code`.
    pub fn rejected(code: i32) -> Self {
        Self {
            reject: Some(code),
            ..Self::default()
        }
    }
}

impl<M> Default for HookResponse<M> {
    fn default() -> Self {
        Self {
            reject: None,
            message: String::new(),
            change_set: ChangeSet::new(),
            module_context: ModuleContext::new(),
            analytics: Analytics::default(),
            warnings: Vec::new(),
        }
    }
}

/// How a hook call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// The hook reports that it could not do its job. Recorded with
    /// status `failure`; the rest of the group continues.
    #[error("{0}")]
    Failure(String),

    /// Anything unexpected. Recorded with status `execution-failure`.
    #[error("{0}")]
    Unexpected(String),
}

/// A unit of module logic bound to one stage.
///
/// The stage is fixed by the payload type parameter, so a hook can only be
/// planned into groups of the stage it was written for.
#[async_trait]
pub trait Hook<P: StagePayload>: Send + Sync {
    /// Runs the hook against a payload snapshot.
    ///
    /// Implementations should watch `invocation.cancellation` during long
    /// operations; once it fires, the engine has already given up on this
    /// invocation.
    async fn call(
        &self,
        invocation: InvocationContext,
        payload: P,
    ) -> Result<HookResponse<P::Mutation>, HookError>;
}
