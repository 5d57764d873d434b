//! Per-request hook execution.
//!
//! One [`HookExecutor`] lives for the duration of one auction request. At
//! each pipeline checkpoint the surrounding server calls the matching
//! `execute_*_stage` method; the executor resolves the stage plan for the
//! current account, runs its groups sequentially (hooks inside a group in
//! parallel), applies mutations, and appends a [`StageOutcome`] to the
//! request's audit log. A [`RejectError`] from any stage is the signal to
//! abort the auction.
//!
//! [`EmptyHookExecutor`] is the drop-in used when hooks are disabled.

mod context;
mod error;
mod group;
mod invoker;
mod outcome;

pub use context::ModuleContextStore;
pub use error::{RejectError, TIMEOUT_ERROR};
pub use outcome::{GroupOutcome, HookAction, HookOutcome, HookStatus, StageOutcome};

use crate::config::Account;
use crate::metrics::ModuleMetrics;
use crate::openrtb::BidRequest;
use crate::payload::{EntrypointPayload, ProcessedAuctionPayload, RawAuctionPayload, StagePayload};
use crate::plan::{ExecutionPlanBuilder, Plan};
use async_trait::async_trait;
use group::execute_group;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// The stage surface the exchange drives.
///
/// Implemented by [`HookExecutor`] and [`EmptyHookExecutor`] so the server
/// can hold either depending on whether hooks are enabled for the host.
#[async_trait]
pub trait HookStageExecutor: Send {
    /// Attaches the account so later stages get account-scoped plans.
    fn set_account(&mut self, account: Account);

    /// Runs entrypoint hooks against the raw HTTP request.
    ///
    /// Header and query mutations are written back into `request`; the
    /// (possibly mutated) body is returned.
    async fn execute_entrypoint_stage(
        &mut self,
        request: &mut http::Request<()>,
        body: Vec<u8>,
    ) -> (Vec<u8>, Option<RejectError>);

    /// Runs raw-auction hooks against the unparsed body.
    async fn execute_raw_auction_stage(
        &mut self,
        body: Vec<u8>,
    ) -> (Vec<u8>, Option<RejectError>);

    /// Runs processed-auction hooks against the parsed bid request,
    /// mutating it in place.
    async fn execute_processed_auction_stage(
        &mut self,
        bid_request: &mut BidRequest,
    ) -> Option<RejectError>;

    /// The audit record of everything hooks did so far, in stage order.
    fn outcomes(&self) -> &[StageOutcome];
}

/// Plan-driven hook executor for one request.
pub struct HookExecutor {
    plan_builder: Arc<dyn ExecutionPlanBuilder>,
    endpoint: String,
    account: Option<Arc<Account>>,
    module_contexts: ModuleContextStore,
    stage_outcomes: Vec<StageOutcome>,
    metrics: Arc<dyn ModuleMetrics>,
}

impl HookExecutor {
    /// Creates an executor for one request arriving on `endpoint`.
    pub fn new(
        plan_builder: Arc<dyn ExecutionPlanBuilder>,
        endpoint: impl Into<String>,
        metrics: Arc<dyn ModuleMetrics>,
    ) -> Self {
        Self {
            plan_builder,
            endpoint: endpoint.into(),
            account: None,
            module_contexts: ModuleContextStore::new(),
            stage_outcomes: Vec::new(),
            metrics,
        }
    }

    /// Read access to the cross-stage module contexts, for the exchange's
    /// debug output.
    pub fn module_contexts(&self) -> &ModuleContextStore {
        &self.module_contexts
    }
}

impl std::fmt::Debug for HookExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookExecutor")
            .field("endpoint", &self.endpoint)
            .field("account", &self.account)
            .field("stage_outcomes", &self.stage_outcomes.len())
            .finish()
    }
}

#[async_trait]
impl HookStageExecutor for HookExecutor {
    fn set_account(&mut self, account: Account) {
        self.account = Some(Arc::new(account));
    }

    async fn execute_entrypoint_stage(
        &mut self,
        request: &mut http::Request<()>,
        body: Vec<u8>,
    ) -> (Vec<u8>, Option<RejectError>) {
        let plan = self.plan_builder.plan_for_entrypoint_stage(&self.endpoint);
        if plan.is_empty() {
            return (body, None);
        }

        let mut payload = EntrypointPayload {
            headers: request.headers().clone(),
            uri: request.uri().clone(),
            body,
        };
        let (outcome, reject) = execute_stage(
            &plan,
            &mut payload,
            &self.endpoint,
            self.account.as_ref(),
            &self.module_contexts,
            self.metrics.as_ref(),
        )
        .await;
        self.stage_outcomes.push(outcome);

        // Mutations applied before a rejection stay visible to the caller.
        *request.headers_mut() = payload.headers;
        *request.uri_mut() = payload.uri;
        (payload.body, reject)
    }

    async fn execute_raw_auction_stage(
        &mut self,
        body: Vec<u8>,
    ) -> (Vec<u8>, Option<RejectError>) {
        let plan = self
            .plan_builder
            .plan_for_raw_auction_stage(&self.endpoint, self.account.as_deref());
        if plan.is_empty() {
            return (body, None);
        }

        let mut payload = RawAuctionPayload { body };
        let (outcome, reject) = execute_stage(
            &plan,
            &mut payload,
            &self.endpoint,
            self.account.as_ref(),
            &self.module_contexts,
            self.metrics.as_ref(),
        )
        .await;
        self.stage_outcomes.push(outcome);

        (payload.body, reject)
    }

    async fn execute_processed_auction_stage(
        &mut self,
        bid_request: &mut BidRequest,
    ) -> Option<RejectError> {
        let plan = self
            .plan_builder
            .plan_for_processed_auction_stage(&self.endpoint, self.account.as_deref());
        if plan.is_empty() {
            return None;
        }

        let mut payload = ProcessedAuctionPayload {
            bid_request: bid_request.clone(),
        };
        let (outcome, reject) = execute_stage(
            &plan,
            &mut payload,
            &self.endpoint,
            self.account.as_ref(),
            &self.module_contexts,
            self.metrics.as_ref(),
        )
        .await;
        self.stage_outcomes.push(outcome);

        *bid_request = payload.bid_request;
        reject
    }

    fn outcomes(&self) -> &[StageOutcome] {
        &self.stage_outcomes
    }
}

/// Walks a stage's groups in order, short-circuiting on rejection.
#[instrument(skip_all, fields(stage = %P::STAGE, endpoint = %endpoint))]
async fn execute_stage<P: StagePayload>(
    plan: &Plan<P>,
    payload: &mut P,
    endpoint: &str,
    account: Option<&Arc<Account>>,
    contexts: &ModuleContextStore,
    metrics: &dyn ModuleMetrics,
) -> (StageOutcome, Option<RejectError>) {
    let started = Instant::now();
    let mut groups = Vec::with_capacity(plan.len());
    let mut reject = None;

    for group in plan.iter() {
        let execution = execute_group(group, payload, endpoint, account, contexts, metrics).await;
        groups.push(execution.outcome);
        if execution.reject.is_some() {
            reject = execution.reject;
            break;
        }
    }

    let outcome = StageOutcome {
        entity: P::STAGE.entity(),
        stage: P::STAGE,
        execution_time: started.elapsed(),
        groups,
    };
    (outcome, reject)
}

/// No-op executor used when hooks are disabled.
///
/// Accepts every call, changes nothing, rejects nothing, records nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyHookExecutor;

#[async_trait]
impl HookStageExecutor for EmptyHookExecutor {
    fn set_account(&mut self, _account: Account) {}

    async fn execute_entrypoint_stage(
        &mut self,
        _request: &mut http::Request<()>,
        body: Vec<u8>,
    ) -> (Vec<u8>, Option<RejectError>) {
        (body, None)
    }

    async fn execute_raw_auction_stage(
        &mut self,
        body: Vec<u8>,
    ) -> (Vec<u8>, Option<RejectError>) {
        (body, None)
    }

    async fn execute_processed_auction_stage(
        &mut self,
        _bid_request: &mut BidRequest,
    ) -> Option<RejectError> {
        None
    }

    fn outcomes(&self) -> &[StageOutcome] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NopMetrics;
    use crate::plan::EmptyPlanBuilder;

    fn request() -> http::Request<()> {
        http::Request::builder()
            .method("POST")
            .uri("https://prebid.example.com/openrtb2/auction")
            .body(())
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_plan_is_a_no_op_stage() {
        let mut executor = HookExecutor::new(
            Arc::new(EmptyPlanBuilder),
            "/openrtb2/auction",
            Arc::new(NopMetrics),
        );
        let mut request = request();
        let body = br#"{"foo": "bar"}"#.to_vec();

        let (new_body, reject) = executor
            .execute_entrypoint_stage(&mut request, body.clone())
            .await;
        assert!(reject.is_none());
        assert_eq!(new_body, body);

        let (new_body, reject) = executor.execute_raw_auction_stage(body.clone()).await;
        assert!(reject.is_none());
        assert_eq!(new_body, body);

        let mut bid_request = BidRequest::default();
        let reject = executor
            .execute_processed_auction_stage(&mut bid_request)
            .await;
        assert!(reject.is_none());
        assert_eq!(bid_request, BidRequest::default());

        assert!(executor.outcomes().is_empty());
        assert!(executor.module_contexts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_executor_changes_nothing() {
        let mut executor = EmptyHookExecutor;
        executor.set_account(Account::new("acct"));

        let mut request = request();
        let body = br#"{"foo": "bar"}"#.to_vec();

        let (new_body, reject) = executor
            .execute_entrypoint_stage(&mut request, body.clone())
            .await;
        assert!(reject.is_none());
        assert_eq!(new_body, body);
        assert!(executor.outcomes().is_empty());
        assert_eq!(executor, EmptyHookExecutor);
    }
}
