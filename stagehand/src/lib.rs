//! Stagehand - staged hook execution for an RTB auction server
//!
//! This library is the extension-point core of the auction server. User
//! supplied modules register hooks that run at fixed checkpoints (stages)
//! of the auction pipeline. At each stage the engine resolves an execution
//! plan for the current account, runs the plan's hook groups, applies the
//! mutations hooks request, and records an immutable audit trail.
//!
//! # High-Level API
//!
//! The [`execution`] module provides the per-request executor:
//!
//! ```ignore
//! use std::sync::Arc;
//! use stagehand::execution::{HookExecutor, HookStageExecutor};
//! use stagehand::metrics::NopMetrics;
//! use stagehand::stage::ENDPOINT_AUCTION;
//!
//! let mut executor = HookExecutor::new(plan_builder, ENDPOINT_AUCTION, Arc::new(NopMetrics));
//! executor.set_account(account);
//!
//! let (body, reject) = executor.execute_entrypoint_stage(&mut request, body).await;
//! if let Some(reject) = reject {
//!     // terminate the auction
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod execution;
pub mod hook;
pub mod metrics;
pub mod openrtb;
pub mod payload;
pub mod plan;
pub mod stage;

/// Version of the stagehand library.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
