//! Module execution metrics.
//!
//! The engine records one `called` observation per hook invocation plus
//! exactly one status counter chosen from the `(status, action)` pair. The
//! sink is injected: the server wires a real backend, tests wire a
//! recorder, and [`NopMetrics`] switches metrics off entirely.

mod client;

pub use client::{metrics_channel, MetricEvent, MetricsClient};

use std::time::Duration;

/// Dimensions a module observation is recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLabels {
    /// Module code.
    pub module: String,

    /// Stage tag, e.g. `entrypoint`.
    pub stage: String,
}

impl ModuleLabels {
    /// Creates labels for a module at a stage.
    pub fn new(module: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            stage: stage.into(),
        }
    }
}

/// Sink for per-hook execution metrics.
///
/// One `record_module_called` per invocation; exactly one of the other
/// methods follows, depending on how the invocation ended.
pub trait ModuleMetrics: Send + Sync {
    /// A hook invocation finished (any status).
    fn record_module_called(&self, labels: &ModuleLabels, duration: Duration);

    /// Successful hook whose mutations were applied.
    fn record_module_success_updated(&self, labels: &ModuleLabels);

    /// Successful hook that rejected the auction.
    fn record_module_success_rejected(&self, labels: &ModuleLabels);

    /// Successful hook that requested nothing.
    fn record_module_success_nooped(&self, labels: &ModuleLabels);

    /// Hook cut off by the group deadline.
    fn record_module_timeout(&self, labels: &ModuleLabels);

    /// Hook that panicked, errored unexpectedly, or failed a mutation.
    fn record_module_execution_error(&self, labels: &ModuleLabels);

    /// Hook that reported a hard failure.
    fn record_module_failed(&self, labels: &ModuleLabels);
}

/// Sink that drops everything, for hosts running without metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopMetrics;

impl ModuleMetrics for NopMetrics {
    fn record_module_called(&self, _labels: &ModuleLabels, _duration: Duration) {}
    fn record_module_success_updated(&self, _labels: &ModuleLabels) {}
    fn record_module_success_rejected(&self, _labels: &ModuleLabels) {}
    fn record_module_success_nooped(&self, _labels: &ModuleLabels) {}
    fn record_module_timeout(&self, _labels: &ModuleLabels) {}
    fn record_module_execution_error(&self, _labels: &ModuleLabels) {}
    fn record_module_failed(&self, _labels: &ModuleLabels) {}
}
