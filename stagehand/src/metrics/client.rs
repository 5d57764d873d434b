//! Channel-backed metrics emission.
//!
//! [`MetricsClient`] is the fire-and-forget implementation of
//! [`ModuleMetrics`]: it forwards each observation as a [`MetricEvent`] on
//! an unbounded channel and never blocks the request path. The receiving
//! side (an aggregation daemon, a test collector) lives with the server.

use super::{ModuleLabels, ModuleMetrics};
use std::time::Duration;
use tokio::sync::mpsc;

/// One module metrics observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricEvent {
    /// A hook invocation finished.
    ModuleCalled {
        labels: ModuleLabels,
        duration: Duration,
    },
    /// Successful hook whose mutations were applied.
    ModuleSuccessUpdated { labels: ModuleLabels },
    /// Successful hook that rejected the auction.
    ModuleSuccessRejected { labels: ModuleLabels },
    /// Successful hook that requested nothing.
    ModuleSuccessNooped { labels: ModuleLabels },
    /// Hook cut off by the group deadline.
    ModuleTimeout { labels: ModuleLabels },
    /// Hook that panicked, errored unexpectedly, or failed a mutation.
    ModuleExecutionError { labels: ModuleLabels },
    /// Hook that reported a hard failure.
    ModuleFailed { labels: ModuleLabels },
}

/// Creates a connected client/receiver pair.
pub fn metrics_channel() -> (MetricsClient, mpsc::UnboundedReceiver<MetricEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MetricsClient::new(tx), rx)
}

/// Cheaply cloneable sender half of the metrics channel.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    tx: mpsc::UnboundedSender<MetricEvent>,
}

impl MetricsClient {
    /// Creates a client emitting into the given channel.
    pub fn new(tx: mpsc::UnboundedSender<MetricEvent>) -> Self {
        Self { tx }
    }

    #[inline]
    fn send(&self, event: MetricEvent) {
        // Ignore send errors - the receiver may have shut down.
        let _ = self.tx.send(event);
    }
}

impl ModuleMetrics for MetricsClient {
    fn record_module_called(&self, labels: &ModuleLabels, duration: Duration) {
        self.send(MetricEvent::ModuleCalled {
            labels: labels.clone(),
            duration,
        });
    }

    fn record_module_success_updated(&self, labels: &ModuleLabels) {
        self.send(MetricEvent::ModuleSuccessUpdated {
            labels: labels.clone(),
        });
    }

    fn record_module_success_rejected(&self, labels: &ModuleLabels) {
        self.send(MetricEvent::ModuleSuccessRejected {
            labels: labels.clone(),
        });
    }

    fn record_module_success_nooped(&self, labels: &ModuleLabels) {
        self.send(MetricEvent::ModuleSuccessNooped {
            labels: labels.clone(),
        });
    }

    fn record_module_timeout(&self, labels: &ModuleLabels) {
        self.send(MetricEvent::ModuleTimeout {
            labels: labels.clone(),
        });
    }

    fn record_module_execution_error(&self, labels: &ModuleLabels) {
        self.send(MetricEvent::ModuleExecutionError {
            labels: labels.clone(),
        });
    }

    fn record_module_failed(&self, labels: &ModuleLabels) {
        self.send(MetricEvent::ModuleFailed {
            labels: labels.clone(),
        });
    }
}
