//! Dispatch statistics

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of registry activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Handlers currently registered
    pub registered_handlers: usize,
    /// Calls that reached `invoke`
    pub invocations: u64,
    /// Calls served by a registered handler
    pub redirected: u64,
    /// Calls served by their fallback
    pub fallbacks: u64,
    /// Registered handlers that returned an error
    pub handler_failures: u64,
    /// Synthesis requests that produced no object
    pub synthesis_failures: u64,
}

/// Lock-free counters behind [`RegistryStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    invocations: AtomicU64,
    redirected: AtomicU64,
    fallbacks: AtomicU64,
    handler_failures: AtomicU64,
    synthesis_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_redirected(&self) {
        self.redirected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_synthesis_failure(&self) {
        self.synthesis_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, registered_handlers: usize) -> RegistryStats {
        RegistryStats {
            registered_handlers,
            invocations: self.invocations.load(Ordering::Relaxed),
            redirected: self.redirected.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            synthesis_failures: self.synthesis_failures.load(Ordering::Relaxed),
        }
    }
}
