/// Core RedirectionRegistry implementation
use super::stats::{RegistryStats, StatsCounters};
use crate::class::ClassCatalog;
use crate::redirection::Redirection;
use dashmap::DashMap;
use std::sync::Arc;

/// The dispatch table behind every intercepted call site.
///
/// Maps descriptors to registered [`Redirection`] handlers. Lookups happen on
/// every intercepted call while registrations happen mostly at startup, so
/// the table is a sharded [`DashMap`]: readers on different shards never
/// contend, and a registration is a single atomic replace.
///
/// The registry is constructed once by the host and shared by `Arc`; proxies
/// and synthesized objects refer back to it weakly.
pub struct RedirectionRegistry {
    /// Map of descriptors to their registered handlers
    pub(super) handlers: DashMap<String, Arc<dyn Redirection>>,
    /// Classes known to the host, used to resolve names in descriptors
    pub(super) catalog: Arc<ClassCatalog>,
    /// Dispatch counters
    pub(crate) stats: StatsCounters,
}

impl std::fmt::Debug for RedirectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectionRegistry")
            .field("handlers", &self.handlers.len())
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl RedirectionRegistry {
    /// Creates an empty registry with its own empty class catalog.
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(ClassCatalog::new()))
    }

    /// Creates an empty registry over a shared class catalog.
    pub fn with_catalog(catalog: Arc<ClassCatalog>) -> Self {
        Self {
            handlers: DashMap::new(),
            catalog,
            stats: StatsCounters::default(),
        }
    }

    /// The class catalog this registry resolves names against
    pub fn catalog(&self) -> &Arc<ClassCatalog> {
        &self.catalog
    }

    /// Gets a snapshot of the dispatch statistics
    pub fn stats(&self) -> RegistryStats {
        self.stats.snapshot(self.handlers.len())
    }
}

impl Default for RedirectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
