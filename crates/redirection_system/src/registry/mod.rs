//! Redirection registry - broken down into manageable components
mod core;
mod dispatch;
mod handlers;
mod stats;

pub use self::core::RedirectionRegistry;
pub use stats::RegistryStats;

use crate::class::ClassCatalog;
use std::sync::Arc;

/// Helper function to create a shared registry over an existing class catalog
pub fn create_redirection_registry(catalog: Arc<ClassCatalog>) -> Arc<RedirectionRegistry> {
    Arc::new(RedirectionRegistry::with_catalog(catalog))
}
