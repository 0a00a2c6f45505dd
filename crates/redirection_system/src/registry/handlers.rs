/// Handler registration methods
use super::core::RedirectionRegistry;
use crate::error::RedirectionError;
use crate::redirection::{FnRedirection, Invocation, Redirection};
use crate::types::Value;
use std::sync::Arc;
use tracing::debug;

impl RedirectionRegistry {
    /// Installs `handler` for `descriptor`, replacing any earlier one.
    ///
    /// Last write wins; the replaced handler is returned. Subsequent
    /// invocations for the descriptor use the new handler.
    pub fn register(
        &self,
        descriptor: impl Into<String>,
        handler: Arc<dyn Redirection>,
    ) -> Option<Arc<dyn Redirection>> {
        let descriptor = descriptor.into();
        debug!(descriptor = %descriptor, handler = handler.name(), "Registered redirection");
        let previous = self.handlers.insert(descriptor, handler);
        if let Some(ref previous) = previous {
            debug!(replaced = previous.name(), "Replaced existing redirection");
        }
        previous
    }

    /// Registers a closure as the handler for `descriptor`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use redirection_system::{Fallback, RedirectionRegistry, TypeRef, Value};
    ///
    /// let registry = RedirectionRegistry::new();
    /// registry.register_fn("Lcom/example/Foo;bar(I)I", |_call| Ok(Value::Int(42)));
    ///
    /// let result = registry.invoke(
    ///     "Lcom/example/Foo;bar(I)I",
    ///     &TypeRef::named("com.example.Foo"),
    ///     None,
    ///     Fallback::unsupported(),
    ///     &[Value::Int(7)],
    /// );
    /// assert_eq!(result, Ok(Value::Int(42)));
    /// ```
    pub fn register_fn<F>(
        &self,
        descriptor: impl Into<String>,
        handler: F,
    ) -> Option<Arc<dyn Redirection>>
    where
        F: Fn(Invocation<'_>) -> Result<Value, RedirectionError> + Send + Sync + 'static,
    {
        let descriptor = descriptor.into();
        let handler = FnRedirection::new(descriptor.clone(), handler);
        self.register(descriptor, Arc::new(handler))
    }

    /// Removes the handler for `descriptor`; later calls fall back.
    pub fn unregister(&self, descriptor: &str) -> Option<Arc<dyn Redirection>> {
        let removed = self.handlers.remove(descriptor).map(|(_, handler)| handler);
        if removed.is_some() {
            debug!(descriptor, "Unregistered redirection");
        }
        removed
    }

    /// The handler currently registered for `descriptor`
    pub fn handler(&self, descriptor: &str) -> Option<Arc<dyn Redirection>> {
        self.handlers.get(descriptor).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, descriptor: &str) -> bool {
        self.handlers.contains_key(descriptor)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// All registered descriptors, sorted
    pub fn descriptors(&self) -> Vec<String> {
        let mut descriptors: Vec<String> =
            self.handlers.iter().map(|entry| entry.key().clone()).collect();
        descriptors.sort();
        descriptors
    }
}
