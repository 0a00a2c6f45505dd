/// Call dispatch
use super::core::RedirectionRegistry;
use crate::class::MethodSig;
use crate::descriptor::method_descriptor;
use crate::error::RedirectionError;
use crate::redirection::{Fallback, Invocation};
use crate::types::{TypeRef, Value};
use tracing::{debug, trace};

impl RedirectionRegistry {
    /// Entry point for intercepted call sites.
    ///
    /// If a handler is registered for `descriptor` it receives the call,
    /// untouched `fallback` included, and its result is returned verbatim,
    /// errors too. Otherwise the fallback is evaluated once and its result
    /// is returned.
    ///
    /// The table entry is released before the handler runs, so handlers may
    /// register, invoke or synthesize through this registry.
    pub fn invoke(
        &self,
        descriptor: &str,
        declared_type: &TypeRef,
        receiver: Option<&Value>,
        fallback: Fallback<'_>,
        args: &[Value],
    ) -> Result<Value, RedirectionError> {
        self.stats.record_invocation();
        let handler = self.handler(descriptor);
        let call = Invocation::new(descriptor, declared_type, receiver, fallback, args);

        match handler {
            Some(handler) => {
                self.stats.record_redirected();
                trace!(descriptor, handler = handler.name(), "Dispatching redirected call");
                handler.invoke(call).inspect_err(|error| {
                    self.stats.record_handler_failure();
                    debug!(descriptor, handler = handler.name(), %error, "Redirection handler failed");
                })
            }
            None => {
                self.stats.record_fallback();
                trace!(descriptor, "No redirection registered, using fallback");
                call.defer()
            }
        }
    }

    /// Invokes a method by shape, deriving its descriptor from `owner`.
    pub fn invoke_method(
        &self,
        owner: &TypeRef,
        method: &MethodSig,
        receiver: Option<&Value>,
        fallback: Fallback<'_>,
        args: &[Value],
    ) -> Result<Value, RedirectionError> {
        let descriptor = method_descriptor(owner, method);
        self.invoke(&descriptor, owner, receiver, fallback, args)
    }
}
