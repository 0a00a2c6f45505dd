//! The redirection handler contract
//!
//! A [`Redirection`] receives one [`Invocation`] per intercepted call and
//! decides the value the call site sees. Every invocation carries a
//! [`Fallback`]: the original behavior, captured lazily so that a handler
//! which fully replaces the call never pays for computing it.

use crate::error::RedirectionError;
use crate::types::{TypeRef, Value};
use std::fmt;
use std::sync::Arc;

/// A registered replacement behavior.
pub trait Redirection: Send + Sync {
    /// Produces the value for an intercepted call, or fails.
    fn invoke(&self, call: Invocation<'_>) -> Result<Value, RedirectionError>;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// One intercepted call.
pub struct Invocation<'a> {
    /// Descriptor the call site was redirected under
    pub descriptor: &'a str,
    /// Declared type of the receiver
    pub declared_type: &'a TypeRef,
    /// Receiver instance; `None` for static call sites
    pub receiver: Option<&'a Value>,
    /// The original behavior
    pub fallback: Fallback<'a>,
    /// Original arguments, untouched
    pub args: &'a [Value],
}

impl<'a> Invocation<'a> {
    pub fn new(
        descriptor: &'a str,
        declared_type: &'a TypeRef,
        receiver: Option<&'a Value>,
        fallback: Fallback<'a>,
        args: &'a [Value],
    ) -> Self {
        Self {
            descriptor,
            declared_type,
            receiver,
            fallback,
            args,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }

    /// Evaluates the fallback and returns what the original behavior
    /// produces for this call. Consumes the invocation, so the fallback runs
    /// at most once.
    pub fn defer(self) -> Result<Value, RedirectionError> {
        let Invocation {
            descriptor,
            declared_type,
            receiver,
            fallback,
            args,
        } = self;

        match fallback.supplier {
            Supplier::Handler(supply) => supply().invoke(Invocation {
                descriptor,
                declared_type,
                receiver,
                fallback: Fallback::unsupported(),
                args,
            }),
            Supplier::Original(original) => original(),
            Supplier::Unsupported => Err(RedirectionError::unsupported(descriptor)),
        }
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("descriptor", &self.descriptor)
            .field("declared_type", &self.declared_type)
            .field("receiver", &self.receiver.map(Value::kind))
            .field("fallback", &self.fallback)
            .field("args", &self.args.len())
            .finish()
    }
}

enum Supplier<'a> {
    Handler(Box<dyn FnOnce() -> Arc<dyn Redirection> + 'a>),
    Original(Box<dyn FnOnce() -> Result<Value, RedirectionError> + 'a>),
    Unsupported,
}

/// Lazily evaluated supplier of the original behavior.
///
/// It either supplies a handler to run in place of the registered one, or
/// computes the original result directly. Nothing is evaluated until
/// [`Invocation::defer`] is called.
pub struct Fallback<'a> {
    supplier: Supplier<'a>,
}

impl<'a> Fallback<'a> {
    /// Supplies a handler on demand.
    pub fn supply<F>(supply: F) -> Self
    where
        F: FnOnce() -> Arc<dyn Redirection> + 'a,
    {
        Self {
            supplier: Supplier::Handler(Box::new(supply)),
        }
    }

    /// Defers to an existing handler.
    pub fn handler(handler: Arc<dyn Redirection>) -> Self {
        Self::supply(move || handler)
    }

    /// Computes the original result on demand.
    pub fn original<F>(original: F) -> Self
    where
        F: FnOnce() -> Result<Value, RedirectionError> + 'a,
    {
        Self {
            supplier: Supplier::Original(Box::new(original)),
        }
    }

    /// The original behavior is a known value.
    pub fn value(value: Value) -> Self {
        Self::original(move || Ok(value))
    }

    /// No original behavior: deferring fails with
    /// [`RedirectionError::Unsupported`].
    pub fn unsupported() -> Self {
        Self {
            supplier: Supplier::Unsupported,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.supplier, Supplier::Unsupported)
    }
}

impl fmt::Debug for Fallback<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.supplier {
            Supplier::Handler(_) => "handler",
            Supplier::Original(_) => "original",
            Supplier::Unsupported => "unsupported",
        };
        write!(f, "Fallback({kind})")
    }
}

/// Closure-backed redirection with a name for logging.
pub struct FnRedirection<F> {
    name: String,
    handler: F,
}

impl<F> FnRedirection<F>
where
    F: Fn(Invocation<'_>) -> Result<Value, RedirectionError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> Redirection for FnRedirection<F>
where
    F: Fn(Invocation<'_>) -> Result<Value, RedirectionError> + Send + Sync,
{
    fn invoke(&self, call: Invocation<'_>) -> Result<Value, RedirectionError> {
        (self.handler)(call)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_fallback_is_not_evaluated_unless_deferred() {
        let evaluated = Cell::new(false);
        let fallback = Fallback::original(|| {
            evaluated.set(true);
            Ok(Value::Int(1))
        });
        let call = Invocation::new("La/B;m()I", &TypeRef::INT, None, fallback, &[]);
        drop(call);
        assert!(!evaluated.get());
    }

    #[test]
    fn test_defer_runs_supplied_handler_once() {
        let supplied = Cell::new(0);
        let handler: Arc<dyn Redirection> = Arc::new(FnRedirection::new("echo", |call: Invocation<'_>| {
            assert!(call.fallback.is_unsupported());
            Ok(call.arg(0).cloned().unwrap_or(Value::Null))
        }));
        let fallback = Fallback::supply(|| {
            supplied.set(supplied.get() + 1);
            handler.clone()
        });
        let args = [Value::from("hello")];
        let call = Invocation::new("La/B;m(Ljava/lang/String;)V", &TypeRef::VOID, None, fallback, &args);

        assert_eq!(call.defer(), Ok(Value::from("hello")));
        assert_eq!(supplied.get(), 1);
    }

    #[test]
    fn test_unsupported_fallback_fails_with_descriptor() {
        let call = Invocation::new("La/B;m()V", &TypeRef::VOID, None, Fallback::unsupported(), &[]);
        assert_eq!(call.defer(), Err(RedirectionError::unsupported("La/B;m()V")));
    }
}
