//! Object synthesis
//!
//! When a handler must return an object it has no real source for, it asks
//! for a placeholder of the required type. The placeholder is chosen by the
//! type's shape, first match wins:
//!
//! 1. interface: a live [`InterfaceProxy`] forwarding into the registry
//! 2. array: a zero-length array of the fully unwrapped element type
//! 3. abstract class: nothing
//! 4. concrete class: a fresh instance from its registered constructor
//!
//! Anything that cannot be produced is reported once through `tracing` and
//! returned as [`Synthesized::Absent`]; synthesis never fails the caller.
//!
//! A panicking constructor is caught, but the process panic hook still runs
//! before the unwind is caught. Hosts that want panics in their structured
//! logs only should install a hook that forwards to `tracing`.

use crate::class::ClassInfo;
use crate::descriptor::type_descriptor;
use crate::proxy::InterfaceProxy;
use crate::registry::RedirectionRegistry;
use crate::types::{ArrayValue, Instance, TypeRef, Value};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Why no object could be synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// Abstract classes cannot be instantiated
    Abstract,
    /// The class has no registered zero-argument constructor
    NoConstructor,
    /// The registered constructor failed or panicked
    ConstructionFailed(String),
    /// No metadata is known for the class name
    Unresolved,
    /// Primitives and `void` are not objects
    NotAnObject,
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsentReason::Abstract => f.write_str("abstract class"),
            AbsentReason::NoConstructor => f.write_str("no zero-argument constructor registered"),
            AbsentReason::ConstructionFailed(reason) => write!(f, "construction failed: {reason}"),
            AbsentReason::Unresolved => f.write_str("unknown class"),
            AbsentReason::NotAnObject => f.write_str("not an object type"),
        }
    }
}

/// A placeholder object, or the explicit absence of one.
#[derive(Debug, Clone)]
pub enum Synthesized {
    Proxy(Arc<InterfaceProxy>),
    Array(Arc<ArrayValue>),
    Instance(Arc<Instance>),
    Absent(AbsentReason),
}

impl Synthesized {
    pub fn is_absent(&self) -> bool {
        matches!(self, Synthesized::Absent(_))
    }

    pub fn absent_reason(&self) -> Option<&AbsentReason> {
        match self {
            Synthesized::Absent(reason) => Some(reason),
            _ => None,
        }
    }

    /// The synthesized value, or `None` when absent.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Synthesized::Proxy(proxy) => Some(Value::Proxy(proxy)),
            Synthesized::Array(array) => Some(Value::Array(array)),
            Synthesized::Instance(instance) => Some(Value::Object(instance)),
            Synthesized::Absent(_) => None,
        }
    }
}

/// Produces a placeholder of type `ty` on behalf of the call site
/// identified by `descriptor`.
///
/// Class names unknown to `ty` are first resolved through the registry's
/// catalog. Proxies are bound to the interface's own type descriptor, so
/// handlers registered for the interface's methods see their calls no matter
/// which call site the proxy was synthesized for.
pub fn synthesize(registry: &Arc<RedirectionRegistry>, ty: &TypeRef, descriptor: &str) -> Synthesized {
    let ty = registry.catalog().resolve(ty);

    let outcome = match &ty {
        TypeRef::Class(info) if info.is_interface() => {
            match InterfaceProxy::new(registry, info.clone(), type_descriptor(&ty)) {
                Ok(proxy) => Synthesized::Proxy(proxy),
                Err(error) => Synthesized::Absent(AbsentReason::ConstructionFailed(error.to_string())),
            }
        }
        TypeRef::Array(component) => {
            let array = ArrayValue::new(component.as_ref().clone(), Vec::new());
            debug!(
                descriptor,
                type_name = %ty,
                dimensions = array.dimensions(),
                "Synthesized empty array"
            );
            Synthesized::Array(Arc::new(array))
        }
        TypeRef::Class(info) if info.is_abstract() => Synthesized::Absent(AbsentReason::Abstract),
        TypeRef::Class(info) => construct(info),
        TypeRef::Unresolved(_) => Synthesized::Absent(AbsentReason::Unresolved),
        TypeRef::Primitive(_) => Synthesized::Absent(AbsentReason::NotAnObject),
    };

    if let Synthesized::Absent(reason) = &outcome {
        registry.stats.record_synthesis_failure();
        warn!(descriptor, type_name = %ty, %reason, "Can't synthesize object for {}", descriptor);
    }
    outcome
}

fn construct(info: &Arc<ClassInfo>) -> Synthesized {
    let Some(constructor) = info.constructor() else {
        return Synthesized::Absent(AbsentReason::NoConstructor);
    };

    match panic::catch_unwind(AssertUnwindSafe(|| constructor())) {
        Ok(Ok(state)) => Synthesized::Instance(Arc::new(Instance::new(info.clone(), state))),
        Ok(Err(reason)) => Synthesized::Absent(AbsentReason::ConstructionFailed(reason)),
        Err(panic_info) => Synthesized::Absent(AbsentReason::ConstructionFailed(panic_message(panic_info))),
    }
}

fn panic_message(panic_info: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        format!("constructor panicked: {s}")
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        format!("constructor panicked: {s}")
    } else {
        "constructor panicked".to_string()
    }
}

impl RedirectionRegistry {
    /// See [`synthesize`].
    pub fn synthesize(self: &Arc<Self>, ty: &TypeRef, descriptor: &str) -> Synthesized {
        synthesize(self, ty, descriptor)
    }
}
