//! Interface proxy dispatcher
//!
//! An [`InterfaceProxy`] stands in for an object implementing an interface
//! that is only described at runtime. It has no behavior of its own: every
//! method call is turned into exactly one [`RedirectionRegistry::invoke`]
//! with the descriptor `<bound descriptor><method name>(<params>)<ret>`, the
//! interface as declared type, the proxy itself as receiver and the
//! arguments passed through unchanged.
//!
//! ```text
//! proxy(Lcom/example/Listener;).call("onEvent", [Int(3)])
//!     -> registry.invoke("Lcom/example/Listener;onEvent(I)V", Listener, proxy, unsupported, [Int(3)])
//! ```

use crate::class::{ClassInfo, MethodSig};
use crate::descriptor::{bind_method, type_descriptor};
use crate::error::RedirectionError;
use crate::redirection::Fallback;
use crate::registry::RedirectionRegistry;
use crate::types::{TypeRef, Value};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;
use uuid::Uuid;

/// A runtime implementation of an interface that forwards into the registry.
pub struct InterfaceProxy {
    /// Identity of this proxy; never shared between two proxies
    id: Uuid,
    interface: Arc<ClassInfo>,
    /// Descriptor method names are appended to
    descriptor: String,
    registry: Weak<RedirectionRegistry>,
}

impl InterfaceProxy {
    /// Creates a proxy for `interface` bound to `descriptor`.
    ///
    /// Fails with [`RedirectionError::NotAnInterface`] for classes.
    pub fn new(
        registry: &Arc<RedirectionRegistry>,
        interface: Arc<ClassInfo>,
        descriptor: impl Into<String>,
    ) -> Result<Arc<Self>, RedirectionError> {
        if !interface.is_interface() {
            return Err(RedirectionError::NotAnInterface {
                class: interface.name().to_string(),
            });
        }

        Ok(Arc::new(Self {
            id: Uuid::new_v4(),
            interface,
            descriptor: descriptor.into(),
            registry: Arc::downgrade(registry),
        }))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn interface(&self) -> &Arc<ClassInfo> {
        &self.interface
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Calls `method` with the default fallback, which fails with
    /// [`RedirectionError::Unsupported`].
    pub fn invoke(self: &Arc<Self>, method: &MethodSig, args: &[Value]) -> Result<Value, RedirectionError> {
        self.invoke_with_fallback(method, args, Fallback::unsupported())
    }

    /// Calls `method`, supplying a richer fallback than the default.
    pub fn invoke_with_fallback(
        self: &Arc<Self>,
        method: &MethodSig,
        args: &[Value],
        fallback: Fallback<'_>,
    ) -> Result<Value, RedirectionError> {
        if !self.interface.declares(method) {
            return Err(RedirectionError::NoSuchMethod {
                interface: self.interface.name().to_string(),
                method: method.name.clone(),
            });
        }

        let descriptor = bind_method(&self.descriptor, method);
        if args.len() != method.arity() {
            return Err(RedirectionError::ArityMismatch {
                descriptor,
                expected: method.arity(),
                actual: args.len(),
            });
        }

        let registry = self
            .registry
            .upgrade()
            .ok_or(RedirectionError::RegistryUnavailable)?;
        let declared_type = TypeRef::Class(self.interface.clone());
        let receiver = Value::Proxy(Arc::clone(self));

        trace!(proxy = %self.id, descriptor = %descriptor, "Forwarding proxy call");
        registry.invoke(&descriptor, &declared_type, Some(&receiver), fallback, args)
    }

    /// Calls the method named `name` whose arity matches `args`.
    pub fn call(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value, RedirectionError> {
        self.call_with_fallback(name, args, Fallback::unsupported())
    }

    /// Like [`InterfaceProxy::call`] with a caller-supplied fallback.
    pub fn call_with_fallback(
        self: &Arc<Self>,
        name: &str,
        args: &[Value],
        fallback: Fallback<'_>,
    ) -> Result<Value, RedirectionError> {
        let method = self
            .interface
            .find_method(name, args.len())
            .cloned()
            .ok_or_else(|| RedirectionError::NoSuchMethod {
                interface: self.interface.name().to_string(),
                method: name.to_string(),
            })?;
        self.invoke_with_fallback(&method, args, fallback)
    }
}

impl fmt::Debug for InterfaceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceProxy")
            .field("id", &self.id)
            .field("interface", &self.interface.name())
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

impl RedirectionRegistry {
    /// Creates a proxy for `interface`, bound to the interface's own
    /// type descriptor.
    pub fn proxy(self: &Arc<Self>, interface: Arc<ClassInfo>) -> Result<Arc<InterfaceProxy>, RedirectionError> {
        let descriptor = type_descriptor(&TypeRef::Class(interface.clone()));
        InterfaceProxy::new(self, interface, descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn listener() -> Arc<ClassInfo> {
        ClassInfo::interface("com.example.Listener")
            .method("onEvent", vec![TypeRef::INT], TypeRef::VOID)
            .method("describe", vec![], TypeRef::named("java.lang.String"))
            .build()
    }

    #[test]
    fn test_call_forwards_once_with_interface_descriptor() {
        let registry = Arc::new(RedirectionRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        registry.register_fn("Lcom/example/Listener;onEvent(I)V", move |call| {
            seen_clone.lock().unwrap().push((
                call.descriptor.to_string(),
                call.declared_type.name(),
                call.receiver.map(|r| r.as_proxy().is_some()),
                call.args.to_vec(),
            ));
            Ok(Value::Void)
        });

        let proxy = registry.proxy(listener()).unwrap();
        assert_eq!(proxy.call("onEvent", &[Value::Int(3)]), Ok(Value::Void));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "Lcom/example/Listener;onEvent(I)V");
        assert_eq!(seen[0].1, "com.example.Listener");
        assert_eq!(seen[0].2, Some(true));
        assert_eq!(seen[0].3, vec![Value::Int(3)]);
    }

    #[test]
    fn test_receiver_is_the_proxy_itself() {
        let registry = Arc::new(RedirectionRegistry::new());
        registry.register_fn("Lcom/example/Listener;describe()Ljava/lang/String;", |call| {
            let proxy = call.receiver.and_then(Value::as_proxy).expect("proxy receiver");
            Ok(Value::from(proxy.id().to_string()))
        });

        let proxy = registry.proxy(listener()).unwrap();
        assert_eq!(proxy.call("describe", &[]), Ok(Value::from(proxy.id().to_string())));
    }

    #[test]
    fn test_default_fallback_is_unsupported() {
        let registry = Arc::new(RedirectionRegistry::new());
        let proxy = registry.proxy(listener()).unwrap();
        assert_eq!(
            proxy.call("describe", &[]),
            Err(RedirectionError::unsupported("Lcom/example/Listener;describe()Ljava/lang/String;"))
        );
        assert_eq!(
            proxy.call_with_fallback("describe", &[], Fallback::value(Value::from("original"))),
            Ok(Value::from("original"))
        );
    }

    #[test]
    fn test_rejects_unknown_methods_and_bad_arity() {
        let registry = Arc::new(RedirectionRegistry::new());
        let proxy = registry.proxy(listener()).unwrap();

        assert!(matches!(
            proxy.call("missing", &[]),
            Err(RedirectionError::NoSuchMethod { .. })
        ));

        let on_event = MethodSig::new("onEvent", vec![TypeRef::INT], TypeRef::VOID);
        assert!(matches!(
            proxy.invoke(&on_event, &[]),
            Err(RedirectionError::ArityMismatch { expected: 1, actual: 0, .. })
        ));
        assert_eq!(registry.stats().invocations, 0);
    }

    #[test]
    fn test_proxy_outliving_registry() {
        let registry = Arc::new(RedirectionRegistry::new());
        let proxy = registry.proxy(listener()).unwrap();
        drop(registry);
        assert_eq!(proxy.call("describe", &[]), Err(RedirectionError::RegistryUnavailable));
    }

    #[test]
    fn test_only_interfaces_can_be_proxied() {
        let registry = Arc::new(RedirectionRegistry::new());
        let concrete = ClassInfo::concrete("com.example.Unit").build();
        assert!(matches!(
            registry.proxy(concrete),
            Err(RedirectionError::NotAnInterface { .. })
        ));
    }
}
