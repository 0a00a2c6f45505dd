//! Built-in redirections
//!
//! Ready-made handlers for the common ways of neutralizing a call: return a
//! fixed value, return the zero value of the method's return type, conjure
//! an object of the return type, or defer to the original behavior.

use crate::descriptor::method_return_type;
use crate::error::RedirectionError;
use crate::redirection::{Invocation, Redirection};
use crate::registry::RedirectionRegistry;
use crate::synthesizer::synthesize;
use crate::types::{TypeRef, Value};
use std::sync::{Arc, Weak};

/// Return type of the redirected method, or the declared type when the
/// descriptor does not name a method.
fn return_type(call: &Invocation<'_>) -> TypeRef {
    method_return_type(call.descriptor).unwrap_or_else(|| call.declared_type.clone())
}

/// Always returns the same value.
#[derive(Debug, Clone)]
pub struct ConstantRedirection {
    value: Value,
}

impl ConstantRedirection {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn null() -> Self {
        Self { value: Value::Null }
    }
}

impl Redirection for ConstantRedirection {
    fn invoke(&self, _call: Invocation<'_>) -> Result<Value, RedirectionError> {
        Ok(self.value.clone())
    }

    fn name(&self) -> &str {
        "constant"
    }
}

/// Returns the zero value of the method's return type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueRedirection;

impl Redirection for DefaultValueRedirection {
    fn invoke(&self, call: Invocation<'_>) -> Result<Value, RedirectionError> {
        Ok(Value::default_for(&return_type(&call)))
    }

    fn name(&self) -> &str {
        "default"
    }
}

/// Always defers to the call's fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferRedirection;

impl Redirection for DeferRedirection {
    fn invoke(&self, call: Invocation<'_>) -> Result<Value, RedirectionError> {
        call.defer()
    }

    fn name(&self) -> &str {
        "defer"
    }
}

/// Synthesizes a placeholder of the method's return type.
///
/// Primitive returns get their zero value; object returns that cannot be
/// synthesized become `Null`.
#[derive(Debug, Clone)]
pub struct ObjectRedirection {
    registry: Weak<RedirectionRegistry>,
}

impl ObjectRedirection {
    pub fn new(registry: &Arc<RedirectionRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

impl Redirection for ObjectRedirection {
    fn invoke(&self, call: Invocation<'_>) -> Result<Value, RedirectionError> {
        let ty = return_type(&call);
        if ty.is_primitive() {
            return Ok(Value::default_for(&ty));
        }

        let registry = self
            .registry
            .upgrade()
            .ok_or(RedirectionError::RegistryUnavailable)?;
        Ok(synthesize(&registry, &ty, call.descriptor)
            .into_value()
            .unwrap_or(Value::Null))
    }

    fn name(&self) -> &str {
        "object"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassInfo;
    use crate::redirection::Fallback;

    #[test]
    fn test_default_value_follows_return_type() {
        let registry = RedirectionRegistry::new();
        registry.register("La/B;count()J", Arc::new(DefaultValueRedirection));
        registry.register("La/B;ready()Z", Arc::new(DefaultValueRedirection));
        registry.register("La/B;tick()V", Arc::new(DefaultValueRedirection));
        registry.register("La/B;label()Ljava/lang/String;", Arc::new(DefaultValueRedirection));

        let owner = TypeRef::named("a.B");
        let invoke = |d: &str| registry.invoke(d, &owner, None, Fallback::unsupported(), &[]);
        assert_eq!(invoke("La/B;count()J"), Ok(Value::Long(0)));
        assert_eq!(invoke("La/B;ready()Z"), Ok(Value::Bool(false)));
        assert_eq!(invoke("La/B;tick()V"), Ok(Value::Void));
        assert_eq!(invoke("La/B;label()Ljava/lang/String;"), Ok(Value::Null));
    }

    #[test]
    fn test_object_redirection_synthesizes_return_type() {
        let registry = Arc::new(RedirectionRegistry::new());
        registry
            .catalog()
            .register(ClassInfo::interface("com.example.Renderer").build());
        registry.register(
            "Lcom/example/Game;renderer()Lcom/example/Renderer;",
            Arc::new(ObjectRedirection::new(&registry)),
        );
        registry.register("Lcom/example/Game;units()[[I", Arc::new(ObjectRedirection::new(&registry)));
        registry.register("Lcom/example/Game;missing()Lcom/example/Gone;", Arc::new(ObjectRedirection::new(&registry)));

        let game = TypeRef::named("com.example.Game");
        let renderer = registry
            .invoke("Lcom/example/Game;renderer()Lcom/example/Renderer;", &game, None, Fallback::unsupported(), &[])
            .unwrap();
        assert_eq!(
            renderer.as_proxy().map(|p| p.interface().name().to_string()),
            Some("com.example.Renderer".to_string())
        );

        let units = registry
            .invoke("Lcom/example/Game;units()[[I", &game, None, Fallback::unsupported(), &[])
            .unwrap();
        assert_eq!(units.as_array().map(|a| (a.len(), a.dimensions())), Some((0, 2)));

        let missing = registry
            .invoke("Lcom/example/Game;missing()Lcom/example/Gone;", &game, None, Fallback::unsupported(), &[])
            .unwrap();
        assert!(missing.is_null());
    }

    #[test]
    fn test_defer_uses_fallback() {
        let registry = RedirectionRegistry::new();
        registry.register("La/B;m()I", Arc::new(DeferRedirection));
        let result = registry.invoke(
            "La/B;m()I",
            &TypeRef::named("a.B"),
            None,
            Fallback::value(Value::Int(5)),
            &[],
        );
        assert_eq!(result, Ok(Value::Int(5)));
    }
}
