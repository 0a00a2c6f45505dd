//! # Redirection System
//!
//! Descriptor-keyed method redirection for running client logic headlessly.
//! Call sites that would execute an original method body instead invoke the
//! [`RedirectionRegistry`] with a descriptor, the receiver's declared type,
//! the receiver, a [`Fallback`] holding the original behavior, and the
//! original arguments. A registered [`Redirection`] decides the result; when
//! none is registered the fallback does.
//!
//! ## Architecture Overview
//!
//! - **Descriptor codec** ([`descriptor`]): canonical string keys for type and
//!   method shapes, e.g. `Lcom/example/Foo;bar(I)I`
//! - **Registry** ([`RedirectionRegistry`]): the concurrent descriptor → handler table
//! - **Interface proxies** ([`InterfaceProxy`]): runtime implementations of any
//!   interface whose calls loop back into the registry
//! - **Object synthesis** ([`synthesize`]): placeholder objects for types no real
//!   value exists for
//!
//! ## Quick Start Example
//!
//! ```rust
//! use redirection_system::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(RedirectionRegistry::new());
//! let foo = TypeRef::named("com.example.Foo");
//! let bar = MethodSig::new("bar", vec![TypeRef::INT], TypeRef::INT);
//!
//! registry.register_fn(method_descriptor(&foo, &bar), |call| {
//!     let input = call.arg(0).and_then(Value::as_int).unwrap_or_default();
//!     Ok(Value::Int(input * 6))
//! });
//!
//! let result = registry.invoke_method(&foo, &bar, None, Fallback::unsupported(), &[Value::Int(7)]);
//! assert_eq!(result, Ok(Value::Int(42)));
//! ```

pub mod builtin;
pub mod class;
pub mod descriptor;
pub mod error;
pub mod proxy;
pub mod redirection;
pub mod registry;
pub mod synthesizer;
pub mod types;

// Re-exports for convenience
pub use builtin::{ConstantRedirection, DefaultValueRedirection, DeferRedirection, ObjectRedirection};
pub use class::{ClassBuilder, ClassCatalog, ClassInfo, ClassKind, Constructor, MethodSig};
pub use descriptor::{
    method_descriptor, method_return_type, parse_method_descriptor, parse_type_descriptor,
    signature_descriptor, type_descriptor, MethodShape,
};
pub use error::RedirectionError;
pub use proxy::InterfaceProxy;
pub use redirection::{Fallback, FnRedirection, Invocation, Redirection};
pub use registry::{create_redirection_registry, RedirectionRegistry, RegistryStats};
pub use synthesizer::{synthesize, AbsentReason, Synthesized};
pub use types::{ArrayValue, Instance, Primitive, TypeRef, Value};
