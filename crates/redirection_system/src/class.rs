//! Class metadata and the class catalog
//!
//! The host describes each class it knows about with a [`ClassInfo`]: its
//! kind, its declared methods, the interfaces it extends and, for classes
//! that may be instantiated headlessly, an explicitly registered zero-argument
//! constructor. The [`ClassCatalog`] indexes these by fully-qualified name so
//! descriptors and unresolved names can be turned back into full shapes.

use crate::descriptor::{parse_type_descriptor, type_descriptor};
use crate::types::TypeRef;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Zero-argument constructor registered for a class.
///
/// Returns the new instance state, or a reason the construction failed.
pub type Constructor =
    Arc<dyn Fn() -> Result<Box<dyn Any + Send + Sync>, String> + Send + Sync>;

/// What kind of class a [`ClassInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Interface,
    Abstract,
    Concrete,
}

/// A method signature: name, parameter types and return type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, params: Vec<TypeRef>, ret: TypeRef) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Metadata for one class or interface.
pub struct ClassInfo {
    name: String,
    kind: ClassKind,
    interfaces: Vec<Arc<ClassInfo>>,
    methods: Vec<MethodSig>,
    constructor: Option<Constructor>,
}

impl ClassInfo {
    /// Starts describing an interface.
    pub fn interface(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Interface)
    }

    /// Starts describing an abstract class.
    pub fn abstract_class(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Abstract)
    }

    /// Starts describing a concrete class.
    pub fn concrete(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Concrete)
    }

    /// Fully-qualified, dot-separated name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == ClassKind::Abstract
    }

    /// Directly extended interfaces
    pub fn interfaces(&self) -> &[Arc<ClassInfo>] {
        &self.interfaces
    }

    /// Methods declared on this class itself
    pub fn methods(&self) -> &[MethodSig] {
        &self.methods
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Looks up a method by name and arity, first on this class and then
    /// depth-first through the extended interfaces.
    pub fn find_method(&self, name: &str, arity: usize) -> Option<&MethodSig> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity() == arity)
            .or_else(|| {
                self.interfaces
                    .iter()
                    .find_map(|parent| parent.find_method(name, arity))
            })
    }

    /// Returns `true` if `method` is part of this class's contract,
    /// including inherited interface methods.
    pub fn declares(&self, method: &MethodSig) -> bool {
        self.methods.contains(method) || self.interfaces.iter().any(|p| p.declares(method))
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("methods", &self.methods.len())
            .field("has_constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Builder for [`ClassInfo`].
pub struct ClassBuilder {
    info: ClassInfo,
}

impl ClassBuilder {
    fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            info: ClassInfo {
                name: name.into(),
                kind,
                interfaces: Vec::new(),
                methods: Vec::new(),
                constructor: None,
            },
        }
    }

    /// Declares a method.
    pub fn method(mut self, name: impl Into<String>, params: Vec<TypeRef>, ret: TypeRef) -> Self {
        self.info.methods.push(MethodSig::new(name, params, ret));
        self
    }

    /// Adds an extended interface.
    pub fn extends(mut self, interface: Arc<ClassInfo>) -> Self {
        self.info.interfaces.push(interface);
        self
    }

    /// Registers the zero-argument constructor.
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Any + Send + Sync>, String> + Send + Sync + 'static,
    {
        self.info.constructor = Some(Arc::new(constructor));
        self
    }

    /// Registers `T::default` as the zero-argument constructor.
    pub fn default_constructor<T>(self) -> Self
    where
        T: Default + Any + Send + Sync,
    {
        self.constructor(|| Ok(Box::new(T::default()) as Box<dyn Any + Send + Sync>))
    }

    pub fn build(self) -> Arc<ClassInfo> {
        Arc::new(self.info)
    }
}

/// Concurrent index of known classes by fully-qualified name.
#[derive(Default)]
pub struct ClassCatalog {
    classes: DashMap<String, Arc<ClassInfo>>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a class, returning the one it replaced.
    pub fn register(&self, info: Arc<ClassInfo>) -> Option<Arc<ClassInfo>> {
        debug!(class = info.name(), kind = ?info.kind(), "Registered class");
        self.classes.insert(info.name().to_string(), info)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassInfo>> {
        self.classes.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Replaces unresolved class names (including array base types) with
    /// their catalog entries where one exists.
    ///
    /// Names that are not catalog entries are read the way the descriptor
    /// codec reads them, so `int[][]` resolves to a two-dimensional `int`
    /// array and `La/B;` to the class `a.B`.
    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Unresolved(name) => match self.get(name) {
                Some(info) => TypeRef::Class(info),
                None => parse_type_descriptor(&type_descriptor(ty), self).unwrap_or_else(|| ty.clone()),
            },
            TypeRef::Array(component) => TypeRef::array_of(self.resolve(component)),
            _ => ty.clone(),
        }
    }
}

impl fmt::Debug for ClassCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCatalog")
            .field("classes", &self.classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_method_searches_super_interfaces() {
        let base = ClassInfo::interface("com.example.Base")
            .method("id", vec![], TypeRef::INT)
            .build();
        let child = ClassInfo::interface("com.example.Child")
            .extends(base)
            .method("name", vec![TypeRef::INT], TypeRef::named("java.lang.String"))
            .build();

        assert!(child.find_method("name", 1).is_some());
        assert!(child.find_method("id", 0).is_some());
        assert!(child.find_method("id", 1).is_none());
        assert!(child.declares(&MethodSig::new("id", vec![], TypeRef::INT)));
    }

    #[test]
    fn test_catalog_resolves_names_inside_arrays() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassInfo::concrete("com.example.Unit").build());

        let resolved = catalog.resolve(&TypeRef::array_of(TypeRef::named("com.example.Unit")));
        let (dimensions, base) = resolved.unwrap_array();
        assert_eq!(dimensions, 1);
        assert!(base.class_info().is_some());

        let unknown = catalog.resolve(&TypeRef::named("com.example.Missing"));
        assert!(matches!(unknown, TypeRef::Unresolved(_)));
    }

    #[test]
    fn test_catalog_resolves_source_form_names() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassInfo::interface("com.example.Unit").build());

        let matrix = catalog.resolve(&TypeRef::named("int[][]"));
        assert_eq!(matrix.unwrap_array(), (2, &TypeRef::INT));

        let units = catalog.resolve(&TypeRef::named("com.example.Unit[]"));
        let (dimensions, base) = units.unwrap_array();
        assert_eq!(dimensions, 1);
        assert!(base.class_info().is_some_and(|info| info.is_interface()));

        let encoded = catalog.resolve(&TypeRef::named("Lcom/example/Unit;"));
        assert!(encoded.class_info().is_some());

        assert_eq!(catalog.resolve(&TypeRef::named("long")), TypeRef::LONG);
    }

    #[test]
    fn test_register_replaces() {
        let catalog = ClassCatalog::new();
        assert!(catalog.register(ClassInfo::concrete("a.B").build()).is_none());
        let previous = catalog.register(ClassInfo::abstract_class("a.B").build());
        assert_eq!(previous.map(|p| p.kind()), Some(ClassKind::Concrete));
        assert_eq!(catalog.get("a.B").map(|c| c.kind()), Some(ClassKind::Abstract));
        assert_eq!(catalog.len(), 1);
    }
}
