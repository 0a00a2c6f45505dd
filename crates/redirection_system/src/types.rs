//! Runtime value and type model
//!
//! Intercepted call sites exchange [`Value`]s with handlers and describe the
//! shapes involved with [`TypeRef`]s. Class shapes carry their [`ClassInfo`]
//! so the synthesizer can tell interfaces, abstract classes and concrete
//! classes apart without any other lookup.

use crate::class::ClassInfo;
use crate::descriptor::type_descriptor;
use crate::proxy::InterfaceProxy;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Types
// ============================================================================

/// Primitive value types, including `void` for method returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    /// Source-level name of the primitive (`int`, `boolean`, ...)
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }
}

/// The shape of a type as seen by a call site.
#[derive(Clone)]
pub enum TypeRef {
    /// A primitive or `void`
    Primitive(Primitive),
    /// A class or interface with full metadata
    Class(Arc<ClassInfo>),
    /// A class known only by name; the host had no metadata for it
    Unresolved(String),
    /// An array of the component type
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub const BOOLEAN: TypeRef = TypeRef::Primitive(Primitive::Boolean);
    pub const BYTE: TypeRef = TypeRef::Primitive(Primitive::Byte);
    pub const CHAR: TypeRef = TypeRef::Primitive(Primitive::Char);
    pub const SHORT: TypeRef = TypeRef::Primitive(Primitive::Short);
    pub const INT: TypeRef = TypeRef::Primitive(Primitive::Int);
    pub const LONG: TypeRef = TypeRef::Primitive(Primitive::Long);
    pub const FLOAT: TypeRef = TypeRef::Primitive(Primitive::Float);
    pub const DOUBLE: TypeRef = TypeRef::Primitive(Primitive::Double);
    pub const VOID: TypeRef = TypeRef::Primitive(Primitive::Void);

    /// A class type backed by metadata
    pub fn class(info: Arc<ClassInfo>) -> Self {
        TypeRef::Class(info)
    }

    /// A class type known only by its fully-qualified name
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Unresolved(name.into())
    }

    /// An array whose elements are `component`
    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    /// Returns `true` for array types.
    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// Returns `true` for primitives and `void`.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// The component type of an array, one layer down.
    pub fn component(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Strips array layers one at a time until a non-array type is reached.
    ///
    /// Returns the number of layers removed together with the base type.
    /// Non-array types yield `(0, self)`.
    pub fn unwrap_array(&self) -> (usize, &TypeRef) {
        let mut dimensions = 0;
        let mut current = self;
        while let TypeRef::Array(component) = current {
            dimensions += 1;
            current = component;
        }
        (dimensions, current)
    }

    /// Class metadata, if this is a resolved class type.
    pub fn class_info(&self) -> Option<&Arc<ClassInfo>> {
        match self {
            TypeRef::Class(info) => Some(info),
            _ => None,
        }
    }

    /// Human-readable name (`int[][]`, `com.example.Foo`)
    pub fn name(&self) -> String {
        match self {
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Class(info) => info.name().to_string(),
            TypeRef::Unresolved(name) => name.clone(),
            TypeRef::Array(component) => format!("{}[]", component.name()),
        }
    }
}

impl PartialEq for TypeRef {
    /// Two types are equal exactly when they encode to the same descriptor,
    /// whether or not their class metadata was available.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Primitive(a), TypeRef::Primitive(b)) => a == b,
            (TypeRef::Array(a), TypeRef::Array(b)) => a == b,
            _ => type_descriptor(self) == type_descriptor(other),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ============================================================================
// Values
// ============================================================================

/// A dynamically typed value passed through redirected calls.
#[derive(Clone, Debug)]
pub enum Value {
    /// The null reference
    Null,
    /// Result of a `void` method
    Void,
    Bool(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Arc<str>),
    Array(Arc<ArrayValue>),
    Object(Arc<Instance>),
    Proxy(Arc<InterfaceProxy>),
}

impl Value {
    /// The zero value a field or return slot of type `ty` holds by default:
    /// `false`/`0` for primitives, `Void` for `void`, `Null` for references.
    pub fn default_for(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Primitive(p) => match p {
                Primitive::Boolean => Value::Bool(false),
                Primitive::Byte => Value::Byte(0),
                Primitive::Char => Value::Char(0),
                Primitive::Short => Value::Short(0),
                Primitive::Int => Value::Int(0),
                Primitive::Long => Value::Long(0),
                Primitive::Float => Value::Float(0.0),
                Primitive::Double => Value::Double(0.0),
                Primitive::Void => Value::Void,
            },
            _ => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            Value::Int(i) => Some(i64::from(*i)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Arc<ArrayValue>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<Instance>> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&Arc<InterfaceProxy>> {
        match self {
            Value::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Void => "void",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Proxy(_) => "proxy",
        }
    }
}

impl PartialEq for Value {
    /// Scalars and strings compare by value, arrays by content, objects and
    /// proxies by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Proxy(a), Value::Proxy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<ArrayValue> for Value {
    fn from(value: ArrayValue) -> Self {
        Value::Array(Arc::new(value))
    }
}

/// An array value with its component type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    component: TypeRef,
    elements: Vec<Value>,
}

impl ArrayValue {
    pub fn new(component: TypeRef, elements: Vec<Value>) -> Self {
        Self {
            component,
            elements,
        }
    }

    /// A zero-length array of the given array type.
    ///
    /// Returns `None` when `array_type` is not an array.
    pub fn empty_of(array_type: &TypeRef) -> Option<Self> {
        let component = array_type.component()?.clone();
        Some(Self::new(component, Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Element type one layer down (`int[]` for an `int[][]`)
    pub fn component_type(&self) -> &TypeRef {
        &self.component
    }

    /// Fully unwrapped element type (`int` for an `int[][]`)
    pub fn base_type(&self) -> &TypeRef {
        self.component.unwrap_array().1
    }

    /// Number of array layers, at least 1
    pub fn dimensions(&self) -> usize {
        1 + self.component.unwrap_array().0
    }

    /// The array's own type
    pub fn array_type(&self) -> TypeRef {
        TypeRef::array_of(self.component.clone())
    }
}

/// An object instance produced by a registered constructor.
pub struct Instance {
    class: Arc<ClassInfo>,
    state: Box<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new(class: Arc<ClassInfo>, state: Box<dyn Any + Send + Sync>) -> Self {
        Self { class, state }
    }

    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    /// Borrows the instance state as `T`, if it is one.
    pub fn state<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_follows_descriptor() {
        let odd = TypeRef::class(ClassInfo::concrete("int").build());
        assert_ne!(odd, TypeRef::named("int"));
        assert_eq!(type_descriptor(&odd), "Lint;");

        assert_eq!(TypeRef::named("int"), TypeRef::INT);
        assert_eq!(TypeRef::named("int[][]"), TypeRef::array_of(TypeRef::array_of(TypeRef::INT)));
        assert_eq!(
            TypeRef::class(ClassInfo::interface("a.B").build()),
            TypeRef::named("a.B")
        );
        assert_ne!(TypeRef::named("a.B"), TypeRef::named("a.C"));
    }

    #[test]
    fn test_unwrap_array_counts_layers() {
        let ty = TypeRef::array_of(TypeRef::array_of(TypeRef::array_of(TypeRef::LONG)));
        let (dimensions, base) = ty.unwrap_array();
        assert_eq!(dimensions, 3);
        assert_eq!(base, &TypeRef::LONG);

        let (dimensions, base) = TypeRef::INT.unwrap_array();
        assert_eq!(dimensions, 0);
        assert_eq!(base, &TypeRef::INT);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(TypeRef::array_of(TypeRef::array_of(TypeRef::INT)).name(), "int[][]");
        assert_eq!(TypeRef::named("com.example.Foo").to_string(), "com.example.Foo");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(Value::default_for(&TypeRef::INT), Value::Int(0));
        assert_eq!(Value::default_for(&TypeRef::BOOLEAN), Value::Bool(false));
        assert_eq!(Value::default_for(&TypeRef::VOID), Value::Void);
        assert_eq!(Value::default_for(&TypeRef::named("a.B")), Value::Null);
    }

    #[test]
    fn test_empty_array_shape() {
        let ty = TypeRef::array_of(TypeRef::array_of(TypeRef::INT));
        let array = ArrayValue::empty_of(&ty).unwrap();
        assert!(array.is_empty());
        assert_eq!(array.dimensions(), 2);
        assert_eq!(array.component_type(), &TypeRef::array_of(TypeRef::INT));
        assert_eq!(array.base_type(), &TypeRef::INT);
        assert_eq!(array.array_type(), ty);

        assert!(ArrayValue::empty_of(&TypeRef::INT).is_none());
    }
}
