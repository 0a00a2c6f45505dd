//! Descriptor codec
//!
//! Descriptors are the only identity the registry knows. A type encodes as
//! a primitive code (`I`, `Z`, `V`, ...), `L<internal/name>;` for classes, or
//! `[` followed by the component descriptor for arrays. A method encodes as
//! its owner's type descriptor, the method name, then `(params)ret`:
//!
//! ```text
//! Lcom/example/Foo;bar(I)I
//! Lcom/example/Sink;accept([Ljava/lang/String;J)V
//! ```
//!
//! Encoding never fails. Names that arrive without full metadata are encoded
//! on a best-effort basis so that the same input always yields the same key.

use crate::class::{ClassCatalog, MethodSig};
use crate::types::{Primitive, TypeRef};

/// Placeholder written for a class with an empty name
const UNKNOWN_CLASS: &str = "?";

/// Single-character code of a primitive.
pub fn primitive_code(primitive: Primitive) -> char {
    match primitive {
        Primitive::Boolean => 'Z',
        Primitive::Byte => 'B',
        Primitive::Char => 'C',
        Primitive::Short => 'S',
        Primitive::Int => 'I',
        Primitive::Long => 'J',
        Primitive::Float => 'F',
        Primitive::Double => 'D',
        Primitive::Void => 'V',
    }
}

/// Primitive for a single-character code.
pub fn primitive_from_code(code: char) -> Option<Primitive> {
    Some(match code {
        'Z' => Primitive::Boolean,
        'B' => Primitive::Byte,
        'C' => Primitive::Char,
        'S' => Primitive::Short,
        'I' => Primitive::Int,
        'J' => Primitive::Long,
        'F' => Primitive::Float,
        'D' => Primitive::Double,
        'V' => Primitive::Void,
        _ => return None,
    })
}

fn primitive_from_name(name: &str) -> Option<Primitive> {
    Some(match name {
        "boolean" => Primitive::Boolean,
        "byte" => Primitive::Byte,
        "char" => Primitive::Char,
        "short" => Primitive::Short,
        "int" => Primitive::Int,
        "long" => Primitive::Long,
        "float" => Primitive::Float,
        "double" => Primitive::Double,
        "void" => Primitive::Void,
        _ => return None,
    })
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a type shape.
pub fn type_descriptor(ty: &TypeRef) -> String {
    let mut out = String::new();
    write_type(&mut out, ty);
    out
}

/// Encodes `(params)ret` for a signature.
pub fn signature_descriptor(signature: &MethodSig) -> String {
    let mut out = String::from("(");
    for param in &signature.params {
        write_type(&mut out, param);
    }
    out.push(')');
    write_type(&mut out, &signature.ret);
    out
}

/// Encodes a method on `owner`.
pub fn method_descriptor(owner: &TypeRef, signature: &MethodSig) -> String {
    bind_method(&type_descriptor(owner), signature)
}

/// Appends a method's name and signature to an already encoded owner.
pub fn bind_method(owner_descriptor: &str, signature: &MethodSig) -> String {
    let mut out = String::with_capacity(owner_descriptor.len() + signature.name.len() + 8);
    out.push_str(owner_descriptor);
    out.push_str(&signature.name);
    out.push_str(&signature_descriptor(signature));
    out
}

fn write_type(out: &mut String, ty: &TypeRef) {
    match ty {
        TypeRef::Primitive(p) => out.push(primitive_code(*p)),
        TypeRef::Class(info) => write_class(out, info.name()),
        TypeRef::Unresolved(name) => write_unresolved(out, name),
        TypeRef::Array(component) => {
            out.push('[');
            write_type(out, component);
        }
    }
}

fn write_class(out: &mut String, name: &str) {
    let name = name.trim();
    out.push('L');
    if name.is_empty() {
        out.push_str(UNKNOWN_CLASS);
    } else {
        for ch in name.chars() {
            out.push(match ch {
                '.' => '/',
                ';' | '[' | '(' | ')' => '_',
                other => other,
            });
        }
    }
    out.push(';');
}

/// Unresolved names may come in source form (`int[]`, `com.a.B[]`) or
/// already encoded (`Lcom/a/B;`); both land on the canonical encoding.
fn write_unresolved(out: &mut String, name: &str) {
    let mut base = name.trim();
    while let Some(stripped) = base.strip_suffix("[]") {
        out.push('[');
        base = stripped.trim_end();
    }

    if let Some(internal) = base
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .filter(|internal| !internal.is_empty())
    {
        write_class(out, internal);
    } else if let Some(primitive) = primitive_from_name(base) {
        out.push(primitive_code(primitive));
    } else {
        write_class(out, base);
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// A method shape decoded from a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodShape {
    pub owner: TypeRef,
    pub name: String,
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
}

impl MethodShape {
    pub fn signature(&self) -> MethodSig {
        MethodSig::new(self.name.clone(), self.params.clone(), self.ret.clone())
    }
}

/// Decodes a complete type descriptor, resolving class names through
/// `catalog`. Returns `None` for malformed input.
pub fn parse_type_descriptor(text: &str, catalog: &ClassCatalog) -> Option<TypeRef> {
    parse_complete_type(text, Some(catalog))
}

/// Decodes a method descriptor. Returns `None` for malformed input or for
/// descriptors that only name a type.
pub fn parse_method_descriptor(text: &str, catalog: &ClassCatalog) -> Option<MethodShape> {
    parse_method(text, Some(catalog))
}

/// Return type of a method descriptor, with class names left unresolved.
pub fn method_return_type(text: &str) -> Option<TypeRef> {
    parse_method(text, None).map(|shape| shape.ret)
}

fn parse_complete_type(text: &str, catalog: Option<&ClassCatalog>) -> Option<TypeRef> {
    match parse_type(text, catalog)? {
        (ty, "") => Some(ty),
        _ => None,
    }
}

fn parse_method(text: &str, catalog: Option<&ClassCatalog>) -> Option<MethodShape> {
    if !text.starts_with('L') {
        return None;
    }
    let (owner, rest) = parse_type(text, catalog)?;

    let open = rest.find('(')?;
    let name = &rest[..open];
    if name.is_empty() || name.contains([';', ')', '[']) {
        return None;
    }

    let mut rest = &rest[open + 1..];
    let mut params = Vec::new();
    while !rest.starts_with(')') {
        let (param, remaining) = parse_type(rest, catalog)?;
        if param == TypeRef::VOID {
            return None;
        }
        params.push(param);
        rest = remaining;
    }

    let ret = parse_complete_type(&rest[1..], catalog)?;
    Some(MethodShape {
        owner,
        name: name.to_string(),
        params,
        ret,
    })
}

fn parse_type<'a>(text: &'a str, catalog: Option<&ClassCatalog>) -> Option<(TypeRef, &'a str)> {
    let dimensions = text.len() - text.trim_start_matches('[').len();
    let text = &text[dimensions..];

    let (mut ty, rest) = match text.chars().next()? {
        'L' => {
            let end = text.find(';')?;
            let internal = &text[1..end];
            if internal.is_empty() {
                return None;
            }
            let name = internal.replace('/', ".");
            let ty = match catalog.and_then(|catalog| catalog.get(&name)) {
                Some(info) => TypeRef::Class(info),
                None => TypeRef::Unresolved(name),
            };
            (ty, &text[end + 1..])
        }
        code => {
            let primitive = primitive_from_code(code)?;
            if dimensions > 0 && primitive == Primitive::Void {
                return None;
            }
            (TypeRef::Primitive(primitive), &text[code.len_utf8()..])
        }
    };

    for _ in 0..dimensions {
        ty = TypeRef::array_of(ty);
    }
    Some((ty, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassInfo;

    #[test]
    fn test_encoding_is_deterministic() {
        let foo = ClassInfo::concrete("com.example.Foo").build();
        let types = [
            TypeRef::INT,
            TypeRef::class(foo),
            TypeRef::named("com.example.Bar"),
            TypeRef::array_of(TypeRef::array_of(TypeRef::DOUBLE)),
        ];
        for ty in &types {
            assert_eq!(type_descriptor(ty), type_descriptor(&ty.clone()));
        }
        assert_eq!(type_descriptor(&types[1]), "Lcom/example/Foo;");
        assert_eq!(type_descriptor(&types[3]), "[[D");
    }

    #[test]
    fn test_resolved_and_unresolved_encode_identically() {
        let info = ClassInfo::interface("com.example.Listener").build();
        assert_eq!(
            type_descriptor(&TypeRef::class(info)),
            type_descriptor(&TypeRef::named("com.example.Listener"))
        );
    }

    #[test]
    fn test_method_descriptor_layout() {
        let sig = MethodSig::new(
            "accept",
            vec![TypeRef::array_of(TypeRef::named("java.lang.String")), TypeRef::LONG],
            TypeRef::VOID,
        );
        assert_eq!(
            method_descriptor(&TypeRef::named("com.example.Sink"), &sig),
            "Lcom/example/Sink;accept([Ljava/lang/String;J)V"
        );
        assert_eq!(signature_descriptor(&MethodSig::new("m", vec![], TypeRef::INT)), "()I");
    }

    #[test]
    fn test_best_effort_names() {
        assert_eq!(type_descriptor(&TypeRef::named("")), "L?;");
        assert_eq!(type_descriptor(&TypeRef::named("int[][]")), "[[I");
        assert_eq!(type_descriptor(&TypeRef::named("a.B[]")), "[La/B;");
        assert_eq!(type_descriptor(&TypeRef::named("La/B;")), "La/B;");
        assert_eq!(type_descriptor(&TypeRef::named("weird;name")), "Lweird_name;");
    }

    #[test]
    fn test_parse_method_descriptor() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassInfo::interface("com.example.Sink").build());

        let shape = parse_method_descriptor("Lcom/example/Sink;accept([Ljava/lang/String;J)Z", &catalog)
            .expect("well-formed descriptor");
        assert!(shape.owner.class_info().is_some());
        assert_eq!(shape.name, "accept");
        assert_eq!(
            shape.params,
            vec![TypeRef::array_of(TypeRef::named("java.lang.String")), TypeRef::LONG]
        );
        assert_eq!(shape.ret, TypeRef::BOOLEAN);
        assert_eq!(
            method_descriptor(&shape.owner, &shape.signature()),
            "Lcom/example/Sink;accept([Ljava/lang/String;J)Z"
        );
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let catalog = ClassCatalog::new();
        for text in ["", "Q", "L;", "Lcom/Foo", "[V", "[[", "Foo#bar(int)", "Lcom/Foo;(I)V", "La/B;m(V)V", "La/B;m(I"] {
            assert!(parse_method_descriptor(text, &catalog).is_none(), "{text}");
        }
        assert!(parse_type_descriptor("II", &catalog).is_none());
        assert_eq!(parse_type_descriptor("[[I", &catalog), Some(TypeRef::array_of(TypeRef::array_of(TypeRef::INT))));
    }

    #[test]
    fn test_method_return_type() {
        assert_eq!(method_return_type("La/B;m(I)[J"), Some(TypeRef::array_of(TypeRef::LONG)));
        assert_eq!(method_return_type("La/B;m()La/C;"), Some(TypeRef::named("a.C")));
        assert_eq!(method_return_type("La/B;"), None);
    }
}
