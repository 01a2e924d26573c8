use crate::jsdoc::DocType;
use crate::types::{Primitive, RecordField, TypeAnnotation};

/// Converts a documentation type into the type expression attached to a declaration site.
/// Absent in, absent out.
pub fn convert(doc: Option<&DocType>) -> Option<TypeAnnotation> {
    doc.map(convert_type)
}

fn convert_type(doc: &DocType) -> TypeAnnotation {
    match doc {
        DocType::Star => TypeAnnotation::Primitive(Primitive::Any),
        DocType::Unknown => TypeAnnotation::Primitive(Primitive::Unknown),
        DocType::Name(name) => named_type(name),

        // Object types are non-nullable already.
        DocType::NonNullable(inner) => convert_type(inner),
        DocType::Nullable(inner) => TypeAnnotation::Nullable(Box::new(convert_type(inner))),
        DocType::Optional(inner) => TypeAnnotation::Optional(Box::new(convert_type(inner))),

        DocType::Rest(inner) => TypeAnnotation::Variadic(Box::new(
            inner
                .as_deref()
                .map_or(TypeAnnotation::Primitive(Primitive::Any), convert_type),
        )),

        DocType::Union(members) => TypeAnnotation::Union(members.iter().map(convert_type).collect()),

        DocType::Generic { base, args } if base == "Array" => match args.as_slice() {
            [element] => TypeAnnotation::Array(Box::new(convert_type(element))),
            _ => generic(base, args),
        },
        DocType::Generic { base, args } => generic(base, args),

        DocType::Record(fields) => TypeAnnotation::Record(
            fields
                .iter()
                .map(|(name, ty)| RecordField {
                    name: name.clone(),
                    ty: ty.as_ref().map(convert_type),
                })
                .collect(),
        ),

        DocType::Function {
            params, returns, ..
        } => TypeAnnotation::Function {
            params: params.iter().map(convert_type).collect(),
            returns: Box::new(
                returns
                    .as_deref()
                    .map_or(TypeAnnotation::Primitive(Primitive::Any), convert_type),
            ),
        },
    }
}

fn generic(base: &str, args: &[DocType]) -> TypeAnnotation {
    TypeAnnotation::Generic {
        base: base.to_string(),
        args: args.iter().map(convert_type).collect(),
    }
}

fn named_type(name: &str) -> TypeAnnotation {
    match name {
        "string" => TypeAnnotation::Primitive(Primitive::String),
        "number" => TypeAnnotation::Primitive(Primitive::Number),
        "boolean" => TypeAnnotation::Primitive(Primitive::Boolean),
        "null" => TypeAnnotation::Primitive(Primitive::Null),
        "undefined" => TypeAnnotation::Primitive(Primitive::Undefined),
        "void" => TypeAnnotation::Primitive(Primitive::Void),
        "Array" => TypeAnnotation::Array(Box::new(TypeAnnotation::Primitive(Primitive::Any))),
        _ => TypeAnnotation::Named(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsdoc::parse_type_expression;

    fn convert_str(expr: &str) -> String {
        let doc = parse_type_expression(expr).expect("bad type expression");
        convert(Some(&doc)).expect("conversion is total").to_string()
    }

    #[test]
    fn absent() {
        assert_eq!(convert(None), None);
    }

    #[test]
    fn primitives() {
        assert_eq!(convert_str("string"), "string");
        assert_eq!(convert_str("undefined"), "undefined");
        assert_eq!(convert_str("null"), "null");
        assert_eq!(convert_str("*"), "any");
        assert_eq!(convert_str("?"), "any");
    }

    #[test]
    fn nullability() {
        assert_eq!(convert_str("?string"), "null | string");
        assert_eq!(convert_str("!number"), "number");
    }

    #[test]
    fn arrays_and_generics() {
        assert_eq!(convert_str("Array.<string>"), "string[]");
        assert_eq!(convert_str("!Array.<!$jscomp.typecheck.Checker>"), "$jscomp.typecheck.Checker[]");
        assert_eq!(convert_str("Array"), "any[]");
        assert_eq!(convert_str("MyCollection.<string>"), "MyCollection<string>");
        assert_eq!(convert_str("Object.<string, number>"), "Object<string, number>");
    }

    #[test]
    fn structural_types() {
        assert_eq!(convert_str("(number|boolean)"), "number | boolean");
        assert_eq!(convert_str("{myNum: number, myObject}"), "{myNum: number; myObject}");
        assert_eq!(
            convert_str("function(string,number):boolean"),
            "(p1: string, p2: number) => boolean"
        );
        assert_eq!(convert_str("function(this:T, ...)"), "(...p1) => any");
    }

    #[test]
    fn variadic_marker() {
        let doc = parse_type_expression("...*").unwrap();
        let ty = convert(Some(&doc)).unwrap();
        assert!(ty.is_variadic());
        assert_eq!(
            ty,
            TypeAnnotation::Variadic(Box::new(TypeAnnotation::Primitive(Primitive::Any)))
        );

        let doc = parse_type_expression("...").unwrap();
        assert!(convert(Some(&doc)).unwrap().is_variadic());
    }

    #[test]
    fn optional() {
        let doc = parse_type_expression("goog.dom.Foo=").unwrap();
        assert_eq!(
            convert(Some(&doc)),
            Some(TypeAnnotation::Optional(Box::new(TypeAnnotation::Named(
                "goog.dom.Foo".to_string()
            ))))
        );
    }
}
