use std::fmt::Display;

/// Represents a primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// The string type.
    String,

    /// A number type.
    Number,

    /// A boolean type.
    Boolean,

    /// The type of `null`.
    Null,

    /// The type of `undefined`.
    Undefined,

    /// A unit type (ie, void).
    Void,

    /// The any type (`*` in documentation comments).
    Any,

    /// The unknown type (`?` in documentation comments). It is printed as `any` since the
    /// documentation convention treats it as unchecked rather than as a top type.
    Unknown,
}

/// A field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    /// The name of the field.
    pub name: String,

    /// The type of the field, if one was declared.
    pub ty: Option<TypeAnnotation>,
}

/// Represents a type expression attached to a declaration site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    /// A primitive type.
    Primitive(Primitive),

    /// A reference to a named type, possibly qualified (ie, `goog.dom.Foo`).
    Named(String),

    /// A type that also admits `null`.
    Nullable(Box<TypeAnnotation>),

    /// A union of several types.
    Union(Vec<TypeAnnotation>),

    /// An array of elements of the given type.
    Array(Box<TypeAnnotation>),

    /// An object shape.
    Record(Vec<RecordField>),

    /// A parameterized type (ie, `Object<string, number>`).
    Generic {
        /// The parameterized type.
        base: String,

        /// The type arguments.
        args: Vec<TypeAnnotation>,
    },

    /// A function type.
    Function {
        /// The parameter types, in order.
        params: Vec<TypeAnnotation>,

        /// The return type.
        returns: Box<TypeAnnotation>,
    },

    /// Marks a parameter as taking any number of arguments of the given type.
    Variadic(Box<TypeAnnotation>),

    /// Marks a parameter as optional.
    Optional(Box<TypeAnnotation>),
}

impl TypeAnnotation {
    /// Shorthand for [`TypeAnnotation::Primitive`].
    pub fn primitive(p: Primitive) -> Self {
        TypeAnnotation::Primitive(p)
    }

    /// Whether the root of this type is the variadic marker.
    pub fn is_variadic(&self) -> bool {
        matches!(self, TypeAnnotation::Variadic(_))
    }

    fn needs_parens_as_element(&self) -> bool {
        matches!(
            self,
            TypeAnnotation::Union(_)
                | TypeAnnotation::Nullable(_)
                | TypeAnnotation::Function { .. }
                | TypeAnnotation::Optional(_)
        )
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Primitive::String => write!(f, "string"),
            Primitive::Number => write!(f, "number"),
            Primitive::Boolean => write!(f, "boolean"),
            Primitive::Null => write!(f, "null"),
            Primitive::Undefined => write!(f, "undefined"),
            Primitive::Void => write!(f, "void"),
            Primitive::Any | Primitive::Unknown => write!(f, "any"),
        }
    }
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAnnotation::Primitive(p) => write!(f, "{}", p),
            TypeAnnotation::Named(name) => write!(f, "{}", name),
            TypeAnnotation::Nullable(inner) => write!(f, "null | {}", inner),
            TypeAnnotation::Union(members) => {
                let mut first = true;
                for member in members {
                    if first {
                        first = false;
                    } else {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
            TypeAnnotation::Array(element) if element.needs_parens_as_element() => {
                write!(f, "({})[]", element)
            }
            TypeAnnotation::Array(element) => write!(f, "{}[]", element),
            TypeAnnotation::Record(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    match &field.ty {
                        Some(ty) => write!(f, "{}: {}", field.name, ty)?,
                        None => write!(f, "{}", field.name)?,
                    }
                }
                write!(f, "}}")
            }
            TypeAnnotation::Generic { base, args } => {
                write!(f, "{}<", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            TypeAnnotation::Function { params, returns } => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let n = i + 1;
                    match param {
                        TypeAnnotation::Variadic(inner)
                            if **inner == TypeAnnotation::Primitive(Primitive::Any) =>
                        {
                            write!(f, "...p{}", n)?
                        }
                        TypeAnnotation::Variadic(inner) => write!(f, "...p{}: {}", n, inner)?,
                        TypeAnnotation::Optional(inner) => write!(f, "p{}?: {}", n, inner)?,
                        _ => write!(f, "p{}: {}", n, param)?,
                    }
                }
                write!(f, ") => {}", returns)
            }
            TypeAnnotation::Variadic(inner) => write!(f, "...{}", inner),
            TypeAnnotation::Optional(inner) => write!(f, "{} | undefined", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> TypeAnnotation {
        TypeAnnotation::Named(name.to_string())
    }

    #[test]
    fn primitives() {
        assert_eq!(TypeAnnotation::primitive(Primitive::Boolean).to_string(), "boolean");
        assert_eq!(TypeAnnotation::primitive(Primitive::Unknown).to_string(), "any");
        assert_eq!(TypeAnnotation::primitive(Primitive::Undefined).to_string(), "undefined");
    }

    #[test]
    fn array_of_union_is_parenthesized() {
        let ty = TypeAnnotation::Array(Box::new(TypeAnnotation::Union(vec![
            TypeAnnotation::primitive(Primitive::Number),
            TypeAnnotation::primitive(Primitive::String),
        ])));
        assert_eq!(ty.to_string(), "(number | string)[]");
    }

    #[test]
    fn function_type_names_its_parameters() {
        let ty = TypeAnnotation::Function {
            params: vec![
                named("Event"),
                TypeAnnotation::Optional(Box::new(TypeAnnotation::primitive(Primitive::Number))),
                TypeAnnotation::Variadic(Box::new(TypeAnnotation::primitive(Primitive::Any))),
            ],
            returns: Box::new(TypeAnnotation::primitive(Primitive::Void)),
        };
        assert_eq!(ty.to_string(), "(p1: Event, p2?: number, ...p3) => void");
    }

    #[test]
    fn record_fields_without_types() {
        let ty = TypeAnnotation::Record(vec![
            RecordField {
                name: "x".to_string(),
                ty: Some(TypeAnnotation::primitive(Primitive::Number)),
            },
            RecordField {
                name: "label".to_string(),
                ty: None,
            },
        ]);
        assert_eq!(ty.to_string(), "{x: number; label}");
    }
}
