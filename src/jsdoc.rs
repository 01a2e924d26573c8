use indexmap::IndexMap;
use tracing::warn;

use crate::error::JsDocError;

/// A type expression as written in a documentation comment, before it is turned into a
/// [`crate::types::TypeAnnotation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocType {
    /// `*`
    Star,

    /// `?`
    Unknown,

    /// A type name, possibly qualified (ie, `string`, `goog.dom.Foo`).
    Name(String),

    /// `?T`
    Nullable(Box<DocType>),

    /// `!T`
    NonNullable(Box<DocType>),

    /// `T=`
    Optional(Box<DocType>),

    /// `...T`, or a bare `...`.
    Rest(Option<Box<DocType>>),

    /// `(A|B)`
    Union(Vec<DocType>),

    /// `Base.<A, B>`
    Generic {
        /// The parameterized type.
        base: String,

        /// The type arguments.
        args: Vec<DocType>,
    },

    /// `{a: T, b}`
    Record(Vec<(String, Option<DocType>)>),

    /// `function(this:T, A, B=):R`
    Function {
        /// The `this:` or `new:` type, if any.
        context: Option<Box<DocType>>,

        /// The parameter types.
        params: Vec<DocType>,

        /// The declared return type.
        returns: Option<Box<DocType>>,
    },
}

impl DocType {
    /// Whether the root of this type is the variadic marker.
    pub fn is_rest(&self) -> bool {
        matches!(self, DocType::Rest(_))
    }
}

/// The information carried by a documentation comment on a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocInfo {
    /// The declared type (`@type`).
    pub ty: Option<DocType>,

    /// The declared return type (`@return`).
    pub return_type: Option<DocType>,

    /// Declared parameter types (`@param`), in the order they were written.
    pub params: IndexMap<String, DocType>,

    /// Whether the declaration is marked `@constructor`.
    pub is_constructor: bool,

    /// Whether the declaration is marked `@interface`.
    pub is_interface: bool,
}

impl DocInfo {
    /// Returns the declared type of the named parameter.
    pub fn parameter_type(&self, name: &str) -> Option<&DocType> {
        self.params.get(name)
    }
}

/// Whether the text of a block comment (without `/*` and `*/`) is a documentation comment.
pub fn is_jsdoc(comment: &str) -> bool {
    comment.starts_with('*') && !comment.starts_with("**")
}

/// Reads the tags of a documentation comment. Malformed type expressions are reported and their
/// tag is dropped.
pub fn parse_jsdoc(comment: &str) -> DocInfo {
    let mut info = DocInfo::default();
    let bytes = comment.as_bytes();
    let mut pos = 0;

    while let Some(offset) = comment[pos..].find('@') {
        let at = pos + offset;
        pos = at + 1;
        if at > 0 && !matches!(bytes[at - 1], b' ' | b'\t' | b'\n' | b'\r' | b'*') {
            continue;
        }

        let tag_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let tag = &comment[tag_start..pos];

        match tag {
            "constructor" => info.is_constructor = true,
            "interface" => info.is_interface = true,
            "type" | "param" | "return" | "returns" => {
                let Some((expr, end)) = braced_type(comment, pos) else {
                    continue;
                };
                pos = end;
                let ty = match parse_type_expression(&expr) {
                    Ok(ty) => ty,
                    Err(e) => {
                        warn!("dropping @{}: {}", tag, e);
                        continue;
                    }
                };

                match tag {
                    "type" => info.ty = Some(ty),
                    "param" => {
                        let (name, end) = param_name(comment, pos);
                        pos = end;
                        if name.is_empty() {
                            warn!("{}", JsDocError::MissingParamName { ty: expr });
                        } else {
                            info.params.insert(name, ty);
                        }
                    }
                    _ => info.return_type = Some(ty),
                }
            }
            _ => (),
        }
    }

    info
}

/// Reads a `{...}` group starting at or after `pos`, returning its contents with line prefixes
/// removed and the position after the closing brace.
fn braced_type(comment: &str, mut pos: usize) -> Option<(String, usize)> {
    let bytes = comment.as_bytes();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'{') {
        return None;
    }

    let start = pos + 1;
    let mut depth = 0;
    for (i, &b) in bytes.iter().enumerate().skip(pos) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let expr = comment[start..i]
                        .lines()
                        .map(|line| line.trim().trim_start_matches('*').trim())
                        .collect::<Vec<_>>()
                        .join(" ");
                    return Some((expr, i + 1));
                }
            }
            _ => (),
        }
    }

    warn!("{}", JsDocError::Unterminated { offset: pos });
    None
}

fn param_name(comment: &str, mut pos: usize) -> (String, usize) {
    let bytes = comment.as_bytes();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    let start = pos;
    while pos < bytes.len() && is_ident_part(bytes[pos]) {
        pos += 1;
    }
    (comment[start..pos].to_string(), pos)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Parses a type expression, the part between the braces of `@type {...}`.
pub fn parse_type_expression(expr: &str) -> Result<DocType, JsDocError> {
    let mut parser = TypeParser { expr, pos: 0 };
    let ty = parser.top_level()?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(ty),
        Some(_) => Err(parser.unexpected()),
    }
}

struct TypeParser<'a> {
    expr: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn peek(&self) -> Option<u8> {
        self.expr.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.expr.as_bytes().get(self.pos + ahead).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().map_or(false, |b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.expr[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), JsDocError> {
        self.skip_ws();
        if self.eat(b) {
            Ok(())
        } else {
            Err(JsDocError::Expected {
                expr: self.expr.to_string(),
                offset: self.pos,
                expected: b as char,
            })
        }
    }

    fn unexpected(&self) -> JsDocError {
        let found = match self.expr[self.pos..].chars().next() {
            Some(c) => format!("`{}`", c),
            None => "end of input".to_string(),
        };
        JsDocError::Unexpected {
            expr: self.expr.to_string(),
            offset: self.pos,
            found,
        }
    }

    fn starts_type(&mut self) -> bool {
        self.skip_ws();
        match self.peek() {
            Some(b'?' | b'!' | b'*' | b'(' | b'{') => true,
            Some(b) => is_ident_start(b),
            None => false,
        }
    }

    /// A type as it appears at the top of an annotation or as a parameter of a function type,
    /// where `...T` and `T=` are allowed.
    fn top_level(&mut self) -> Result<DocType, JsDocError> {
        self.skip_ws();
        if self.eat_str("...") {
            if !self.starts_type() {
                return Ok(DocType::Rest(None));
            }
            return Ok(DocType::Rest(Some(Box::new(self.union()?))));
        }

        let ty = self.union()?;
        self.skip_ws();
        if self.eat(b'=') {
            Ok(DocType::Optional(Box::new(ty)))
        } else {
            Ok(ty)
        }
    }

    fn union(&mut self) -> Result<DocType, JsDocError> {
        let mut members = vec![self.prefixed()?];
        loop {
            self.skip_ws();
            if !self.eat(b'|') {
                break;
            }
            members.push(self.prefixed()?);
        }

        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(DocType::Union(members))
        }
    }

    fn prefixed(&mut self) -> Result<DocType, JsDocError> {
        self.skip_ws();
        match self.peek() {
            Some(b'?') => {
                self.pos += 1;
                if self.starts_type() {
                    Ok(DocType::Nullable(Box::new(self.prefixed()?)))
                } else {
                    Ok(DocType::Unknown)
                }
            }
            Some(b'!') => {
                self.pos += 1;
                Ok(DocType::NonNullable(Box::new(self.prefixed()?)))
            }
            Some(b'*') => {
                self.pos += 1;
                Ok(DocType::Star)
            }
            Some(b'(') => {
                self.pos += 1;
                let ty = self.union()?;
                self.expect(b')')?;
                Ok(ty)
            }
            Some(b'{') => {
                self.pos += 1;
                self.record()
            }
            Some(b) if is_ident_start(b) => {
                let name = self.name();
                self.skip_ws();
                if name == "function" && self.peek() == Some(b'(') {
                    self.function()
                } else {
                    self.type_arguments(name)
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_ident_part(b) || (b == b'.' && self.peek_at(1) != Some(b'<')) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.expr[start..self.pos].to_string()
    }

    fn type_arguments(&mut self, base: String) -> Result<DocType, JsDocError> {
        if !self.eat_str(".<") && !self.eat(b'<') {
            return Ok(DocType::Name(base));
        }

        let mut args = vec![self.top_level()?];
        loop {
            self.skip_ws();
            if !self.eat(b',') {
                break;
            }
            args.push(self.top_level()?);
        }
        self.expect(b'>')?;
        Ok(DocType::Generic { base, args })
    }

    fn record(&mut self) -> Result<DocType, JsDocError> {
        let mut fields = Vec::new();
        self.skip_ws();
        if self.eat(b'}') {
            return Ok(DocType::Record(fields));
        }

        loop {
            self.skip_ws();
            let key = self.name();
            if key.is_empty() {
                return Err(self.unexpected());
            }
            self.skip_ws();
            let ty = if self.eat(b':') {
                Some(self.top_level()?)
            } else {
                None
            };
            fields.push((key, ty));

            self.skip_ws();
            if !self.eat(b',') {
                break;
            }
        }
        self.expect(b'}')?;
        Ok(DocType::Record(fields))
    }

    fn function(&mut self) -> Result<DocType, JsDocError> {
        self.expect(b'(')?;
        let mut context = None;
        let mut params = Vec::new();

        self.skip_ws();
        if !self.eat(b')') {
            loop {
                self.skip_ws();
                if self.eat_str("this:") || self.eat_str("new:") {
                    context = Some(Box::new(self.union()?));
                } else {
                    params.push(self.top_level()?);
                }
                self.skip_ws();
                if !self.eat(b',') {
                    break;
                }
            }
            self.expect(b')')?;
        }

        self.skip_ws();
        let returns = if self.eat(b':') {
            Some(Box::new(self.prefixed()?))
        } else {
            None
        };

        Ok(DocType::Function {
            context,
            params,
            returns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> DocType {
        DocType::Name(n.to_string())
    }

    #[test]
    fn tags() {
        let info = parse_jsdoc("* @param {number} n @param {string} s @return {boolean} ");
        assert_eq!(info.parameter_type("n"), Some(&name("number")));
        assert_eq!(info.parameter_type("s"), Some(&name("string")));
        assert_eq!(info.return_type, Some(name("boolean")));
        assert_eq!(info.ty, None);
        assert!(!info.is_constructor);
    }

    #[test]
    fn multiline_comment() {
        let info = parse_jsdoc(
            "*\n * A shape, see {@link Circle}.\n * Mail shapes@example.com.\n * @interface\n * @struct\n ",
        );
        assert!(info.is_interface);
        assert!(!info.is_constructor);
        assert!(info.params.is_empty());
    }

    #[test]
    fn params_keep_declaration_order() {
        let info = parse_jsdoc("* @param {string} b\n * @param {number} a\n * @param {*} c ");
        let names: Vec<_> = info.params.keys().map(String::as_str).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn malformed_type_is_dropped() {
        let info = parse_jsdoc("* @type {Array.<string} @constructor ");
        assert_eq!(info.ty, None);
        assert!(info.is_constructor);
    }

    #[test]
    fn prefixes_and_suffixes() {
        assert_eq!(parse_type_expression("*"), Ok(DocType::Star));
        assert_eq!(parse_type_expression("?"), Ok(DocType::Unknown));
        assert_eq!(
            parse_type_expression("?string"),
            Ok(DocType::Nullable(Box::new(name("string"))))
        );
        assert_eq!(
            parse_type_expression("!number"),
            Ok(DocType::NonNullable(Box::new(name("number"))))
        );
        assert_eq!(
            parse_type_expression("goog.dom.Foo="),
            Ok(DocType::Optional(Box::new(name("goog.dom.Foo"))))
        );
        assert_eq!(
            parse_type_expression("...*"),
            Ok(DocType::Rest(Some(Box::new(DocType::Star))))
        );
    }

    #[test]
    fn generics_and_unions() {
        assert_eq!(
            parse_type_expression("Object.<string, number>"),
            Ok(DocType::Generic {
                base: "Object".to_string(),
                args: vec![name("string"), name("number")],
            })
        );
        assert_eq!(
            parse_type_expression("!Array.<!$jscomp.typecheck.Checker>"),
            Ok(DocType::NonNullable(Box::new(DocType::Generic {
                base: "Array".to_string(),
                args: vec![DocType::NonNullable(Box::new(name("$jscomp.typecheck.Checker")))],
            })))
        );
        assert_eq!(
            parse_type_expression("(number|boolean)"),
            Ok(DocType::Union(vec![name("number"), name("boolean")]))
        );
    }

    #[test]
    fn records() {
        assert_eq!(
            parse_type_expression("{myNum: number, myObject}"),
            Ok(DocType::Record(vec![
                ("myNum".to_string(), Some(name("number"))),
                ("myObject".to_string(), None),
            ]))
        );
        assert_eq!(parse_type_expression("{}"), Ok(DocType::Record(vec![])));
    }

    #[test]
    fn functions() {
        assert_eq!(
            parse_type_expression("function(string,number):boolean"),
            Ok(DocType::Function {
                context: None,
                params: vec![name("string"), name("number")],
                returns: Some(Box::new(name("boolean"))),
            })
        );
        assert_eq!(
            parse_type_expression("function(this:T, ...)"),
            Ok(DocType::Function {
                context: Some(Box::new(name("T"))),
                params: vec![DocType::Rest(None)],
                returns: None,
            })
        );
    }

    #[test]
    fn errors() {
        assert!(matches!(
            parse_type_expression("Array.<string"),
            Err(JsDocError::Expected { expected: '>', .. })
        ));
        assert!(matches!(
            parse_type_expression("number]"),
            Err(JsDocError::Unexpected { offset: 6, .. })
        ));
        assert!(parse_type_expression("").is_err());
    }
}
