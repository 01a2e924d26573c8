use std::fmt::{Display, Formatter, Result};

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::types::TypeAnnotation;

/// Prints a single node of a tree. Obtained from [`SyntaxTree::display`].
pub struct NodeDisplay<'a> {
    tree: &'a SyntaxTree,
    node: NodeId,
}

impl SyntaxTree {
    /// Returns a printable view of the subtree at `node`.
    pub fn display(&self, node: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { tree: self, node }
    }
}

/// Prints the program in TypeScript syntax, one top-level statement per line.
impl Display for SyntaxTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let printer = Printer { tree: self };
        for &statement in self.children(self.root()) {
            printer.statement(f, statement)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let printer = Printer { tree: self.tree };
        match self.tree.kind(self.node) {
            NodeKind::Program => write!(f, "{}", self.tree),
            kind if is_statement(kind) => printer.statement(f, self.node),
            _ => printer.expression(f, self.node),
        }
    }
}

fn is_statement(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::VarDecl(_)
            | NodeKind::ExpressionStatement
            | NodeKind::Return
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Block
            | NodeKind::ClassDecl
            | NodeKind::Throw
    )
}

/// Writes a string as a single-quoted JavaScript literal.
pub(crate) fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

struct Printer<'a> {
    tree: &'a SyntaxTree,
}

impl<'a> Printer<'a> {
    fn statement(&self, f: &mut Formatter<'_>, id: NodeId) -> Result {
        let tree = self.tree;
        let children = tree.children(id);
        match tree.kind(id) {
            NodeKind::VarDecl(keyword) => {
                write!(f, "{} ", keyword)?;
                for (i, &var) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.expression(f, var)?;
                    self.type_suffix(f, var)?;
                    if let Some(init) = tree.first_child(var) {
                        write!(f, " = ")?;
                        self.expression(f, init)?;
                    }
                }
                write!(f, ";")
            }

            NodeKind::FunctionDecl => self.function(f, id, "function"),
            NodeKind::ClassDecl => self.class(f, id),
            NodeKind::Block => self.block(f, id),
            NodeKind::Empty => write!(f, ";"),

            NodeKind::Return => {
                write!(f, "return")?;
                if let Some(&value) = children.first() {
                    write!(f, " ")?;
                    self.expression(f, value)?;
                }
                write!(f, ";")
            }

            NodeKind::If => {
                write!(f, "if (")?;
                self.expression(f, children[0])?;
                write!(f, ") ")?;
                self.statement(f, children[1])?;
                if let Some(&elsy) = children.get(2) {
                    write!(f, " else ")?;
                    self.statement(f, elsy)?;
                }
                Ok(())
            }

            NodeKind::While => {
                write!(f, "while (")?;
                self.expression(f, children[0])?;
                write!(f, ") ")?;
                self.statement(f, children[1])
            }

            NodeKind::Throw => {
                write!(f, "throw ")?;
                self.expression(f, children[0])?;
                write!(f, ";")
            }

            NodeKind::ExpressionStatement => {
                // A leading `{` would read as a block.
                if *tree.kind(children[0]) == NodeKind::ObjectLit {
                    write!(f, "(")?;
                    self.expression(f, children[0])?;
                    return write!(f, ");");
                }
                self.expression(f, children[0])?;
                if matches!(
                    tree.kind(children[0]),
                    NodeKind::Name(_) | NodeKind::PropertyAccess(_)
                ) {
                    self.type_suffix(f, children[0])?;
                }
                write!(f, ";")
            }

            _ => {
                self.expression(f, id)?;
                write!(f, ";")
            }
        }
    }

    fn block(&self, f: &mut Formatter<'_>, id: NodeId) -> Result {
        let statements = self.tree.children(id);
        if statements.is_empty() {
            return write!(f, "{{}}");
        }
        write!(f, "{{")?;
        for &statement in statements {
            write!(f, " ")?;
            self.statement(f, statement)?;
        }
        write!(f, " }}")
    }

    /// Prints `<keyword> name(params): R { body }`. Members pass their name as the keyword.
    fn function(&self, f: &mut Formatter<'_>, id: NodeId, keyword: &str) -> Result {
        let tree = self.tree;
        let children = tree.children(id);
        write!(f, "{}", keyword)?;
        if let NodeKind::Name(name) = tree.kind(children[0]) {
            if !name.is_empty() {
                write!(f, " {}", name)?;
            }
        }

        write!(f, "(")?;
        for (i, &param) in tree.children(children[1]).iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            self.parameter(f, param)?;
        }
        write!(f, ")")?;
        self.type_suffix(f, id)?;
        write!(f, " ")?;
        self.block(f, children[2])
    }

    fn parameter(&self, f: &mut Formatter<'_>, id: NodeId) -> Result {
        let declared = self.tree.declared_type(id);
        match (self.tree.kind(id), declared) {
            (NodeKind::RestParam(name), Some(TypeAnnotation::Variadic(element))) => {
                write!(f, "...{}: {}", name, element)
            }
            (NodeKind::RestParam(name), Some(ty)) => write!(f, "...{}: {}", name, ty),
            (NodeKind::RestParam(name), None) => write!(f, "...{}", name),
            (NodeKind::Name(name), Some(TypeAnnotation::Optional(inner))) => {
                write!(f, "{}?: {}", name, inner)
            }
            (NodeKind::Name(name), Some(ty)) => write!(f, "{}: {}", name, ty),
            _ => self.expression(f, id),
        }
    }

    fn class(&self, f: &mut Formatter<'_>, id: NodeId) -> Result {
        let tree = self.tree;
        let children = tree.children(id);
        write!(f, "class")?;
        if let NodeKind::Name(name) = tree.kind(children[0]) {
            write!(f, " {}", name)?;
        }
        if *tree.kind(children[1]) != NodeKind::Empty {
            write!(f, " extends ")?;
            self.expression(f, children[1])?;
        }

        let members = tree.children(children[2]);
        if members.is_empty() {
            return write!(f, " {{}}");
        }
        write!(f, " {{")?;
        for &member in members {
            write!(f, " ")?;
            match (tree.kind(member), tree.first_child(member)) {
                (NodeKind::MemberFunction(name), Some(function)) => {
                    self.function(f, function, name)?
                }
                _ => self.statement(f, member)?,
            }
        }
        write!(f, " }}")
    }

    fn type_suffix(&self, f: &mut Formatter<'_>, id: NodeId) -> Result {
        match self.tree.declared_type(id) {
            Some(ty) => write!(f, ": {}", ty),
            None => Ok(()),
        }
    }

    /// Prints a child expression, parenthesizing anything that is not atomic.
    fn operand(&self, f: &mut Formatter<'_>, id: NodeId) -> Result {
        match self.tree.kind(id) {
            NodeKind::Binary(_)
            | NodeKind::Assignment(_)
            | NodeKind::Unary(_)
            | NodeKind::Conditional
            | NodeKind::FunctionDecl
            | NodeKind::ClassDecl
            | NodeKind::New => {
                write!(f, "(")?;
                self.expression(f, id)?;
                write!(f, ")")
            }
            _ => self.expression(f, id),
        }
    }

    fn arguments(&self, f: &mut Formatter<'_>, args: &[NodeId]) -> Result {
        write!(f, "(")?;
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            self.expression(f, arg)?;
        }
        write!(f, ")")
    }

    fn expression(&self, f: &mut Formatter<'_>, id: NodeId) -> Result {
        let tree = self.tree;
        let children = tree.children(id);
        match tree.kind(id) {
            NodeKind::Name(name) | NodeKind::RestParam(name) => write!(f, "{}", name),
            NodeKind::This => write!(f, "this"),
            NodeKind::Null => write!(f, "null"),
            NodeKind::BoolLit(b) => write!(f, "{}", b),
            NodeKind::NumberLit(n) => write!(f, "{}", n),
            NodeKind::StringLit(s) => write!(f, "{}", quote(s)),

            NodeKind::Conditional => {
                self.operand(f, children[0])?;
                write!(f, " ? ")?;
                self.operand(f, children[1])?;
                write!(f, " : ")?;
                self.operand(f, children[2])
            }

            NodeKind::ArrayLit => {
                write!(f, "[")?;
                for (i, &element) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.expression(f, element)?;
                }
                // A trailing hole needs its own comma.
                if children.last().map_or(false, |&e| *tree.kind(e) == NodeKind::Empty) {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }

            NodeKind::ObjectLit => {
                if children.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{")?;
                for (i, &prop) in children.iter().enumerate() {
                    write!(f, "{}", if i > 0 { ", " } else { " " })?;
                    if let NodeKind::Property(key) = tree.kind(prop) {
                        write!(f, "{}: ", key)?;
                    }
                    if let Some(value) = tree.first_child(prop) {
                        self.expression(f, value)?;
                    }
                }
                write!(f, " }}")
            }

            NodeKind::PropertyAccess(prop) => {
                self.operand(f, children[0])?;
                write!(f, ".{}", prop)
            }

            NodeKind::Assignment(op) => {
                self.expression(f, children[0])?;
                self.type_suffix(f, children[0])?;
                write!(f, " {} ", op)?;
                self.expression(f, children[1])
            }

            NodeKind::Unary(op) => {
                write!(f, "{}", op)?;
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    write!(f, " ")?;
                }
                self.operand(f, children[0])
            }

            NodeKind::Binary(op) => {
                self.operand(f, children[0])?;
                write!(f, " {} ", op)?;
                self.operand(f, children[1])
            }

            NodeKind::Call => {
                self.operand(f, children[0])?;
                self.arguments(f, &children[1..])
            }

            NodeKind::New => {
                write!(f, "new ")?;
                self.operand(f, children[0])?;
                self.arguments(f, &children[1..])
            }

            NodeKind::FunctionDecl => self.function(f, id, "function"),
            NodeKind::ClassDecl => self.class(f, id),
            NodeKind::Empty => Ok(()),

            _ => self.statement(f, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::parse_helper;

    fn round_trip(source: &str) -> String {
        parse_helper(source).to_string().trim_end().to_string()
    }

    #[test]
    fn statements() {
        assert_eq!(round_trip("var x = 3, y;"), "var x = 3, y;");
        assert_eq!(round_trip("const z = 'it\\'s';"), "const z = 'it\\'s';");
        assert_eq!(
            round_trip("if (a) { b(); } else c = new D(1, null);"),
            "if (a) { b(); } else c = new D(1, null);"
        );
        assert_eq!(round_trip("while (x < 3) x += 1;"), "while (x < 3) x += 1;");
    }

    #[test]
    fn functions() {
        assert_eq!(round_trip("function f(a, b) {}"), "function f(a, b) {}");
        assert_eq!(
            round_trip("var f = function(b) { return !b; };"),
            "var f = function(b) { return !b; };"
        );
        assert_eq!(
            round_trip("function g(...rest) { return typeof rest; }"),
            "function g(...rest) { return typeof rest; }"
        );
    }

    #[test]
    fn grouping_is_explicit() {
        assert_eq!(round_trip("x = (a + b) * c;"), "x = (a + b) * c;");
        assert_eq!(round_trip("x = a + b * c;"), "x = a + (b * c);");
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            round_trip("var s = 'a\\nb\\r\\u2028c\\\\';"),
            "var s = 'a\\nb\\r\\u2028c\\\\';"
        );
    }

    #[test]
    fn literals_and_conditionals() {
        assert_eq!(
            round_trip("this.items = [1, , x];\nthis.m = {a: 1, 'b c': d, e};\nthis.e = {};"),
            "this.items = [1, , x];\nthis.m = { a: 1, 'b c': d, e: e };\nthis.e = {};"
        );
        assert_eq!(round_trip("x = [a, ];"), "x = [a];");
        assert_eq!(round_trip("x = [a, , ];"), "x = [a, ,];");
        assert_eq!(
            round_trip("throw c ? a + 1 : (b ? d : e);"),
            "throw c ? (a + 1) : (b ? d : e);"
        );
    }

    #[test]
    fn one_line_per_statement() {
        assert_eq!(parse_helper("a();\nb();").to_string(), "a();\nb();\n");
    }
}
