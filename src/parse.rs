use swc_common::comments::{CommentKind, Comments, SingleThreadedComments};
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceFile, SourceMap, Span, Spanned};
use swc_ecma_ast::{
    Callee, Decl, Expr, ExprOrSpread, Function, Ident, Lit, MemberProp, ModuleItem, Pat, PatOrExpr,
    Prop, PropName, PropOrSpread, Stmt, VarDeclKind,
};
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{Parser, StringInput, Syntax};

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::error::FrontendError;
use crate::jsdoc::{is_jsdoc, parse_jsdoc, DocInfo};
use crate::print::quote;

/// Parses JavaScript source and converts it into a [`SyntaxTree`], attaching documentation
/// comments to the declarations they precede.
pub fn parse_source(file_name: &str, source: &str) -> Result<SyntaxTree, FrontendError> {
    let cm = Lrc::<SourceMap>::default();
    let fm = cm.new_source_file(FileName::Custom(file_name.to_string()), source.to_string());
    parse_source_file(&fm)
}

/// Like [`parse_source`], for a file already registered in a [`SourceMap`], so that error
/// spans can be rendered against it.
pub fn parse_source_file(fm: &SourceFile) -> Result<SyntaxTree, FrontendError> {
    let comments = SingleThreadedComments::default();
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        Default::default(),
        StringInput::from(fm),
        Some(&comments),
    );

    let mut parser = Parser::new_from(lexer);
    let module = parser.parse_module().map_err(parse_error)?;
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(parse_error(e));
    }

    parse(module.body, &comments)
}

fn parse_error(e: swc_ecma_parser::error::Error) -> FrontendError {
    FrontendError::Parse {
        message: format!("{:?}", e.kind()),
        span: e.span(),
    }
}

/// Converts a [`swc_ecma_ast`] module body into a [`SyntaxTree`]. Leading `/** ... */` comments
/// found in `comments` become documentation records on the declaration that follows them.
///
/// # Example
/// ```rs
/// # use swc_ecma_parser::Parser;
/// # use jsdoc2ts::parse;
/// # fn testy(parser: Parser, comments: &SingleThreadedComments) -> Result<SyntaxTree, ()> {
/// let module = parser.parse_module()?;
/// let tree = parse::parse(module.body, comments)?;
/// println!("{}", tree);
/// # Ok()
/// # }
/// ```
pub fn parse(
    module: Vec<ModuleItem>,
    comments: &SingleThreadedComments,
) -> Result<SyntaxTree, FrontendError> {
    let mut lowering = Lowering {
        tree: SyntaxTree::new(),
        comments,
    };
    let root = lowering.tree.root();

    for item in module {
        match item {
            ModuleItem::ModuleDecl(decl) => {
                return Err(FrontendError::Unsupported {
                    construct: "module declaration",
                    span: decl.span(),
                })
            }
            ModuleItem::Stmt(statement) => {
                if let Some(node) = lowering.walk_statement(statement)? {
                    lowering.tree.add_child_to_back(root, node);
                }
            }
        }
    }

    Ok(lowering.tree)
}

struct Lowering<'a> {
    tree: SyntaxTree,
    comments: &'a SingleThreadedComments,
}

fn unsupported<T>(construct: &'static str, span: Span) -> Result<T, FrontendError> {
    Err(FrontendError::Unsupported { construct, span })
}

impl<'a> Lowering<'a> {
    fn node(&mut self, kind: NodeKind, span: Span, children: &[NodeId]) -> NodeId {
        self.tree.new_node_with_children(kind, Some(span), children)
    }

    /// The documentation comment directly in front of `span`, if any.
    fn leading_doc(&self, span: Span) -> Option<DocInfo> {
        let leading = self.comments.get_leading(span.lo)?;
        leading
            .iter()
            .rev()
            .find(|c| matches!(c.kind, CommentKind::Block) && is_jsdoc(&c.text))
            .map(|c| parse_jsdoc(&c.text))
    }

    fn walk_statement(&mut self, statement: Stmt) -> Result<Option<NodeId>, FrontendError> {
        let span = statement.span();
        let doc = self.leading_doc(span);

        let node = match statement {
            Stmt::Block(block) => {
                let mut children = Vec::new();
                for stat in block.stmts {
                    children.extend(self.walk_statement(stat)?);
                }
                self.node(NodeKind::Block, span, &children)
            }

            Stmt::Empty(_) => return Ok(None),

            Stmt::Return(ret) => {
                let mut value = Vec::new();
                if let Some(arg) = ret.arg {
                    value.push(self.walk_expression(*arg)?);
                }
                self.node(NodeKind::Return, span, &value)
            }

            Stmt::If(if_) => {
                let cond = self.walk_expression(*if_.test)?;
                let then = self.walk_statement_or_empty(*if_.cons)?;
                let mut children = vec![cond, then];
                if let Some(elsy) = if_.alt {
                    children.push(self.walk_statement_or_empty(*elsy)?);
                }
                self.node(NodeKind::If, span, &children)
            }

            Stmt::While(while_) => {
                let cond = self.walk_expression(*while_.test)?;
                let body = self.walk_statement_or_empty(*while_.body)?;
                self.node(NodeKind::While, span, &[cond, body])
            }

            Stmt::Decl(Decl::Fn(decl)) => {
                let function = self.walk_function(Some(decl.ident), *decl.function)?;
                if let Some(doc) = doc {
                    self.tree.set_doc(function, doc);
                }
                function
            }

            Stmt::Decl(Decl::Var(decl)) => {
                let keyword = match decl.kind {
                    VarDeclKind::Var => "var",
                    VarDeclKind::Let => "let",
                    VarDeclKind::Const => "const",
                };
                let mut vars = Vec::new();
                for decl in decl.decls {
                    match decl.name {
                        Pat::Ident(name) => {
                            let mut init = Vec::new();
                            if let Some(v) = decl.init {
                                init.push(self.walk_expression(*v)?);
                            }
                            vars.push(self.node(
                                NodeKind::Name(name.id.sym.to_string()),
                                name.id.span,
                                &init,
                            ));
                        }

                        other => return unsupported("destructuring declaration", other.span()),
                    }
                }

                let var = self.node(NodeKind::VarDecl(keyword), span, &vars);
                if let Some(doc) = doc {
                    self.tree.set_doc(var, doc);
                }
                var
            }

            Stmt::Decl(Decl::Class(_)) => return unsupported("class declaration", span),
            Stmt::Decl(_) => return unsupported("TypeScript declaration", span),

            Stmt::Expr(e) => {
                let expr = self.walk_expression(*e.expr)?;
                // `/** @type {T} */ a.b = c;` and `/** @type {T} */ a.b;` document the expression.
                if let Some(doc) = doc {
                    if matches!(
                        self.tree.kind(expr),
                        NodeKind::Assignment(_) | NodeKind::Name(_) | NodeKind::PropertyAccess(_)
                    ) {
                        self.tree.set_doc(expr, doc);
                    }
                }
                self.node(NodeKind::ExpressionStatement, span, &[expr])
            }

            Stmt::Throw(throw) => {
                let value = self.walk_expression(*throw.arg)?;
                self.node(NodeKind::Throw, span, &[value])
            }

            Stmt::Debugger(_) => return unsupported("debugger statement", span),
            Stmt::With(_) => return unsupported("with statement", span),
            Stmt::Labeled(_) => return unsupported("labeled statement", span),
            Stmt::Break(_) => return unsupported("break statement", span),
            Stmt::Continue(_) => return unsupported("continue statement", span),
            Stmt::Switch(_) => return unsupported("switch statement", span),
            Stmt::Try(_) => return unsupported("try statement", span),
            Stmt::DoWhile(_) => return unsupported("do-while loop", span),
            Stmt::For(_) | Stmt::ForIn(_) | Stmt::ForOf(_) => return unsupported("for loop", span),
        };

        Ok(Some(node))
    }

    fn walk_statement_or_empty(&mut self, statement: Stmt) -> Result<NodeId, FrontendError> {
        let span = statement.span();
        match self.walk_statement(statement)? {
            Some(node) => Ok(node),
            None => Ok(self.node(NodeKind::Empty, span, &[])),
        }
    }

    fn walk_function(
        &mut self,
        ident: Option<Ident>,
        function: Function,
    ) -> Result<NodeId, FrontendError> {
        if function.is_async || function.is_generator {
            return unsupported("async or generator function", function.span);
        }

        let name = match ident {
            Some(ident) => self.node(NodeKind::Name(ident.sym.to_string()), ident.span, &[]),
            None => self.tree.new_node(NodeKind::Name(String::new()), None),
        };

        let mut params = Vec::new();
        for param in function.params {
            let node = match param.pat {
                Pat::Ident(name) => {
                    self.node(NodeKind::Name(name.id.sym.to_string()), name.id.span, &[])
                }
                Pat::Rest(rest) => match *rest.arg {
                    Pat::Ident(name) => {
                        self.node(NodeKind::RestParam(name.id.sym.to_string()), rest.span, &[])
                    }
                    other => return unsupported("destructuring parameter", other.span()),
                },
                other => return unsupported("destructuring parameter", other.span()),
            };
            params.push(node);
        }
        let params = self.tree.new_node_with_children(NodeKind::ParamList, None, &params);

        let mut statements = Vec::new();
        let body_span = match function.body {
            Some(body) => {
                for stat in body.stmts {
                    statements.extend(self.walk_statement(stat)?);
                }
                body.span
            }
            None => function.span,
        };
        let body = self.node(NodeKind::Block, body_span, &statements);

        let function_node = self.tree.function(name, params, body);
        self.tree.node_mut(function_node).span = Some(function.span);
        Ok(function_node)
    }

    fn walk_arguments(&mut self, args: Vec<ExprOrSpread>) -> Result<Vec<NodeId>, FrontendError> {
        let mut result = Vec::new();
        for arg in args {
            if let Some(spread) = arg.spread {
                return unsupported("spread argument", spread);
            }
            result.push(self.walk_expression(*arg.expr)?);
        }
        Ok(result)
    }

    fn walk_expression(&mut self, expression: Expr) -> Result<NodeId, FrontendError> {
        let span = expression.span();

        let node = match expression {
            Expr::This(_) => self.node(NodeKind::This, span, &[]),

            Expr::Ident(var) => self.node(NodeKind::Name(var.sym.to_string()), span, &[]),

            Expr::Lit(lit) => match lit {
                Lit::Str(s) => self.node(NodeKind::StringLit(s.value.to_string()), span, &[]),
                Lit::Bool(b) => self.node(NodeKind::BoolLit(b.value), span, &[]),
                Lit::Null(_) => self.node(NodeKind::Null, span, &[]),
                Lit::Num(n) => self.node(NodeKind::NumberLit(n.value), span, &[]),
                _ => return unsupported("literal", span),
            },

            Expr::Paren(paren) => return self.walk_expression(*paren.expr),

            Expr::Unary(unary) => {
                let value = self.walk_expression(*unary.arg)?;
                self.node(NodeKind::Unary(unary.op.to_string()), span, &[value])
            }

            Expr::Bin(bin) => {
                let left = self.walk_expression(*bin.left)?;
                let right = self.walk_expression(*bin.right)?;
                self.node(NodeKind::Binary(bin.op.to_string()), span, &[left, right])
            }

            Expr::Assign(assign) => {
                let target = match assign.left {
                    PatOrExpr::Expr(target) => self.walk_expression(*target)?,
                    PatOrExpr::Pat(target) => match *target {
                        Pat::Ident(var) => {
                            self.node(NodeKind::Name(var.id.sym.to_string()), var.id.span, &[])
                        }
                        Pat::Expr(target) => self.walk_expression(*target)?,
                        other => return unsupported("destructuring assignment", other.span()),
                    },
                };
                let value = self.walk_expression(*assign.right)?;
                self.node(NodeKind::Assignment(assign.op.to_string()), span, &[target, value])
            }

            Expr::Member(member) => match member.prop {
                MemberProp::Ident(prop) => {
                    let object = self.walk_expression(*member.obj)?;
                    self.node(NodeKind::PropertyAccess(prop.sym.to_string()), span, &[object])
                }
                _ => return unsupported("computed or private member access", span),
            },

            Expr::Call(call) => {
                let callee = match call.callee {
                    Callee::Expr(callee) => self.walk_expression(*callee)?,
                    _ => return unsupported("super or import call", span),
                };
                let mut children = vec![callee];
                children.extend(self.walk_arguments(call.args)?);
                self.node(NodeKind::Call, span, &children)
            }

            Expr::New(new) => {
                let mut children = vec![self.walk_expression(*new.callee)?];
                children.extend(self.walk_arguments(new.args.unwrap_or_default())?);
                self.node(NodeKind::New, span, &children)
            }

            Expr::Fn(function) => self.walk_function(function.ident, *function.function)?,

            Expr::Cond(cond) => {
                let test = self.walk_expression(*cond.test)?;
                let then = self.walk_expression(*cond.cons)?;
                let elsy = self.walk_expression(*cond.alt)?;
                self.node(NodeKind::Conditional, span, &[test, then, elsy])
            }

            Expr::Array(array) => {
                let mut elements = Vec::new();
                for element in array.elems {
                    let node = match element {
                        Some(ExprOrSpread {
                            spread: Some(spread),
                            ..
                        }) => return unsupported("spread element", spread),
                        Some(element) => self.walk_expression(*element.expr)?,
                        None => self.tree.new_node(NodeKind::Empty, None),
                    };
                    elements.push(node);
                }
                self.node(NodeKind::ArrayLit, span, &elements)
            }

            Expr::Object(object) => {
                let mut props = Vec::new();
                for prop in object.props {
                    let prop = match prop {
                        PropOrSpread::Prop(prop) => *prop,
                        PropOrSpread::Spread(spread) => {
                            return unsupported("spread property", spread.dot3_token)
                        }
                    };
                    let prop_span = prop.span();
                    let (key, value) = match prop {
                        Prop::KeyValue(kv) => {
                            let key = match kv.key {
                                PropName::Ident(ident) => ident.sym.to_string(),
                                PropName::Str(s) => quote(&s.value),
                                PropName::Num(n) => n.value.to_string(),
                                other => return unsupported("computed property", other.span()),
                            };
                            (key, self.walk_expression(*kv.value)?)
                        }
                        Prop::Shorthand(ident) => {
                            let value =
                                self.node(NodeKind::Name(ident.sym.to_string()), ident.span, &[]);
                            (ident.sym.to_string(), value)
                        }
                        _ => return unsupported("accessor or method property", prop_span),
                    };
                    props.push(self.node(NodeKind::Property(key), prop_span, &[value]));
                }
                self.node(NodeKind::ObjectLit, span, &props)
            }

            _ => return unsupported("expression", span),
        };

        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsdoc::DocType;
    use crate::testing::parse_helper;

    #[test]
    fn var_declarations() {
        let tree = parse_helper("/** @type {string} */ var x = 3, y;");
        let var = tree.first_child(tree.root()).unwrap();
        assert_eq!(tree.kind(var), &NodeKind::VarDecl("var"));
        assert_eq!(tree.children(var).len(), 2);
        let x = tree.first_child(var).unwrap();
        assert_eq!(tree.kind(x), &NodeKind::Name("x".to_string()));
        assert_eq!(tree.kind(tree.first_child(x).unwrap()), &NodeKind::NumberLit(3.0));
        assert_eq!(
            tree.doc(var).and_then(|doc| doc.ty.clone()),
            Some(DocType::Name("string".to_string()))
        );
    }

    #[test]
    fn function_layout() {
        let tree = parse_helper("/** @return {boolean} */ function b(p, ...rest) { return !p; }");
        let function = tree.first_child(tree.root()).unwrap();
        assert_eq!(tree.kind(function), &NodeKind::FunctionDecl);
        assert!(tree.doc(function).is_some());

        let name = tree.child(function, 0).unwrap();
        let params = tree.child(function, 1).unwrap();
        let body = tree.child(function, 2).unwrap();
        assert_eq!(tree.kind(name), &NodeKind::Name("b".to_string()));
        let params: Vec<_> = tree.children(params).iter().map(|&p| tree.kind(p).clone()).collect();
        assert_eq!(
            params,
            vec![NodeKind::Name("p".to_string()), NodeKind::RestParam("rest".to_string())]
        );
        assert_eq!(tree.kind(tree.first_child(body).unwrap()), &NodeKind::Return);
    }

    #[test]
    fn prototype_assignment() {
        let tree = parse_helper("/** @return {number} */ C.prototype.m = function() {};");
        let statement = tree.first_child(tree.root()).unwrap();
        assert!(tree.is_prototype_property_declaration(statement));

        let assign = tree.first_child(statement).unwrap();
        assert!(tree.doc(assign).is_some());
        let target = tree.first_child(assign).unwrap();
        assert_eq!(tree.prototype_class_name(target).as_deref(), Some("C"));
        assert_eq!(tree.prototype_property_name(target), Some("m"));
    }

    #[test]
    fn plain_comments_are_not_documentation() {
        let tree = parse_helper("/* @constructor */ var C = function() {};\n// @interface\nvar D;");
        let root = tree.root();
        for &statement in tree.children(root) {
            assert!(tree.doc(statement).is_none());
        }
    }

    #[test]
    fn nested_statements() {
        let tree = parse_helper("if (a) { b(); } else c = new D(1, 'two');\nwhile (x < 3) x = x + 1;");
        let root = tree.root();
        let kinds: Vec<_> = tree.children(root).iter().map(|&s| tree.kind(s).clone()).collect();
        assert_eq!(kinds, vec![NodeKind::If, NodeKind::While]);
    }

    #[test]
    fn literals_and_conditionals() {
        let tree = parse_helper("this.items = [1, , x];\nthis.m = {a: 1, 'b c': d, e};\nthrow c ? a : b;");
        let root = tree.root();
        let kinds: Vec<_> = tree
            .children(root)
            .iter()
            .map(|&s| {
                let expr = tree.first_child(s).unwrap();
                match tree.kind(expr) {
                    NodeKind::Assignment(_) => tree.kind(tree.child(expr, 1).unwrap()).clone(),
                    other => other.clone(),
                }
            })
            .collect();
        assert_eq!(
            kinds,
            vec![NodeKind::ArrayLit, NodeKind::ObjectLit, NodeKind::Conditional]
        );
        assert_eq!(tree.kind(tree.children(root)[2]), &NodeKind::Throw);

        let object = tree.find_all(|n| n.kind == NodeKind::ObjectLit)[0];
        let keys: Vec<_> = tree
            .children(object)
            .iter()
            .map(|&p| tree.kind(p).clone())
            .collect();
        assert_eq!(
            keys,
            vec![
                NodeKind::Property("a".to_string()),
                NodeKind::Property("'b c'".to_string()),
                NodeKind::Property("e".to_string()),
            ]
        );
    }

    #[test]
    fn unsupported_constructs() {
        assert!(matches!(
            parse_source("test.js", "for (;;) {}"),
            Err(FrontendError::Unsupported {
                construct: "for loop",
                ..
            })
        ));
        assert!(matches!(
            parse_source("test.js", "var {a} = b;"),
            Err(FrontendError::Unsupported {
                construct: "destructuring declaration",
                ..
            })
        ));
        assert!(matches!(
            parse_source("test.js", "var = ;"),
            Err(FrontendError::Parse { .. })
        ));
    }
}
