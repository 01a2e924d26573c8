use std::collections::HashSet;

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::error::ValidationError;

fn invalid(tree: &SyntaxTree, id: NodeId, reason: impl Into<String>) -> ValidationError {
    let kind = format!("{:?}", tree.kind(id));
    ValidationError {
        kind: kind.split('(').next().unwrap_or_default().to_string(),
        reason: reason.into(),
    }
}

fn validate_helper(
    tree: &SyntaxTree,
    classes: &mut HashSet<String>,
    id: NodeId,
) -> Result<(), ValidationError> {
    let children = tree.children(id);
    for &child in children {
        if tree.parent(child) != Some(id) {
            return Err(invalid(tree, child, "parent link does not match the child list"));
        }
    }

    match tree.kind(id) {
        NodeKind::FunctionDecl => {
            if children.len() != 3
                || !matches!(tree.kind(children[0]), NodeKind::Name(_))
                || *tree.kind(children[1]) != NodeKind::ParamList
                || *tree.kind(children[2]) != NodeKind::Block
            {
                return Err(invalid(tree, id, "expected a name, parameters and a body"));
            }
        }

        NodeKind::If => {
            if !(2..=3).contains(&children.len()) {
                return Err(invalid(tree, id, "expected a condition and one or two clauses"));
            }
        }

        NodeKind::While => {
            if children.len() != 2 {
                return Err(invalid(tree, id, "expected a condition and a body"));
            }
        }

        NodeKind::ClassDecl => {
            if children.len() != 3 || *tree.kind(children[2]) != NodeKind::ClassMemberList {
                return Err(invalid(tree, id, "expected a name, a heritage and members"));
            }
            match tree.kind(children[0]) {
                NodeKind::Name(name) => {
                    if !classes.insert(name.clone()) {
                        return Err(invalid(tree, id, format!("class `{}` declared twice", name)));
                    }
                }
                NodeKind::Empty => {}
                _ => return Err(invalid(tree, id, "class name must be a name or empty")),
            }
        }

        NodeKind::ClassMemberList => {
            let mut constructors = 0;
            for &member in children {
                match tree.kind(member) {
                    NodeKind::MemberFunction(name) => {
                        if name == "constructor" {
                            constructors += 1;
                        }
                    }
                    _ => return Err(invalid(tree, member, "only methods may appear in a class")),
                }
            }
            if constructors > 1 {
                return Err(invalid(tree, id, "class has more than one constructor"));
            }
        }

        NodeKind::MemberFunction(_) => {
            if children.len() != 1 || *tree.kind(children[0]) != NodeKind::FunctionDecl {
                return Err(invalid(tree, id, "a method wraps exactly one function"));
            }
        }

        NodeKind::RestParam(_) => {
            let in_params = tree
                .parent(id)
                .map_or(false, |parent| *tree.kind(parent) == NodeKind::ParamList);
            if !in_params {
                return Err(invalid(tree, id, "rest parameter outside a parameter list"));
            }
        }

        NodeKind::ParamList => {
            let rest = children
                .iter()
                .position(|&p| matches!(tree.kind(p), NodeKind::RestParam(_)));
            if rest.map_or(false, |i| i + 1 != children.len()) {
                return Err(invalid(tree, id, "rest parameter must come last"));
            }
        }

        _ => {}
    }

    for &child in children {
        validate_helper(tree, classes, child)?;
    }
    Ok(())
}

/// Checks the structural invariants of a (rewritten) [`SyntaxTree`]: parent links agree with
/// child lists, functions and classes have their fixed layout, rest parameters sit last in a
/// parameter list, a class has at most one `constructor` and no two classes share a name.
pub fn validate(tree: &SyntaxTree) -> Result<(), ValidationError> {
    let mut classes = HashSet::new();
    validate_helper(tree, &mut classes, tree.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::parse_helper;

    #[test]
    fn parsed_trees_are_valid() {
        let tree = parse_helper(
            "var C = function(a, ...b) { this.a = a; };\nC.prototype.m = function() { return 1; };",
        );
        assert_eq!(validate(&tree), Ok(()));
    }

    fn class(tree: &mut SyntaxTree, name: &str, members: &[NodeId]) -> NodeId {
        let name = tree.new_node(NodeKind::Name(name.to_string()), None);
        let heritage = tree.new_node(NodeKind::Empty, None);
        let list = tree.new_node_with_children(NodeKind::ClassMemberList, None, members);
        tree.new_node_with_children(NodeKind::ClassDecl, None, &[name, heritage, list])
    }

    fn method(tree: &mut SyntaxTree, name: &str) -> NodeId {
        let anonymous = tree.new_node(NodeKind::Name(String::new()), None);
        let params = tree.new_node(NodeKind::ParamList, None);
        let body = tree.new_node(NodeKind::Block, None);
        let function = tree.function(anonymous, params, body);
        tree.member_function_def(name, function)
    }

    #[test]
    fn duplicate_classes() {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        for _ in 0..2 {
            let c = class(&mut tree, "C", &[]);
            tree.add_child_to_back(root, c);
        }
        let err = validate(&tree).unwrap_err();
        assert_eq!(err.kind, "ClassDecl");
        assert_eq!(err.reason, "class `C` declared twice");
    }

    #[test]
    fn two_constructors() {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        let first = method(&mut tree, "constructor");
        let second = method(&mut tree, "constructor");
        let c = class(&mut tree, "C", &[first, second]);
        tree.add_child_to_back(root, c);
        assert_eq!(validate(&tree).unwrap_err().kind, "ClassMemberList");
    }

    #[test]
    fn clause_counts() {
        let mut tree = parse_helper("if (c) d();\nwhile (c) d();");
        assert_eq!(validate(&tree), Ok(()));

        let root = tree.root();
        for statement in tree.children(root).to_vec() {
            let body = tree.child(statement, 1).unwrap();
            tree.remove_child(statement, body);
        }
        assert_eq!(validate(&tree).unwrap_err().kind, "If");
        let if_ = tree.children(root)[0];
        tree.remove_child(root, if_);
        assert_eq!(validate(&tree).unwrap_err().kind, "While");
    }

    #[test]
    fn misplaced_rest_parameter() {
        let mut tree = parse_helper("function f(...a) {}");
        let root = tree.root();
        let stray = tree.new_node(NodeKind::RestParam("b".to_string()), None);
        let statement =
            tree.new_node_with_children(NodeKind::ExpressionStatement, None, &[stray]);
        tree.add_child_to_back(root, statement);
        assert_eq!(validate(&tree).unwrap_err().kind, "RestParam");
    }
}
