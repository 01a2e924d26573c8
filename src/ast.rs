use std::collections::HashMap;

use swc_common::Span;

use crate::jsdoc::DocInfo;
use crate::types::TypeAnnotation;

/// Identifies a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kinds of nodes in a [`SyntaxTree`]. Payloads hold the identifier or operator a node
/// carries; everything else lives in the node's children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The root of a tree. Children are statements.
    Program,

    /// A block of statements.
    Block,

    /// A variable declaration (ie, `var x = 2, y`) with its keyword. Children are
    /// [`NodeKind::Name`] nodes whose only child, if any, is the initializer.
    VarDecl(&'static str),

    /// A function, either declared or used as an expression. Children are the name (empty for
    /// anonymous functions), the [`NodeKind::ParamList`] and the body [`NodeKind::Block`].
    FunctionDecl,

    /// The parameters of a function.
    ParamList,

    /// An identifier.
    Name(String),

    /// A parameter collecting the remaining arguments (ie, `...args`).
    RestParam(String),

    /// A property access (ie, `obj.prop`). The only child is the object.
    PropertyAccess(String),

    /// An assignment with the given operator. Children are the target and the value.
    Assignment(String),

    /// An expression evaluated for its side effects.
    ExpressionStatement,

    /// A return statement with an optional value.
    Return,

    /// An if statement. Children are the condition, the then clause and an optional else clause.
    If,

    /// A while loop. Children are the condition and the body.
    While,

    /// A call. Children are the callee followed by the arguments.
    Call,

    /// A constructor call. Children are the callee followed by the arguments.
    New,

    /// The `this` keyword.
    This,

    /// A thrown value.
    Throw,

    /// A conditional expression. Children are the condition and the two alternatives.
    Conditional,

    /// An array literal. Holes are [`NodeKind::Empty`].
    ArrayLit,

    /// An object literal. Children are [`NodeKind::Property`] nodes.
    ObjectLit,

    /// A property of an object literal, with its key as written. The only child is the value.
    Property(String),

    /// A unary operator applied to the only child.
    Unary(String),

    /// An infix or binary operator applied to the two children.
    Binary(String),

    /// A string literal.
    StringLit(String),

    /// A numeric value.
    NumberLit(f64),

    /// A boolean value.
    BoolLit(bool),

    /// The `null` literal.
    Null,

    /// A class. Children are the name (or [`NodeKind::Empty`] for a class expression), the
    /// heritage clause ([`NodeKind::Empty`] when there is none) and the
    /// [`NodeKind::ClassMemberList`].
    ClassDecl,

    /// The members of a class, in declaration order.
    ClassMemberList,

    /// A method of a class. The only child is the [`NodeKind::FunctionDecl`] implementing it.
    MemberFunction(String),

    /// A placeholder for an absent child.
    Empty,
}

/// A node of a [`SyntaxTree`].
#[derive(Debug, Clone)]
pub struct Node {
    /// The variant of the node.
    pub kind: NodeKind,

    /// The location in the file of the node, if it came from source.
    pub span: Option<Span>,

    /// The type declared for this node, if it is a declaration site.
    pub declared_type: Option<TypeAnnotation>,

    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// A mutable syntax tree. Nodes are stored in an arena and refer to each other by [`NodeId`];
/// a node detached from its parent stays in the arena but is no longer reachable from the root.
///
/// Documentation records are kept in a side table keyed by the node that owns the comment.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    docs: HashMap<NodeId, DocInfo>,
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxTree {
    /// Creates a tree containing an empty [`NodeKind::Program`].
    pub fn new() -> Self {
        let mut tree = SyntaxTree {
            nodes: Vec::new(),
            root: NodeId(0),
            docs: HashMap::new(),
        };
        tree.root = tree.new_node(NodeKind::Program, None);
        tree
    }

    /// The [`NodeKind::Program`] node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes allocated, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true; a tree always has its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for an id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the node for an id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Returns the kind of a node.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Returns the children of a node, in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Returns the `index`th child of a node.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.node(id).children.get(index).copied()
    }

    /// Returns the first child of a node.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.child(id, 0)
    }

    /// Returns the parent of a node, or `None` for the root and detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Whether the node has at least one child.
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.node(id).children.is_empty()
    }

    /// Allocates a detached node.
    pub fn new_node(&mut self, kind: NodeKind, span: Option<Span>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            declared_type: None,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Allocates a detached node with the given children.
    pub fn new_node_with_children(
        &mut self,
        kind: NodeKind,
        span: Option<Span>,
        children: &[NodeId],
    ) -> NodeId {
        let id = self.new_node(kind, span);
        for &child in children {
            self.add_child_to_back(id, child);
        }
        id
    }

    /// Builds a [`NodeKind::FunctionDecl`] from its three parts.
    pub fn function(&mut self, name: NodeId, params: NodeId, body: NodeId) -> NodeId {
        self.new_node_with_children(NodeKind::FunctionDecl, None, &[name, params, body])
    }

    /// Builds a [`NodeKind::MemberFunction`] named `name` implemented by `function`.
    pub fn member_function_def(&mut self, name: &str, function: NodeId) -> NodeId {
        self.new_node_with_children(NodeKind::MemberFunction(name.to_string()), None, &[function])
    }

    /// Appends a detached node to the children of `parent`.
    pub fn add_child_to_back(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "node already has a parent");
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Puts `new_child` where `old_child` was among the children of `parent`. The old child is
    /// left detached.
    pub fn replace_child(&mut self, parent: NodeId, old_child: NodeId, new_child: NodeId) {
        debug_assert!(self.parent(new_child).is_none(), "node already has a parent");
        let position = self
            .children(parent)
            .iter()
            .position(|&c| c == old_child)
            .expect("replaced node is not a child of the given parent");
        self.node_mut(parent).children[position] = new_child;
        self.node_mut(new_child).parent = Some(parent);
        self.node_mut(old_child).parent = None;
    }

    /// Detaches `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.node_mut(parent).children;
        let position = children
            .iter()
            .position(|&c| c == child)
            .expect("removed node is not a child of the given parent");
        children.remove(position);
        self.node_mut(child).parent = None;
    }

    /// Copies a single node without its children.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let source = self.node(id);
        let (kind, span, declared_type) =
            (source.kind.clone(), source.span, source.declared_type.clone());
        let copy = self.new_node(kind, span);
        self.node_mut(copy).declared_type = declared_type;
        copy
    }

    /// Whether the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root
    }

    /// Deep copies a subtree, including declared types and documentation records. The copy is
    /// detached.
    pub fn clone_tree(&mut self, id: NodeId) -> NodeId {
        let source = self.node(id);
        let (kind, span, declared_type) =
            (source.kind.clone(), source.span, source.declared_type.clone());
        let copy = self.new_node(kind, span);
        self.node_mut(copy).declared_type = declared_type;
        if let Some(doc) = self.docs.get(&id).cloned() {
            self.docs.insert(copy, doc);
        }

        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_tree(child);
            self.add_child_to_back(copy, child_copy);
        }
        copy
    }

    /// Gives every node of the subtree at `id` that has no span the span of `from`.
    pub fn use_source_info_if_missing_from_for_tree(&mut self, id: NodeId, from: NodeId) {
        let Some(span) = self.node(from).span else {
            return;
        };
        for node in self.descendants(id) {
            let node = self.node_mut(node);
            if node.span.is_none() {
                node.span = Some(span);
            }
        }
    }

    /// Returns the subtree at `id` in pre-order, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        result
    }

    /// Finds the nodes reachable from the root that satisfy `predicate`, in pre-order.
    pub fn find_all(&self, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| predicate(self.node(id)))
            .collect()
    }

    /// Sets the declared type of a node, replacing any previous one.
    pub fn set_declared_type(&mut self, id: NodeId, ty: TypeAnnotation) {
        self.node_mut(id).declared_type = Some(ty);
    }

    /// Returns the declared type of a node.
    pub fn declared_type(&self, id: NodeId) -> Option<&TypeAnnotation> {
        self.node(id).declared_type.as_ref()
    }

    /// Attaches a documentation record to the node owning the comment.
    pub fn set_doc(&mut self, id: NodeId, doc: DocInfo) {
        self.docs.insert(id, doc);
    }

    /// Returns the documentation record owned by this very node.
    pub fn doc(&self, id: NodeId) -> Option<&DocInfo> {
        self.docs.get(&id)
    }

    /// Returns the documentation that describes a node: its own record, or the one of the
    /// declaration it belongs to. `var f = function(x) {}` documents the function (and through
    /// it the parameter `x`) with the comment on the `var`.
    pub fn best_doc(&self, id: NodeId) -> Option<&DocInfo> {
        if let Some(doc) = self.docs.get(&id) {
            return Some(doc);
        }
        let parent = self.parent(id)?;
        match self.kind(parent) {
            NodeKind::Name(_) | NodeKind::Assignment(_) | NodeKind::FunctionDecl => {
                self.best_doc(parent)
            }
            NodeKind::VarDecl(_) if self.children(parent).len() == 1 => self.docs.get(&parent),
            _ => None,
        }
    }

    /// Returns the dot-joined name of a name or a chain of property accesses (ie, `a.b.C`).
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        match self.kind(id) {
            NodeKind::Name(name) if !name.is_empty() => Some(name.clone()),
            NodeKind::This => Some("this".to_string()),
            NodeKind::PropertyAccess(prop) => {
                let object = self.qualified_name(self.first_child(id)?)?;
                Some(format!("{}.{}", object, prop))
            }
            _ => None,
        }
    }

    /// Whether the node is a property access of the shape `<Class>.prototype.<member>`.
    pub fn is_prototype_property(&self, id: NodeId) -> bool {
        if !matches!(self.kind(id), NodeKind::PropertyAccess(_)) {
            return false;
        }
        match self.first_child(id).map(|object| (object, self.kind(object))) {
            Some((_, NodeKind::PropertyAccess(prop))) => prop == "prototype",
            _ => false,
        }
    }

    /// Whether the node is a statement of the shape `<Class>.prototype.<member> = <value>;`.
    pub fn is_prototype_property_declaration(&self, id: NodeId) -> bool {
        if *self.kind(id) != NodeKind::ExpressionStatement {
            return false;
        }
        let Some(assign) = self.first_child(id) else {
            return false;
        };
        if !matches!(self.kind(assign), NodeKind::Assignment(op) if op == "=") {
            return false;
        }
        self.first_child(assign)
            .map_or(false, |target| self.is_prototype_property(target))
    }

    /// For `a.b.C.prototype.m`, returns `a.b.C`.
    pub fn prototype_class_name(&self, prototype_property: NodeId) -> Option<String> {
        let prototype = self.first_child(prototype_property)?;
        self.qualified_name(self.first_child(prototype)?)
    }

    /// For `a.b.C.prototype.m`, returns `m`.
    pub fn prototype_property_name(&self, prototype_property: NodeId) -> Option<&str> {
        match self.kind(prototype_property) {
            NodeKind::PropertyAccess(prop) => Some(prop),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsdoc::DocInfo;

    fn name(tree: &mut SyntaxTree, id: &str) -> NodeId {
        tree.new_node(NodeKind::Name(id.to_string()), None)
    }

    fn prop(tree: &mut SyntaxTree, object: NodeId, prop: &str) -> NodeId {
        tree.new_node_with_children(NodeKind::PropertyAccess(prop.to_string()), None, &[object])
    }

    #[test]
    fn replace_keeps_position() {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        let a = tree.new_node(NodeKind::Empty, None);
        let b = tree.new_node(NodeKind::Empty, None);
        let c = tree.new_node(NodeKind::Empty, None);
        tree.add_child_to_back(root, a);
        tree.add_child_to_back(root, b);
        tree.add_child_to_back(root, c);

        let replacement = tree.new_node(NodeKind::Null, None);
        tree.replace_child(root, b, replacement);
        assert_eq!(tree.children(root), &[a, replacement, c]);
        assert_eq!(tree.parent(b), None);
        assert_eq!(tree.parent(replacement), Some(root));

        tree.remove_child(root, a);
        assert_eq!(tree.children(root), &[replacement, c]);
        assert!(tree.is_attached(c));
        assert!(!tree.is_attached(a));
    }

    #[test]
    fn clone_node_is_shallow() {
        let mut tree = SyntaxTree::new();
        let init = tree.new_node(NodeKind::NumberLit(1.0), None);
        let x = tree.new_node_with_children(NodeKind::Name("x".to_string()), None, &[init]);
        tree.set_declared_type(x, TypeAnnotation::Named("T".to_string()));

        let copy = tree.clone_node(x);
        assert_eq!(tree.kind(copy), tree.kind(x));
        assert!(!tree.has_children(copy));
        assert_eq!(tree.declared_type(copy), tree.declared_type(x));
    }

    #[test]
    fn clone_tree_copies_types_and_docs() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        tree.set_declared_type(x, TypeAnnotation::Named("Foo".to_string()));
        let var = tree.new_node_with_children(NodeKind::VarDecl("var"), None, &[x]);
        tree.set_doc(var, DocInfo::default());

        let copy = tree.clone_tree(var);
        assert_ne!(copy, var);
        assert!(tree.doc(copy).is_some());
        let x_copy = tree.first_child(copy).unwrap();
        assert_eq!(tree.kind(x_copy), &NodeKind::Name("x".to_string()));
        assert_eq!(tree.declared_type(x_copy), Some(&TypeAnnotation::Named("Foo".to_string())));
        assert_eq!(tree.parent(copy), None);
    }

    #[test]
    fn qualified_names() {
        let mut tree = SyntaxTree::new();
        let a = name(&mut tree, "a");
        let ab = prop(&mut tree, a, "b");
        let proto = prop(&mut tree, ab, "prototype");
        let method = prop(&mut tree, proto, "m");

        assert_eq!(tree.qualified_name(method).as_deref(), Some("a.b.prototype.m"));
        assert!(tree.is_prototype_property(method));
        assert!(!tree.is_prototype_property(ab));
        assert_eq!(tree.prototype_class_name(method).as_deref(), Some("a.b"));
        assert_eq!(tree.prototype_property_name(method), Some("m"));
    }

    #[test]
    fn best_doc_reaches_through_var_with_one_declarator() {
        let mut tree = SyntaxTree::new();
        let params = tree.new_node(NodeKind::ParamList, None);
        let body = tree.new_node(NodeKind::Block, None);
        let anonymous = name(&mut tree, "");
        let function = tree.function(anonymous, params, body);
        let f = tree.new_node_with_children(NodeKind::Name("f".to_string()), None, &[function]);
        let var = tree.new_node_with_children(NodeKind::VarDecl("var"), None, &[f]);
        tree.set_doc(
            var,
            DocInfo {
                is_constructor: true,
                ..DocInfo::default()
            },
        );

        assert!(tree.best_doc(params).map_or(false, |doc| doc.is_constructor));

        let g = name(&mut tree, "g");
        tree.add_child_to_back(var, g);
        assert!(tree.best_doc(params).is_none());
    }
}
