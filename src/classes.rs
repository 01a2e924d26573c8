use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::declarations::{
    declared_type, is_declaration_target, parameter_type, return_type, set_type_expression,
};
use crate::error::PassError;
use crate::pass::{traverse, CompilerPass, PassOutcome, PostOrderCallback};
use crate::types::TypeAnnotation;

/// The classes created so far in one run, by qualified name. Each entry is the member list of
/// the class, which is already part of the tree, so members appended to it show up in place.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: IndexMap<String, NodeId>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the member list of a new class.
    pub fn register(&mut self, name: &str, members: NodeId) -> Result<(), PassError> {
        if self.classes.contains_key(name) {
            return Err(PassError::DuplicateClass(name.to_string()));
        }
        self.classes.insert(name.to_string(), members);
        Ok(())
    }

    /// Whether a class of this name was created.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// The member list of a class.
    pub fn members(&self, name: &str) -> Option<NodeId> {
        self.classes.get(name).copied()
    }

    /// Number of classes, in creation order.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class was created.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The qualified names of the classes, in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

/// How a constructor function is bound, which decides the class name and what gets replaced.
enum Binding {
    /// `var C = function() {}`: the whole statement becomes `class C {}`.
    Variable { statement: NodeId, name: NodeId },

    /// `function C() {}`, or a named function expression: the function becomes `class C {}`.
    Declaration { name: NodeId },

    /// `a.b.C = function() {}`: the function becomes `class {}`, registered as `a.b.C`.
    Qualified { name: String },
}

/// Turns constructor functions and the prototype methods assigned to them into classes, and
/// moves documented types onto declarations the way [`crate::declarations`] does. Variadic
/// parameters become rest parameters.
///
/// Constructors must come before their prototype methods and every class name must be unique;
/// otherwise the pass fails and the tree is left as it was.
#[derive(Debug, Default)]
pub struct ClassifyAndRewrite {
    registry: ClassRegistry,
    outcome: PassOutcome,
}

impl ClassifyAndRewrite {
    /// Creates the pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the pass with classes known before the next run, as if their constructors had
    /// already been converted.
    pub fn with_registry(registry: ClassRegistry) -> Self {
        ClassifyAndRewrite {
            registry,
            outcome: PassOutcome::default(),
        }
    }

    fn visit_name(&mut self, tree: &mut SyntaxTree, node: NodeId) {
        let in_params = tree
            .parent(node)
            .map_or(false, |p| *tree.kind(p) == NodeKind::ParamList);
        if in_params {
            self.visit_parameter(tree, node);
        } else if is_declaration_target(tree, node) {
            let ty = declared_type(tree, node);
            set_type_expression(tree, node, ty, &mut self.outcome);
        }
    }

    fn visit_parameter(&mut self, tree: &mut SyntaxTree, param: NodeId) {
        let Some(ty) = parameter_type(tree, param) else {
            return;
        };
        let name = match tree.kind(param) {
            NodeKind::Name(name) if ty.is_variadic() => Some(name.clone()),
            _ => None,
        };
        let Some(name) = name else {
            return set_type_expression(tree, param, Some(ty), &mut self.outcome);
        };

        let span = tree.node(param).span;
        let rest = tree.new_node(NodeKind::RestParam(name), span);
        trace!("{} is a rest parameter of type {}", tree.display(param), ty);
        tree.set_declared_type(rest, ty);
        if let Some(params) = tree.parent(param) {
            tree.replace_child(params, param, rest);
        }
        self.outcome.report_code_change();
    }

    fn visit_function(
        &mut self,
        tree: &mut SyntaxTree,
        function: NodeId,
    ) -> Result<(), PassError> {
        let returns = return_type(tree, function);
        set_type_expression(tree, function, returns.clone(), &mut self.outcome);

        let is_constructor = tree
            .best_doc(function)
            .map_or(false, |doc| doc.is_constructor || doc.is_interface);
        if is_constructor {
            let clone = anonymous_clone(tree, function, returns);
            self.visit_constructor(tree, function, clone)
        } else if let Some(statement) = prototype_statement(tree, function) {
            let clone = anonymous_clone(tree, function, returns);
            self.visit_class_member(tree, statement, clone)
        } else {
            Ok(())
        }
    }

    fn visit_constructor(
        &mut self,
        tree: &mut SyntaxTree,
        function: NodeId,
        clone: NodeId,
    ) -> Result<(), PassError> {
        let binding = binding(tree, function).ok_or(PassError::UnnamedConstructor)?;
        let (class_name, replaced) = match &binding {
            Binding::Variable { statement, name } => (tree.qualified_name(*name), *statement),
            Binding::Declaration { name } => (tree.qualified_name(*name), function),
            Binding::Qualified { name } => (Some(name.clone()), function),
        };
        let class_name = class_name.ok_or(PassError::UnnamedConstructor)?;
        if self.registry.contains(&class_name) {
            return Err(PassError::DuplicateClass(class_name));
        }
        let Some(parent) = tree.parent(replaced) else {
            return Ok(());
        };

        let members = tree.new_node(NodeKind::ClassMemberList, None);
        let body = tree.child(function, 2);
        if body.map_or(false, |body| tree.has_children(body)) {
            let constructor = tree.member_function_def("constructor", clone);
            tree.add_child_to_back(members, constructor);
        }

        let name = match binding {
            Binding::Variable { name, .. } | Binding::Declaration { name } => tree.clone_node(name),
            Binding::Qualified { .. } => tree.new_node(NodeKind::Empty, None),
        };
        let heritage = tree.new_node(NodeKind::Empty, None);
        let class =
            tree.new_node_with_children(NodeKind::ClassDecl, None, &[name, heritage, members]);
        if let Some(doc) = tree.doc(replaced).cloned() {
            tree.set_doc(class, doc);
        }

        self.registry.register(&class_name, members)?;
        tree.use_source_info_if_missing_from_for_tree(class, replaced);
        tree.replace_child(parent, replaced, class);
        self.outcome.report_code_change();
        debug!("converted constructor `{}` into a class", class_name);
        Ok(())
    }

    fn visit_class_member(
        &mut self,
        tree: &mut SyntaxTree,
        statement: NodeId,
        clone: NodeId,
    ) -> Result<(), PassError> {
        let Some(target) = tree.first_child(statement).and_then(|a| tree.first_child(a)) else {
            return Ok(());
        };
        let class_name = tree.prototype_class_name(target).unwrap_or_default();
        let member_name = tree
            .prototype_property_name(target)
            .unwrap_or_default()
            .to_string();
        let Some(members) = self.registry.members(&class_name) else {
            return Err(PassError::UnknownClass(class_name, member_name));
        };

        let member = tree.member_function_def(&member_name, clone);
        tree.add_child_to_back(members, member);
        tree.use_source_info_if_missing_from_for_tree(members, statement);
        if let Some(parent) = tree.parent(statement) {
            // `if` and `while` clauses are fixed slots, not statement lists.
            if matches!(tree.kind(parent), NodeKind::Program | NodeKind::Block) {
                tree.remove_child(parent, statement);
            } else {
                let empty = tree.new_node(NodeKind::Empty, tree.node(statement).span);
                tree.replace_child(parent, statement, empty);
            }
        }
        self.outcome.report_code_change();
        debug!("moved `{}` into class `{}`", member_name, class_name);
        Ok(())
    }
}

/// A detached copy of `function` without its name, carrying `returns` as its return type.
fn anonymous_clone(
    tree: &mut SyntaxTree,
    function: NodeId,
    returns: Option<TypeAnnotation>,
) -> NodeId {
    let name = tree.new_node(NodeKind::Name(String::new()), None);
    let params = match tree.child(function, 1) {
        Some(params) => tree.clone_tree(params),
        None => tree.new_node(NodeKind::ParamList, None),
    };
    let body = match tree.child(function, 2) {
        Some(body) => tree.clone_tree(body),
        None => tree.new_node(NodeKind::Block, None),
    };
    let clone = tree.function(name, params, body);
    if let Some(returns) = returns {
        tree.set_declared_type(clone, returns);
    }
    clone
}

/// The `<Class>.prototype.<member> = function…;` statement whose value is `function`.
fn prototype_statement(tree: &SyntaxTree, function: NodeId) -> Option<NodeId> {
    let assign = tree.parent(function)?;
    if !matches!(tree.kind(assign), NodeKind::Assignment(_))
        || tree.child(assign, 1) != Some(function)
    {
        return None;
    }
    let statement = tree.parent(assign)?;
    tree.is_prototype_property_declaration(statement).then_some(statement)
}

fn binding(tree: &SyntaxTree, function: NodeId) -> Option<Binding> {
    let parent = tree.parent(function)?;
    match tree.kind(parent) {
        NodeKind::Name(_) => {
            let statement = tree.parent(parent)?;
            let single = matches!(tree.kind(statement), NodeKind::VarDecl(_))
                && tree.children(statement).len() == 1;
            single.then_some(Binding::Variable {
                statement,
                name: parent,
            })
        }
        NodeKind::Assignment(op) if op == "=" && tree.child(parent, 1) == Some(function) => {
            let target = tree.first_child(parent)?;
            let name = tree.qualified_name(target)?;
            Some(Binding::Qualified { name })
        }
        _ => {
            let name = tree.first_child(function)?;
            tree.qualified_name(name).map(|_| Binding::Declaration { name })
        }
    }
}

impl PostOrderCallback for ClassifyAndRewrite {
    fn visit(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), PassError> {
        if !tree.is_attached(node) {
            return Ok(());
        }
        let kind = tree.kind(node);
        if *kind == NodeKind::FunctionDecl {
            return self.visit_function(tree, node);
        }
        if matches!(
            kind,
            NodeKind::Name(_) | NodeKind::RestParam(_) | NodeKind::PropertyAccess(_)
        ) {
            self.visit_name(tree, node);
        }
        Ok(())
    }
}

impl CompilerPass for ClassifyAndRewrite {
    fn name(&self) -> &'static str {
        "classify-and-rewrite"
    }

    fn process(&mut self, tree: &mut SyntaxTree) -> Result<PassOutcome, PassError> {
        self.outcome = PassOutcome::default();
        let mut scratch = tree.clone();
        let root = scratch.root();
        let result = traverse(&mut scratch, root, self);

        let registry = std::mem::take(&mut self.registry);
        result?;
        debug!("{} pass created {} classes", self.name(), registry.len());
        *tree = scratch;
        Ok(std::mem::take(&mut self.outcome))
    }
}
