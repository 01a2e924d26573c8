use tracing::trace;

use crate::ast::{NodeId, NodeKind, SyntaxTree};
use crate::bridge::convert;
use crate::error::PassError;
use crate::pass::{traverse, CompilerPass, PassOutcome, PostOrderCallback};
use crate::types::TypeAnnotation;

/// Whether a name or property access declares something: a variable, the target of an
/// assignment or a bare declaration such as `/** @type {T} */ a.b;`.
pub(crate) fn is_declaration_target(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    match tree.kind(parent) {
        NodeKind::VarDecl(_) | NodeKind::ExpressionStatement => true,
        NodeKind::Assignment(_) => tree.first_child(parent) == Some(node),
        _ => false,
    }
}

/// The type documented for a declaration target.
pub(crate) fn declared_type(tree: &SyntaxTree, node: NodeId) -> Option<TypeAnnotation> {
    convert(tree.best_doc(node)?.ty.as_ref())
}

/// The type documented for a parameter by the comment on its function.
pub(crate) fn parameter_type(tree: &SyntaxTree, param: NodeId) -> Option<TypeAnnotation> {
    let params = tree.parent(param)?;
    if *tree.kind(params) != NodeKind::ParamList {
        return None;
    }
    let name = match tree.kind(param) {
        NodeKind::Name(name) | NodeKind::RestParam(name) => name,
        _ => return None,
    };
    convert(tree.best_doc(params)?.parameter_type(name))
}

/// The return type documented for a function.
pub(crate) fn return_type(tree: &SyntaxTree, function: NodeId) -> Option<TypeAnnotation> {
    convert(tree.best_doc(function)?.return_type.as_ref())
}

/// Attaches `ty` to `node`. Only a new or different type counts as a change, which keeps a
/// second run over the same tree quiet.
pub(crate) fn set_type_expression(
    tree: &mut SyntaxTree,
    node: NodeId,
    ty: Option<TypeAnnotation>,
    outcome: &mut PassOutcome,
) {
    let Some(ty) = ty else {
        return;
    };
    if tree.declared_type(node) == Some(&ty) {
        return;
    }
    trace!("declaring {} as {}", tree.display(node), ty);
    tree.set_declared_type(node, ty);
    outcome.report_code_change();
}

/// Moves documented types onto declaration sites: variables, assignment targets, parameters
/// and function return types. The shape of the tree is left alone.
#[derive(Debug, Default)]
pub struct DeclarationTypeAttacher {
    outcome: PassOutcome,
}

impl DeclarationTypeAttacher {
    /// Creates the pass.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostOrderCallback for DeclarationTypeAttacher {
    fn visit(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), PassError> {
        let ty = match tree.kind(node) {
            NodeKind::Name(_) | NodeKind::RestParam(_)
                if tree
                    .parent(node)
                    .map_or(false, |p| *tree.kind(p) == NodeKind::ParamList) =>
            {
                parameter_type(tree, node)
            }
            NodeKind::Name(_) | NodeKind::PropertyAccess(_)
                if is_declaration_target(tree, node) =>
            {
                declared_type(tree, node)
            }
            NodeKind::FunctionDecl => return_type(tree, node),
            _ => None,
        };
        set_type_expression(tree, node, ty, &mut self.outcome);
        Ok(())
    }
}

impl CompilerPass for DeclarationTypeAttacher {
    fn name(&self) -> &'static str {
        "declaration-types"
    }

    fn process(&mut self, tree: &mut SyntaxTree) -> Result<PassOutcome, PassError> {
        self.outcome = PassOutcome::default();
        let root = tree.root();
        traverse(tree, root, self)?;
        Ok(std::mem::take(&mut self.outcome))
    }
}
