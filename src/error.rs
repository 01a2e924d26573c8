//! Error types for the front end and the passes.

use swc_common::Span;
use thiserror::Error;

/// Violations of the preconditions of the class rewrite. The input does not follow the
/// constructor/prototype idiom the pass is written for, so the rewrite is abandoned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PassError {
    /// Two constructor declarations claim the same class name.
    #[error("class `{0}` was already created by an earlier constructor")]
    DuplicateClass(String),

    /// A prototype method was assigned before (or without) its constructor.
    #[error("didn't previously create class `{0}` for prototype member `{1}`")]
    UnknownClass(String, String),

    /// A constructor-pattern function with no name to give the class.
    #[error("constructor function has no name to give its class")]
    UnnamedConstructor,
}

/// Errors turning source text into a [`crate::ast::SyntaxTree`].
#[derive(Debug, Error)]
pub enum FrontendError {
    /// The source failed to parse.
    #[error("parse error at {span:?}: {message}")]
    Parse {
        /// What the parser reported.
        message: String,

        /// Where it went wrong.
        span: Span,
    },

    /// The source uses a construct the tree has no node for.
    #[error("unsupported {construct} at {span:?}")]
    Unsupported {
        /// A short description of the construct.
        construct: &'static str,

        /// Where it appears.
        span: Span,
    },
}

/// Problems reading a documentation comment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsDocError {
    /// A character or the end of input that no type can start or continue with.
    #[error("unexpected {found} at offset {offset} in type expression `{expr}`")]
    Unexpected {
        /// The type expression.
        expr: String,
        /// Byte offset into `expr`.
        offset: usize,
        /// What was found instead.
        found: String,
    },

    /// A required delimiter is missing.
    #[error("expected `{expected}` at offset {offset} in type expression `{expr}`")]
    Expected {
        /// The type expression.
        expr: String,
        /// Byte offset into `expr`.
        offset: usize,
        /// The delimiter.
        expected: char,
    },

    /// A `{` in the comment is never closed.
    #[error("unterminated type expression starting at offset {offset}")]
    Unterminated {
        /// Byte offset of the `{` in the comment.
        offset: usize,
    },

    /// `@param {T}` without the name of the parameter.
    #[error("@param {{{ty}}} is missing a parameter name")]
    MissingParamName {
        /// The type that was given.
        ty: String,
    },
}

/// A broken structural invariant found by [`crate::validate::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} node: {reason}")]
pub struct ValidationError {
    /// The kind of the offending node.
    pub kind: String,

    /// What is wrong with it.
    pub reason: String,
}
