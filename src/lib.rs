#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// The mutable syntax tree the passes rewrite, with documentation records in a side table.
pub mod ast;

/// Type expressions attached to declaration sites.
pub mod types;

/// Reading documentation comments: tags and Closure-style type expressions.
pub mod jsdoc;

/// Converts documentation types into [`types::TypeAnnotation`]s.
pub mod bridge;

/// Implements utility functions for transforming the ast used by [`swc_ecma_parser`] into a
/// [`ast::SyntaxTree`]. Only the statements and expressions the passes care about are
/// supported; anything else is reported as an error.
pub mod parse;

/// The pass interface and the post-order traversal passes are built on.
pub mod pass;

/// Attaching documented types to declarations.
pub mod declarations;

/// Rewriting constructor functions and prototype methods into classes.
pub mod classes;

/// Errors.
pub mod error;

/// Printing a [`ast::SyntaxTree`] as TypeScript.
pub mod print;

/// Implements functions for validating a rewritten [`ast::SyntaxTree`].
pub mod validate;

/// Private crate for testing utilities.
#[cfg(test)]
pub(crate) mod testing;
