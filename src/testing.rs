use crate::ast::SyntaxTree;
use crate::parse::parse_source;
use crate::pass::CompilerPass;
use crate::validate::validate;

pub(crate) fn parse_helper(contents: &str) -> SyntaxTree {
    parse_source("test.js", contents).expect("error parsing")
}

/// Runs `pass` over `contents`, checks the result is well formed and prints it.
pub(crate) fn transpile_helper(pass: &mut dyn CompilerPass, contents: &str) -> String {
    let mut tree = parse_helper(contents);
    pass.process(&mut tree).expect("pass failed");
    validate(&tree).expect("invalid tree");
    tree.to_string().trim_end().to_string()
}
