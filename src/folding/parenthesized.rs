use crate::ast::{Ast, Node, NodeId};
use crate::error::Result;
use crate::folding::Folding;

/// Unwraps a literal in parentheses, e.g. `(1)` becomes `1`.
#[derive(Default, Debug)]
pub struct ParenthesizedExpressionFolding {}

impl ParenthesizedExpressionFolding {
    pub fn new() -> Self {
        Self {}
    }
}

impl Folding for ParenthesizedExpressionFolding {
    fn name(&self) -> &'static str {
        "ParenthesizedExpressionFolding"
    }

    fn fold_node(&self, ast: &mut Ast, node: NodeId) -> Result<bool> {
        let expression = match ast.node(node) {
            Node::Parenthesized { expression } => *expression,
            _ => return Ok(false),
        };
        if ast.node(expression).literal().is_none() {
            return Ok(false);
        }

        let literal = ast.duplicate(expression);
        ast.replace(node, literal)?;

        trace!("Unwrapped parenthesized literal {}", node);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::fixtures::{body, method};

    #[test]
    fn test_unwrap_literals_of_any_kind() {
        // GIVEN
        let mut ast = method("f((1), (true), (\"s\"), (null), ((2)));");
        let root = ast.root();

        // WHEN
        let folded = ParenthesizedExpressionFolding::new()
            .fold(&mut ast, root)
            .unwrap();

        // THEN
        assert!(folded);
        assert_eq!(body(&ast), "{ f(1, true, \"s\", null, 2); }");
    }

    #[test]
    fn test_keep_parenthesized_non_literals() {
        let mut ast = method("x = (a) * (1 + 2);");
        let root = ast.root();

        let folded = ParenthesizedExpressionFolding::new()
            .fold(&mut ast, root)
            .unwrap();

        assert!(!folded);
        assert_eq!(body(&ast), "{ x = (a) * (1 + 2); }");
    }
}
