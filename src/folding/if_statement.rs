use crate::ast::{Ast, Literal, Node, NodeId};
use crate::error::Result;
use crate::folding::Folding;

/// Resolves an `if` statement whose condition is a boolean literal.
///
/// The statement is replaced by a copy of the taken branch, or removed when the condition is
/// `false` and there is no else branch.
#[derive(Default, Debug)]
pub struct IfStatementFolding {}

impl IfStatementFolding {
    pub fn new() -> Self {
        Self {}
    }
}

impl Folding for IfStatementFolding {
    fn name(&self) -> &'static str {
        "IfStatementFolding"
    }

    fn fold_node(&self, ast: &mut Ast, node: NodeId) -> Result<bool> {
        let (condition, then_branch, else_branch) = match ast.node(node) {
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => (*condition, *then_branch, *else_branch),
            _ => return Ok(false),
        };

        let taken = match ast.node(condition).literal().and_then(Literal::boolean_value) {
            Some(true) => Some(then_branch),
            Some(false) => else_branch,
            None => return Ok(false),
        };

        match taken {
            Some(branch) => {
                let copy = ast.duplicate(branch);
                ast.replace(node, copy)?;
                trace!("Replaced if statement {} by its branch {}", node, branch);
            }
            None => {
                ast.remove(node)?;
                trace!("Removed if statement {}", node);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::fixtures::{body, method};

    fn fold(statements: &str) -> String {
        let mut ast = method(statements);
        let root = ast.root();
        assert!(IfStatementFolding::new().fold(&mut ast, root).unwrap());
        body(&ast)
    }

    #[test]
    fn test_take_then_branch() {
        assert_eq!(
            fold("if (true) { x = 1; } else { x = 2; } y = 3;"),
            "{ { x = 1; } y = 3; }"
        );
    }

    #[test]
    fn test_take_else_branch() {
        assert_eq!(fold("if (false) x = 1; else x = 2;"), "{ x = 2; }");
    }

    #[test]
    fn test_remove_statement_without_else() {
        assert_eq!(fold("a = 0; if (false) { x = 1; } b = 2;"), "{ a = 0; b = 2; }");
    }

    #[test]
    fn test_remove_else_if_chain_member() {
        assert_eq!(
            fold("if (c) { x = 1; } else if (false) { x = 2; }"),
            "{ if (c) { x = 1; } }"
        );
    }

    #[test]
    fn test_remove_from_mandatory_slot_leaves_empty_block() {
        assert_eq!(fold("while (c) if (false) x = 1;"), "{ while (c) { } }");
    }

    #[test]
    fn test_nested_constant_ifs_fold_bottom_up() {
        assert_eq!(
            fold("if (true) { if (false) { x = 1; } else { x = 2; } }"),
            "{ { { x = 2; } } }"
        );
    }

    #[test]
    fn test_keep_non_constant_conditions() {
        let mut ast = method("if (c) { x = 1; } if (1 < 2) { x = 2; }");
        let root = ast.root();

        let folded = IfStatementFolding::new().fold(&mut ast, root).unwrap();

        assert!(!folded);
        assert_eq!(body(&ast), "{ if (c) { x = 1; } if (1 < 2) { x = 2; } }");
    }
}
