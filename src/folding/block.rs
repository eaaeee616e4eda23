use crate::ast::{Ast, Node, NodeId};
use crate::error::Result;
use crate::folding::Folding;

/// Dissolves a block nested directly in the statement list of another block.
///
/// `{ a; { b; c; } d; }` becomes `{ a; b; c; d; }`.
#[derive(Default, Debug)]
pub struct BlockFolding {}

impl BlockFolding {
    pub fn new() -> Self {
        Self {}
    }
}

impl Folding for BlockFolding {
    fn name(&self) -> &'static str {
        "BlockFolding"
    }

    fn fold_node(&self, ast: &mut Ast, node: NodeId) -> Result<bool> {
        let statements = match ast.node(node) {
            Node::Block { statements } => statements.clone(),
            _ => return Ok(false),
        };

        match ast.parent(node) {
            Some(parent) if ast.node(parent).is_block() => {}
            _ => return Ok(false),
        }

        let copies = statements
            .into_iter()
            .map(|statement| ast.duplicate(statement))
            .collect();
        ast.splice(node, copies)?;

        trace!("Dissolved nested block {}", node);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::fixtures::{body, method};

    #[test]
    fn test_dissolve_nested_blocks_in_order() {
        // GIVEN
        let mut ast = method("a = 1; { b = 2; { c = 3; } d = 4; } e = 5;");
        let root = ast.root();

        // WHEN
        let folded = BlockFolding::new().fold(&mut ast, root).unwrap();

        // THEN
        assert!(folded);
        assert_eq!(body(&ast), "{ a = 1; b = 2; c = 3; d = 4; e = 5; }");
    }

    #[test]
    fn test_dissolve_empty_nested_block() {
        let mut ast = method("a = 1; { } b = 2;");
        let root = ast.root();

        assert!(BlockFolding::new().fold(&mut ast, root).unwrap());
        assert_eq!(body(&ast), "{ a = 1; b = 2; }");
    }

    #[test]
    fn test_keep_blocks_of_control_statements() {
        let mut ast = method("if (c) { a = 1; } else { a = 2; } while (c) { b = 1; }");
        let root = ast.root();
        let before = ast.to_string();

        let folded = BlockFolding::new().fold(&mut ast, root).unwrap();

        assert!(!folded);
        assert_eq!(ast.to_string(), before);
    }
}
