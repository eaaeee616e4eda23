use crate::ast::{Ast, Literal, Node, NodeId, PrefixOperator};
use crate::error::Result;
use crate::folding::Folding;

/// Negates a boolean literal, e.g. `!true` becomes `false`.
#[derive(Default, Debug)]
pub struct NegationPrefixExpressionFolding {}

impl NegationPrefixExpressionFolding {
    pub fn new() -> Self {
        Self {}
    }
}

impl Folding for NegationPrefixExpressionFolding {
    fn name(&self) -> &'static str {
        "NegationPrefixExpressionFolding"
    }

    fn fold_node(&self, ast: &mut Ast, node: NodeId) -> Result<bool> {
        let value = match ast.node(node) {
            Node::Prefix {
                operator: PrefixOperator::Not,
                operand,
            } => ast.node(*operand).literal().and_then(Literal::boolean_value),
            _ => None,
        };

        match value {
            Some(value) => {
                let negated = ast.literal(Literal::boolean(!value));
                ast.replace(node, negated)?;
                trace!("Folded !{} at {}", value, node);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
