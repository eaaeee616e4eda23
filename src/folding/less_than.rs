use crate::ast::{Ast, InfixOperator, Literal, Node, NodeId};
use crate::error::Result;
use crate::folding::Folding;

/// Compares two integer literals, e.g. `1 < 2` becomes `true`.
#[derive(Default, Debug)]
pub struct LessThanInfixExpressionFolding {}

impl LessThanInfixExpressionFolding {
    pub fn new() -> Self {
        Self {}
    }
}

impl Folding for LessThanInfixExpressionFolding {
    fn name(&self) -> &'static str {
        "LessThanInfixExpressionFolding"
    }

    fn fold_node(&self, ast: &mut Ast, node: NodeId) -> Result<bool> {
        let (left, right) = match ast.node(node) {
            Node::Infix {
                operator: InfixOperator::Less,
                left,
                right,
                extended,
            } if extended.is_empty() => (*left, *right),
            _ => return Ok(false),
        };

        let int_value = |operand: NodeId| ast.node(operand).literal().and_then(Literal::int_value);
        let result = match (int_value(left), int_value(right)) {
            (Some(left), Some(right)) => left < right,
            _ => return Ok(false),
        };

        let literal = ast.literal(Literal::boolean(result));
        ast.replace(node, literal)?;

        trace!("Folded comparison to {} at {}", result, node);
        Ok(true)
    }
}
