use crate::ast::{Ast, InfixOperator, Literal, Node, NodeId};
use crate::error::Result;
use crate::folding::Folding;

/// Sums a `+` chain of integer literals, e.g. `1 + 2 + 3` becomes `6`.
///
/// The sum wraps around on overflow like 32 bit `int` arithmetic does.
#[derive(Default, Debug)]
pub struct PlusInfixExpressionFolding {}

impl PlusInfixExpressionFolding {
    pub fn new() -> Self {
        Self {}
    }
}

impl Folding for PlusInfixExpressionFolding {
    fn name(&self) -> &'static str {
        "PlusInfixExpressionFolding"
    }

    fn fold_node(&self, ast: &mut Ast, node: NodeId) -> Result<bool> {
        let operands = match ast.node(node) {
            Node::Infix {
                operator: InfixOperator::Plus,
                ..
            } => ast.node(node).children(),
            _ => return Ok(false),
        };

        let sum = operands.iter().try_fold(0i32, |sum, &operand| {
            ast.node(operand)
                .literal()
                .and_then(Literal::int_value)
                .map(|value| sum.wrapping_add(value))
        });

        match sum {
            Some(sum) => {
                let literal = ast.literal(Literal::integer(sum));
                ast.replace(node, literal)?;
                trace!("Folded {} operand sum to {} at {}", operands.len(), sum, node);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
