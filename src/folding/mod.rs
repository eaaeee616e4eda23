//! Constant Folding
//!
//! Rewrites statements and expressions whose outcome is known at compile time,
//! e.g. `1 + 2` will become `3` and `if (true) s` will become `s`.

use crate::ast::{Ast, NodeId};
use crate::environment::{Environment, FoldingRule};
use crate::error::Result;
use crate::util::Transform;

mod block;
mod if_statement;
mod less_than;
mod negation;
mod parenthesized;
mod plus;

pub use block::BlockFolding;
pub use if_statement::IfStatementFolding;
pub use less_than::LessThanInfixExpressionFolding;
pub use negation::NegationPrefixExpressionFolding;
pub use parenthesized::ParenthesizedExpressionFolding;
pub use plus::PlusInfixExpressionFolding;

pub trait Folding {
    fn name(&self) -> &'static str;

    /// Tries to rewrite the single node `node`, assuming its descendants are already folded.
    fn fold_node(&self, ast: &mut Ast, node: NodeId) -> Result<bool>;

    /// Folds every node below and including `root`, children before their parents.
    ///
    /// Returns whether at least one node was rewritten.
    fn fold(&self, ast: &mut Ast, root: NodeId) -> Result<bool> {
        ast.expect_attached(root)?;

        let mut folded = false;
        for node in ast.post_order(root) {
            folded = self.fold_node(ast, node)? || folded;
        }
        Ok(folded)
    }
}

/// Applies an ordered list of folding rules until none of them fires anymore.
pub struct ConstantFolding {
    rules: Vec<Box<dyn Folding>>,
}

impl ConstantFolding {
    pub fn new() -> Self {
        Self::with_rules(&FoldingRule::all())
    }

    pub fn new_from_env(env: &Environment) -> Self {
        Self::with_rules(&env.folding.rules)
    }

    pub fn with_rules(rules: &[FoldingRule]) -> Self {
        Self {
            rules: rules.iter().map(|&rule| create_rule(rule)).collect(),
        }
    }

    /// Runs complete passes over `root` until a pass leaves the tree unchanged.
    ///
    /// Returns whether anything changed. Stops early if `root` itself got replaced.
    pub fn fold_to_fixpoint(&self, ast: &mut Ast, root: NodeId) -> Result<bool> {
        ast.expect_attached(root)?;

        let mut changed = false;
        let mut pass = 0;
        loop {
            pass += 1;
            let mut folded = false;
            for rule in &self.rules {
                if rule.fold(ast, root)? {
                    trace!("Pass {}: {} rewrote nodes below {}", pass, rule.name(), root);
                    folded = true;
                }
                if !ast.is_attached(root) {
                    debug!("Folding replaced the root {} itself", root);
                    return Ok(true);
                }
            }

            if !folded {
                break;
            }
            changed = true;
        }

        debug!("Folding reached its fixpoint after {} pass(es)", pass);
        Ok(changed)
    }
}

impl Default for ConstantFolding {
    fn default() -> Self {
        Self::new()
    }
}

fn create_rule(rule: FoldingRule) -> Box<dyn Folding> {
    match rule {
        FoldingRule::Block => Box::new(BlockFolding::new()),
        FoldingRule::Parenthesized => Box::new(ParenthesizedExpressionFolding::new()),
        FoldingRule::Negation => Box::new(NegationPrefixExpressionFolding::new()),
        FoldingRule::Plus => Box::new(PlusInfixExpressionFolding::new()),
        FoldingRule::LessThan => Box::new(LessThanInfixExpressionFolding::new()),
        FoldingRule::IfStatement => Box::new(IfStatementFolding::new()),
    }
}

impl Transform<Ast> for ConstantFolding {
    fn name(&self) -> &'static str {
        "ConstantFolding"
    }

    fn description(&self) -> &'static str {
        "Fold constant expressions and statements"
    }

    fn transform(&self, ast: &mut Ast) -> Result<()> {
        let root = ast.root();
        self.fold_to_fixpoint(ast, root)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::fixtures::{body, find, method};
    use crate::ast::{parse, Literal, Node};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fold_constant_if_statement_with_else() {
        // GIVEN
        let mut ast = method("if (true) { x = 1; } else { x = 2; }");
        let root = ast.root();

        // WHEN
        let changed = ConstantFolding::new()
            .fold_to_fixpoint(&mut ast, root)
            .unwrap();

        // THEN
        assert!(changed);
        assert_eq!(body(&ast), "{ x = 1; }");
    }

    #[test]
    fn test_fold_double_negation() {
        let mut ast = method("b = !(!true);");
        let root = ast.root();

        ConstantFolding::new()
            .fold_to_fixpoint(&mut ast, root)
            .unwrap();

        assert_eq!(body(&ast), "{ b = true; }");
    }

    #[test]
    fn test_fold_nested_constants_across_rules() {
        let mut ast = method("while (c) { if (1 + 2 < (3)) { { y = (1 + 1); } } else x = 0; }");
        let root = ast.root();

        ConstantFolding::new()
            .fold_to_fixpoint(&mut ast, root)
            .unwrap();

        assert_eq!(body(&ast), "{ while (c) { x = 0; } }");
    }

    #[test]
    fn test_fold_to_fixpoint_is_idempotent() {
        // GIVEN
        let mut ast = method("if (!false) { a = 1 + 2 + 3; } b = (4 < 5);");
        let root = ast.root();
        let folding = ConstantFolding::new();
        folding.fold_to_fixpoint(&mut ast, root).unwrap();
        let folded = ast.to_string();

        // WHEN
        let changed = folding.fold_to_fixpoint(&mut ast, root).unwrap();

        // THEN
        assert!(!changed);
        assert_eq!(ast.to_string(), folded);
        assert_eq!(body(&ast), "{ a = 6; b = true; }");
    }

    #[test]
    fn test_fold_to_fixpoint_reports_unchanged_tree() {
        let mut ast = method("x = a + 1; if (c) { return; }");
        let root = ast.root();
        let before = ast.to_string();

        let changed = ConstantFolding::new()
            .fold_to_fixpoint(&mut ast, root)
            .unwrap();

        assert!(!changed);
        assert_eq!(ast.to_string(), before);
    }

    #[test]
    fn test_fold_respects_configured_rules() {
        let mut ast = method("if (true) { x = !false; }");
        let root = ast.root();

        ConstantFolding::with_rules(&[FoldingRule::Negation])
            .fold_to_fixpoint(&mut ast, root)
            .unwrap();

        assert_eq!(body(&ast), "{ if (true) { x = true; } }");
    }

    #[test]
    fn test_fold_subtree_only() {
        let mut ast = parse(
            "class A { int f() { return 1 + 2; } int g() { return 3 + 4; } }",
        )
        .unwrap();
        let f = ast.method_declarations(ast.root())[0];

        ConstantFolding::new().fold_to_fixpoint(&mut ast, f).unwrap();

        assert_eq!(
            ast.to_string(),
            "class A {\n  int f() {\n    return 3;\n  }\n\n  int g() {\n    return 3 + 4;\n  }\n}\n"
        );
    }

    #[test]
    fn test_fold_rejects_detached_root() {
        // GIVEN
        let mut ast = method("x = 1 + 2;");
        let detached = ast.literal(Literal::integer(1));
        let before = ast.to_string();

        // WHEN
        let result = ConstantFolding::new().fold_to_fixpoint(&mut ast, detached);

        // THEN
        assert!(result.is_err());
        assert_eq!(ast.to_string(), before);
    }

    #[test]
    fn test_fold_stops_when_root_is_replaced() {
        let mut ast = method("if (true) { x = 1; }");
        let if_statement = find(&ast, |node| matches!(node, Node::If { .. }));

        let changed = ConstantFolding::new()
            .fold_to_fixpoint(&mut ast, if_statement)
            .unwrap();

        assert!(changed);
        assert!(!ast.is_attached(if_statement));
        assert_eq!(body(&ast), "{ { x = 1; } }");
    }

    #[test]
    fn test_transform_folds_whole_compilation_unit() {
        let mut ast = method("x = 1 + 2;");

        ConstantFolding::new().transform(&mut ast).unwrap();

        assert_eq!(body(&ast), "{ x = 3; }");
    }
}
