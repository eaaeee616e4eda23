//! Constant Propagation
//!
//! Alternates constant folding with the substitution of variable reads whose single reaching
//! definition assigns a constant, until neither of them changes the tree anymore.

use crate::ast::{Ast, NodeId};
use crate::cfg;
use crate::environment::Environment;
use crate::error::Result;
use crate::folding::ConstantFolding;
use crate::rd;
use crate::util::Transform;

mod substitution;

use substitution::Substitution;

pub struct ConstantPropagation {
    folding: ConstantFolding,
}

impl ConstantPropagation {
    pub fn new() -> Self {
        Self {
            folding: ConstantFolding::new(),
        }
    }

    pub fn new_from_env(env: &Environment) -> Self {
        Self {
            folding: ConstantFolding::new_from_env(env),
        }
    }

    /// Optimizes every method below `root`.
    ///
    /// Graphs and reaching definitions are rebuilt from scratch in every iteration.
    pub fn propagate(&self, ast: &mut Ast, root: NodeId) -> Result<()> {
        ast.expect_attached(root)?;

        let mut iteration = 0;
        loop {
            iteration += 1;

            let folded = self.folding.fold_to_fixpoint(ast, root)?;
            if !ast.is_attached(root) {
                debug!("Iteration {}: folding replaced the root {}", iteration, root);
                return Ok(());
            }

            let cfgs = cfg::build(ast, root)?;
            let rds = rd::build(ast, &cfgs)?;

            let mut substitutions = 0;
            for (cfg, rd) in cfgs.iter().zip(&rds) {
                substitutions += Substitution::new(cfg, rd).apply(ast)?;
            }

            debug!(
                "Iteration {}: folded {}, {} substitution(s) in {} method(s)",
                iteration,
                folded,
                substitutions,
                cfgs.len()
            );

            if !folded && substitutions == 0 {
                return Ok(());
            }
        }
    }
}

impl Default for ConstantPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform<Ast> for ConstantPropagation {
    fn name(&self) -> &'static str {
        "ConstantPropagation"
    }

    fn description(&self) -> &'static str {
        "Propagate and fold constants"
    }

    fn transform(&self, ast: &mut Ast) -> Result<()> {
        let root = ast.root();
        self.propagate(ast, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::fixtures::{body, find, method};
    use crate::ast::{parse, Literal, Node};
    use crate::environment::{EnvironmentBuilder, Folding, FoldingRule};
    use pretty_assertions::assert_eq;

    fn propagate(source: &str) -> String {
        let mut ast = method(source);
        let root = ast.root();
        ConstantPropagation::new().propagate(&mut ast, root).unwrap();
        body(&ast)
    }

    #[test]
    fn test_propagate_single_definition() {
        // GIVEN
        let source = "int a; a = 1; return a;";

        // WHEN
        let optimized = propagate(source);

        // THEN
        assert_eq!(optimized, "{ int a; a = 1; return 1; }");
    }

    #[test]
    fn test_keep_read_reached_by_two_definitions() {
        let optimized = propagate("int a; if (c) { a = 1; } else { a = 2; } return a;");

        assert_eq!(
            optimized,
            "{ int a; if (c) { a = 1; } else { a = 2; } return a; }"
        );
    }

    #[test]
    fn test_never_replace_assignment_target() {
        let optimized = propagate("int a = 1; a = a + 2; return a;");

        assert_eq!(optimized, "{ int a = 1; a = 3; return 3; }");
    }

    #[test]
    fn test_chained_assignment_invalidates_inner_target() {
        // GIVEN
        let source = "int b = 2; int a; a = b = 1; return b;";

        // WHEN
        let optimized = propagate(source);

        // THEN
        assert_eq!(optimized, "{ int b = 2; int a; a = b = 1; return b; }");
    }

    #[test]
    fn test_assignment_in_call_argument_invalidates_target() {
        let optimized = propagate("int b = 2; f(b = 1); return b;");

        assert_eq!(optimized, "{ int b = 2; f(b = 1); return b; }");
    }

    #[test]
    fn test_keep_reads_after_assignment_in_same_statement() {
        let optimized = propagate("int b = 2; a = (b = 1) + b;");

        assert_eq!(optimized, "{ int b = 2; a = (b = 1) + b; }");
    }

    #[test]
    fn test_keep_parameters() {
        let mut ast = parse("class A { int f(int p) { int q = p; return q; } }").unwrap();
        let before = ast.to_string();
        let root = ast.root();

        ConstantPropagation::new().propagate(&mut ast, root).unwrap();

        assert_eq!(ast.to_string(), before);
    }

    #[test]
    fn test_propagation_enables_folding_and_vice_versa() {
        // GIVEN
        let source = "int a = 1; int b = a + 2; if (b < 4) { x = 1; } else { x = 2; } return x;";

        // WHEN
        let optimized = propagate(source);

        // THEN
        assert_eq!(optimized, "{ int a = 1; int b = 3; x = 1; return 1; }");
    }

    #[test]
    fn test_keep_loop_carried_variable() {
        let source = "int i = 0; while (i < 10) { i = i + 1; } return i;";

        let optimized = propagate(source);

        assert_eq!(
            optimized,
            "{ int i = 0; while (i < 10) { i = i + 1; } return i; }"
        );
    }

    #[test]
    fn test_propagate_into_loop_of_unmodified_variable() {
        let optimized = propagate("int n = 10; while (i < n) { i = i + n; }");

        assert_eq!(optimized, "{ int n = 10; while (i < 10) { i = i + 10; } }");
    }

    #[test]
    fn test_propagate_into_call_arguments_only() {
        let optimized = propagate("int a = 1; System.out.println(a); f(a, -a);");

        assert_eq!(
            optimized,
            "{ int a = 1; System.out.println(1); f(1, -1); }"
        );
    }

    #[test]
    fn test_keep_non_numeric_constants() {
        let optimized = propagate("String s = \"x\"; int b = true; f(s, b);");

        assert_eq!(optimized, "{ String s = \"x\"; int b = true; f(s, true); }");
    }

    #[test]
    fn test_keep_later_declaration_fragments() {
        let optimized = propagate("int a = 1, b = 2; return a + b;");

        assert_eq!(optimized, "{ int a = 1, b = 2; return 1 + b; }");
    }

    #[test]
    fn test_keep_unreachable_statements() {
        let optimized = propagate("int a = 1; return a; f(a);");

        assert_eq!(optimized, "{ int a = 1; return 1; f(a); }");
    }

    #[test]
    fn test_methods_are_independent() {
        let mut ast = parse(
            "class A { int f() { int a = 1; return a; } int g(int a) { return a; } }",
        )
        .unwrap();
        let root = ast.root();

        ConstantPropagation::new().propagate(&mut ast, root).unwrap();

        assert_eq!(
            ast.to_string(),
            "class A {\n  int f() {\n    int a = 1;\n    return 1;\n  }\n\n  int g(int a) {\n    return a;\n  }\n}\n"
        );
    }

    #[test]
    fn test_propagate_is_idempotent() {
        // GIVEN
        let mut ast = method("int a = 2; int b = a + a; if (!(b < 3)) { y = b; }");
        let root = ast.root();
        let propagation = ConstantPropagation::new();
        propagation.propagate(&mut ast, root).unwrap();
        let optimized = ast.to_string();

        // WHEN
        propagation.propagate(&mut ast, root).unwrap();

        // THEN
        assert_eq!(ast.to_string(), optimized);
        assert_eq!(body(&ast), "{ int a = 2; int b = 4; y = 4; }");
    }

    #[test]
    fn test_reject_detached_root() {
        let mut ast = method("int a = 1; return a;");
        let detached = ast.literal(Literal::integer(1));
        let before = ast.to_string();

        let result = ConstantPropagation::new().propagate(&mut ast, detached);

        assert!(result.is_err());
        assert_eq!(ast.to_string(), before);
    }

    #[test]
    fn test_stop_when_folding_replaces_root() {
        let mut ast = method("int a = 1; if (true) { return a; }");
        let if_statement = find(&ast, |node| matches!(node, Node::If { .. }));

        ConstantPropagation::new()
            .propagate(&mut ast, if_statement)
            .unwrap();

        assert_eq!(body(&ast), "{ int a = 1; { return a; } }");
    }

    #[test]
    fn test_new_from_env_uses_configured_rules() {
        let env = EnvironmentBuilder::default()
            .folding(Folding {
                rules: vec![FoldingRule::Plus],
            })
            .build()
            .unwrap();
        let mut ast = method("int a = 1; if (a < 2) { x = a + 1; }");

        ConstantPropagation::new_from_env(&env)
            .transform(&mut ast)
            .unwrap();

        assert_eq!(body(&ast), "{ int a = 1; if (1 < 2) { x = 2; } }");
    }
}
