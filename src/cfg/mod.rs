//! Statement level control flow graphs.
//!
//! Every statement of a method body is a vertex on its own; blocks are not vertices but only
//! chain their statements. All paths leaving the method meet in the synthetic `Vertex::End`.

use crate::ast::{Ast, Node, NodeId};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Vertex {
    Statement(NodeId),
    End,
}

impl Vertex {
    pub fn statement(self) -> Option<NodeId> {
        match self {
            Self::Statement(id) => Some(id),
            Self::End => None,
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Statement(id) => write!(f, "{}", id),
            Self::End => write!(f, "end"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControlFlowGraph {
    method: NodeId,
    start: Vertex,
    successors: BTreeMap<Vertex, BTreeSet<Vertex>>,
    predecessors: BTreeMap<Vertex, BTreeSet<Vertex>>,
}

impl ControlFlowGraph {
    fn new(method: NodeId) -> Self {
        let mut cfg = Self {
            method,
            start: Vertex::End,
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        };
        cfg.add_vertex(Vertex::End);
        cfg
    }

    /// The method declaration this graph was built for.
    pub fn method(&self) -> NodeId {
        self.method
    }

    /// Entry vertex, `Vertex::End` for a method without statements.
    pub fn start(&self) -> Vertex {
        self.start
    }

    pub fn end(&self) -> Vertex {
        Vertex::End
    }

    pub fn contains(&self, vertex: Vertex) -> bool {
        self.successors.contains_key(&vertex)
    }

    /// All vertices in ascending order, `Vertex::End` last.
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.successors.keys().copied()
    }

    pub fn successors(&self, vertex: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.successors.get(&vertex).into_iter().flatten().copied()
    }

    pub fn predecessors(&self, vertex: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.predecessors.get(&vertex).into_iter().flatten().copied()
    }

    pub fn has_edge(&self, from: Vertex, to: Vertex) -> bool {
        self.successors
            .get(&from)
            .map_or(false, |successors| successors.contains(&to))
    }

    pub fn edge_count(&self) -> usize {
        self.successors.values().map(BTreeSet::len).sum()
    }

    fn add_vertex(&mut self, vertex: Vertex) {
        self.successors.entry(vertex).or_default();
        self.predecessors.entry(vertex).or_default();
    }

    fn add_edge(&mut self, from: Vertex, to: Vertex) {
        self.add_vertex(from);
        self.add_vertex(to);
        self.successors.entry(from).or_default().insert(to);
        self.predecessors.entry(to).or_default().insert(from);
    }

    /// Renders the graph in Graphviz DOT format, labeling vertices with their statements.
    pub fn dot_graph(&self, ast: &Ast) -> String {
        let name = match ast.node(self.method) {
            Node::MethodDeclaration { name, .. } => name.as_str(),
            _ => "cfg",
        };

        let mut dot = format!("digraph \"{}\" {{\n", name);
        dot.push_str("  entry [shape=point];\n");
        for vertex in self.vertices() {
            dot.push_str(&format!(
                "  {} [shape=box, label=\"{}\"];\n",
                dot_id(vertex),
                label(ast, vertex).replace('\\', "\\\\").replace('"', "\\\"")
            ));
        }
        dot.push_str(&format!("  entry -> {};\n", dot_id(self.start)));
        for (from, successors) in &self.successors {
            for to in successors {
                dot.push_str(&format!("  {} -> {};\n", dot_id(*from), dot_id(*to)));
            }
        }
        dot.push_str("}\n");
        dot
    }
}

fn dot_id(vertex: Vertex) -> String {
    match vertex {
        Vertex::Statement(id) => format!("s{}", id.index()),
        Vertex::End => "end".to_owned(),
    }
}

/// One line describing `vertex`; compound statements are reduced to their header.
pub fn label(ast: &Ast, vertex: Vertex) -> String {
    let id = match vertex {
        Vertex::Statement(id) => id,
        Vertex::End => return "end".to_owned(),
    };

    match ast.node(id) {
        Node::If { condition, .. } => format!("if ({})", ast.display(*condition)),
        Node::While { condition, .. } => format!("while ({})", ast.display(*condition)),
        Node::DoWhile { condition, .. } => format!("do-while ({})", ast.display(*condition)),
        Node::Block { .. } => "{ ... }".to_owned(),
        _ => ast
            .display(id)
            .to_string()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Builds one control flow graph per method declaration below `root`, in source order.
pub fn build(ast: &Ast, root: NodeId) -> Result<Vec<ControlFlowGraph>> {
    ast.expect_attached(root)?;

    let cfgs: Vec<ControlFlowGraph> = ast
        .method_declarations(root)
        .into_iter()
        .map(|method| Builder::new(ast, method).build())
        .collect();

    for cfg in &cfgs {
        trace!(
            "CFG of {}: {} vertices, {} edges",
            cfg.method(),
            cfg.successors.len(),
            cfg.edge_count()
        );
    }
    Ok(cfgs)
}

struct Builder<'a> {
    ast: &'a Ast,
    cfg: ControlFlowGraph,
}

impl<'a> Builder<'a> {
    fn new(ast: &'a Ast, method: NodeId) -> Self {
        Self {
            ast,
            cfg: ControlFlowGraph::new(method),
        }
    }

    fn build(mut self) -> ControlFlowGraph {
        let body = match self.ast.node(self.cfg.method) {
            Node::MethodDeclaration { body, .. } => *body,
            _ => None,
        };
        if let Some(body) = body {
            self.cfg.start = self.statement(body, Vertex::End);
        }
        self.cfg
    }

    /// Adds `statement` with flow continuing at `continuation` and returns its entry vertex.
    fn statement(&mut self, statement: NodeId, continuation: Vertex) -> Vertex {
        let ast = self.ast;
        let vertex = Vertex::Statement(statement);

        match ast.node(statement) {
            Node::Block { statements } => return self.block(statements, continuation),
            Node::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.cfg.add_vertex(vertex);
                let then_entry = self.statement(*then_branch, continuation);
                self.cfg.add_edge(vertex, then_entry);
                let else_entry = match else_branch {
                    Some(else_branch) => self.statement(*else_branch, continuation),
                    None => continuation,
                };
                self.cfg.add_edge(vertex, else_entry);
            }
            Node::While { body, .. } | Node::DoWhile { body, .. } => {
                self.cfg.add_vertex(vertex);
                let body_entry = self.statement(*body, vertex);
                if body_entry != vertex {
                    self.cfg.add_edge(vertex, body_entry);
                }
                self.cfg.add_edge(vertex, continuation);
            }
            Node::Return { .. } => self.cfg.add_edge(vertex, Vertex::End),
            _ => self.cfg.add_edge(vertex, continuation),
        }

        vertex
    }

    fn block(&mut self, statements: &[NodeId], continuation: Vertex) -> Vertex {
        let ast = self.ast;
        let reachable = statements
            .iter()
            .position(|&statement| matches!(ast.node(statement), Node::Return { .. }))
            .map_or(statements.len(), |position| position + 1);

        for &statement in &statements[reachable..] {
            self.cfg.add_vertex(Vertex::Statement(statement));
        }

        statements[..reachable]
            .iter()
            .rev()
            .fold(continuation, |next, &statement| {
                self.statement(statement, next)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::fixtures::method;
    use crate::ast::{parse, Literal};
    use pretty_assertions::assert_eq;

    fn cfg_of(statements: &str) -> (Ast, ControlFlowGraph) {
        let ast = method(statements);
        let mut cfgs = build(&ast, ast.root()).unwrap();
        assert_eq!(cfgs.len(), 1);
        let cfg = cfgs.remove(0);
        (ast, cfg)
    }

    fn edges(ast: &Ast, cfg: &ControlFlowGraph) -> Vec<(String, String)> {
        cfg.vertices()
            .flat_map(|from| {
                cfg.successors(from)
                    .map(move |to| (label(ast, from), label(ast, to)))
            })
            .collect()
    }

    fn edge(from: &str, to: &str) -> (String, String) {
        (from.to_owned(), to.to_owned())
    }

    fn sorted(mut edges: Vec<(String, String)>) -> Vec<(String, String)> {
        edges.sort();
        edges
    }

    #[test]
    fn test_empty_body_starts_at_end() {
        let (_, cfg) = cfg_of("");

        assert_eq!(cfg.start(), Vertex::End);
        assert_eq!(cfg.successors(cfg.end()).count(), 0);
        assert_eq!(cfg.edge_count(), 0);
    }

    #[test]
    fn test_method_without_body_starts_at_end() {
        let ast = parse("class A { abstract void f(); }").unwrap();

        let cfgs = build(&ast, ast.root()).unwrap();

        assert_eq!(cfgs.len(), 1);
        assert_eq!(cfgs[0].start(), Vertex::End);
    }

    #[test]
    fn test_sequence() {
        let (ast, cfg) = cfg_of("int a = 1; a = 2; ;");

        assert_eq!(label(&ast, cfg.start()), "int a = 1;");
        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![
                edge("int a = 1;", "a = 2;"),
                edge("a = 2;", ";"),
                edge(";", "end"),
            ])
        );
    }

    #[test]
    fn test_if_without_else_links_continuation() {
        let (ast, cfg) = cfg_of("if (c) { a = 1; } b = 2;");

        assert_eq!(label(&ast, cfg.start()), "if (c)");
        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![
                edge("if (c)", "a = 1;"),
                edge("if (c)", "b = 2;"),
                edge("a = 1;", "b = 2;"),
                edge("b = 2;", "end"),
            ])
        );
    }

    #[test]
    fn test_if_with_else_does_not_link_continuation() {
        let (ast, cfg) = cfg_of("if (c) { a = 1; } else { a = 2; } b = 3;");

        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![
                edge("if (c)", "a = 1;"),
                edge("if (c)", "a = 2;"),
                edge("a = 1;", "b = 3;"),
                edge("a = 2;", "b = 3;"),
                edge("b = 3;", "end"),
            ])
        );
    }

    #[test]
    fn test_if_with_empty_branches_links_continuation() {
        let (ast, cfg) = cfg_of("if (c) { } else { } b = 1;");

        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![edge("if (c)", "b = 1;"), edge("b = 1;", "end")])
        );
    }

    #[test]
    fn test_while_has_back_edge() {
        // GIVEN
        let source = "while (c) { a = 1; a = 2; } b = 3;";

        // WHEN
        let (ast, cfg) = cfg_of(source);

        // THEN
        assert_eq!(label(&ast, cfg.start()), "while (c)");
        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![
                edge("while (c)", "a = 1;"),
                edge("while (c)", "b = 3;"),
                edge("a = 1;", "a = 2;"),
                edge("a = 2;", "while (c)"),
                edge("b = 3;", "end"),
            ])
        );
    }

    #[test]
    fn test_empty_while_links_only_continuation() {
        let (ast, cfg) = cfg_of("while (c) { } b = 1;");

        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![edge("while (c)", "b = 1;"), edge("b = 1;", "end")])
        );
    }

    #[test]
    fn test_do_while_uses_header_first() {
        let (ast, cfg) = cfg_of("do { a = 1; } while (c); b = 2;");

        assert_eq!(label(&ast, cfg.start()), "do-while (c)");
        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![
                edge("do-while (c)", "a = 1;"),
                edge("do-while (c)", "b = 2;"),
                edge("a = 1;", "do-while (c)"),
                edge("b = 2;", "end"),
            ])
        );
    }

    #[test]
    fn test_return_links_end_only() {
        // GIVEN
        let source = "if (c) { return 1; } a = 2; return a; a = 3;";

        // WHEN
        let (ast, cfg) = cfg_of(source);

        // THEN
        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![
                edge("if (c)", "return 1;"),
                edge("if (c)", "a = 2;"),
                edge("return 1;", "end"),
                edge("a = 2;", "return a;"),
                edge("return a;", "end"),
            ])
        );
        let unreachable = cfg
            .vertices()
            .find(|&vertex| label(&ast, vertex) == "a = 3;")
            .unwrap();
        assert_eq!(cfg.successors(unreachable).count(), 0);
        assert_eq!(cfg.predecessors(unreachable).count(), 0);
    }

    #[test]
    fn test_nested_blocks_are_chained() {
        let (ast, cfg) = cfg_of("{ a = 1; { } } b = 2;");

        assert_eq!(label(&ast, cfg.start()), "a = 1;");
        assert_eq!(
            sorted(edges(&ast, &cfg)),
            sorted(vec![edge("a = 1;", "b = 2;"), edge("b = 2;", "end")])
        );
    }

    #[test]
    fn test_predecessors_mirror_successors() {
        let (_, cfg) = cfg_of("while (c) { if (d) { a = 1; } else { return; } } b = 2;");

        for from in cfg.vertices() {
            for to in cfg.successors(from) {
                assert!(cfg.predecessors(to).any(|vertex| vertex == from));
            }
            for to in cfg.predecessors(from) {
                assert!(cfg.has_edge(to, from));
            }
        }
        assert_eq!(cfg.successors(cfg.end()).count(), 0);
    }

    #[test]
    fn test_one_graph_per_method_in_source_order() {
        let ast = parse(
            "class A { void f() { a = 1; } void g() { } }\n\
             class B { int h(int x) { return x; } }",
        )
        .unwrap();

        let cfgs = build(&ast, ast.root()).unwrap();

        let names: Vec<String> = cfgs
            .iter()
            .map(|cfg| match ast.node(cfg.method()) {
                Node::MethodDeclaration { name, .. } => name.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["f", "g", "h"]);
    }

    #[test]
    fn test_build_rejects_detached_root() {
        let mut ast = method("a = 1;");
        let detached = ast.literal(Literal::integer(1));

        assert!(build(&ast, detached).is_err());
    }

    #[test]
    fn test_dot_graph() {
        let (ast, cfg) = cfg_of("x = \"s\";");
        let statement = cfg.start().statement().unwrap();

        let dot = cfg.dot_graph(&ast);

        assert_eq!(
            dot,
            format!(
                "digraph \"f\" {{\n  \
                   entry [shape=point];\n  \
                   s{0} [shape=box, label=\"x = \\\"s\\\";\"];\n  \
                   end [shape=box, label=\"end\"];\n  \
                   entry -> s{0};\n  \
                   s{0} -> end;\n\
                 }}\n",
                statement.index()
            )
        );
    }
}
