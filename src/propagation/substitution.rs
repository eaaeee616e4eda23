use crate::ast::{Ast, Literal, Node, NodeId};
use crate::cfg::{ControlFlowGraph, Vertex};
use crate::error::Result;
use crate::rd::{self, Definition, ReachingDefinitions};
use std::collections::BTreeSet;

/// Replaces variable reads of one function by the constant their single reaching definition
/// assigns.
///
/// The reaching definitions are computed upfront and stay fixed while the function is rewritten.
pub(super) struct Substitution<'a> {
    cfg: &'a ControlFlowGraph,
    rd: &'a ReachingDefinitions,
    visited: BTreeSet<Vertex>,
}

impl<'a> Substitution<'a> {
    pub fn new(cfg: &'a ControlFlowGraph, rd: &'a ReachingDefinitions) -> Self {
        Self {
            cfg,
            rd,
            visited: BTreeSet::new(),
        }
    }

    /// Visits every statement reachable from the start once, depth first.
    ///
    /// Returns the number of replaced reads.
    pub fn apply(mut self, ast: &mut Ast) -> Result<usize> {
        let mut substitutions = 0;
        let mut stack = vec![self.cfg.start()];

        while let Some(vertex) = stack.pop() {
            let statement = match vertex {
                Vertex::Statement(statement) => statement,
                Vertex::End => continue,
            };
            if !self.visited.insert(vertex) {
                continue;
            }

            substitutions += self.substitute(ast, vertex, statement)?;
            stack.extend(self.cfg.successors(vertex));
        }

        Ok(substitutions)
    }

    fn substitute(&self, ast: &mut Ast, vertex: Vertex, statement: NodeId) -> Result<usize> {
        let definitions = match self.rd.reaching_definitions(vertex) {
            Some(definitions) => definitions,
            None => return Ok(0),
        };

        // the entry definitions are stale for names the statement writes itself
        let written = rd::nested_assignments(ast, statement);

        let mut substitutions = 0;
        for occurrence in read_occurrences(ast, statement) {
            let name = match ast.node(occurrence) {
                Node::Name(name) if rd::is_simple_name(name) && !written.contains(name) => {
                    name.clone()
                }
                _ => continue,
            };
            if let Some(literal) = constant_value(ast, definitions, &name) {
                let copy = ast.literal(literal);
                ast.replace(occurrence, copy)?;
                trace!("Replaced {} in {} by {}", name, statement, ast.display(copy));
                substitutions += 1;
            }
        }
        Ok(substitutions)
    }
}

/// The constant value of `name` if exactly one definition of it reaches and that definition
/// assigns a boolean or number literal.
fn constant_value(ast: &Ast, definitions: &BTreeSet<Definition>, name: &str) -> Option<Literal> {
    let mut reaching = definitions
        .iter()
        .filter(|definition| definition.name() == name);

    let statement = match (reaching.next(), reaching.next()) {
        (Some(Definition::Assigned(_, statement)), None) => *statement,
        _ => return None,
    };

    assigned_expression(ast, statement)
        .and_then(|expression| ast.node(expression).literal())
        .filter(|literal| literal.is_boolean() || literal.is_number())
        .cloned()
}

/// Right-hand side of an assignment statement or initializer of the first declaration fragment.
fn assigned_expression(ast: &Ast, statement: NodeId) -> Option<NodeId> {
    match ast.node(statement) {
        Node::ExpressionStatement { expression } => match ast.node(*expression) {
            Node::Assignment { value, .. } => Some(*value),
            _ => None,
        },
        Node::VariableDeclaration { fragments, .. } => {
            fragments.first().and_then(|fragment| fragment.initializer)
        }
        _ => None,
    }
}

/// Names read by the expressions of `statement` itself, in source order. Nested statements
/// are visited on their own.
pub(super) fn read_occurrences(ast: &Ast, statement: NodeId) -> Vec<NodeId> {
    let mut occurrences = Vec::new();
    for expression in ast.statement_expressions(statement) {
        collect_reads(ast, expression, &mut occurrences);
    }
    occurrences
}

fn collect_reads(ast: &Ast, expression: NodeId, occurrences: &mut Vec<NodeId>) {
    match ast.node(expression) {
        Node::Name(_) => occurrences.push(expression),
        // the target is written, not read
        Node::Assignment { value, .. } => collect_reads(ast, *value, occurrences),
        // the receiver is not a variable read
        Node::MethodCall { arguments, .. } => {
            for &argument in arguments {
                collect_reads(ast, argument, occurrences);
            }
        }
        node => {
            for child in node.children() {
                collect_reads(ast, child, occurrences);
            }
        }
    }
}
