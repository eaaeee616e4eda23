//! Reaching definitions over statement level control flow graphs.
//!
//! A forward may-analysis solved with a FIFO worklist:
//!
//! - `exit(n) = (entry(n) \ kill(n)) ∪ gen(n)`, where `kill(n)` holds every simple name
//!   written by `n` and `gen(n)` at most the definition of its outermost assignment
//! - `entry(n) = ⋃ exit(p)` over all predecessors `p`, plus the method parameters at the start.

use crate::ast::{Ast, Node, NodeId};
use crate::cfg::{ControlFlowGraph, Vertex};
use crate::error::{ErrorKind, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// A definition of a variable which may reach a statement.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Definition {
    /// Defined outside of the method body, so the value is unknown.
    Parameter(String),
    /// Defined by an assignment or a variable declaration.
    Assigned(String, NodeId),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Self::Parameter(name) | Self::Assigned(name, _) => name,
        }
    }

    /// The defining statement, `None` for parameters.
    pub fn statement(&self) -> Option<NodeId> {
        match self {
            Self::Parameter(_) => None,
            Self::Assigned(_, statement) => Some(*statement),
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Parameter(name) => write!(f, "{} (parameter)", name),
            Self::Assigned(name, statement) => write!(f, "{} @ {}", name, statement),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReachingDefinitions {
    method: NodeId,
    entries: BTreeMap<Vertex, BTreeSet<Definition>>,
    exits: BTreeMap<Vertex, BTreeSet<Definition>>,
}

impl ReachingDefinitions {
    pub fn method(&self) -> NodeId {
        self.method
    }

    /// Definitions reaching the entry of `vertex`, `None` if the vertex is unreachable.
    pub fn reaching_definitions(&self, vertex: Vertex) -> Option<&BTreeSet<Definition>> {
        self.entries.get(&vertex)
    }

    /// Definitions leaving `vertex`, `None` if the vertex is unreachable.
    pub fn exit_definitions(&self, vertex: Vertex) -> Option<&BTreeSet<Definition>> {
        self.exits.get(&vertex)
    }
}

/// Computes the reaching definitions of every graph in `cfgs`.
pub fn build(ast: &Ast, cfgs: &[ControlFlowGraph]) -> Result<Vec<ReachingDefinitions>> {
    cfgs.iter().map(|cfg| reaching_definitions(ast, cfg)).collect()
}

fn reaching_definitions(ast: &Ast, cfg: &ControlFlowGraph) -> Result<ReachingDefinitions> {
    if !ast.contains(cfg.method()) {
        bail!(ErrorKind::Precondition(format!(
            "node {} does not belong to this tree",
            cfg.method()
        )));
    }
    let parameters = match ast.node(cfg.method()) {
        Node::MethodDeclaration { parameters, .. } => parameters,
        _ => bail!(ErrorKind::Precondition(format!(
            "node {} is not a method declaration",
            cfg.method()
        ))),
    };

    let seed: BTreeSet<Definition> = parameters
        .iter()
        .map(|parameter| Definition::Parameter(parameter.name.clone()))
        .collect();
    let transfers = compute_transfers(ast, cfg);

    let mut entries: BTreeMap<Vertex, BTreeSet<Definition>> = BTreeMap::new();
    let mut exits: BTreeMap<Vertex, BTreeSet<Definition>> = BTreeMap::new();

    let mut queue = VecDeque::new();
    queue.push_back(cfg.start());

    while let Some(vertex) = queue.pop_front() {
        // entry = seed ∪ exits of all predecessors (which have been visited already)
        let mut entry = if vertex == cfg.start() {
            seed.clone()
        } else {
            BTreeSet::new()
        };
        for predecessor in cfg.predecessors(vertex) {
            if let Some(exit) = exits.get(&predecessor) {
                entry.extend(exit.iter().cloned());
            }
        }

        // exit = (entry \ kill) ∪ gen
        let mut exit = entry.clone();
        if let Some(transfer) = transfers.get(&vertex) {
            exit.retain(|reaching| !transfer.killed.contains(reaching.name()));
            exit.extend(transfer.generated.iter().cloned());
        }

        entries.insert(vertex, entry);

        if exits.get(&vertex) != Some(&exit) {
            exits.insert(vertex, exit);
            queue.extend(cfg.successors(vertex));
        }
    }

    debug!(
        "Reaching definitions of {}: {} of {} vertices reached",
        cfg.method(),
        entries.len(),
        cfg.vertices().count()
    );

    Ok(ReachingDefinitions {
        method: cfg.method(),
        entries,
        exits,
    })
}

struct Transfer {
    killed: BTreeSet<String>,
    generated: Option<Definition>,
}

/// Collects the kill/gen information of every vertex reachable from the start.
fn compute_transfers(ast: &Ast, cfg: &ControlFlowGraph) -> BTreeMap<Vertex, Transfer> {
    let mut transfers = BTreeMap::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![cfg.start()];

    while let Some(vertex) = stack.pop() {
        if !visited.insert(vertex) {
            continue;
        }
        if let Some(statement) = vertex.statement() {
            let mut killed = nested_assignments(ast, statement);
            let generated = defined_variable(ast, statement).map(|name| {
                killed.insert(name.to_owned());
                Definition::Assigned(name.to_owned(), statement)
            });
            if !killed.is_empty() {
                transfers.insert(vertex, Transfer { killed, generated });
            }
        }
        stack.extend(cfg.successors(vertex));
    }

    transfers
}

/// The variable defined by `statement`: the simple name assigned by an expression statement
/// or the first fragment of a variable declaration.
pub fn defined_variable(ast: &Ast, statement: NodeId) -> Option<&str> {
    match ast.node(statement) {
        Node::ExpressionStatement { expression } => match ast.node(*expression) {
            Node::Assignment { target, .. } => match ast.node(*target) {
                Node::Name(name) if is_simple_name(name) => Some(name),
                _ => None,
            },
            _ => None,
        },
        Node::VariableDeclaration { fragments, .. } => {
            fragments.first().map(|fragment| fragment.name.as_str())
        }
        _ => None,
    }
}

/// Simple names written by assignments nested in the expressions of `statement`, like `b` in
/// `a = b = 1;` or in `f(b = 1);`. These are killed without generating a definition.
pub fn nested_assignments(ast: &Ast, statement: NodeId) -> BTreeSet<String> {
    let roots = match ast.node(statement) {
        Node::ExpressionStatement { expression } => match ast.node(*expression) {
            Node::Assignment { value, .. } => vec![*value],
            _ => vec![*expression],
        },
        _ => ast.statement_expressions(statement),
    };

    roots
        .into_iter()
        .flat_map(|root| ast.pre_order(root))
        .filter_map(|node| match ast.node(node) {
            Node::Assignment { target, .. } => match ast.node(*target) {
                Node::Name(name) if is_simple_name(name) => Some(name.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

pub fn is_simple_name(name: &str) -> bool {
    !name.contains('.')
}
