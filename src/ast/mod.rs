//! Arena based syntax tree of the Java subset.
//!
//! Nodes live in a single `Ast` and refer to each other through `NodeId`s. Every node knows its
//! parent, so a rewrite is an update of one child slot. Nodes which are replaced or removed stay
//! in the arena as detached garbage and are never attached again; moving a subtree always means
//! duplicating it into fresh arena entries.

use crate::error::{ErrorKind, Result};
use std::fmt;

mod node;
mod parser;
mod printer;

pub use self::node::{Fragment, InfixOperator, Literal, Node, NodeId, Parameter, PrefixOperator};
pub use self::parser::parse;

#[derive(Clone, Debug)]
struct Entry {
    node: Node,
    parent: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct Ast {
    entries: Vec<Entry>,
    root: NodeId,
}

impl Ast {
    /// Creates an `Ast` holding an empty compilation unit.
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                node: Node::CompilationUnit {
                    package: None,
                    imports: Vec::new(),
                    types: Vec::new(),
                },
                parent: None,
            }],
            root: NodeId(0),
        }
    }

    /// Returns the compilation unit.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of arena entries, detached ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.entries.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.entries[id.0].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.0].parent
    }

    /// Returns whether `id` is the root or hangs (transitively) below the root.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root
    }

    /// Returns whether `id` is the compilation unit or has a parent.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.parent(id).is_some()
    }

    /// Checks the entry condition of every tree operation: `id` belongs to this arena and is
    /// either the compilation unit or attached to a parent.
    pub fn expect_attached(&self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            bail!(ErrorKind::Precondition(format!(
                "node {} does not belong to this tree",
                id
            )));
        }
        if !self.is_attached(id) {
            bail!(ErrorKind::Precondition(format!(
                "node {} is neither the compilation unit nor attached to a parent",
                id
            )));
        }
        Ok(())
    }

    /// Adds a new node whose children must all be detached, and adopts them.
    pub fn add(&mut self, node: Node) -> Result<NodeId> {
        for child in node.children() {
            if !self.contains(child) {
                bail!(ErrorKind::Precondition(format!(
                    "child {} does not belong to this tree",
                    child
                )));
            }
            if child == self.root || self.parent(child).is_some() {
                bail!(ErrorKind::Precondition(format!(
                    "child {} already has a parent",
                    child
                )));
            }
        }
        Ok(self.push(node))
    }

    /// Adds a fresh literal leaf.
    pub fn literal(&mut self, literal: Literal) -> NodeId {
        self.push(Node::Literal(literal))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.entries.len());
        for child in node.children() {
            self.entries[child.0].parent = Some(id);
        }
        self.entries.push(Entry { node, parent: None });
        id
    }

    /// Appends a detached type declaration to the compilation unit.
    pub fn add_type(&mut self, type_declaration: NodeId) -> Result<()> {
        self.expect_detached(type_declaration)?;
        let root = self.root;
        if let Node::CompilationUnit { types, .. } = &mut self.entries[root.0].node {
            types.push(type_declaration);
        }
        self.entries[type_declaration.0].parent = Some(root);
        Ok(())
    }

    pub fn set_package(&mut self, package: Option<String>, imports: Vec<String>) {
        let root = self.root;
        if let Node::CompilationUnit {
            package: unit_package,
            imports: unit_imports,
            ..
        } = &mut self.entries[root.0].node
        {
            *unit_package = package;
            *unit_imports = imports;
        }
    }

    fn expect_detached(&self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            bail!(ErrorKind::Precondition(format!(
                "node {} does not belong to this tree",
                id
            )));
        }
        if id == self.root || self.parent(id).is_some() {
            bail!(ErrorKind::Precondition(format!(
                "node {} already has a parent",
                id
            )));
        }
        Ok(())
    }

    /// Creates a structural copy of the subtree rooted at `id`. The copy is detached and shares
    /// no node with the original.
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let mut node = self.node(id).clone();
        for child in node.children_mut() {
            *child = self.duplicate(*child);
        }
        self.push(node)
    }

    /// Replaces `old` by the detached node `new` in the parent slot of `old`.
    ///
    /// Sibling order is preserved and `old` becomes detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        self.expect_detached(new)?;
        let parent = self.parent(old).ok_or_else(|| {
            ErrorKind::Precondition(format!("node {} has no parent to be replaced in", old))
        })?;

        let slot = self.entries[parent.0]
            .node
            .children_mut()
            .into_iter()
            .find(|child| **child == old);
        match slot {
            Some(slot) => *slot = new,
            None => bail!("node {} is not a child of its parent {}", old, parent),
        }

        self.entries[new.0].parent = Some(parent);
        self.entries[old.0].parent = None;
        Ok(())
    }

    /// Replaces the statement `old` by detached copies of `statements`, spliced into the
    /// statement list of the parent block.
    pub fn splice(&mut self, old: NodeId, statements: Vec<NodeId>) -> Result<()> {
        for &statement in &statements {
            self.expect_detached(statement)?;
        }
        let parent = self.parent(old).ok_or_else(|| {
            ErrorKind::Precondition(format!("node {} has no parent to be spliced in", old))
        })?;

        match &mut self.entries[parent.0].node {
            Node::Block {
                statements: siblings,
            } => {
                let position = siblings
                    .iter()
                    .position(|&sibling| sibling == old)
                    .ok_or_else(|| format!("node {} is not a child of {}", old, parent))?;
                siblings.splice(position..=position, statements.iter().copied());
            }
            _ => bail!(ErrorKind::Precondition(format!(
                "node {} is not part of a statement list",
                old
            ))),
        }

        for statement in statements {
            self.entries[statement.0].parent = Some(parent);
        }
        self.entries[old.0].parent = None;
        Ok(())
    }

    /// Removes the statement `id` from its parent.
    ///
    /// Removal from a block deletes the list entry, an optional slot (else branch) is cleared
    /// and a mandatory statement slot receives a fresh empty block.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let parent = self.parent(id).ok_or_else(|| {
            ErrorKind::Precondition(format!("node {} has no parent to be removed from", id))
        })?;

        let removed = match &mut self.entries[parent.0].node {
            Node::Block { statements } => {
                statements.retain(|&statement| statement != id);
                true
            }
            Node::If { else_branch, .. } if *else_branch == Some(id) => {
                *else_branch = None;
                true
            }
            Node::Return { expression } if *expression == Some(id) => {
                *expression = None;
                true
            }
            Node::MethodDeclaration { body, .. } if *body == Some(id) => {
                *body = None;
                true
            }
            _ => false,
        };

        if removed {
            self.entries[id.0].parent = None;
            Ok(())
        } else if self.node(id).is_statement() {
            let empty = self.push(Node::empty_block());
            self.replace(id, empty)
        } else {
            bail!(ErrorKind::Precondition(format!(
                "node {} occupies a mandatory slot and cannot be removed",
                id
            )))
        }
    }

    /// All nodes below and including `id`, parents before children.
    pub fn pre_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.node(current).children().into_iter().rev());
        }
        order
    }

    /// All nodes below and including `id`, children before parents.
    pub fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = self.pre_order_reversed_children(id);
        order.reverse();
        order
    }

    // Pre-order with children pushed in source order; reversed it is a post-order in source order.
    fn pre_order_reversed_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.node(current).children());
        }
        order
    }

    /// All method declarations below `id` in source order.
    pub fn method_declarations(&self, id: NodeId) -> Vec<NodeId> {
        self.pre_order(id)
            .into_iter()
            .filter(|&node| matches!(self.node(node), Node::MethodDeclaration { .. }))
            .collect()
    }

    /// The top level expressions of `statement` itself in source order, without those of
    /// nested statements.
    pub fn statement_expressions(&self, statement: NodeId) -> Vec<NodeId> {
        match self.node(statement) {
            Node::ExpressionStatement { expression } => vec![*expression],
            Node::VariableDeclaration { fragments, .. } => fragments
                .iter()
                .filter_map(|fragment| fragment.initializer)
                .collect(),
            Node::If { condition, .. }
            | Node::While { condition, .. }
            | Node::DoWhile { condition, .. } => vec![*condition],
            Node::Return { expression } => expression.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns a value printing the subtree rooted at `id` as source text.
    pub fn display(&self, id: NodeId) -> Display<'_> {
        Display { ast: self, id }
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display(self.root))
    }
}

pub struct Display<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> fmt::Display for Display<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        printer::print(self.ast, self.id, f)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Parses `statements` as the body of `void f()` in `class A`.
    pub fn method(statements: &str) -> Ast {
        parse(&format!("class A {{ void f() {{ {} }} }}", statements)).unwrap()
    }

    /// Prints the body of the first method on a single line, e.g. `{ x = 1; }`.
    pub fn body(ast: &Ast) -> String {
        let method = ast.method_declarations(ast.root())[0];
        match ast.node(method) {
            Node::MethodDeclaration {
                body: Some(body), ..
            } => single_line(ast, *body),
            _ => String::new(),
        }
    }

    pub fn single_line(ast: &Ast, id: NodeId) -> String {
        ast.display(id)
            .to_string()
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First node in pre-order matching `predicate`.
    pub fn find<F>(ast: &Ast, predicate: F) -> NodeId
    where
        F: Fn(&Node) -> bool,
    {
        ast.pre_order(ast.root())
            .into_iter()
            .find(|&id| predicate(ast.node(id)))
            .unwrap()
    }
}
