use super::{Ast, Fragment, Node, NodeId, PrefixOperator};
use std::fmt;

const INDENT: &str = "  ";

/// Prints the subtree rooted at `id` as source text.
///
/// Statements are printed without trailing newline, a compilation unit ends with one.
pub(super) fn print(ast: &Ast, id: NodeId, f: &mut fmt::Formatter) -> fmt::Result {
    Printer { ast, f }.node(id, 0)
}

struct Printer<'a, 'f, 'b> {
    ast: &'a Ast,
    f: &'f mut fmt::Formatter<'b>,
}

impl<'a, 'f, 'b> Printer<'a, 'f, 'b> {
    fn indent(&mut self, level: usize) -> fmt::Result {
        for _ in 0..level {
            write!(self.f, "{}", INDENT)?;
        }
        Ok(())
    }

    fn node(&mut self, id: NodeId, level: usize) -> fmt::Result {
        let node = self.ast.node(id);
        if node.is_expression() {
            return self.expression(id);
        }

        match node {
            Node::CompilationUnit {
                package,
                imports,
                types,
            } => {
                if let Some(package) = package {
                    writeln!(self.f, "package {};", package)?;
                    writeln!(self.f)?;
                }
                for import in imports {
                    writeln!(self.f, "import {};", import)?;
                }
                if !imports.is_empty() {
                    writeln!(self.f)?;
                }
                for (i, &type_declaration) in types.iter().enumerate() {
                    if i > 0 {
                        writeln!(self.f)?;
                    }
                    self.node(type_declaration, level)?;
                    writeln!(self.f)?;
                }
                Ok(())
            }
            Node::TypeDeclaration {
                modifiers,
                name,
                methods,
            } => {
                self.modifiers(modifiers)?;
                writeln!(self.f, "class {} {{", name)?;
                for (i, &method) in methods.iter().enumerate() {
                    if i > 0 {
                        writeln!(self.f)?;
                    }
                    self.indent(level + 1)?;
                    self.node(method, level + 1)?;
                    writeln!(self.f)?;
                }
                self.indent(level)?;
                write!(self.f, "}}")
            }
            Node::MethodDeclaration {
                modifiers,
                return_type,
                name,
                parameters,
                body,
            } => {
                self.modifiers(modifiers)?;
                let parameters: Vec<String> = parameters
                    .iter()
                    .map(|parameter| format!("{} {}", parameter.ty, parameter.name))
                    .collect();
                write!(
                    self.f,
                    "{} {}({})",
                    return_type,
                    name,
                    parameters.join(", ")
                )?;
                match body {
                    Some(body) => {
                        write!(self.f, " ")?;
                        self.node(*body, level)
                    }
                    None => write!(self.f, ";"),
                }
            }
            Node::Block { statements } => {
                writeln!(self.f, "{{")?;
                for &statement in statements {
                    self.indent(level + 1)?;
                    self.node(statement, level + 1)?;
                    writeln!(self.f)?;
                }
                self.indent(level)?;
                write!(self.f, "}}")
            }
            Node::ExpressionStatement { expression } => {
                self.expression(*expression)?;
                write!(self.f, ";")
            }
            Node::VariableDeclaration { ty, fragments } => {
                write!(self.f, "{} ", ty)?;
                for (i, Fragment { name, initializer }) in fragments.iter().enumerate() {
                    if i > 0 {
                        write!(self.f, ", ")?;
                    }
                    write!(self.f, "{}", name)?;
                    if let Some(initializer) = initializer {
                        write!(self.f, " = ")?;
                        self.expression(*initializer)?;
                    }
                }
                write!(self.f, ";")
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(self.f, "if (")?;
                self.expression(*condition)?;
                write!(self.f, ")")?;
                self.branch(*then_branch, level)?;
                if let Some(else_branch) = else_branch {
                    self.continuation(*then_branch, level)?;
                    write!(self.f, "else")?;
                    if matches!(self.ast.node(*else_branch), Node::If { .. }) {
                        write!(self.f, " ")?;
                        self.node(*else_branch, level)?;
                    } else {
                        self.branch(*else_branch, level)?;
                    }
                }
                Ok(())
            }
            Node::While { condition, body } => {
                write!(self.f, "while (")?;
                self.expression(*condition)?;
                write!(self.f, ")")?;
                self.branch(*body, level)
            }
            Node::DoWhile { body, condition } => {
                write!(self.f, "do")?;
                self.branch(*body, level)?;
                self.continuation(*body, level)?;
                write!(self.f, "while (")?;
                self.expression(*condition)?;
                write!(self.f, ");")
            }
            Node::Return { expression } => {
                write!(self.f, "return")?;
                if let Some(expression) = expression {
                    write!(self.f, " ")?;
                    self.expression(*expression)?;
                }
                write!(self.f, ";")
            }
            Node::Empty => write!(self.f, ";"),
            _ => unreachable!("expressions are printed by `expression`"),
        }
    }

    fn modifiers(&mut self, modifiers: &[String]) -> fmt::Result {
        for modifier in modifiers {
            write!(self.f, "{} ", modifier)?;
        }
        Ok(())
    }

    /// Prints the body of a control statement: blocks stay on the header line, other
    /// statements go to the next line, indented one level deeper.
    fn branch(&mut self, id: NodeId, level: usize) -> fmt::Result {
        if self.ast.node(id).is_block() {
            write!(self.f, " ")?;
            self.node(id, level)
        } else {
            writeln!(self.f)?;
            self.indent(level + 1)?;
            self.node(id, level + 1)
        }
    }

    /// Separator between a branch and a following `else` or `while`.
    fn continuation(&mut self, previous: NodeId, level: usize) -> fmt::Result {
        if self.ast.node(previous).is_block() {
            write!(self.f, " ")
        } else {
            writeln!(self.f)?;
            self.indent(level)
        }
    }

    fn expression(&mut self, id: NodeId) -> fmt::Result {
        match self.ast.node(id) {
            Node::Literal(literal) => write!(self.f, "{}", literal),
            Node::Name(name) => write!(self.f, "{}", name),
            Node::Prefix { operator, operand } => {
                write!(self.f, "{}", operator)?;
                // `- -1` must not turn into the decrement operator
                if *operator == PrefixOperator::Minus && starts_with_minus(self.ast, *operand) {
                    write!(self.f, " ")?;
                }
                self.expression(*operand)
            }
            Node::Infix {
                operator,
                left,
                right,
                extended,
            } => {
                self.expression(*left)?;
                for &operand in std::iter::once(right).chain(extended.iter()) {
                    write!(self.f, " {} ", operator)?;
                    self.expression(operand)?;
                }
                Ok(())
            }
            Node::Parenthesized { expression } => {
                write!(self.f, "(")?;
                self.expression(*expression)?;
                write!(self.f, ")")
            }
            Node::Assignment { target, value } => {
                self.expression(*target)?;
                write!(self.f, " = ")?;
                self.expression(*value)
            }
            Node::MethodCall {
                receiver,
                name,
                arguments,
            } => {
                if let Some(receiver) = receiver {
                    self.expression(*receiver)?;
                    write!(self.f, ".")?;
                }
                write!(self.f, "{}(", name)?;
                for (i, &argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(self.f, ", ")?;
                    }
                    self.expression(argument)?;
                }
                write!(self.f, ")")
            }
            _ => unreachable!("statements are printed by `node`"),
        }
    }
}

fn starts_with_minus(ast: &Ast, id: NodeId) -> bool {
    match ast.node(id) {
        Node::Literal(literal) => literal.to_string().starts_with('-'),
        Node::Prefix { operator, .. } => *operator == PrefixOperator::Minus,
        Node::Infix { left, .. } => starts_with_minus(ast, *left),
        _ => false,
    }
}
