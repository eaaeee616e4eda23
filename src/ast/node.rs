use std::fmt;

/// Stable index of a node inside an `Ast` arena.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeId(pub(super) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Literal {
    Boolean(bool),
    /// The number token as written, e.g. `42`, `7L` or `1.5`.
    Number(String),
    /// String contents without the surrounding quotes, escapes kept as written.
    String(String),
    /// Character contents without the surrounding quotes, escapes kept as written.
    Character(String),
    Null,
    /// `Name.class`
    Type(String),
}

impl Literal {
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn integer(value: i32) -> Self {
        Self::Number(value.to_string())
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    pub fn boolean_value(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value of a decimal `int` literal.
    ///
    /// Tokens with a suffix, a fraction or a value outside of the 32 bit range yield `None`,
    /// as do octal tokens like `010`.
    pub fn int_value(&self) -> Option<i32> {
        match self {
            Self::Number(token) if is_decimal(token) => token.parse::<i32>().ok(),
            _ => None,
        }
    }
}

fn is_decimal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    digits == "0" || !digits.starts_with('0')
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Number(token) => write!(f, "{}", token),
            Self::String(contents) => write!(f, "\"{}\"", contents),
            Self::Character(contents) => write!(f, "'{}'", contents),
            Self::Null => write!(f, "null"),
            Self::Type(name) => write!(f, "{}.class", name),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum PrefixOperator {
    Not,
    Minus,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Not => write!(f, "!"),
            Self::Minus => write!(f, "-"),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum InfixOperator {
    ConditionalOr,
    ConditionalAnd,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Plus,
    Minus,
    Times,
    Divide,
    Remainder,
}

impl InfixOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::ConditionalOr => "||",
            Self::ConditionalAnd => "&&",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Less => "<",
            Self::LessEquals => "<=",
            Self::Greater => ">",
            Self::GreaterEquals => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
        }
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Parameter {
    pub ty: String,
    pub name: String,
}

impl Parameter {
    pub fn new<S: Into<String>>(ty: S, name: S) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

/// One `name [= initializer]` part of a variable declaration.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub initializer: Option<NodeId>,
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Node {
    // Declarations
    CompilationUnit {
        package: Option<String>,
        imports: Vec<String>,
        types: Vec<NodeId>,
    },
    TypeDeclaration {
        modifiers: Vec<String>,
        name: String,
        methods: Vec<NodeId>,
    },
    MethodDeclaration {
        modifiers: Vec<String>,
        return_type: String,
        name: String,
        parameters: Vec<Parameter>,
        body: Option<NodeId>,
    },

    // Statements
    Block {
        statements: Vec<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    VariableDeclaration {
        ty: String,
        fragments: Vec<Fragment>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    Return {
        expression: Option<NodeId>,
    },
    /// The empty statement `;`, standing in for every statement kind the optimizer ignores.
    Empty,

    // Expressions
    Literal(Literal),
    Name(String),
    Prefix {
        operator: PrefixOperator,
        operand: NodeId,
    },
    Infix {
        operator: InfixOperator,
        left: NodeId,
        right: NodeId,
        extended: Vec<NodeId>,
    },
    Parenthesized {
        expression: NodeId,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    MethodCall {
        receiver: Option<NodeId>,
        name: String,
        arguments: Vec<NodeId>,
    },
}

impl Node {
    pub fn boolean(value: bool) -> Self {
        Self::Literal(Literal::boolean(value))
    }

    pub fn integer(value: i32) -> Self {
        Self::Literal(Literal::integer(value))
    }

    pub fn name<S: Into<String>>(name: S) -> Self {
        Self::Name(name.into())
    }

    pub fn empty_block() -> Self {
        Self::Block {
            statements: Vec::new(),
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::Block { .. }
                | Self::ExpressionStatement { .. }
                | Self::VariableDeclaration { .. }
                | Self::If { .. }
                | Self::While { .. }
                | Self::DoWhile { .. }
                | Self::Return { .. }
                | Self::Empty
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Self::Literal(_)
                | Self::Name(_)
                | Self::Prefix { .. }
                | Self::Infix { .. }
                | Self::Parenthesized { .. }
                | Self::Assignment { .. }
                | Self::MethodCall { .. }
        )
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    pub fn literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Returns all direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::CompilationUnit { types, .. } => types.clone(),
            Self::TypeDeclaration { methods, .. } => methods.clone(),
            Self::MethodDeclaration { body, .. } => body.iter().copied().collect(),
            Self::Block { statements } => statements.clone(),
            Self::ExpressionStatement { expression } => vec![*expression],
            Self::VariableDeclaration { fragments, .. } => fragments
                .iter()
                .filter_map(|fragment| fragment.initializer)
                .collect(),
            Self::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![*condition, *then_branch];
                children.extend(else_branch.iter().copied());
                children
            }
            Self::While { condition, body } => vec![*condition, *body],
            Self::DoWhile { body, condition } => vec![*body, *condition],
            Self::Return { expression } => expression.iter().copied().collect(),
            Self::Empty | Self::Literal(_) | Self::Name(_) => Vec::new(),
            Self::Prefix { operand, .. } => vec![*operand],
            Self::Infix {
                left,
                right,
                extended,
                ..
            } => {
                let mut children = vec![*left, *right];
                children.extend(extended.iter().copied());
                children
            }
            Self::Parenthesized { expression } => vec![*expression],
            Self::Assignment { target, value } => vec![*target, *value],
            Self::MethodCall {
                receiver,
                arguments,
                ..
            } => {
                let mut children: Vec<NodeId> = receiver.iter().copied().collect();
                children.extend(arguments.iter().copied());
                children
            }
        }
    }

    /// Returns mutable references to all child slots in source order.
    pub fn children_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            Self::CompilationUnit { types, .. } => types.iter_mut().collect(),
            Self::TypeDeclaration { methods, .. } => methods.iter_mut().collect(),
            Self::MethodDeclaration { body, .. } => body.iter_mut().collect(),
            Self::Block { statements } => statements.iter_mut().collect(),
            Self::ExpressionStatement { expression } => vec![expression],
            Self::VariableDeclaration { fragments, .. } => fragments
                .iter_mut()
                .filter_map(|fragment| fragment.initializer.as_mut())
                .collect(),
            Self::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![condition, then_branch];
                children.extend(else_branch.iter_mut());
                children
            }
            Self::While { condition, body } => vec![condition, body],
            Self::DoWhile { body, condition } => vec![body, condition],
            Self::Return { expression } => expression.iter_mut().collect(),
            Self::Empty | Self::Literal(_) | Self::Name(_) => Vec::new(),
            Self::Prefix { operand, .. } => vec![operand],
            Self::Infix {
                left,
                right,
                extended,
                ..
            } => {
                let mut children = vec![left, right];
                children.extend(extended.iter_mut());
                children
            }
            Self::Parenthesized { expression } => vec![expression],
            Self::Assignment { target, value } => vec![target, value],
            Self::MethodCall {
                receiver,
                arguments,
                ..
            } => {
                let mut children: Vec<&mut NodeId> = receiver.iter_mut().collect();
                children.extend(arguments.iter_mut());
                children
            }
        }
    }
}
