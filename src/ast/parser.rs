//! Front end for the Java subset.
//!
//! The combinators build a small owned syntax tree which is lowered into the arena afterwards,
//! so the arena only ever sees complete and well-formed subtrees.
//!
//! Jumps (`break`, `continue`, `throw`), `for`, `switch`, `try`, object creation, increments
//! and compound assignments are rejected as syntax errors.

use super::{Ast, Fragment, InfixOperator, Literal, Node, NodeId, Parameter, PrefixOperator};
use crate::error::{ErrorKind, Result};
use nom::{
    branch::alt,
    bytes::complete::{escaped, is_not, tag, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, multispace1, one_of},
    combinator::{cut, map, not, opt, recognize, value, verify},
    multi::{many0, separated_list, separated_nonempty_list},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "continue", "do", "else", "false", "for", "if", "import",
    "new", "null", "package", "return", "switch", "throw", "true", "try", "while",
];

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "synchronized",
    "native",
];

/// Parses a compilation unit.
pub fn parse(source: &str) -> Result<Ast> {
    let unit = match compilation_unit(source) {
        Ok(("", unit)) => unit,
        Ok((rest, _)) => bail!(syntax_error(source, rest)),
        Err(nom::Err::Error((rest, _))) | Err(nom::Err::Failure((rest, _))) => {
            bail!(syntax_error(source, rest))
        }
        Err(nom::Err::Incomplete(_)) => {
            bail!(ErrorKind::Parse("unexpected end of input".to_owned()))
        }
    };

    let mut ast = Ast::new();
    ast.set_package(unit.package, unit.imports);
    for class in unit.classes {
        let id = lower_class(&mut ast, class)?;
        ast.add_type(id)?;
    }
    Ok(ast)
}

fn syntax_error(source: &str, rest: &str) -> ErrorKind {
    let offset = source.len() - rest.len();
    let consumed = &source[..offset];
    let line = consumed.matches('\n').count() + 1;
    let line_start = consumed.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = consumed[line_start..].chars().count() + 1;
    let unexpected: String = rest.chars().take_while(|c| *c != '\n').take(20).collect();
    ErrorKind::Parse(format!(
        "unexpected `{}` at line {}, column {}",
        unexpected, line, column
    ))
}

struct CompilationUnit {
    package: Option<String>,
    imports: Vec<String>,
    classes: Vec<Class>,
}

struct Class {
    modifiers: Vec<String>,
    name: String,
    methods: Vec<Method>,
}

struct Method {
    modifiers: Vec<String>,
    return_type: String,
    name: String,
    parameters: Vec<Parameter>,
    body: Option<Vec<Statement>>,
}

enum Statement {
    Block(Vec<Statement>),
    Expression(Expression),
    Declaration(String, Vec<(String, Option<Expression>)>),
    If(Expression, Box<Statement>, Option<Box<Statement>>),
    While(Expression, Box<Statement>),
    DoWhile(Box<Statement>, Expression),
    Return(Option<Expression>),
    Empty,
}

enum Expression {
    Literal(Literal),
    Name(String),
    Prefix(PrefixOperator, Box<Expression>),
    Infix(
        InfixOperator,
        Box<Expression>,
        Box<Expression>,
        Vec<Expression>,
    ),
    Parenthesized(Box<Expression>),
    Assignment(Box<Expression>, Box<Expression>),
    MethodCall(Option<String>, String, Vec<Expression>),
}

// Lexical helpers

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), take_while(|c: char| c != '\n')))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Skips whitespace and comments.
fn sp(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, line_comment, block_comment))))(input)
}

fn symbol<'a>(s: &'static str) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| preceded(sp, tag(s))(input)
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn identifier_char(input: &str) -> IResult<&str, char> {
    verify(anychar, |c: &char| is_identifier_char(*c))(input)
}

fn keyword<'a>(word: &'static str) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| terminated(preceded(sp, tag(word)), not(identifier_char))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    verify(
        preceded(
            sp,
            recognize(pair(
                take_while1(is_identifier_start),
                take_while(is_identifier_char),
            )),
        ),
        |name: &str| !KEYWORDS.contains(&name),
    )(input)
}

fn owned_identifier(input: &str) -> IResult<&str, String> {
    map(identifier, String::from)(input)
}

fn qualified_name(input: &str) -> IResult<&str, String> {
    map(separated_nonempty_list(symbol("."), identifier), |names: Vec<&str>| {
        names.join(".")
    })(input)
}

fn type_name(input: &str) -> IResult<&str, String> {
    map(
        pair(qualified_name, many0(pair(symbol("["), symbol("]")))),
        |(name, dimensions): (String, Vec<(&str, &str)>)| format!("{}{}", name, "[]".repeat(dimensions.len())),
    )(input)
}

fn modifier(input: &str) -> IResult<&str, String> {
    map(
        verify(identifier, |name: &str| MODIFIERS.contains(&name)),
        String::from,
    )(input)
}

// Literals

fn number_literal(input: &str) -> IResult<&str, Literal> {
    map(
        preceded(
            sp,
            recognize(tuple((
                digit1,
                opt(pair(char('.'), digit1)),
                opt(one_of("lLfFdD")),
            ))),
        ),
        |token: &str| Literal::Number(token.to_owned()),
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, Literal> {
    map(
        preceded(
            sp,
            delimited(
                char('"'),
                opt(escaped(is_not("\\\""), '\\', anychar)),
                char('"'),
            ),
        ),
        |contents: Option<&str>| Literal::String(contents.unwrap_or("").to_owned()),
    )(input)
}

fn character_literal(input: &str) -> IResult<&str, Literal> {
    map(
        preceded(
            sp,
            delimited(
                char('\''),
                opt(escaped(is_not("\\'"), '\\', anychar)),
                char('\''),
            ),
        ),
        |contents: Option<&str>| Literal::Character(contents.unwrap_or("").to_owned()),
    )(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::Boolean(true), keyword("true")),
        value(Literal::Boolean(false), keyword("false")),
        value(Literal::Null, keyword("null")),
        number_literal,
        string_literal,
        character_literal,
    ))(input)
}

// Expressions

fn arguments(input: &str) -> IResult<&str, Vec<Expression>> {
    delimited(
        symbol("("),
        separated_list(symbol(","), expression),
        symbol(")"),
    )(input)
}

fn class_suffix(input: &str) -> IResult<&str, &str> {
    preceded(symbol("."), keyword("class"))(input)
}

/// `a.b.c`, `a.b.c(args)` or `a.b.C.class`
fn name_or_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = qualified_name(input)?;

    if let Ok((input, _)) = class_suffix(input) {
        return Ok((input, Expression::Literal(Literal::Type(name))));
    }

    match arguments(input) {
        Ok((input, arguments)) => {
            let call = match name.rfind('.') {
                Some(dot) => Expression::MethodCall(
                    Some(name[..dot].to_owned()),
                    name[dot + 1..].to_owned(),
                    arguments,
                ),
                None => Expression::MethodCall(None, name, arguments),
            };
            Ok((input, call))
        }
        Err(nom::Err::Error(_)) => Ok((input, Expression::Name(name))),
        Err(e) => Err(e),
    }
}

fn primary(input: &str) -> IResult<&str, Expression> {
    alt((
        map(literal, Expression::Literal),
        map(delimited(symbol("("), expression, symbol(")")), |e| {
            Expression::Parenthesized(Box::new(e))
        }),
        name_or_call,
    ))(input)
}

fn unary(input: &str) -> IResult<&str, Expression> {
    alt((
        map(preceded(symbol("!"), unary), |e| {
            Expression::Prefix(PrefixOperator::Not, Box::new(e))
        }),
        map(preceded(symbol("-"), unary), |e| {
            Expression::Prefix(PrefixOperator::Minus, Box::new(e))
        }),
        primary,
    ))(input)
}

/// Parses a left associative chain of one precedence level. Repeating the same operator
/// extends the chain instead of nesting it.
fn infix_chain<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expression>,
    operator: fn(&'a str) -> IResult<&'a str, InfixOperator>,
) -> IResult<&'a str, Expression> {
    let (mut input, mut left) = operand(input)?;
    loop {
        match operator(input) {
            Ok((rest, op)) => {
                let (rest, right) = operand(rest)?;
                left = match left {
                    Expression::Infix(current, l, r, mut extended) if current == op => {
                        extended.push(right);
                        Expression::Infix(current, l, r, extended)
                    }
                    left => Expression::Infix(op, Box::new(left), Box::new(right), Vec::new()),
                };
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, left)),
            Err(e) => return Err(e),
        }
    }
}

fn multiplicative_operator(input: &str) -> IResult<&str, InfixOperator> {
    alt((
        value(InfixOperator::Times, symbol("*")),
        value(InfixOperator::Divide, symbol("/")),
        value(InfixOperator::Remainder, symbol("%")),
    ))(input)
}

fn additive_operator(input: &str) -> IResult<&str, InfixOperator> {
    alt((
        value(InfixOperator::Plus, symbol("+")),
        value(InfixOperator::Minus, symbol("-")),
    ))(input)
}

fn relational_operator(input: &str) -> IResult<&str, InfixOperator> {
    alt((
        value(InfixOperator::LessEquals, symbol("<=")),
        value(InfixOperator::GreaterEquals, symbol(">=")),
        value(InfixOperator::Less, symbol("<")),
        value(InfixOperator::Greater, symbol(">")),
    ))(input)
}

fn equality_operator(input: &str) -> IResult<&str, InfixOperator> {
    alt((
        value(InfixOperator::Equals, symbol("==")),
        value(InfixOperator::NotEquals, symbol("!=")),
    ))(input)
}

fn conditional_and_operator(input: &str) -> IResult<&str, InfixOperator> {
    value(InfixOperator::ConditionalAnd, symbol("&&"))(input)
}

fn conditional_or_operator(input: &str) -> IResult<&str, InfixOperator> {
    value(InfixOperator::ConditionalOr, symbol("||"))(input)
}

fn multiplicative(input: &str) -> IResult<&str, Expression> {
    infix_chain(input, unary, multiplicative_operator)
}

fn additive(input: &str) -> IResult<&str, Expression> {
    infix_chain(input, multiplicative, additive_operator)
}

fn relational(input: &str) -> IResult<&str, Expression> {
    infix_chain(input, additive, relational_operator)
}

fn equality(input: &str) -> IResult<&str, Expression> {
    infix_chain(input, relational, equality_operator)
}

fn conditional_and(input: &str) -> IResult<&str, Expression> {
    infix_chain(input, equality, conditional_and_operator)
}

fn conditional_or(input: &str) -> IResult<&str, Expression> {
    infix_chain(input, conditional_and, conditional_or_operator)
}

fn assignment_operator(input: &str) -> IResult<&str, &str> {
    terminated(symbol("="), not(char('=')))(input)
}

fn expression(input: &str) -> IResult<&str, Expression> {
    let (input, left) = conditional_or(input)?;
    match assignment_operator(input) {
        Ok((input, _)) => {
            let (input, value) = expression(input)?;
            Ok((
                input,
                Expression::Assignment(Box::new(left), Box::new(value)),
            ))
        }
        Err(nom::Err::Error(_)) => Ok((input, left)),
        Err(e) => Err(e),
    }
}

// Statements

fn parenthesized_condition(input: &str) -> IResult<&str, Expression> {
    delimited(symbol("("), expression, symbol(")"))(input)
}

fn block(input: &str) -> IResult<&str, Vec<Statement>> {
    preceded(
        symbol("{"),
        cut(terminated(many0(statement), symbol("}"))),
    )(input)
}

fn if_statement(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(
            keyword("if"),
            cut(tuple((
                parenthesized_condition,
                statement,
                opt(preceded(keyword("else"), statement)),
            ))),
        ),
        |(condition, then_branch, else_branch): (Expression, Statement, Option<Statement>)| {
            Statement::If(condition, Box::new(then_branch), else_branch.map(Box::new))
        },
    )(input)
}

fn while_statement(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(
            keyword("while"),
            cut(pair(parenthesized_condition, statement)),
        ),
        |(condition, body)| Statement::While(condition, Box::new(body)),
    )(input)
}

fn do_while_statement(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(
            keyword("do"),
            cut(tuple((
                statement,
                keyword("while"),
                parenthesized_condition,
                symbol(";"),
            ))),
        ),
        |(body, _, condition, _)| Statement::DoWhile(Box::new(body), condition),
    )(input)
}

fn return_statement(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(
            keyword("return"),
            cut(terminated(opt(expression), symbol(";"))),
        ),
        Statement::Return,
    )(input)
}

fn fragment(input: &str) -> IResult<&str, (String, Option<Expression>)> {
    map(
        pair(
            identifier,
            opt(preceded(assignment_operator, expression)),
        ),
        |(name, initializer): (&str, Option<Expression>)| (name.to_owned(), initializer),
    )(input)
}

fn declaration(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            opt(keyword("final")),
            type_name,
            separated_nonempty_list(symbol(","), fragment),
            symbol(";"),
        )),
        |(_, ty, fragments, _)| Statement::Declaration(ty, fragments),
    )(input)
}

/// Fails at the keyword of a statement kind the tree has no node for.
fn unsupported_statement(input: &str) -> IResult<&str, Statement> {
    let (input, _) = sp(input)?;
    alt((
        keyword("break"),
        keyword("continue"),
        keyword("for"),
        keyword("switch"),
        keyword("throw"),
        keyword("try"),
    ))(input)?;
    Err(nom::Err::Failure((input, nom::error::ErrorKind::Verify)))
}

fn statement(input: &str) -> IResult<&str, Statement> {
    alt((
        unsupported_statement,
        map(block, Statement::Block),
        if_statement,
        while_statement,
        do_while_statement,
        return_statement,
        map(symbol(";"), |_| Statement::Empty),
        declaration,
        map(terminated(expression, symbol(";")), Statement::Expression),
    ))(input)
}

// Declarations

fn parameter(input: &str) -> IResult<&str, Parameter> {
    map(
        tuple((opt(keyword("final")), type_name, identifier)),
        |(_, ty, name): (Option<&str>, String, &str)| Parameter::new(ty, name.to_owned()),
    )(input)
}

fn method(input: &str) -> IResult<&str, Method> {
    map(
        tuple((
            many0(modifier),
            type_name,
            owned_identifier,
            delimited(
                symbol("("),
                separated_list(symbol(","), parameter),
                symbol(")"),
            ),
            alt((map(block, Some), map(symbol(";"), |_| None))),
        )),
        |(modifiers, return_type, name, parameters, body)| Method {
            modifiers,
            return_type,
            name,
            parameters,
            body,
        },
    )(input)
}

fn class(input: &str) -> IResult<&str, Class> {
    map(
        tuple((
            many0(modifier),
            keyword("class"),
            cut(tuple((
                owned_identifier,
                symbol("{"),
                many0(method),
                symbol("}"),
            ))),
        )),
        |(modifiers, _, (name, _, methods, _))| Class {
            modifiers,
            name,
            methods,
        },
    )(input)
}

fn import(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            keyword("import"),
            pair(qualified_name, opt(pair(symbol("."), symbol("*")))),
            symbol(";"),
        ),
        |(name, wildcard): (String, Option<(&str, &str)>)| match wildcard {
            Some(_) => format!("{}.*", name),
            None => name,
        },
    )(input)
}

fn compilation_unit(input: &str) -> IResult<&str, CompilationUnit> {
    map(
        tuple((
            opt(delimited(keyword("package"), qualified_name, symbol(";"))),
            many0(import),
            many0(class),
            sp,
        )),
        |(package, imports, classes, _)| CompilationUnit {
            package,
            imports,
            classes,
        },
    )(input)
}

// Lowering into the arena

fn lower_class(ast: &mut Ast, class: Class) -> Result<NodeId> {
    let methods = class
        .methods
        .into_iter()
        .map(|method| lower_method(ast, method))
        .collect::<Result<Vec<_>>>()?;
    ast.add(Node::TypeDeclaration {
        modifiers: class.modifiers,
        name: class.name,
        methods,
    })
}

fn lower_method(ast: &mut Ast, method: Method) -> Result<NodeId> {
    let body = match method.body {
        Some(statements) => Some(lower_statement(ast, Statement::Block(statements))?),
        None => None,
    };
    ast.add(Node::MethodDeclaration {
        modifiers: method.modifiers,
        return_type: method.return_type,
        name: method.name,
        parameters: method.parameters,
        body,
    })
}

fn lower_statement(ast: &mut Ast, statement: Statement) -> Result<NodeId> {
    let node = match statement {
        Statement::Block(statements) => Node::Block {
            statements: statements
                .into_iter()
                .map(|statement| lower_statement(ast, statement))
                .collect::<Result<Vec<_>>>()?,
        },
        Statement::Expression(expression) => Node::ExpressionStatement {
            expression: lower_expression(ast, expression)?,
        },
        Statement::Declaration(ty, fragments) => {
            let fragments = fragments
                .into_iter()
                .map(|(name, initializer)| {
                    let initializer = match initializer {
                        Some(initializer) => Some(lower_expression(ast, initializer)?),
                        None => None,
                    };
                    Ok(Fragment { name, initializer })
                })
                .collect::<Result<Vec<_>>>()?;
            Node::VariableDeclaration { ty, fragments }
        }
        Statement::If(condition, then_branch, else_branch) => Node::If {
            condition: lower_expression(ast, condition)?,
            then_branch: lower_statement(ast, *then_branch)?,
            else_branch: match else_branch {
                Some(else_branch) => Some(lower_statement(ast, *else_branch)?),
                None => None,
            },
        },
        Statement::While(condition, body) => Node::While {
            condition: lower_expression(ast, condition)?,
            body: lower_statement(ast, *body)?,
        },
        Statement::DoWhile(body, condition) => Node::DoWhile {
            body: lower_statement(ast, *body)?,
            condition: lower_expression(ast, condition)?,
        },
        Statement::Return(expression) => Node::Return {
            expression: match expression {
                Some(expression) => Some(lower_expression(ast, expression)?),
                None => None,
            },
        },
        Statement::Empty => Node::Empty,
    };
    ast.add(node)
}

fn lower_expression(ast: &mut Ast, expression: Expression) -> Result<NodeId> {
    let node = match expression {
        Expression::Literal(literal) => Node::Literal(literal),
        Expression::Name(name) => Node::Name(name),
        Expression::Prefix(operator, operand) => Node::Prefix {
            operator,
            operand: lower_expression(ast, *operand)?,
        },
        Expression::Infix(operator, left, right, extended) => Node::Infix {
            operator,
            left: lower_expression(ast, *left)?,
            right: lower_expression(ast, *right)?,
            extended: extended
                .into_iter()
                .map(|operand| lower_expression(ast, operand))
                .collect::<Result<Vec<_>>>()?,
        },
        Expression::Parenthesized(expression) => Node::Parenthesized {
            expression: lower_expression(ast, *expression)?,
        },
        Expression::Assignment(target, value) => Node::Assignment {
            target: lower_expression(ast, *target)?,
            value: lower_expression(ast, *value)?,
        },
        Expression::MethodCall(receiver, name, arguments) => Node::MethodCall {
            receiver: match receiver {
                Some(receiver) => Some(ast.add(Node::Name(receiver))?),
                None => None,
            },
            name,
            arguments: arguments
                .into_iter()
                .map(|argument| lower_expression(ast, argument))
                .collect::<Result<Vec<_>>>()?,
        },
    };
    ast.add(node)
}
