//! Grammar for the configuration expression language.
//!
//! Precedence, lowest first: `?:`, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary `!`/`-`, then literals, references,
//! calls and parenthesised expressions.

use crate::ast::{Expression, Value, Variable};
use crate::error::CompileError;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Or,
    And,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    SmallerThan,
    SmallerThanOrEqual,
    Sum,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl Operator {
    fn apply(self, left: Expression, right: Expression) -> Expression {
        let (l, r) = (Box::new(left), Box::new(right));
        match self {
            Operator::Or => Expression::Or(l, r),
            Operator::And => Expression::And(l, r),
            Operator::Equal => Expression::Equal(l, r),
            Operator::NotEqual => Expression::NotEqual(l, r),
            Operator::GreaterThan => Expression::GreaterThan(l, r),
            Operator::GreaterThanOrEqual => Expression::GreaterThanOrEqual(l, r),
            Operator::SmallerThan => Expression::SmallerThan(l, r),
            Operator::SmallerThanOrEqual => Expression::SmallerThanOrEqual(l, r),
            Operator::Sum => Expression::Sum(l, r),
            Operator::Subtract => Expression::Subtract(l, r),
            Operator::Multiply => Expression::Multiply(l, r),
            Operator::Divide => Expression::Divide(l, r),
            Operator::Remainder => Expression::Remainder(l, r),
        }
    }
}

/// Parses an expression source string into an AST.
///
/// The JavaScript-style wrapper `{ return <expr>; }` found in older
/// configuration documents is accepted and stripped first.
pub fn parse_expression(source: &str) -> Result<Expression, CompileError> {
    let body = strip_function_wrapper(source);
    if body.is_empty() {
        return Err(CompileError::Syntax {
            offset: 0,
            message: "expression is empty".to_string(),
        });
    }

    match all_consuming(ws(expression))(body) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(CompileError::Syntax {
            offset: body.len() - e.input.len(),
            message: describe_remainder(e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(CompileError::Syntax {
            offset: body.len(),
            message: "unexpected end of expression".to_string(),
        }),
    }
}

/// Removes a surrounding `{ ... }` block, a leading `return` and trailing semicolons.
pub fn strip_function_wrapper(source: &str) -> &str {
    let mut body = source.trim();
    if let Some(inner) = body.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        body = inner.trim();
    }
    if let Some(rest) = body.strip_prefix("return") {
        if rest.starts_with(char::is_whitespace) || rest.starts_with('(') {
            body = rest.trim_start();
        }
    }
    body.trim_end().trim_end_matches(';').trim_end()
}

fn describe_remainder(remainder: &str) -> String {
    if remainder.is_empty() {
        return "unexpected end of expression".to_string();
    }
    let snippet: String = remainder.chars().take(16).collect();
    format!("unexpected input near '{}'", snippet)
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn expression(input: &str) -> IResult<&str, Expression> {
    conditional(input)
}

fn conditional(input: &str) -> IResult<&str, Expression> {
    let (input, condition) = logical_or(input)?;
    let (input, branches) = opt(pair(
        preceded(ws(char('?')), conditional),
        preceded(ws(char(':')), conditional),
    ))(input)?;

    let expr = match branches {
        Some((then, otherwise)) => Expression::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        },
        None => condition,
    };
    Ok((input, expr))
}

/// Parses a left-associative chain of `operand (operator operand)*`.
fn binary_chain<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expression>,
    operator: fn(&'a str) -> IResult<&'a str, Operator>,
) -> IResult<&'a str, Expression> {
    let (input, first) = operand(input)?;
    fold_many0(
        pair(ws(operator), operand),
        move || first.clone(),
        |left, (op, right)| op.apply(left, right),
    )(input)
}

fn logical_or(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, logical_and, |i| value(Operator::Or, tag("||"))(i))
}

fn logical_and(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, equality, |i| value(Operator::And, tag("&&"))(i))
}

fn equality(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, relational, |i| {
        alt((
            value(Operator::Equal, tag("===")),
            value(Operator::NotEqual, tag("!==")),
            value(Operator::Equal, tag("==")),
            value(Operator::NotEqual, tag("!=")),
        ))(i)
    })
}

fn relational(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, additive, |i| {
        alt((
            value(Operator::GreaterThanOrEqual, tag(">=")),
            value(Operator::SmallerThanOrEqual, tag("<=")),
            value(Operator::GreaterThan, tag(">")),
            value(Operator::SmallerThan, tag("<")),
        ))(i)
    })
}

fn additive(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, multiplicative, |i| {
        alt((
            value(Operator::Sum, char('+')),
            value(Operator::Subtract, char('-')),
        ))(i)
    })
}

fn multiplicative(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, unary, |i| {
        alt((
            value(Operator::Multiply, char('*')),
            value(Operator::Divide, char('/')),
            value(Operator::Remainder, char('%')),
        ))(i)
    })
}

fn unary(input: &str) -> IResult<&str, Expression> {
    alt((
        map(preceded(ws(char('!')), unary), |e| Expression::Not(Box::new(e))),
        map(preceded(ws(char('-')), unary), |e| {
            Expression::Negate(Box::new(e))
        }),
        primary,
    ))(input)
}

fn primary(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        number,
        string_literal,
        reference,
        delimited(char('('), ws(expression), char(')')),
    )))(input)
}

fn number(input: &str) -> IResult<&str, Expression> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |digits: &str| {
            digits
                .parse::<f64>()
                .map(|n| Expression::Literal(Value::Number(n)))
        },
    )(input)
}

// No escape sequences: backslashes reach regex patterns untouched.
fn string_literal(input: &str) -> IResult<&str, Expression> {
    map(
        alt((
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        )),
        |text: &str| Expression::Literal(Value::Text(text.to_string())),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
    ))(input)
}

/// A variable with member accesses, a keyword literal, or a function call.
fn reference(input: &str) -> IResult<&str, Expression> {
    let (input, root) = identifier(input)?;
    let (input, members) = many0(preceded(ws(char('.')), identifier))(input)?;
    let (input, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    ))(input)?;

    let expr = match args {
        Some(args) => {
            // `Math.round(x)` and `round(x)` name the same function.
            let function = match members.as_slice() {
                [name] if root == "Math" => name.to_string(),
                _ => std::iter::once(root)
                    .chain(members.iter().copied())
                    .collect::<Vec<_>>()
                    .join("."),
            };
            Expression::Call { function, args }
        }
        None if members.is_empty() => match root {
            "true" => Expression::Literal(Value::Bool(true)),
            "false" => Expression::Literal(Value::Bool(false)),
            "null" | "undefined" => Expression::Literal(Value::Null),
            _ => Expression::Variable(Variable::new(root, &[])),
        },
        None => Expression::Variable(Variable::new(root, &members)),
    };
    Ok((input, expr))
}
