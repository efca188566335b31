use super::Value;
use std::fmt;

/// A reference to a bound variable, optionally followed by member accesses,
/// e.g. `values.dimensions.length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub root: String,
    pub members: Vec<String>,
}

impl Variable {
    pub fn new(root: &str, members: &[&str]) -> Self {
        Self {
            root: root.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for member in &self.members {
            write!(f, ".{}", member)?;
        }
        Ok(())
    }
}

/// The Abstract Syntax Tree of a configuration expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    // Arithmetic
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Remainder(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),

    // Logical
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),

    // Comparison
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    SmallerThan(Box<Expression>, Box<Expression>),
    SmallerThanOrEqual(Box<Expression>, Box<Expression>),

    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    Call {
        function: String,
        args: Vec<Expression>,
    },

    // Leaf nodes
    Literal(Value),
    Variable(Variable),
}

impl Expression {
    /// Collects every variable the expression reads.
    pub fn collect_variables<'a>(&'a self, variables: &mut Vec<&'a Variable>) {
        match self {
            Expression::Variable(v) => variables.push(v),
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r)
            | Expression::Remainder(l, r)
            | Expression::And(l, r)
            | Expression::Or(l, r)
            | Expression::Equal(l, r)
            | Expression::NotEqual(l, r)
            | Expression::GreaterThan(l, r)
            | Expression::GreaterThanOrEqual(l, r)
            | Expression::SmallerThan(l, r)
            | Expression::SmallerThanOrEqual(l, r) => {
                l.collect_variables(variables);
                r.collect_variables(variables);
            }
            Expression::Negate(v) | Expression::Not(v) => v.collect_variables(variables),
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_variables(variables);
                then.collect_variables(variables);
                otherwise.collect_variables(variables);
            }
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(variables);
                }
            }
            Expression::Literal(_) => {}
        }
    }

    /// Collects `(name, arguments)` for every function call.
    pub fn collect_calls<'a>(&'a self, calls: &mut Vec<(&'a str, &'a [Expression])>) {
        match self {
            Expression::Call { function, args } => {
                calls.push((function.as_str(), args.as_slice()));
                for arg in args {
                    arg.collect_calls(calls);
                }
            }
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r)
            | Expression::Remainder(l, r)
            | Expression::And(l, r)
            | Expression::Or(l, r)
            | Expression::Equal(l, r)
            | Expression::NotEqual(l, r)
            | Expression::GreaterThan(l, r)
            | Expression::GreaterThanOrEqual(l, r)
            | Expression::SmallerThan(l, r)
            | Expression::SmallerThanOrEqual(l, r) => {
                l.collect_calls(calls);
                r.collect_calls(calls);
            }
            Expression::Negate(v) | Expression::Not(v) => v.collect_calls(calls),
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_calls(calls);
                then.collect_calls(calls);
                otherwise.collect_calls(calls);
            }
            Expression::Literal(_) | Expression::Variable(_) => {}
        }
    }

    /// `true` when the expression reads no variables and calls no functions,
    /// i.e. it can be folded at compile time.
    pub fn is_constant(&self) -> bool {
        let mut variables = Vec::new();
        let mut calls = Vec::new();
        self.collect_variables(&mut variables);
        self.collect_calls(&mut calls);
        variables.is_empty() && calls.is_empty()
    }
}

/// A wrapper to display an expression as an indented tree.
/// Used by the CLI to explain compiled calculations.
pub struct DisplayExpression<'a> {
    pub expr: &'a Expression,
}

impl<'a> fmt::Display for DisplayExpression<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_as_tree(self.expr, f, "", true)
    }
}

impl<'a> DisplayExpression<'a> {
    fn fmt_as_tree(
        &self,
        expr: &Expression,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match expr {
            Expression::Literal(v) => writeln!(f, "Literal: {}", v.literal_repr())?,
            Expression::Variable(v) => writeln!(f, "Variable: {}", v)?,
            Expression::Not(v) => {
                writeln!(f, "Not (!)")?;
                self.fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Expression::Negate(v) => {
                writeln!(f, "Negate (-)")?;
                self.fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Expression::Sum(l, r) => self.fmt_binary(f, "Sum (+)", l, r, &child_prefix)?,
            Expression::Subtract(l, r) => {
                self.fmt_binary(f, "Subtract (-)", l, r, &child_prefix)?
            }
            Expression::Multiply(l, r) => {
                self.fmt_binary(f, "Multiply (*)", l, r, &child_prefix)?
            }
            Expression::Divide(l, r) => self.fmt_binary(f, "Divide (/)", l, r, &child_prefix)?,
            Expression::Remainder(l, r) => {
                self.fmt_binary(f, "Remainder (%)", l, r, &child_prefix)?
            }
            Expression::And(l, r) => self.fmt_binary(f, "And (&&)", l, r, &child_prefix)?,
            Expression::Or(l, r) => self.fmt_binary(f, "Or (||)", l, r, &child_prefix)?,
            Expression::Equal(l, r) => self.fmt_binary(f, "Equal (==)", l, r, &child_prefix)?,
            Expression::NotEqual(l, r) => {
                self.fmt_binary(f, "NotEqual (!=)", l, r, &child_prefix)?
            }
            Expression::GreaterThan(l, r) => {
                self.fmt_binary(f, "GreaterThan (>)", l, r, &child_prefix)?
            }
            Expression::GreaterThanOrEqual(l, r) => {
                self.fmt_binary(f, "GreaterThanOrEqual (>=)", l, r, &child_prefix)?
            }
            Expression::SmallerThan(l, r) => {
                self.fmt_binary(f, "SmallerThan (<)", l, r, &child_prefix)?
            }
            Expression::SmallerThanOrEqual(l, r) => {
                self.fmt_binary(f, "SmallerThanOrEqual (<=)", l, r, &child_prefix)?
            }
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                writeln!(f, "Conditional (?:)")?;
                self.fmt_as_tree(condition, f, &child_prefix, false)?;
                self.fmt_as_tree(then, f, &child_prefix, false)?;
                self.fmt_as_tree(otherwise, f, &child_prefix, true)?;
            }
            Expression::Call { function, args } => {
                writeln!(f, "Call: {}()", function)?;
                for (i, arg) in args.iter().enumerate() {
                    self.fmt_as_tree(arg, f, &child_prefix, i + 1 == args.len())?;
                }
            }
        }
        Ok(())
    }

    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        l: &Expression,
        r: &Expression,
        prefix: &str,
    ) -> fmt::Result {
        writeln!(f, "{}", name)?;
        self.fmt_as_tree(l, f, prefix, false)?;
        self.fmt_as_tree(r, f, prefix, true)?;
        Ok(())
    }
}
