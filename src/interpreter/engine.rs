use super::scope::Scope;
use crate::ast::{EvaluationTrace, Expression, Value};
use crate::compiler::FunctionRegistry;
use crate::error::EvaluationError;
use std::cmp::Ordering;

// This macro generates a match arm for a binary operation.
macro_rules! eval_op {
    ($self:ident, $l:ident, $r:ident, $op_str:expr, $op_fn:expr, number) => {
        $self.eval_arithmetic($l, $r, $op_str, $op_fn)
    };
    ($self:ident, $l:ident, $r:ident, $op_str:expr, $op_fn:expr, compare) => {
        $self.eval_comparison($l, $r, $op_str, $op_fn)
    };
}

/// The core recursive engine for evaluating a single expression against a scope.
pub(crate) struct AstEngine<'a> {
    scope: &'a Scope<'a>,
    functions: &'a FunctionRegistry,
}

impl<'a> AstEngine<'a> {
    pub(crate) fn new(scope: &'a Scope<'a>, functions: &'a FunctionRegistry) -> Self {
        Self { scope, functions }
    }

    /// Evaluates the AST and returns a trace of the execution.
    pub(crate) fn evaluate(&self, expr: &Expression) -> Result<EvaluationTrace, EvaluationError> {
        match expr {
            // --- Arithmetic Operations ---
            Expression::Sum(l, r) => self.eval_sum(l, r),
            Expression::Subtract(l, r) => eval_op!(self, l, r, "-", |a, b| Ok(a - b), number),
            Expression::Multiply(l, r) => eval_op!(self, l, r, "*", |a, b| Ok(a * b), number),
            Expression::Divide(l, r) => eval_op!(
                self,
                l,
                r,
                "/",
                |a, b| if b == 0.0 {
                    Err(EvaluationError::DivisionByZero)
                } else {
                    Ok(a / b)
                },
                number
            ),
            Expression::Remainder(l, r) => eval_op!(
                self,
                l,
                r,
                "%",
                |a, b| if b == 0.0 {
                    Err(EvaluationError::DivisionByZero)
                } else {
                    Ok(a % b)
                },
                number
            ),
            Expression::Negate(v) => {
                let child_trace = self.evaluate(v)?;
                let value = child_trace.get_outcome();
                let outcome = match value.coerce_number() {
                    Some(n) => Value::Number(-n),
                    None => return Err(self.type_mismatch("-", "Number", value)),
                };
                Ok(EvaluationTrace::UnaryOp {
                    op_symbol: "-",
                    child: Box::new(child_trace),
                    outcome,
                })
            }

            // --- Comparison Operations ---
            Expression::GreaterThan(l, r) => {
                eval_op!(self, l, r, ">", |o| o == Ordering::Greater, compare)
            }
            Expression::SmallerThan(l, r) => {
                eval_op!(self, l, r, "<", |o| o == Ordering::Less, compare)
            }
            Expression::GreaterThanOrEqual(l, r) => {
                eval_op!(self, l, r, ">=", |o| o != Ordering::Less, compare)
            }
            Expression::SmallerThanOrEqual(l, r) => {
                eval_op!(self, l, r, "<=", |o| o != Ordering::Greater, compare)
            }

            // --- Equality ---
            Expression::Equal(l, r) => {
                let left_trace = self.evaluate(l)?;
                let right_trace = self.evaluate(r)?;
                let outcome = Value::Bool(
                    left_trace
                        .get_outcome()
                        .loosely_equals(&right_trace.get_outcome()),
                );
                Ok(EvaluationTrace::BinaryOp {
                    op_symbol: "==",
                    left: Box::new(left_trace),
                    right: Box::new(right_trace),
                    outcome,
                })
            }
            Expression::NotEqual(l, r) => {
                let left_trace = self.evaluate(l)?;
                let right_trace = self.evaluate(r)?;
                let outcome = Value::Bool(
                    !left_trace
                        .get_outcome()
                        .loosely_equals(&right_trace.get_outcome()),
                );
                Ok(EvaluationTrace::BinaryOp {
                    op_symbol: "!=",
                    left: Box::new(left_trace),
                    right: Box::new(right_trace),
                    outcome,
                })
            }

            // --- Logical Operations ---
            // `&&` and `||` yield one of their operands, not a coerced boolean.
            Expression::And(l, r) => {
                let left_trace = self.evaluate(l)?;
                let left = left_trace.get_outcome();
                if !left.is_truthy() {
                    return Ok(EvaluationTrace::BinaryOp {
                        op_symbol: "&&",
                        left: Box::new(left_trace),
                        right: Box::new(EvaluationTrace::NotEvaluated),
                        outcome: left,
                    });
                }
                let right_trace = self.evaluate(r)?;
                let outcome = right_trace.get_outcome();
                Ok(EvaluationTrace::BinaryOp {
                    op_symbol: "&&",
                    left: Box::new(left_trace),
                    right: Box::new(right_trace),
                    outcome,
                })
            }
            Expression::Or(l, r) => {
                let left_trace = self.evaluate(l)?;
                let left = left_trace.get_outcome();
                if left.is_truthy() {
                    return Ok(EvaluationTrace::BinaryOp {
                        op_symbol: "||",
                        left: Box::new(left_trace),
                        right: Box::new(EvaluationTrace::NotEvaluated),
                        outcome: left,
                    });
                }
                let right_trace = self.evaluate(r)?;
                let outcome = right_trace.get_outcome();
                Ok(EvaluationTrace::BinaryOp {
                    op_symbol: "||",
                    left: Box::new(left_trace),
                    right: Box::new(right_trace),
                    outcome,
                })
            }
            Expression::Not(v) => {
                let child_trace = self.evaluate(v)?;
                let outcome = Value::Bool(!child_trace.get_outcome().is_truthy());
                Ok(EvaluationTrace::UnaryOp {
                    op_symbol: "!",
                    child: Box::new(child_trace),
                    outcome,
                })
            }

            // --- Other Operations ---
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let condition_trace = self.evaluate(condition)?;
                let branch = if condition_trace.get_outcome().is_truthy() {
                    then
                } else {
                    otherwise
                };
                let branch_trace = self.evaluate(branch)?;
                let outcome = branch_trace.get_outcome();
                Ok(EvaluationTrace::Conditional {
                    condition: Box::new(condition_trace),
                    branch: Box::new(branch_trace),
                    outcome,
                })
            }
            Expression::Call { function, args } => {
                let arg_traces = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let values: Vec<Value> = arg_traces.iter().map(|t| t.get_outcome()).collect();

                let callee = self
                    .functions
                    .get(function)
                    .ok_or_else(|| EvaluationError::UnknownFunction(function.clone()))?;
                if !callee.arity().accepts(values.len()) {
                    return Err(EvaluationError::FunctionFailed {
                        name: function.clone(),
                        message: format!(
                            "expects {} argument(s), received {}",
                            callee.arity(),
                            values.len()
                        ),
                    });
                }
                let outcome = callee.call(&values)?;
                Ok(EvaluationTrace::Call {
                    function: function.clone(),
                    args: arg_traces,
                    outcome,
                })
            }
            Expression::Literal(val) => Ok(EvaluationTrace::Leaf {
                source: val.literal_repr(),
                value: val.clone(),
                is_input: false,
            }),
            Expression::Variable(variable) => Ok(EvaluationTrace::Leaf {
                source: variable.to_string(),
                value: self.scope.resolve(variable)?,
                is_input: true,
            }),
        }
    }

    /// `+` concatenates when either side is non-numeric text, and adds otherwise.
    fn eval_sum(&self, l: &Expression, r: &Expression) -> Result<EvaluationTrace, EvaluationError> {
        let left_trace = self.evaluate(l)?;
        let right_trace = self.evaluate(r)?;
        let (left, right) = (left_trace.get_outcome(), right_trace.get_outcome());

        let outcome = match (left.coerce_number(), right.coerce_number()) {
            (Some(a), Some(b)) => Value::Number(a + b),
            _ => Value::Text(format!("{}{}", left.display_text(), right.display_text())),
        };
        Ok(EvaluationTrace::BinaryOp {
            op_symbol: "+",
            left: Box::new(left_trace),
            right: Box::new(right_trace),
            outcome,
        })
    }

    fn eval_arithmetic<F>(
        &self,
        l: &Expression,
        r: &Expression,
        op: &'static str,
        f: F,
    ) -> Result<EvaluationTrace, EvaluationError>
    where
        F: Fn(f64, f64) -> Result<f64, EvaluationError>,
    {
        let left_trace = self.evaluate(l)?;
        let right_trace = self.evaluate(r)?;
        let (left, right) = (left_trace.get_outcome(), right_trace.get_outcome());
        let outcome = match (left.coerce_number(), right.coerce_number()) {
            (Some(lv), Some(rv)) => Value::Number(f(lv, rv)?),
            (None, _) => return Err(self.type_mismatch(op, "Number", left)),
            (_, None) => return Err(self.type_mismatch(op, "Number", right)),
        };
        Ok(EvaluationTrace::BinaryOp {
            op_symbol: op,
            left: Box::new(left_trace),
            right: Box::new(right_trace),
            outcome,
        })
    }

    /// Numeric when both sides read as numbers, textual otherwise.
    fn eval_comparison<F>(
        &self,
        l: &Expression,
        r: &Expression,
        op: &'static str,
        f: F,
    ) -> Result<EvaluationTrace, EvaluationError>
    where
        F: Fn(Ordering) -> bool,
    {
        let left_trace = self.evaluate(l)?;
        let right_trace = self.evaluate(r)?;
        let (left, right) = (left_trace.get_outcome(), right_trace.get_outcome());
        let ordering = match (left.coerce_number(), right.coerce_number()) {
            (Some(lv), Some(rv)) => lv.partial_cmp(&rv),
            _ => Some(left.display_text().cmp(&right.display_text())),
        };
        // NaN compares false both ways.
        let outcome = Value::Bool(ordering.is_some_and(f));
        Ok(EvaluationTrace::BinaryOp {
            op_symbol: op,
            left: Box::new(left_trace),
            right: Box::new(right_trace),
            outcome,
        })
    }

    fn type_mismatch(&self, op: &str, expected: &str, found: Value) -> EvaluationError {
        EvaluationError::TypeMismatch {
            operation: op.to_string(),
            expected: expected.to_string(),
            found,
        }
    }
}
