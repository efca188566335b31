use super::FunctionRegistry;
use crate::ast::Expression;
use crate::interpreter::{AstEngine, Scope};

/// Simplifies an AST before it is stored in the engine.
pub struct AstOptimizer<'a> {
    functions: &'a FunctionRegistry,
}

impl<'a> AstOptimizer<'a> {
    pub fn new(functions: &'a FunctionRegistry) -> Self {
        Self { functions }
    }

    /// Runs the folding pass in a loop until the AST reaches a fixed point.
    pub fn optimize(&self, expr: Expression) -> Expression {
        let mut current_expr = expr;
        loop {
            let next = self.fold(current_expr.clone());
            if next == current_expr {
                return next;
            }
            current_expr = next;
        }
    }

    fn fold(&self, expr: Expression) -> Expression {
        // First, recursively optimize the children
        let expr = match expr {
            Expression::Sum(l, r) => Expression::Sum(self.fold_boxed(l), self.fold_boxed(r)),
            Expression::Subtract(l, r) => {
                Expression::Subtract(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::Multiply(l, r) => {
                Expression::Multiply(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::Divide(l, r) => Expression::Divide(self.fold_boxed(l), self.fold_boxed(r)),
            Expression::Remainder(l, r) => {
                Expression::Remainder(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::Negate(v) => Expression::Negate(self.fold_boxed(v)),
            Expression::Not(v) => Expression::Not(self.fold_boxed(v)),
            Expression::And(l, r) => Expression::And(self.fold_boxed(l), self.fold_boxed(r)),
            Expression::Or(l, r) => Expression::Or(self.fold_boxed(l), self.fold_boxed(r)),
            Expression::Equal(l, r) => Expression::Equal(self.fold_boxed(l), self.fold_boxed(r)),
            Expression::NotEqual(l, r) => {
                Expression::NotEqual(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::GreaterThan(l, r) => {
                Expression::GreaterThan(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::GreaterThanOrEqual(l, r) => {
                Expression::GreaterThanOrEqual(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::SmallerThan(l, r) => {
                Expression::SmallerThan(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::SmallerThanOrEqual(l, r) => {
                Expression::SmallerThanOrEqual(self.fold_boxed(l), self.fold_boxed(r))
            }
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => Expression::Conditional {
                condition: self.fold_boxed(condition),
                then: self.fold_boxed(then),
                otherwise: self.fold_boxed(otherwise),
            },
            Expression::Call { function, args } => Expression::Call {
                function,
                args: args.into_iter().map(|arg| self.fold(arg)).collect(),
            },
            leaf @ (Expression::Literal(_) | Expression::Variable(_)) => leaf,
        };

        // Second, apply the folding rules
        self.apply_folding_rules(expr)
    }

    fn fold_boxed(&self, expr: Box<Expression>) -> Box<Expression> {
        Box::new(self.fold(*expr))
    }

    fn apply_folding_rules(&self, expr: Expression) -> Expression {
        if !matches!(expr, Expression::Literal(_)) && expr.is_constant() {
            // A constant subtree that fails (e.g. `1 / 0`) is left for runtime to report.
            let scope = Scope::empty();
            if let Ok(trace) = AstEngine::new(&scope, self.functions).evaluate(&expr) {
                return Expression::Literal(trace.get_outcome());
            }
            return expr;
        }

        match expr {
            Expression::And(l, r) => match *l {
                Expression::Literal(v) if !v.is_truthy() => Expression::Literal(v),
                Expression::Literal(_) => *r,
                left => Expression::And(Box::new(left), r),
            },
            Expression::Or(l, r) => match *l {
                Expression::Literal(v) if v.is_truthy() => Expression::Literal(v),
                Expression::Literal(_) => *r,
                left => Expression::Or(Box::new(left), r),
            },
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => match *condition {
                Expression::Literal(v) if v.is_truthy() => *then,
                Expression::Literal(_) => *otherwise,
                condition => Expression::Conditional {
                    condition: Box::new(condition),
                    then,
                    otherwise,
                },
            },
            Expression::Not(v) => match *v {
                Expression::Not(inner) if matches!(*inner, Expression::Not(_)) => *inner,
                opt_v => Expression::Not(Box::new(opt_v)),
            },
            other => other,
        }
    }
}
