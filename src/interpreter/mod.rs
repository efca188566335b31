use crate::ast::{EvaluationTrace, Expression, Value};
use crate::compiler::{CompiledExpression, FunctionRegistry};
use crate::error::EvaluationError;
use crate::schema::FieldPath;
use crate::store::ValueTree;
use crate::trace::TraceFormatter;
use tracing::{debug, warn};

mod engine;
mod scope;

pub(crate) use engine::AstEngine;
pub use scope::{Binding, COMPUTED_ROOTS, PREDICATE_ROOTS, Scope};

/// Runs compiled expressions and applies the failure policy around them.
///
/// `evaluate` reports every failure to the caller. `compute` and `predicate`
/// are the two call sites the engine uses; they log failures and fall back to
/// a neutral result instead.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    functions: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(functions: &'a FunctionRegistry) -> Self {
        Self { functions }
    }

    /// Evaluates an expression against `scope`, returning the full trace.
    pub fn evaluate(
        &self,
        expr: &Expression,
        scope: &Scope<'_>,
    ) -> Result<EvaluationTrace, EvaluationError> {
        AstEngine::new(scope, self.functions).evaluate(expr)
    }

    /// The value of a computed field. Failures yield the empty value.
    pub fn compute(
        &self,
        expression: &CompiledExpression,
        path: &FieldPath,
        values: &ValueTree,
    ) -> Value {
        // Compile failures were reported when the engine was built.
        let Ok(program) = &expression.program else {
            return Value::empty();
        };
        match self.evaluate(program, &Scope::computed(values)) {
            Ok(trace) => trace.get_outcome(),
            Err(e) => {
                warn!(
                    field = %path,
                    expression = %expression.source,
                    error = %e,
                    "calculation failed"
                );
                Value::empty()
            }
        }
    }

    /// Whether a custom validation predicate accepts the value. Failures pass.
    ///
    /// `form_value` is what the predicate sees as `formValue`: the whole tree
    /// for a top-level field, the group's members for a grouped one.
    pub fn predicate(
        &self,
        expression: &CompiledExpression,
        field_name: &str,
        field_value: &Value,
        form_value: Binding<'_>,
        values: &ValueTree,
    ) -> bool {
        let Ok(program) = &expression.program else {
            return true;
        };
        let scope = Scope::predicate(field_name, field_value.clone(), form_value, values);
        match self.evaluate(program, &scope) {
            Ok(trace) if trace.get_outcome().is_truthy() => true,
            Ok(trace) => {
                debug!(
                    field = field_name,
                    reason = %TraceFormatter::format_trace(&trace),
                    "validation predicate rejected value"
                );
                false
            }
            Err(e) => {
                warn!(
                    field = field_name,
                    expression = %expression.source,
                    error = %e,
                    "validation predicate failed"
                );
                true
            }
        }
    }
}
