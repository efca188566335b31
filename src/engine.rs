use crate::ast::Value;
use crate::compiler::{
    Calculation, CompiledRule, Compiler, CompilerBuilder, FormFunction, FunctionRegistry,
};
use crate::interpreter::Evaluator;
use crate::options;
use crate::schema::{Field, FieldPath, Form, flatten};
use crate::store::{self, ValueTree};
use crate::validator::{ErrorMap, Validator};
use ahash::AHashMap;

/// A form whose expressions and rules have been compiled.
///
/// The engine is immutable once built and holds no per-user state, so one
/// instance can back any number of sessions.
pub struct FormEngine {
    form: Form,
    calculations: Vec<Calculation>,
    rules: AHashMap<FieldPath, Vec<CompiledRule>>,
    functions: FunctionRegistry,
}

/// Configures and builds a [`FormEngine`].
pub struct FormEngineBuilder {
    compiler: CompilerBuilder,
}

impl FormEngineBuilder {
    pub fn with_function(mut self, function: Box<dyn FormFunction>) -> Self {
        self.compiler = self.compiler.with_function(function);
        self
    }

    pub fn build(self) -> FormEngine {
        self.compiler.build().compile()
    }
}

impl FormEngine {
    pub fn builder(form: Form) -> FormEngineBuilder {
        FormEngineBuilder {
            compiler: Compiler::builder(form),
        }
    }

    /// Builds an engine with the built-in functions only.
    pub fn new(form: Form) -> Self {
        Self::builder(form).build()
    }

    pub(crate) fn assemble(
        form: Form,
        calculations: Vec<Calculation>,
        rules: AHashMap<FieldPath, Vec<CompiledRule>>,
        functions: FunctionRegistry,
    ) -> Self {
        Self {
            form,
            calculations,
            rules,
            functions,
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn calculations(&self) -> &[Calculation] {
        &self.calculations
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.functions)
    }

    /// The tree before any derived pass: defaults, or empty values.
    pub fn initialize(&self) -> ValueTree {
        store::initialize(&self.form)
    }

    pub fn apply_change(&self, values: &ValueTree, path: &FieldPath, value: Value) -> ValueTree {
        store::apply_change(values, path, value)
    }

    pub fn recompute_derived(&self, values: &ValueTree) -> ValueTree {
        store::recompute_derived(values, &self.calculations, &self.evaluator())
    }

    /// Validates the stage at `index`. An index past the last stage has no errors.
    pub fn validate_stage(&self, index: usize, values: &ValueTree) -> ErrorMap {
        let Some(stage) = self.form.stage(index) else {
            return ErrorMap::new();
        };
        Validator::new(&self.rules, self.evaluator())
            .validate_stage(&flatten(&stage.fields), values)
    }

    pub fn is_computed(&self, path: &FieldPath) -> bool {
        self.calculations.iter().any(|c| &c.path == path)
    }

    pub fn resolve_options(
        &self,
        field: &Field,
        group: Option<&str>,
        values: &ValueTree,
    ) -> Vec<String> {
        options::resolve_options(field, group, values)
    }

    pub fn is_disabled(&self, field: &Field, group: Option<&str>, values: &ValueTree) -> bool {
        options::is_disabled(field, group, values)
    }
}
