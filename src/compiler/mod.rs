use crate::ast::{Expression, Value};
use crate::engine::FormEngine;
use crate::error::CompileError;
use crate::interpreter::{COMPUTED_ROOTS, PREDICATE_ROOTS};
use crate::schema::{Field, FieldPath, Form, ValidationRule};
use ahash::AHashMap;
use itertools::Itertools;
use regex::Regex;
use tracing::warn;

mod functions;
mod optimizer;
pub mod parsing;

pub use functions::{Arity, FormFunction, FunctionRegistry};
use optimizer::AstOptimizer;
use parsing::parse_expression;

/// An expression source string together with the result of compiling it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub source: String,
    pub program: Result<Expression, CompileError>,
}

/// A computed field: where the result goes and how it is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub path: FieldPath,
    pub expression: CompiledExpression,
}

/// A validation rule with its bounds and patterns resolved against the field.
#[derive(Debug, Clone)]
pub enum RuleCheck {
    /// `None` when the pattern did not compile; the rule then always passes.
    Regex(Option<Regex>),
    Required,
    MinLength(usize),
    MaxLength(Option<usize>),
    MinValue(f64),
    MaxValue(Option<f64>),
    Predicate(CompiledExpression),
    Unsupported(String),
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub check: RuleCheck,
    pub message: String,
}

pub struct Compiler {
    form: Form,
    functions: FunctionRegistry,
}

pub struct CompilerBuilder {
    form: Form,
    functions: FunctionRegistry,
}

impl CompilerBuilder {
    pub fn new(form: Form) -> Self {
        Self {
            form,
            functions: FunctionRegistry::with_defaults(),
        }
    }

    /// Makes a function callable from expressions. A function with the name of
    /// a built-in replaces it.
    pub fn with_function(mut self, function: Box<dyn FormFunction>) -> Self {
        self.functions.register(function);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            form: self.form,
            functions: self.functions,
        }
    }
}

impl Compiler {
    pub fn builder(form: Form) -> CompilerBuilder {
        CompilerBuilder::new(form)
    }

    /// Parses, checks and optimizes one expression. `roots` lists the
    /// variables the call site binds.
    pub fn compile_expression(&self, source: &str, roots: &[&str]) -> CompiledExpression {
        CompiledExpression {
            source: source.to_string(),
            program: self.compile_program(source, roots),
        }
    }

    fn compile_program(&self, source: &str, roots: &[&str]) -> Result<Expression, CompileError> {
        let ast = parse_expression(source)?;

        let mut calls = Vec::new();
        ast.collect_calls(&mut calls);
        for (name, args) in calls {
            let function = self
                .functions
                .get(name)
                .ok_or_else(|| CompileError::UnknownFunction(name.to_string()))?;
            if !function.arity().accepts(args.len()) {
                return Err(CompileError::ArityMismatch {
                    name: name.to_string(),
                    expected: function.arity().to_string(),
                    found: args.len(),
                });
            }
        }

        let mut variables = Vec::new();
        ast.collect_variables(&mut variables);
        if let Some(unknown) = variables.iter().find(|v| !roots.contains(&v.root.as_str())) {
            return Err(CompileError::UnknownVariable {
                name: unknown.root.clone(),
                allowed: roots.iter().join(", "),
            });
        }

        let program = AstOptimizer::new(&self.functions).optimize(ast);

        // Folding may have turned more arguments into literals.
        let mut calls = Vec::new();
        program.collect_calls(&mut calls);
        for (name, args) in calls {
            if let Some(function) = self.functions.get(name) {
                let literals: Vec<Option<&Value>> = args
                    .iter()
                    .map(|arg| match arg {
                        Expression::Literal(value) => Some(value),
                        _ => None,
                    })
                    .collect();
                function.prepare(&literals)?;
            }
        }

        Ok(program)
    }

    /// Compiles every calculation and validation rule of the form into an engine.
    ///
    /// Nothing here fails: problems are logged and the affected calculation or
    /// rule degrades to its neutral result.
    pub fn compile(self) -> FormEngine {
        for issue in self.form.lint() {
            warn!(form = %self.form.name, "{}", issue);
        }

        let calculations = self.compile_calculations();
        let rules = self.compile_rules();
        FormEngine::assemble(self.form, calculations, rules, self.functions)
    }

    fn compile_calculations(&self) -> Vec<Calculation> {
        let entries = self.form.fields();
        let calculations: Vec<Calculation> = entries
            .iter()
            .filter_map(|entry| {
                let source = entry.field.value_calculation.as_deref()?;
                let expression = self.compile_expression(source, COMPUTED_ROOTS);
                if let Err(e) = &expression.program {
                    warn!(field = %entry.path, error = %e, "calculation will yield empty values");
                }
                Some(Calculation {
                    path: entry.path.clone(),
                    expression,
                })
            })
            .collect();

        report_late_reads(&calculations);
        calculations
    }

    fn compile_rules(&self) -> AHashMap<FieldPath, Vec<CompiledRule>> {
        let mut rules: AHashMap<FieldPath, Vec<CompiledRule>> = AHashMap::new();
        for entry in self.form.fields() {
            let compiled = entry
                .field
                .validations
                .iter()
                .map(|rule| self.compile_rule(rule, entry.field, &entry.path));
            rules.entry(entry.path.clone()).or_default().extend(compiled);
        }
        rules.retain(|_, compiled| !compiled.is_empty());
        rules
    }

    fn compile_rule(&self, rule: &ValidationRule, field: &Field, path: &FieldPath) -> CompiledRule {
        let check = match rule {
            ValidationRule::Regex { pattern, .. } => match Regex::new(pattern) {
                Ok(regex) => RuleCheck::Regex(Some(regex)),
                Err(e) => {
                    let error = CompileError::InvalidPattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    };
                    warn!(field = %path, error = %error, "regex rule will always pass");
                    RuleCheck::Regex(None)
                }
            },
            ValidationRule::Function { body, .. } => {
                let expression = self.compile_expression(body, PREDICATE_ROOTS);
                if let Err(e) = &expression.program {
                    warn!(field = %path, error = %e, "predicate rule will always pass");
                }
                RuleCheck::Predicate(expression)
            }
            ValidationRule::Required { .. } => RuleCheck::Required,
            ValidationRule::MinLength { .. } => RuleCheck::MinLength(field.min_length.unwrap_or(0)),
            ValidationRule::MaxLength { .. } => RuleCheck::MaxLength(field.max_length),
            ValidationRule::MinValue { .. } => RuleCheck::MinValue(field.min.unwrap_or(0.0)),
            ValidationRule::MaxValue { .. } => RuleCheck::MaxValue(field.max),
            ValidationRule::Unsupported { kind, .. } => {
                warn!(field = %path, kind = %kind, "unsupported validation rule will always pass");
                RuleCheck::Unsupported(kind.clone())
            }
        };

        CompiledRule {
            check,
            message: rule.message().to_string(),
        }
    }
}

/// Warns about calculations that read a computed field at or after their own
/// position. Those reads see the previous pass's value, so the derived pass is
/// only idempotent for forms without them.
fn report_late_reads(calculations: &[Calculation]) {
    let positions: AHashMap<&FieldPath, usize> = calculations
        .iter()
        .enumerate()
        .map(|(index, calculation)| (&calculation.path, index))
        .collect();

    for (index, calculation) in calculations.iter().enumerate() {
        let Ok(program) = &calculation.expression.program else {
            continue;
        };
        let mut variables = Vec::new();
        program.collect_variables(&mut variables);

        for variable in variables {
            let read = match variable.members.as_slice() {
                [group, name, ..] => FieldPath::grouped(group, name),
                [name] => FieldPath::root(name),
                [] => continue,
            };
            let target = positions
                .get(&read)
                .or_else(|| positions.get(&FieldPath::root(read.group().unwrap_or(read.name()))));
            if let Some(&position) = target {
                if position >= index {
                    warn!(
                        field = %calculation.path,
                        reads = %read,
                        "calculation reads a computed field that is derived later in the same pass"
                    );
                }
            }
        }
    }
}
