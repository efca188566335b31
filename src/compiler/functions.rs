use crate::ast::Value;
use crate::error::{CompileError, EvaluationError};
use ahash::AHashMap;
use regex::Regex;
use std::fmt;
use std::sync::RwLock;

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Between(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

/// Defines the contract for a named function callable from expressions.
///
/// Functions must be pure: the engine evaluates them on every derived pass
/// and assumes the same arguments always produce the same result.
pub trait FormFunction: Send + Sync {
    fn name(&self) -> &str;
    fn arity(&self) -> Arity;
    fn call(&self, args: &[Value]) -> Result<Value, EvaluationError>;

    /// Called once per call site while the engine is built. `literals` holds
    /// the arguments known at that point; the others are `None`.
    fn prepare(&self, _literals: &[Option<&Value>]) -> Result<(), CompileError> {
        Ok(())
    }
}

/// Reads an argument as a number, coercing numeric text.
fn number_arg(function: &str, value: &Value) -> Result<f64, EvaluationError> {
    value
        .coerce_number()
        .ok_or_else(|| EvaluationError::TypeMismatch {
            operation: function.to_string(),
            expected: "Number".to_string(),
            found: value.clone(),
        })
}

/// Master macro to define the numeric built-ins and their registration.
macro_rules! define_functions {
    ( $( ($struct_name:ident, $name:expr, Unary, $op:expr) ),* $(,)? ; $( ($bi_struct_name:ident, $bi_name:expr, Binary, $bi_op:expr) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl FormFunction for $struct_name {
                fn name(&self) -> &str { $name }
                fn arity(&self) -> Arity { Arity::Exact(1) }
                fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
                    let op: fn(f64) -> f64 = $op;
                    Ok(Value::Number(op(number_arg($name, &args[0])?)))
                }
            }
        )*
        $(
            struct $bi_struct_name;
            impl FormFunction for $bi_struct_name {
                fn name(&self) -> &str { $bi_name }
                fn arity(&self) -> Arity { Arity::Exact(2) }
                fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
                    let op: fn(f64, f64) -> f64 = $bi_op;
                    let left = number_arg($bi_name, &args[0])?;
                    let right = number_arg($bi_name, &args[1])?;
                    Ok(Value::Number(op(left, right)))
                }
            }
        )*

        fn register_numeric_functions(registry: &mut FunctionRegistry) {
            $( registry.register(Box::new($struct_name)); )*
            $( registry.register(Box::new($bi_struct_name)); )*
        }
    };
}

define_functions! {
    (AbsFunction, "abs", Unary, f64::abs),
    (FloorFunction, "floor", Unary, f64::floor),
    (CeilFunction, "ceil", Unary, f64::ceil),
    (SqrtFunction, "sqrt", Unary, f64::sqrt),

    ;

    (MinFunction, "min", Binary, f64::min),
    (MaxFunction, "max", Binary, f64::max),
    (PowFunction, "pow", Binary, f64::powf)
}

/// `round(x)` or `round(x, digits)`.
struct RoundFunction;

impl FormFunction for RoundFunction {
    fn name(&self) -> &str {
        "round"
    }
    fn arity(&self) -> Arity {
        Arity::Between(1, 2)
    }
    fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        let x = number_arg("round", &args[0])?;
        let digits = match args.get(1) {
            Some(digits) => number_arg("round", digits)?.trunc() as i32,
            None => 0,
        };
        let factor = 10f64.powi(digits);
        Ok(Value::Number((x * factor).round() / factor))
    }
}

/// Character count of the value as displayed.
struct LenFunction;

impl FormFunction for LenFunction {
    fn name(&self) -> &str {
        "len"
    }
    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }
    fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        Ok(Value::Number(args[0].display_text().chars().count() as f64))
    }
}

struct IsEmptyFunction;

impl FormFunction for IsEmptyFunction {
    fn name(&self) -> &str {
        "isEmpty"
    }
    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }
    fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        Ok(Value::Bool(args[0].is_empty()))
    }
}

struct NumberFunction;

impl FormFunction for NumberFunction {
    fn name(&self) -> &str {
        "number"
    }
    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }
    fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        number_arg("number", &args[0]).map(Value::Number)
    }
}

/// Concatenates the display text of every argument.
struct ConcatFunction;

impl FormFunction for ConcatFunction {
    fn name(&self) -> &str {
        "concat"
    }
    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }
    fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        Ok(Value::Text(
            args.iter().map(|arg| arg.display_text()).collect::<String>(),
        ))
    }
}

/// `matches(text, pattern)`: whether the text matches the regular expression.
///
/// Literal patterns are compiled once, when the engine is built.
#[derive(Default)]
struct MatchesFunction {
    patterns: RwLock<AHashMap<String, Regex>>,
}

impl MatchesFunction {
    fn cached(&self, pattern: &str) -> Option<Regex> {
        self.patterns.read().ok()?.get(pattern).cloned()
    }
}

impl FormFunction for MatchesFunction {
    fn name(&self) -> &str {
        "matches"
    }
    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }
    fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        let pattern = args[1].display_text();
        let regex = match self.cached(&pattern) {
            Some(regex) => regex,
            None => Regex::new(&pattern).map_err(|e| EvaluationError::FunctionFailed {
                name: "matches".to_string(),
                message: e.to_string(),
            })?,
        };
        Ok(Value::Bool(regex.is_match(&args[0].display_text())))
    }
    fn prepare(&self, literals: &[Option<&Value>]) -> Result<(), CompileError> {
        let Some(Some(pattern)) = literals.get(1) else {
            return Ok(());
        };
        let pattern = pattern.display_text();
        let regex = Regex::new(&pattern).map_err(|e| CompileError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        if let Ok(mut patterns) = self.patterns.write() {
            patterns.insert(pattern.into_owned(), regex);
        }
        Ok(())
    }
}

/// The closed set of functions expressions may call.
pub struct FunctionRegistry {
    functions: AHashMap<String, Box<dyn FormFunction>>,
}

impl FunctionRegistry {
    /// An empty registry. Most callers want [`FunctionRegistry::with_defaults`].
    pub fn new() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_numeric_functions(&mut registry);
        registry.register(Box::new(RoundFunction));
        registry.register(Box::new(LenFunction));
        registry.register(Box::new(IsEmptyFunction));
        registry.register(Box::new(NumberFunction));
        registry.register(Box::new(ConcatFunction));
        registry.register(Box::<MatchesFunction>::default());
        registry
    }

    /// Adds a function, replacing any function already registered under its name.
    pub fn register(&mut self, function: Box<dyn FormFunction>) {
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn get(&self, name: &str) -> Option<&dyn FormFunction> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
