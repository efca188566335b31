use crate::ast::Value;
use thiserror::Error;

/// Errors that can occur while loading a form configuration document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Failed to parse form configuration JSON: {0}")]
    JsonParseError(String),

    #[error("Node '{node}' in stage '{stage}' could not be converted: {message}")]
    ConversionError {
        stage: String,
        node: String,
        message: String,
    },
}

/// Errors that can occur while compiling an expression or a validation rule.
///
/// These never reach the caller of the engine: the compiler logs them and the
/// affected calculation or rule degrades to its neutral result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Function '{0}' is not registered")]
    UnknownFunction(String),

    #[error("Function '{name}' expects {expected} argument(s), but received {found}")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Variable '{name}' is not available here (expected one of: {allowed})")]
    UnknownVariable { name: String, allowed: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Errors that can occur while evaluating a compiled expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error(
        "Type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("Variable '{0}' is not bound in the evaluation scope")]
    UnknownVariable(String),

    #[error("'{0}' refers to a group of values, not a single value")]
    NotAScalar(String),

    #[error("Cannot read member '{member}' of an empty value at '{path}'")]
    MemberOfNull { path: String, member: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Function '{0}' is not registered")]
    UnknownFunction(String),

    #[error("Function '{name}' failed: {message}")]
    FunctionFailed { name: String, message: String },
}

/// Errors produced when a field path cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Field path is empty")]
    Empty,

    #[error("Field path '{0}' nests deeper than one group")]
    TooDeep(String),

    #[error("Field path '{0}' contains an empty segment")]
    EmptySegment(String),
}

/// Errors that can occur when loading a scripted session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Could not read script file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse session script JSON: {0}")]
    JsonParseError(String),
}
