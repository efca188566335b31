//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the youshiki crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use youshiki::prelude::*;
//! use std::sync::Arc;
//!
//! # fn run_example() -> Result<()> {
//! let form = Form::from_json(&std::fs::read_to_string("path/to/form.json")?)?;
//! let mut session = FormSession::new(Arc::new(FormEngine::new(form)));
//! session.change("email", "someone@example.com")?;
//! let transition = session.next();
//! println!("{:?}", transition);
//! # Ok(())
//! # }
//! ```

// Engine and session
pub use crate::engine::{FormEngine, FormEngineBuilder};
pub use crate::session::FormSession;
pub use crate::controller::{StageController, StageStatus, Transition};

// Schema
pub use crate::schema::{FieldPath, Form, IntoForm, LegacyForm};

// Expressions
pub use crate::ast::{EvaluationTrace, Expression, Value};
pub use crate::compiler::{Arity, FormFunction};

// Values, errors and views
pub use crate::store::ValueTree;
pub use crate::validator::ErrorMap;
pub use crate::view::{FormView, PlainTextRenderer, Renderer};

// Cross-page state
pub use crate::context::{Action, AppContext, Dispatch};

// Scripts
pub use crate::data::SessionScript;

// Error types
pub use crate::error::{EvaluationError, PathError, SchemaError, ScriptError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
