//! # Youshiki - Schema-Driven Multi-Stage Form Engine
//!
//! **Youshiki** interprets a declarative form configuration (stages, fields,
//! groups, sections, computed values and validation rules) and drives a
//! multi-stage wizard over it. Expressions in the configuration are compiled
//! once into typed ASTs and evaluated by a small sandboxed interpreter, so a
//! configuration can compute and validate but never run arbitrary code.
//!
//! ## Core Workflow
//!
//! 1.  **Load the configuration**: parse the tagged JSON format with
//!     `Form::from_json`, or convert another shape through the `IntoForm` trait
//!     (`LegacyForm` handles the older attribute-sniffed format).
//! 2.  **Build the engine**: `FormEngine::builder(form)` compiles every
//!     calculation and rule. Problems in the configuration are logged through
//!     `tracing` and degrade to neutral results instead of failing the build.
//! 3.  **Run sessions**: a `FormSession` owns one user's values, stage state and
//!     errors. Each edit recomputes derived fields and revalidates the stage.
//! 4.  **Render**: `FormSession::view` resolves everything a presentation layer
//!     needs; implement `Renderer` to draw it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use youshiki::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("path/to/form.json")?;
//!     let form = Form::from_json(&json)?;
//!
//!     let engine = Arc::new(FormEngine::builder(form).build());
//!     let mut session = FormSession::new(engine);
//!     let mut context = AppContext::new();
//!
//!     session.change("dimensions.length", 2)?;
//!     session.change("dimensions.width", 3)?;
//!     session.change("dimensions.height", 4)?;
//!     println!("volume = {:?}", session.value(&FieldPath::root("volume")));
//!
//!     match session.submit_into(&mut context) {
//!         Transition::Blocked(errors) => println!("{} field(s) need attention", errors.len()),
//!         Transition::Submitted => println!("submitted: {:?}", context.state().quote_form),
//!         other => println!("{:?}", other),
//!     }
//!
//!     print!("{}", PlainTextRenderer.render(&session.view()));
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod compiler;
pub mod context;
pub mod controller;
pub mod data;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod options;
pub mod prelude;
pub mod schema;
pub mod session;
pub mod store;
pub mod trace;
pub mod validator;
pub mod view;
