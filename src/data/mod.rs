mod script;

pub use script::{ScriptStep, SessionScript, StepOutcome};
