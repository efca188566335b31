use crate::ast::Value;
use crate::context::Dispatch;
use crate::controller::Transition;
use crate::error::{PathError, ScriptError};
use crate::session::FormSession;
use serde::Deserialize;
use std::fs;

/// A recorded sequence of user events, replayed against a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionScript {
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ScriptStep {
    Change { path: String, value: Value },
    Next,
    Previous,
    Jump { stage: usize },
}

/// What happened when a step was replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Changed { path: String, accepted: bool },
    InvalidPath { path: String, error: PathError },
    Navigated(Transition),
}

impl SessionScript {
    /// Load a session script from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path).map_err(|e| ScriptError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(json).map_err(|e| ScriptError::JsonParseError(e.to_string()))
    }

    /// Replays every step in order. Submissions are dispatched into `dispatch`.
    pub fn replay(
        &self,
        session: &mut FormSession,
        dispatch: &mut dyn Dispatch,
    ) -> Vec<StepOutcome> {
        self.steps
            .iter()
            .map(|step| step.apply(session, dispatch))
            .collect()
    }
}

impl ScriptStep {
    pub fn apply(&self, session: &mut FormSession, dispatch: &mut dyn Dispatch) -> StepOutcome {
        match self {
            ScriptStep::Change { path, value } => match session.change(path, value.clone()) {
                Ok(accepted) => StepOutcome::Changed {
                    path: path.clone(),
                    accepted,
                },
                Err(error) => StepOutcome::InvalidPath {
                    path: path.clone(),
                    error,
                },
            },
            ScriptStep::Next => StepOutcome::Navigated(session.submit_into(dispatch)),
            ScriptStep::Previous => StepOutcome::Navigated(session.previous()),
            ScriptStep::Jump { stage } => StepOutcome::Navigated(session.jump_to(*stage)),
        }
    }
}
