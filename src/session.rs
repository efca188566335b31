use crate::ast::Value;
use crate::context::{Action, Dispatch};
use crate::controller::{StageController, StageStatus, Transition};
use crate::engine::FormEngine;
use crate::error::PathError;
use crate::schema::FieldPath;
use crate::store::ValueTree;
use crate::validator::ErrorMap;
use crate::view::FormView;
use std::sync::Arc;
use tracing::debug;

/// One mounted form: the value tree, stage state and current errors of a
/// single user working through a [`FormEngine`].
///
/// Every edit runs the full pipeline synchronously: apply the change,
/// recompute derived fields, validate the current stage.
pub struct FormSession {
    engine: Arc<FormEngine>,
    values: ValueTree,
    controller: StageController,
    errors: ErrorMap,
}

impl FormSession {
    pub fn new(engine: Arc<FormEngine>) -> Self {
        let values = engine.recompute_derived(&engine.initialize());
        let controller = StageController::new(engine.form().stage_count());
        Self {
            engine,
            values,
            controller,
            errors: ErrorMap::new(),
        }
    }

    /// Records an edit addressed by a dotted path string.
    ///
    /// Returns `Ok(false)` when the edit was refused: the path names no field
    /// of the form, or the field is computed.
    pub fn change(&mut self, path: &str, value: impl Into<Value>) -> Result<bool, PathError> {
        let path = FieldPath::parse(path)?;
        Ok(self.change_path(&path, value.into()))
    }

    pub fn change_path(&mut self, path: &FieldPath, value: Value) -> bool {
        if self.engine.form().field(path).is_none() {
            debug!(field = %path, "edit rejected: no such field");
            return false;
        }
        if self.engine.is_computed(path) {
            debug!(field = %path, "edit rejected: field is computed");
            return false;
        }

        let changed = self.engine.apply_change(&self.values, path, value);
        self.values = self.engine.recompute_derived(&changed);
        self.errors = self
            .engine
            .validate_stage(self.controller.current(), &self.values);
        true
    }

    /// Validates the current stage and moves forward, or submits on the last stage.
    pub fn next(&mut self) -> Transition {
        let engine = &self.engine;
        let values = &self.values;
        let transition = self
            .controller
            .submit(|index| engine.validate_stage(index, values));

        self.errors = match &transition {
            Transition::Blocked(errors) => errors.clone(),
            Transition::Submitted => ErrorMap::new(),
            _ => self.revalidate(),
        };
        transition
    }

    /// Like [`FormSession::next`], dispatching the value tree as
    /// `SET_QUOTE_FORM` when the form is submitted.
    pub fn submit_into(&mut self, dispatch: &mut dyn Dispatch) -> Transition {
        let transition = self.next();
        if transition == Transition::Submitted {
            dispatch.dispatch(Action::SetQuoteForm(self.values.to_json()));
        }
        transition
    }

    pub fn previous(&mut self) -> Transition {
        let transition = self.controller.previous();
        if transition != Transition::Ignored {
            self.errors = self.revalidate();
        }
        transition
    }

    pub fn jump_to(&mut self, index: usize) -> Transition {
        let transition = self.controller.jump_to(index);
        if transition != Transition::Ignored {
            self.errors = self.revalidate();
        }
        transition
    }

    fn revalidate(&self) -> ErrorMap {
        self.engine
            .validate_stage(self.controller.current(), &self.values)
    }

    /// The errors to show: none while the current stage is untouched.
    pub fn visible_errors(&self) -> ErrorMap {
        match self.controller.status(self.controller.current()) {
            Some(StageStatus::Untouched) | None => ErrorMap::new(),
            Some(_) => self.errors.clone(),
        }
    }

    /// Every error of the current stage, shown or not.
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn values(&self) -> &ValueTree {
        &self.values
    }

    pub fn value(&self, path: &FieldPath) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn current_stage(&self) -> usize {
        self.controller.current()
    }

    pub fn status(&self, index: usize) -> Option<StageStatus> {
        self.controller.status(index)
    }

    pub fn controller(&self) -> &StageController {
        &self.controller
    }

    pub fn engine(&self) -> &FormEngine {
        &self.engine
    }

    pub fn view(&self) -> FormView {
        FormView::build(
            &self.engine,
            &self.values,
            &self.controller,
            &self.visible_errors(),
        )
    }
}
