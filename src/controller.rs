use crate::validator::ErrorMap;
use serde::Serialize;
use tracing::debug;

/// Completion state of one stage. A stage never returns to `Untouched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Untouched,
    Incomplete,
    Complete,
}

/// The outcome of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The current stage validated and the next stage is now current.
    Advanced { from: usize, to: usize },
    /// The last stage validated: the form is submitted. Resubmission is allowed.
    Submitted,
    /// Validation failed; the index is unchanged.
    Blocked(ErrorMap),
    /// Backward or jump navigation, which never validates.
    Moved { from: usize, to: usize },
    /// The request was not allowed and changed nothing.
    Ignored,
}

/// Current stage index and per-stage status for a wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageController {
    current: usize,
    statuses: Vec<StageStatus>,
}

impl StageController {
    pub fn new(stage_count: usize) -> Self {
        Self {
            current: 0,
            statuses: vec![StageStatus::Untouched; stage_count],
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn stage_count(&self) -> usize {
        self.statuses.len()
    }

    pub fn status(&self, index: usize) -> Option<StageStatus> {
        self.statuses.get(index).copied()
    }

    pub fn statuses(&self) -> &[StageStatus] {
        &self.statuses
    }

    pub fn is_last_stage(&self) -> bool {
        self.current + 1 == self.statuses.len()
    }

    /// Validates the current stage with `validate` and moves forward, or
    /// submits when the current stage is the last one.
    pub fn submit<F>(&mut self, validate: F) -> Transition
    where
        F: FnOnce(usize) -> ErrorMap,
    {
        if self.statuses.is_empty() {
            return Transition::Ignored;
        }
        let from = self.current;
        let errors = validate(from);

        if !errors.is_empty() {
            self.statuses[from] = StageStatus::Incomplete;
            debug!(stage = from, errors = errors.len(), "stage blocked");
            return Transition::Blocked(errors);
        }

        self.statuses[from] = StageStatus::Complete;
        if self.is_last_stage() {
            debug!(stage = from, "form submitted");
            Transition::Submitted
        } else {
            self.current = from + 1;
            debug!(from, to = self.current, "stage advanced");
            Transition::Advanced {
                from,
                to: self.current,
            }
        }
    }

    /// Steps back one stage without validating. A no-op on the first stage.
    pub fn previous(&mut self) -> Transition {
        if self.current == 0 {
            return Transition::Ignored;
        }
        let from = self.current;
        self.current -= 1;
        debug!(from, to = self.current, "stage moved back");
        Transition::Moved {
            from,
            to: self.current,
        }
    }

    /// Whether a progress step may be clicked: it has been attempted and is
    /// not the current stage.
    pub fn can_jump_to(&self, target: usize) -> bool {
        target != self.current
            && self
                .status(target)
                .is_some_and(|status| status != StageStatus::Untouched)
    }

    pub fn jump_to(&mut self, target: usize) -> Transition {
        if !self.can_jump_to(target) {
            return Transition::Ignored;
        }
        let from = self.current;
        self.current = target;
        debug!(from, to = target, "stage jumped");
        Transition::Moved { from, to: target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldPath;

    fn failing(_: usize) -> ErrorMap {
        let mut errors = ErrorMap::new();
        errors.insert(FieldPath::root("email"), "Email is required.".to_string());
        errors
    }

    #[test]
    fn test_blocked_submit_marks_incomplete() {
        let mut controller = StageController::new(2);
        assert!(matches!(controller.submit(failing), Transition::Blocked(_)));
        assert_eq!(controller.current(), 0);
        assert_eq!(controller.status(0), Some(StageStatus::Incomplete));
    }

    #[test]
    fn test_advance_then_submit() {
        let mut controller = StageController::new(2);
        assert_eq!(
            controller.submit(|_| ErrorMap::new()),
            Transition::Advanced { from: 0, to: 1 }
        );
        assert_eq!(controller.submit(|_| ErrorMap::new()), Transition::Submitted);
        assert_eq!(controller.current(), 1);
        // No terminal lock.
        assert_eq!(controller.submit(|_| ErrorMap::new()), Transition::Submitted);
    }

    #[test]
    fn test_jump_requires_attempted_stage() {
        let mut controller = StageController::new(3);
        assert_eq!(controller.jump_to(2), Transition::Ignored);
        controller.submit(|_| ErrorMap::new());
        assert_eq!(controller.jump_to(1), Transition::Ignored);
        assert_eq!(controller.jump_to(0), Transition::Moved { from: 1, to: 0 });
        assert_eq!(controller.status(0), Some(StageStatus::Complete));
    }

    #[test]
    fn test_previous_at_first_stage_is_ignored() {
        let mut controller = StageController::new(2);
        assert_eq!(controller.previous(), Transition::Ignored);
    }

    #[test]
    fn test_empty_form_ignores_everything() {
        let mut controller = StageController::new(0);
        assert_eq!(controller.submit(|_| ErrorMap::new()), Transition::Ignored);
        assert_eq!(controller.previous(), Transition::Ignored);
        assert_eq!(controller.jump_to(0), Transition::Ignored);
    }
}
