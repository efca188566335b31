//! Tests for a form session: edits, stage navigation, visible errors and
//! the resolved view.
mod common;
use common::*;
use youshiki::prelude::*;
use youshiki::view::{BlockView, FieldView, StepState};

fn field_view<'a>(view: &'a FormView, path: &str) -> &'a FieldView {
    fn find<'a>(blocks: &'a [BlockView], path: &str) -> Option<&'a FieldView> {
        blocks.iter().find_map(|block| match block {
            BlockView::Field(field) if field.path.to_string() == path => Some(field),
            BlockView::Field(_) => None,
            BlockView::Group(group) => group.fields.iter().find(|f| f.path.to_string() == path),
            BlockView::Section(section) => find(&section.blocks, path),
        })
    }
    let stage = view.stage.as_ref().expect("view should have a current stage");
    find(&stage.blocks, path).unwrap_or_else(|| panic!("no field '{}' in view", path))
}

fn advance_to_destination(session: &mut FormSession) {
    fill_shipment(session);
    assert_eq!(session.next(), Transition::Advanced { from: 0, to: 1 });
}

#[test]
fn test_new_session_starts_untouched() {
    let session = freight_session();
    assert_eq!(session.current_stage(), 0);
    assert_eq!(session.status(0), Some(StageStatus::Untouched));
    assert_eq!(session.value(&FieldPath::root("volume")), Some(&Value::Number(0.0)));
}

#[test]
fn test_errors_are_hidden_until_the_stage_is_attempted() {
    let mut session = freight_session();
    session.change("cargoType", "General").unwrap();

    // Errors are computed on every edit but not shown yet.
    assert!(!session.errors().is_empty());
    assert!(session.visible_errors().is_empty());
    assert_eq!(field_view(&session.view(), "dimensions.length").error, None);

    assert!(matches!(session.next(), Transition::Blocked(_)));
    assert_eq!(session.status(0), Some(StageStatus::Incomplete));
    assert_eq!(session.visible_errors().len(), 3);
    assert_eq!(
        field_view(&session.view(), "dimensions.length").error.as_deref(),
        Some("Length is required.")
    );
}

#[test]
fn test_errors_clear_as_fields_are_fixed() {
    let mut session = freight_session();
    assert!(matches!(session.next(), Transition::Blocked(errors) if errors.len() == 4));

    fill_shipment(&mut session);
    assert!(session.visible_errors().is_empty());
}

#[test]
fn test_blocked_stage_keeps_its_index() {
    let mut session = freight_session();
    session.change("cargoType", "General").unwrap();
    let transition = session.next();

    match transition {
        Transition::Blocked(errors) => {
            assert!(errors.contains_key(&FieldPath::grouped("dimensions", "width")));
        }
        other => panic!("expected the stage to be blocked, got {:?}", other),
    }
    assert_eq!(session.current_stage(), 0);
}

#[test]
fn test_volume_follows_dimension_edits() {
    let mut session = freight_session();
    fill_shipment(&mut session);
    assert_eq!(session.value(&FieldPath::root("volume")), Some(&Value::Number(24.0)));

    session.change("dimensions.width", "10").unwrap();
    assert_eq!(session.value(&FieldPath::root("volume")), Some(&Value::Number(80.0)));
}

#[test]
fn test_computed_and_unknown_fields_refuse_edits() {
    let mut session = freight_session();
    fill_shipment(&mut session);

    assert_eq!(session.change("volume", "1"), Ok(false));
    assert_eq!(session.value(&FieldPath::root("volume")), Some(&Value::Number(24.0)));
    assert_eq!(session.change("nonexistent", "1"), Ok(false));
    assert_eq!(session.change("dimensions.depth", "1"), Ok(false));
    assert_eq!(session.change("a.b.c", "1"), Err(PathError::TooDeep("a.b.c".to_string())));
}

#[test]
fn test_edits_on_other_stages_are_accepted() {
    let mut session = freight_session();
    assert_eq!(session.change("email", "ada@example.com"), Ok(true));
    assert_eq!(
        session.value(&FieldPath::root("email")),
        Some(&Value::from("ada@example.com"))
    );
}

#[test]
fn test_previous_never_validates() {
    let mut session = freight_session();
    advance_to_destination(&mut session);
    session.change("cargoType", "").unwrap();

    assert_eq!(session.previous(), Transition::Moved { from: 1, to: 0 });
    assert_eq!(session.current_stage(), 0);
    assert_eq!(session.previous(), Transition::Ignored);
    // The stage was completed before, so its new error is visible.
    assert_eq!(session.visible_errors().len(), 1);
}

#[test]
fn test_jump_only_to_attempted_stages() {
    let mut session = freight_session();
    assert_eq!(session.jump_to(2), Transition::Ignored);

    advance_to_destination(&mut session);
    assert_eq!(session.jump_to(2), Transition::Ignored);
    assert_eq!(session.jump_to(1), Transition::Ignored);
    assert_eq!(session.jump_to(0), Transition::Moved { from: 1, to: 0 });

    let progress = session.view().progress;
    assert_eq!(progress[0].state, StepState::Current);
    assert!(!progress[0].clickable);
    // Stage 1 was reached but never attempted.
    assert_eq!(progress[1].state, StepState::Untouched);
    assert!(!progress[1].clickable);
}

#[test]
fn test_dependent_options_follow_country() {
    let mut session = freight_session();
    advance_to_destination(&mut session);

    let state = field_view(&session.view(), "state").clone();
    assert!(state.options.is_empty());
    assert!(state.disabled);
    assert_eq!(state.placeholder.as_deref(), Some("Select state..."));

    session.change("country", "CA").unwrap();
    let state = field_view(&session.view(), "state").clone();
    assert_eq!(state.options, vec!["ON", "QC"]);
    assert!(!state.disabled);

    session.change("country", "US").unwrap();
    assert_eq!(field_view(&session.view(), "state").options, vec!["CA", "NY", "TX"]);
}

#[test]
fn test_computed_fields_render_disabled() {
    let session = freight_session();
    let volume = field_view(&session.view(), "volume").clone();
    assert!(volume.disabled);
    assert!(volume.read_only);
    assert_eq!(volume.input_type, youshiki::schema::InputType::Number);
}

#[test]
fn test_submission_dispatches_the_value_tree() {
    let mut session = freight_session();
    let mut context = AppContext::new();
    advance_to_destination(&mut session);
    session.change("country", "US").unwrap();
    assert_eq!(session.submit_into(&mut context), Transition::Advanced { from: 1, to: 2 });
    assert_eq!(context.state().quote_form, None);

    // Blocked: the email is still empty.
    assert!(matches!(session.submit_into(&mut context), Transition::Blocked(_)));
    assert_eq!(context.state().quote_form, None);

    session.change("email", "ada@example.com").unwrap();
    assert!(session.controller().is_last_stage());
    assert_eq!(session.submit_into(&mut context), Transition::Submitted);
    assert!(session.errors().is_empty());

    let payload = context.state().quote_form.clone().expect("form should be submitted");
    assert_eq!(payload["email"], "ada@example.com");
    assert_eq!(payload["volume"], 24.0);
    assert_eq!(session.status(2), Some(StageStatus::Complete));

    // Resubmission is allowed.
    assert_eq!(session.submit_into(&mut context), Transition::Submitted);
}

#[test]
fn test_dispatch_into_custom_state() {
    struct Recorder(Vec<Action>);

    impl Dispatch for Recorder {
        fn dispatch(&mut self, action: Action) {
            self.0.push(action);
        }
    }

    let mut session = FormSession::new(std::sync::Arc::new(FormEngine::new(greeting_form())));
    let mut recorder = Recorder(Vec::new());
    session.change("name", "Ada").unwrap();
    assert_eq!(
        session.value(&FieldPath::root("greeting")),
        Some(&Value::from("Hello, Ada from Utrecht"))
    );

    assert_eq!(session.submit_into(&mut recorder), Transition::Submitted);
    match recorder.0.as_slice() {
        [Action::SetQuoteForm(payload)] => {
            assert_eq!(payload["greeting"], "Hello, Ada from Utrecht");
            assert_eq!(payload["address"]["city"], "Utrecht");
        }
        other => panic!("expected one submission, got {:?}", other),
    }
}

#[test]
fn test_plain_text_rendering() {
    let mut session = freight_session();
    session.next();
    let text = PlainTextRenderer.render(&session.view());

    assert!(text.starts_with("== Freight Quote ==\n"));
    assert!(text.contains("[>] 1. Shipment"));
    assert!(text.contains("# Weight"));
    assert!(text.contains("Length* = \"\"  <- Length is required."));
    assert!(text.contains("Volume = \"0\" (disabled)"));
}
