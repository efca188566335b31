use serde::{Deserialize, Serialize};
use tracing::debug;

/// An update to the cross-page state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SetContactInfo(serde_json::Value),
    SetQuoteForm(serde_json::Value),
}

/// State shared between the pages hosting a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub contact_info: Option<serde_json::Value>,
    pub quote_form: Option<serde_json::Value>,
}

/// Receives actions. Sessions dispatch their submission through this.
pub trait Dispatch {
    fn dispatch(&mut self, action: Action);
}

/// Applies an action to a state, producing the next state.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::SetContactInfo(payload) => next.contact_info = Some(payload),
        Action::SetQuoteForm(payload) => next.quote_form = Some(payload),
    }
    next
}

/// The default key/value store behind [`Dispatch`].
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    state: AppState,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The hosting shell only routes into the form once contact details exist.
    pub fn has_contact_info(&self) -> bool {
        self.state.contact_info.is_some()
    }
}

impl Dispatch for AppContext {
    fn dispatch(&mut self, action: Action) {
        debug!(?action, "dispatching action");
        self.state = reduce(&self.state, action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_wire_shape() {
        let action: Action = serde_json::from_value(json!({
            "type": "SET_CONTACT_INFO",
            "payload": {"email": "a@b.c"}
        }))
        .unwrap();
        assert_eq!(action, Action::SetContactInfo(json!({"email": "a@b.c"})));
        assert_eq!(
            serde_json::to_value(Action::SetQuoteForm(json!({}))).unwrap(),
            json!({"type": "SET_QUOTE_FORM", "payload": {}})
        );
    }

    #[test]
    fn test_dispatch_updates_state() {
        let mut context = AppContext::new();
        assert!(!context.has_contact_info());
        context.dispatch(Action::SetContactInfo(json!({"name": "Ada"})));
        assert!(context.has_contact_info());
        assert_eq!(context.state().quote_form, None);
    }
}
