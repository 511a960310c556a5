//! Component states: the per-request, mutable side of a component.
//!
//! A [`ComponentState`] is created fresh by its pattern for every request.
//! Client snapshots are applied through [`ComponentState::initialize`],
//! event handlers and hooks mutate it, and [`ComponentState::render`]
//! produces its part of the response. Two independent dirty flags control
//! rendering: `render_requested` decides whether `content` is sent at all,
//! `update_state_requested` tells the client that dependent components must
//! recompute.

pub mod content;
pub mod message;

use serde_json::{json, Map, Value};

pub use content::{Content, StateError};
pub use message::{MessageType, StateMessage};

use crate::components::field::FieldState;
use crate::components::form::FormState;
use crate::components::grid::GridState;
use crate::components::lookup::LookupState;
use crate::components::ribbon::RibbonState;
use crate::components::window::WindowState;

// ---------------------------------------------------------------------------
// ContentState
// ---------------------------------------------------------------------------

/// Content encode/decode contract shared by every widget state.
///
/// For well-formed input, `render_content` reproduces every key
/// `initialize_content` accepted.
pub trait ContentState {
    /// Apply a client content payload.
    fn initialize_content(&mut self, content: &Content<'_>) -> Result<(), StateError>;

    /// Current content payload.
    fn render_content(&self) -> Value;

    /// The widget's primary value, if it has one.
    fn field_value(&self) -> Option<Value> {
        None
    }

    /// Replace the primary value. Returns `false` if the widget has none.
    fn set_field_value(&mut self, _value: Option<&Value>) -> Result<bool, String> {
        Ok(false)
    }
}

// ---------------------------------------------------------------------------
// StateKind
// ---------------------------------------------------------------------------

/// Widget-specific state, one variant per pattern kind.
#[derive(Debug, Clone, PartialEq)]
pub enum StateKind {
    Field(FieldState),
    Lookup(LookupState),
    Grid(GridState),
    Form(FormState),
    Window(WindowState),
    Ribbon(RibbonState),
}

impl StateKind {
    fn as_content(&self) -> &dyn ContentState {
        match self {
            Self::Field(state) => state,
            Self::Lookup(state) => state,
            Self::Grid(state) => state,
            Self::Form(state) => state,
            Self::Window(state) => state,
            Self::Ribbon(state) => state,
        }
    }

    fn as_content_mut(&mut self) -> &mut dyn ContentState {
        match self {
            Self::Field(state) => state,
            Self::Lookup(state) => state,
            Self::Grid(state) => state,
            Self::Form(state) => state,
            Self::Window(state) => state,
            Self::Ribbon(state) => state,
        }
    }
}

// ---------------------------------------------------------------------------
// ComponentState
// ---------------------------------------------------------------------------

/// Live state of one component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentState {
    path: String,
    enabled: bool,
    visible: bool,
    messages: Vec<StateMessage>,
    render_requested: bool,
    update_state_requested: bool,
    kind: StateKind,
}

impl ComponentState {
    /// A new state. New states are dirty so the first render sends content.
    pub fn new(path: impl Into<String>, kind: StateKind) -> Self {
        Self {
            path: path.into(),
            enabled: true,
            visible: true,
            messages: Vec::new(),
            render_requested: true,
            update_state_requested: false,
            kind,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut StateKind {
        &mut self.kind
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// Apply one component snapshot: `{"content"?, "enabled"?, "visible"?}`.
    ///
    /// Either the whole snapshot applies or the state is left untouched.
    /// Applying a snapshot clears the render flag: the client already shows
    /// this content.
    pub fn initialize(&mut self, snapshot: &Value) -> Result<(), StateError> {
        let snapshot = Content::new(&self.path, snapshot)?;
        let enabled = snapshot.bool("enabled")?;
        let visible = snapshot.bool("visible")?;
        let mut kind = self.kind.clone();
        if let Some(content) = snapshot.object("content")? {
            kind.as_content_mut().initialize_content(&content)?;
        } else if snapshot.contains("content") {
            return Err(snapshot.malformed("`content` is null"));
        }

        self.kind = kind;
        if let Some(enabled) = enabled {
            self.enabled = enabled;
        }
        if let Some(visible) = visible {
            self.visible = visible;
        }
        self.render_requested = false;
        Ok(())
    }

    /// Apply a content payload directly.
    pub fn initialize_content(&mut self, content: &Value) -> Result<(), StateError> {
        let content = Content::new(&self.path, content)?;
        let mut kind = self.kind.clone();
        kind.as_content_mut().initialize_content(&content)?;
        self.kind = kind;
        Ok(())
    }

    pub fn render_content(&self) -> Value {
        self.kind.as_content().render_content()
    }

    /// Render this state and clear both dirty flags and pending messages.
    ///
    /// `content` and `updateState` are present only when a render was
    /// requested; `enabled`, `visible` and `messages` always are.
    pub fn render(&mut self) -> Map<String, Value> {
        let mut rendered = Map::new();
        if self.render_requested {
            rendered.insert("content".into(), self.render_content());
            rendered.insert("updateState".into(), json!(self.update_state_requested));
        }
        rendered.insert("enabled".into(), json!(self.enabled));
        rendered.insert("visible".into(), json!(self.visible));
        rendered.insert(
            "messages".into(),
            serde_json::to_value(&self.messages).unwrap_or(Value::Array(Vec::new())),
        );
        self.messages.clear();
        self.render_requested = false;
        self.update_state_requested = false;
        rendered
    }

    // ── Value ────────────────────────────────────────────────────────

    pub fn field_value(&self) -> Option<Value> {
        self.kind.as_content().field_value()
    }

    /// Replace the primary value and mark the state for render and state
    /// update.
    pub fn set_field_value(&mut self, value: Option<&Value>) -> Result<(), StateError> {
        match self.kind.as_content_mut().set_field_value(value) {
            Ok(true) => {
                self.request_render();
                self.request_update_state();
                Ok(())
            }
            Ok(false) => Err(StateError::ValueNotSupported {
                path: self.path.clone(),
            }),
            Err(reason) => Err(StateError::Malformed {
                path: self.path.clone(),
                reason,
            }),
        }
    }

    // ── Flags ────────────────────────────────────────────────────────

    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    pub fn request_update_state(&mut self) {
        self.update_state_requested = true;
    }

    pub fn needs_render(&self) -> bool {
        self.render_requested
    }

    pub fn needs_update_state(&self) -> bool {
        self.update_state_requested
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.request_render();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.request_render();
        }
    }

    // ── Messages ─────────────────────────────────────────────────────

    pub fn add_message(&mut self, message: StateMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[StateMessage] {
        &self.messages
    }

    /// Whether a failure message is pending.
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(StateMessage::is_failure)
    }

    // ── Typed access ─────────────────────────────────────────────────

    pub fn as_field(&self) -> Option<&FieldState> {
        match &self.kind {
            StateKind::Field(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_field_mut(&mut self) -> Option<&mut FieldState> {
        match &mut self.kind {
            StateKind::Field(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_lookup(&self) -> Option<&LookupState> {
        match &self.kind {
            StateKind::Lookup(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_lookup_mut(&mut self) -> Option<&mut LookupState> {
        match &mut self.kind {
            StateKind::Lookup(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_grid(&self) -> Option<&GridState> {
        match &self.kind {
            StateKind::Grid(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_grid_mut(&mut self) -> Option<&mut GridState> {
        match &mut self.kind {
            StateKind::Grid(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&FormState> {
        match &self.kind {
            StateKind::Form(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_form_mut(&mut self) -> Option<&mut FormState> {
        match &mut self.kind {
            StateKind::Form(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_window_mut(&mut self) -> Option<&mut WindowState> {
        match &mut self.kind {
            StateKind::Window(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_ribbon(&self) -> Option<&RibbonState> {
        match &self.kind {
            StateKind::Ribbon(state) => Some(state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(path: &str) -> ComponentState {
        ComponentState::new(path, StateKind::Field(FieldState::default()))
    }

    #[test]
    fn new_state_renders_content() {
        let mut state = field("window.name");
        assert!(state.needs_render());
        let rendered = state.render();
        assert_eq!(
            Value::Object(rendered),
            json!({
                "content": {"value": null, "required": false, "valid": false},
                "updateState": false,
                "enabled": true,
                "visible": true,
                "messages": []
            })
        );
        assert!(!state.needs_render());
    }

    #[test]
    fn clean_state_omits_content() {
        let mut state = field("name");
        state.render();
        let rendered = state.render();
        assert!(!rendered.contains_key("content"));
        assert!(!rendered.contains_key("updateState"));
        assert_eq!(rendered["enabled"], json!(true));
    }

    #[test]
    fn set_field_value_marks_both_flags() {
        let mut state = field("name");
        state.render();
        state.set_field_value(Some(&json!("abc"))).unwrap();
        assert!(state.needs_render());
        assert!(state.needs_update_state());
        assert_eq!(state.field_value(), Some(json!("abc")));

        let rendered = state.render();
        assert_eq!(rendered["updateState"], json!(true));
        assert!(!state.needs_update_state());
    }

    #[test]
    fn window_has_no_field_value() {
        let mut state = ComponentState::new("window", StateKind::Window(WindowState::default()));
        assert_eq!(state.field_value(), None);
        assert_eq!(
            state.set_field_value(Some(&json!("x"))),
            Err(StateError::ValueNotSupported {
                path: "window".into()
            })
        );
    }

    #[test]
    fn snapshot_applies_flags_and_clears_render() {
        let mut state = field("name");
        state
            .initialize(&json!({
                "content": {"value": "abc", "required": true},
                "enabled": false
            }))
            .unwrap();
        assert!(!state.needs_render());
        assert!(!state.is_enabled());
        assert!(state.is_visible());
        assert_eq!(state.field_value(), Some(json!("abc")));
    }

    #[test]
    fn malformed_snapshot_leaves_state_untouched() {
        let mut state = field("name");
        let before = state.clone();
        let err = state
            .initialize(&json!({"content": {"required": true}, "enabled": false}))
            .unwrap_err();
        assert!(matches!(err, StateError::Malformed { .. }));
        assert_eq!(state, before);

        assert!(state.initialize(&json!({"content": null})).is_err());
        assert!(state.initialize(&json!("content")).is_err());
    }

    #[test]
    fn messages_are_rendered_once() {
        let mut state = field("name");
        state.add_message(StateMessage::failure("Required"));
        assert!(state.has_errors());
        let rendered = state.render();
        assert_eq!(
            rendered["messages"],
            json!([{"title": null, "content": "Required", "type": "failure"}])
        );
        assert!(!state.has_errors());
        assert_eq!(state.render()["messages"], json!([]));
    }

    #[test]
    fn toggling_visibility_requests_render() {
        let mut state = field("name");
        state.render();
        state.set_visible(true);
        assert!(!state.needs_render());
        state.set_visible(false);
        assert!(state.needs_render());
    }
}
