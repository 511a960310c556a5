//! Per-request state of a whole view.

use serde_json::{Map, Value};
use slotmap::SecondaryMap;
use tracing::warn;

use super::error::ViewError;
use super::request::{ResponseError, ViewResponse, COMPONENTS_KEY};
use super::ViewDefinition;
use crate::components::window;
use crate::model::{Entity, Locale};
use crate::pattern::{ComponentPattern, PatternKind};
use crate::state::content::value_as_id;
use crate::state::{ComponentState, StateError};
use crate::tree::node::child_path;
use crate::tree::PatternId;

/// Live states of every component of a view, for one request.
///
/// Borrows the view definition for the duration of the request; states are
/// addressed by the pattern ids of that definition.
pub struct ViewDefinitionState<'v> {
    view: &'v ViewDefinition,
    states: SecondaryMap<PatternId, ComponentState>,
    locale: Locale,
    errors: Vec<ResponseError>,
}

impl<'v> ViewDefinitionState<'v> {
    /// Instantiate a fresh state for every pattern.
    pub(crate) fn new(view: &'v ViewDefinition, locale: Locale) -> Self {
        let mut states = SecondaryMap::new();
        for id in view.tree().depth_first() {
            if let Some(pattern) = view.tree().get(id) {
                let mut state = pattern.instantiate_state();
                if let (PatternKind::Window(options), Some(window)) =
                    (pattern.kind(), state.as_window_mut())
                {
                    window.header = window::initial_header(view, pattern, options, &locale);
                }
                states.insert(id, state);
            }
        }
        Self {
            view,
            states,
            locale,
            errors: Vec::new(),
        }
    }

    pub fn view(&self) -> &'v ViewDefinition {
        self.view
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn pattern(&self, id: PatternId) -> Option<&'v ComponentPattern> {
        self.view.tree().get(id)
    }

    pub fn state(&self, id: PatternId) -> Option<&ComponentState> {
        self.states.get(id)
    }

    pub fn state_mut(&mut self, id: PatternId) -> Option<&mut ComponentState> {
        self.states.get_mut(id)
    }

    /// State of the component at a dotted path.
    pub fn component(&self, path: &str) -> Option<&ComponentState> {
        self.states.get(self.view.tree().find(path)?)
    }

    pub fn component_mut(&mut self, path: &str) -> Option<&mut ComponentState> {
        let id = self.view.tree().find(path)?;
        self.states.get_mut(id)
    }

    /// Entity currently selected by component `id`: the form's entity, the
    /// grid's or lookup's selection, fetched from its data definition.
    pub fn selected_entity(&self, id: PatternId) -> Option<Entity> {
        let entity_id = value_as_id(&self.state(id)?.field_value()?)?;
        self.pattern(id)?.data_definition()?.get(entity_id)
    }

    /// Translate a message code in the request locale.
    pub fn translate(&self, code: &str) -> String {
        self.view
            .services()
            .translations
            .translate_code(code, &self.locale)
    }

    /// Record a non-fatal error; the response will report failure.
    pub fn add_error(&mut self, err: &ViewError) {
        self.errors.push(err.into());
    }

    pub fn errors(&self) -> &[ResponseError] {
        &self.errors
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Apply client snapshots. Malformed snapshots are recorded and skipped;
    /// the other components still apply.
    pub(crate) fn apply_snapshots(&mut self, components: &Map<String, Value>) {
        for (path, snapshot) in components {
            self.apply_snapshot(path, snapshot);
        }
    }

    fn apply_snapshot(&mut self, path: &str, snapshot: &Value) {
        let result = match self.component_mut(path) {
            Some(state) => state.initialize(snapshot),
            None => Err(StateError::Malformed {
                path: path.to_owned(),
                reason: "no such component".into(),
            }),
        };
        if let Err(err) = result {
            warn!(component = path, error = %err, "skipping component snapshot");
            self.add_error(&err.into());
            return;
        }

        if let Some(Value::Object(children)) = snapshot.get(COMPONENTS_KEY) {
            for (name, child) in children {
                self.apply_snapshot(&child_path(path, name), child);
            }
        }
    }

    // ── Render ───────────────────────────────────────────────────────

    /// Render the whole tree, nested by container.
    pub fn render(&mut self) -> Map<String, Value> {
        let view = self.view;
        let mut rendered = Map::new();
        for &root in view.tree().roots() {
            if let Some(pattern) = view.tree().get(root) {
                rendered.insert(pattern.name().to_owned(), self.render_node(root));
            }
        }
        rendered
    }

    fn render_node(&mut self, id: PatternId) -> Value {
        let mut node = self
            .states
            .get_mut(id)
            .map(ComponentState::render)
            .unwrap_or_default();

        let view = self.view;
        let children = view.tree().children(id);
        if !children.is_empty() {
            let mut rendered = Map::new();
            for &child in children {
                if let Some(pattern) = view.tree().get(child) {
                    rendered.insert(pattern.name().to_owned(), self.render_node(child));
                }
            }
            node.insert(COMPONENTS_KEY.into(), Value::Object(rendered));
        }
        Value::Object(node)
    }

    /// Whether any recorded error or pending failure message exists.
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty() || self.states.values().any(ComponentState::has_errors)
    }

    /// Render and wrap into a response.
    pub(crate) fn into_response(mut self) -> ViewResponse {
        let success = !self.has_failures();
        let components = self.render();
        ViewResponse {
            components,
            success,
            errors: self.errors,
        }
    }
}
