//! Form: binds one entity to the widgets it owns.
//!
//! A form owns every descendant whose nearest form ancestor it is. Binding
//! walks those widgets in tree order with one [`SelectedEntities`]
//! accumulator, so a lookup can use an entity resolved by an earlier one as
//! its context.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::debug;

use super::{apply_binding_result, field, grid, lookup, owning_form};
use crate::binding::{BindingContext, Expression, SelectedEntities};
use crate::model::{Entity, EntityId};
use crate::pattern::options::OptionReader;
use crate::pattern::{ComponentOption, ComponentPattern, OptionError, PatternKind};
use crate::state::content::value_as_id;
use crate::state::{Content, ContentState, StateError, StateMessage};
use crate::tree::PatternId;
use crate::view::{ViewDefinitionState, ViewError};

/// Message code attached when the requested entity does not exist.
pub const ENTITY_NOT_FOUND: &str = "core.message.entityNotFound";

/// Typed options of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormOptions {
    /// Header text derived from the bound entity.
    pub header: Option<Expression>,
}

impl FormOptions {
    pub fn parse(path: &str, options: &[ComponentOption]) -> Result<Self, OptionError> {
        let reader = OptionReader::new(path, "form");
        let mut parsed = Self::default();
        for option in options {
            match option.kind() {
                "expression" => parsed.header = Some(reader.expression(option)?),
                _ => return Err(reader.unknown(option)),
            }
        }
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Live state of a form: `{"entityId", "valid", "header"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub entity_id: Option<EntityId>,
    pub valid: bool,
    pub header: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            entity_id: None,
            valid: true,
            header: None,
        }
    }
}

impl ContentState for FormState {
    fn initialize_content(&mut self, content: &Content<'_>) -> Result<(), StateError> {
        if content.contains("entityId") {
            self.entity_id = content.id("entityId")?;
        }
        if let Some(valid) = content.bool("valid")? {
            self.valid = valid;
        }
        if content.contains("header") {
            self.header = content.string("header")?;
        }
        Ok(())
    }

    fn render_content(&self) -> Value {
        json!({
            "entityId": self.entity_id,
            "valid": self.valid,
            "header": self.header,
        })
    }

    fn field_value(&self) -> Option<Value> {
        Some(self.entity_id.map_or(Value::Null, Value::from))
    }

    fn set_field_value(&mut self, value: Option<&Value>) -> Result<bool, String> {
        self.entity_id = match value {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_as_id(value).ok_or_else(|| format!("not an id: {value}"))?),
        };
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub(crate) fn perform(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    pattern: &ComponentPattern,
    options: &FormOptions,
    event: &str,
) -> Result<bool, ViewError> {
    match event {
        "initialize" | "reset" => {
            let entity = fetch(state, id, pattern);
            bind(state, id, pattern, options, entity, &BTreeSet::new())?;
        }
        "refresh" => {
            let entity = fetch(state, id, pattern);
            let edited = edited_paths(state, id);
            bind(state, id, pattern, options, entity, &edited)?;
        }
        "clear" => {
            if let Some(form) = state.state_mut(id).and_then(|s| s.as_form_mut()) {
                form.entity_id = None;
            }
            bind(state, id, pattern, options, None, &BTreeSet::new())?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// The entity named by the form's `entityId`. A missing entity adds a
/// failure message and leaves the form in create mode.
fn fetch(state: &mut ViewDefinitionState<'_>, id: PatternId, pattern: &ComponentPattern) -> Option<Entity> {
    let entity_id = state.state(id)?.as_form()?.entity_id?;
    let entity = pattern.data_definition()?.get(entity_id);
    if entity.is_none() {
        debug!(component = pattern.path(), entity_id, "entity not found");
        let message = state.translate(ENTITY_NOT_FOUND);
        if let Some(form) = state.state_mut(id) {
            form.add_message(StateMessage::failure(message));
            if let Some(form) = form.as_form_mut() {
                form.entity_id = None;
            }
        }
    }
    entity
}

/// Widgets bound by the form `form`, in tree order.
pub(crate) fn owned_components(state: &ViewDefinitionState<'_>, form: PatternId) -> Vec<PatternId> {
    let tree = state.view().tree();
    tree.walk_depth_first(form)
        .into_iter()
        .skip(1)
        .filter(|&id| owning_form(tree, id) == Some(form))
        .collect()
}

/// Paths of the value widgets a refresh keeps client values for.
fn edited_paths(state: &ViewDefinitionState<'_>, form: PatternId) -> BTreeSet<String> {
    owned_components(state, form)
        .into_iter()
        .filter_map(|id| state.pattern(id))
        .filter(|p| matches!(p.kind(), PatternKind::Field(_) | PatternKind::Lookup(_)))
        .map(|p| p.path().to_owned())
        .collect()
}

/// Bind `entity` (or create mode, for `None`) to every owned widget.
pub(crate) fn bind(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    pattern: &ComponentPattern,
    options: &FormOptions,
    entity: Option<Entity>,
    paths_to_update: &BTreeSet<String>,
) -> Result<(), ViewError> {
    let view = state.view();
    let locale = state.locale().clone();
    let mut selected = SelectedEntities::new();
    if let Some(entity) = entity.as_ref().filter(|e| !e.is_new()) {
        selected.insert(pattern.path().to_owned(), entity.clone());
    }
    let mut valid = entity.as_ref().map_or(true, Entity::is_valid);
    // Relation grids sourced from this form read its entity id while binding.
    if let Some(form) = state.state_mut(id).and_then(|s| s.as_form_mut()) {
        form.entity_id = entity.as_ref().and_then(|e| e.id);
    }

    for child in owned_components(state, id) {
        let Some(child_pattern) = view.tree().get(child) else {
            continue;
        };
        let mut binding = BindingContext {
            entity: entity.as_ref(),
            selected_entities: &mut selected,
            paths_to_update,
            locale: &locale,
            translations: view.services().translations.as_ref(),
            config: view.config(),
        };
        match child_pattern.kind() {
            PatternKind::Field(field_options) => {
                let Some(current) = state.state(child).and_then(|s| s.as_field()).cloned() else {
                    continue;
                };
                let value = field::component_value(child_pattern, field_options, &current, &binding);
                valid &= !value.has_errors();
                let (data, errors, enabled) = value.into_parts();
                if let Some(component) = state.state_mut(child) {
                    if let Some(field) = component.as_field_mut() {
                        field.value = data.value;
                        field.required = data.required;
                    }
                    apply_binding_result(component, enabled, errors);
                }
            }
            PatternKind::Lookup(lookup_options) => {
                lookup::bind(state, child, child_pattern, lookup_options, &mut binding);
                valid &= !state.state(child).is_some_and(|s| s.has_errors());
            }
            PatternKind::Grid(grid_options) => {
                let relation = child_pattern.source().is_none()
                    && child_pattern
                        .resolution()
                        .and_then(|r| r.join_field())
                        .is_some();
                if relation {
                    if let Some(grid) = state.state_mut(child).and_then(|s| s.as_grid_mut()) {
                        grid.belongs_to_entity_id = entity.as_ref().and_then(|e| e.id);
                    }
                }
                grid::refresh(state, child, child_pattern, grid_options)?;
            }
            PatternKind::Form(_) | PatternKind::Window(_) | PatternKind::Ribbon(_) => {}
        }
    }

    let header = entity
        .as_ref()
        .filter(|e| !e.is_new())
        .zip(options.header.as_ref())
        .map(|(entity, expression)| expression.evaluate(entity));
    if let Some(component) = state.state_mut(id) {
        if let Some(form) = component.as_form_mut() {
            form.valid = valid;
            form.header = header;
        }
        component.request_render();
        component.request_update_state();
    }
    debug!(component = pattern.path(), valid, "form bound");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_expression() {
        let options =
            FormOptions::parse("form", &[ComponentOption::value("expression", "#number")]).unwrap();
        assert_eq!(options.header.unwrap().source(), "#number");
        assert!(FormOptions::parse("form", &[ComponentOption::value("header", "x")]).is_err());
    }

    #[test]
    fn content_round_trip() {
        let mut state = FormState::default();
        let payload = json!({"entityId": 12, "valid": false, "header": "P-12"});
        state
            .initialize_content(&Content::new("form", &payload).unwrap())
            .unwrap();
        assert_eq!(state.render_content(), payload);
    }

    #[test]
    fn string_entity_id() {
        let mut state = FormState::default();
        let payload = json!({"entityId": "12"});
        state
            .initialize_content(&Content::new("form", &payload).unwrap())
            .unwrap();
        assert_eq!(state.entity_id, Some(12));
        assert!(state.valid);
    }
}
