//! Lookup: a field bound to a foreign entity.
//!
//! The selected entity is resolved either by id or by a unique business
//! code, optionally restricted to the entity selected by the lookup's source
//! component (the context). A code matching zero or several entities is a
//! validation error: the typed code is kept for redisplay and one message is
//! attached.

pub mod popup;

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::debug;

use super::{apply_binding_result, id_argument, owning_form};
use crate::binding::{BindingContext, Expression, SelectedEntities, ViewValue};
use crate::model::{DataDefinition, Entity, EntityId, Restriction, SearchCriteria};
use crate::pattern::options::OptionReader;
use crate::pattern::{ComponentOption, ComponentPattern, OptionError};
use crate::state::content::value_as_id;
use crate::state::{Content, ContentState, StateError};
use crate::tree::PatternId;
use crate::view::{ViewDefinitionState, ViewError};

/// Message code attached when a typed code does not match exactly one entity.
pub const CODE_NOT_FOUND: &str = "core.validate.field.error.lookupCodeNotFound";

/// Grid options a lookup forwards to its popup.
const FORWARDED_OPTIONS: &[&str] = &["column", "orderable", "searchable", "paginable", "fullScreen"];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Typed options of a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupOptions {
    /// Field holding the business code of the looked-up entity.
    pub field_code: String,
    /// Display expression; the code is shown when unset.
    pub expression: Option<Expression>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Raw grid options for the popup.
    pub grid_options: Vec<ComponentOption>,
}

impl LookupOptions {
    pub fn parse(path: &str, options: &[ComponentOption]) -> Result<Self, OptionError> {
        let reader = OptionReader::new(path, "lookup");
        let mut parsed = Self::default();
        let mut field_code = None;
        for option in options {
            match option.kind() {
                "fieldCode" => field_code = Some(reader.string(option)?),
                "expression" => parsed.expression = Some(reader.expression(option)?),
                "width" => parsed.width = Some(reader.u32(option)?),
                "height" => parsed.height = Some(reader.u32(option)?),
                kind if FORWARDED_OPTIONS.contains(&kind) => parsed.grid_options.push(option.clone()),
                _ => return Err(reader.unknown(option)),
            }
        }
        parsed.field_code = field_code.ok_or_else(|| OptionError::MissingAttribute {
            component: path.to_owned(),
            option: "fieldCode".into(),
            attribute: "value".into(),
        })?;
        Ok(parsed)
    }

    /// Display text of a resolved entity.
    pub fn display_value(&self, entity: &Entity) -> Option<String> {
        match &self.expression {
            Some(expression) => Some(expression.evaluate(entity)),
            None => entity.text(&self.field_code),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Selection carried by a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupData {
    pub selected_entity_id: Option<EntityId>,
    pub selected_entity_code: Option<String>,
    pub selected_entity_value: Option<String>,
    pub context_entity_id: Option<EntityId>,
}

impl LookupData {
    pub fn from_content(content: &Content<'_>) -> Result<Self, StateError> {
        Ok(Self {
            selected_entity_id: content.id("selectedEntityId")?,
            selected_entity_code: content.string("selectedEntityCode")?,
            selected_entity_value: content.string("selectedEntityValue")?,
            context_entity_id: content.id("contextEntityId")?,
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "selectedEntityId": self.selected_entity_id,
            "selectedEntityCode": self.selected_entity_code,
            "selectedEntityValue": self.selected_entity_value,
            "contextEntityId": self.context_entity_id,
        })
    }
}

/// Live state of a lookup: `{"value": {...}, "required": bool}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupState {
    pub data: LookupData,
    pub required: bool,
}

impl ContentState for LookupState {
    fn initialize_content(&mut self, content: &Content<'_>) -> Result<(), StateError> {
        content.required("value")?;
        self.data = match content.object("value")? {
            Some(value) => LookupData::from_content(&value)?,
            None => LookupData::default(),
        };
        if let Some(required) = content.bool("required")? {
            self.required = required;
        }
        Ok(())
    }

    fn render_content(&self) -> Value {
        json!({
            "value": self.data.to_json(),
            "required": self.required,
        })
    }

    fn field_value(&self) -> Option<Value> {
        Some(self.data.selected_entity_id.map_or(Value::Null, Value::from))
    }

    fn set_field_value(&mut self, value: Option<&Value>) -> Result<bool, String> {
        let id = match value {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_as_id(value).ok_or_else(|| format!("not an id: {value}"))?),
        };
        self.data = LookupData {
            selected_entity_id: id,
            context_entity_id: self.data.context_entity_id,
            ..LookupData::default()
        };
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Derived display value of a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupValue {
    pub data: LookupData,
    pub required: bool,
}

/// Derive a lookup's selection for the current binding pass.
///
/// Unless the client edited it, a lookup inside a form shows the entity its
/// field references. Otherwise the client's id wins over its code. A
/// resolved entity is recorded in the pass's selected entities.
pub fn component_value(
    pattern: &ComponentPattern,
    options: &LookupOptions,
    current: &LookupState,
    binding: &mut BindingContext<'_>,
) -> ViewValue<LookupValue> {
    let path = pattern.path();
    let field = pattern.field_definition();
    let source = pattern.resolution().and_then(|r| r.source.as_ref());
    let context_entity_id = match source {
        Some(source) => binding
            .selected_entities
            .get(&source.path)
            .and_then(|entity| entity.id),
        None => current.data.context_entity_id,
    };

    let mut value = ViewValue::new(LookupValue {
        data: LookupData {
            context_entity_id,
            ..LookupData::default()
        },
        required: binding.is_required(field),
    });
    value.set_enabled(!binding.is_read_only(field));

    let definition = pattern.data_definition();
    // A lookup scoped by a source relation resolves nothing until the source
    // has a selected entity.
    let has_context = source.map_or(true, |s| s.field.is_none()) || context_entity_id.is_some();
    let mut code_not_found = false;
    let selected = if !binding.paths_to_update.contains(path) && binding.entity.is_some() {
        binding
            .entity
            .zip(pattern.field_path())
            .and_then(|(entity, field)| entity.belongs_to(field))
            .map(|related| {
                related
                    .id
                    .zip(definition)
                    .and_then(|(id, definition)| definition.get(id))
                    .unwrap_or_else(|| related.clone())
            })
    } else if let Some(definition) = definition.filter(|_| has_context) {
        let code = current
            .data
            .selected_entity_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());
        match (current.data.selected_entity_id, code) {
            (Some(id), _) => definition.get(id),
            (None, Some(code)) => {
                let join_field = pattern.resolution().and_then(|r| r.join_field());
                match find_by_code(definition.as_ref(), options, code, join_field, context_entity_id, binding) {
                    Some(entity) => Some(entity),
                    None => {
                        value.value_mut().data.selected_entity_code = Some(code.to_owned());
                        value.add_error_message(binding.translate(CODE_NOT_FOUND));
                        code_not_found = true;
                        None
                    }
                }
            }
            (None, None) => None,
        }
    } else {
        None
    };

    if let Some(entity) = selected {
        let data = &mut value.value_mut().data;
        data.selected_entity_id = entity.id;
        data.selected_entity_code = entity.text(&options.field_code);
        data.selected_entity_value = options.display_value(&entity);
        binding.selected_entities.insert(path.to_owned(), entity);
    }
    if !code_not_found {
        if let Some(error) = validation_error(pattern, binding) {
            value.add_error_message(error);
        }
    }
    value
}

/// The single entity whose code matches, restricted to the context entity.
fn find_by_code(
    definition: &dyn DataDefinition,
    options: &LookupOptions,
    code: &str,
    join_field: Option<&str>,
    context_entity_id: Option<EntityId>,
    binding: &BindingContext<'_>,
) -> Option<Entity> {
    let restriction = if binding.config.lookup_prefix_search {
        Restriction::like(&options.field_code, format!("{code}*"))
    } else {
        Restriction::eq(&options.field_code, code)
    };
    let mut criteria = SearchCriteria::new().restricted_with(restriction);
    if let Some((join_field, context)) = join_field.zip(context_entity_id) {
        criteria = criteria.restricted_with(Restriction::belongs_to(join_field, context));
    }

    let result = definition.find(&criteria);
    if result.total_number_of_entities == 1 {
        result.entities.into_iter().next()
    } else {
        debug!(
            code,
            matches = result.total_number_of_entities,
            "lookup code does not match exactly one entity"
        );
        None
    }
}

/// First validation error reported for the lookup's fields: the source
/// field on the context entity, the source field on the bound entity, then
/// the own field on the bound entity. Reported whether or not anything is
/// selected, so an empty required lookup shows its error.
fn validation_error(pattern: &ComponentPattern, binding: &BindingContext<'_>) -> Option<String> {
    let source = pattern.resolution().and_then(|r| r.source.as_ref());
    let source_field = source.and_then(|source| source.field.as_deref());
    let on_context = source.zip(source_field).and_then(|(source, field)| {
        binding.field_error(binding.selected_entities.get(&source.path), field)
    });
    on_context
        .or_else(|| source_field.and_then(|field| binding.field_error(binding.entity, field)))
        .or_else(|| {
            pattern
                .field_path()
                .and_then(|field| binding.field_error(binding.entity, field))
        })
}

/// Store a derived value in the lookup's state.
fn apply(state: &mut ViewDefinitionState<'_>, id: PatternId, value: ViewValue<LookupValue>) {
    let Some(component) = state.state_mut(id) else {
        return;
    };
    let (value, errors, enabled) = value.into_parts();
    if let Some(lookup) = component.as_lookup_mut() {
        let changed = lookup.data.selected_entity_id != value.data.selected_entity_id;
        lookup.data = value.data;
        lookup.required = value.required;
        if changed {
            component.request_update_state();
        }
    }
    apply_binding_result(component, enabled, errors);
}

pub(crate) fn bind(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    pattern: &ComponentPattern,
    options: &LookupOptions,
    binding: &mut BindingContext<'_>,
) {
    let Some(current) = state.state(id).and_then(|s| s.as_lookup()).cloned() else {
        return;
    };
    let value = component_value(pattern, options, &current, binding);
    apply(state, id, value);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub(crate) fn perform(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    pattern: &ComponentPattern,
    options: &LookupOptions,
    event: &str,
    args: &[String],
) -> Result<bool, ViewError> {
    match event {
        "initialize" => {
            // Lookups inside a form are bound by the form.
            if owning_form(state.view().tree(), id).is_none() {
                resolve_standalone(state, id, pattern, options);
            }
        }
        "select" => {
            let selected = id_argument(pattern, event, args)?;
            if let Some(lookup) = state.state_mut(id).and_then(|s| s.as_lookup_mut()) {
                lookup.data.selected_entity_id = selected;
                lookup.data.selected_entity_code = None;
            }
            resolve_standalone(state, id, pattern, options);
        }
        "clear" => {
            if let Some(component) = state.state_mut(id) {
                if let Some(lookup) = component.as_lookup_mut() {
                    lookup.data = LookupData {
                        context_entity_id: lookup.data.context_entity_id,
                        ..LookupData::default()
                    };
                }
                component.request_render();
                component.request_update_state();
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Resolve the client's id or code outside a form binding pass. The
/// source component's selected entity provides the context.
fn resolve_standalone(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    pattern: &ComponentPattern,
    options: &LookupOptions,
) {
    let view = state.view();
    let locale = state.locale().clone();
    let mut selected = SelectedEntities::new();
    if let Some(source) = pattern.resolution().and_then(|r| r.source.as_ref()) {
        if let Some(entity) = state.selected_entity(source.id) {
            selected.insert(source.path.clone(), entity);
        }
    }
    let paths = BTreeSet::from([pattern.path().to_owned()]);
    let mut binding = BindingContext {
        entity: None,
        selected_entities: &mut selected,
        paths_to_update: &paths,
        locale: &locale,
        translations: view.services().translations.as_ref(),
        config: view.config(),
    };
    bind(state, id, pattern, options, &mut binding);
}
