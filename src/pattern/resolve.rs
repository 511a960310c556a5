//! Dependency resolution for one pattern.
//!
//! A pattern depends on its parent (for the data definition its `field` is
//! looked up in) and on its `source` component, if any. [`initialize`]
//! resolves one pattern when those dependencies are ready and reports
//! `false` otherwise; the view repeats passes until every pattern is
//! resolved or no pass makes progress.

use std::sync::Arc;

use tracing::trace;

use crate::model::{DataDefinition, DataModel, FieldDefinition};
use crate::tree::{PatternId, PatternTree};
use crate::view::ViewError;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A resolved `source` reference.
#[derive(Debug, Clone)]
pub struct SourceBinding {
    pub id: PatternId,
    /// Path of the source component.
    pub path: String,
    /// Field of the source's data definition, for `#{path}.field`.
    pub field: Option<String>,
    /// Data definition of the source component itself.
    pub data_definition: Option<Arc<dyn DataDefinition>>,
    pub field_definition: Option<FieldDefinition>,
}

/// Everything a pattern learned during initialization.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The data definition the component shows or edits.
    pub data_definition: Option<Arc<dyn DataDefinition>>,
    /// Metadata of the component's own `field`.
    pub field_definition: Option<FieldDefinition>,
    /// The data definition `field` was looked up in.
    pub field_scope: Option<Arc<dyn DataDefinition>>,
    pub source: Option<SourceBinding>,
}

impl Resolution {
    /// Join field restricting searches to the context entity.
    ///
    /// A has-many source field wins over a has-many own field.
    pub fn join_field(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|source| source.field_definition.as_ref())
            .and_then(|field| field.field_type.join_field())
            .or_else(|| {
                self.field_definition
                    .as_ref()
                    .and_then(|field| field.field_type.join_field())
            })
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// View-level inputs to resolution.
pub struct ResolveScope<'a> {
    pub plugin_identifier: &'a str,
    /// Data definition of the view, used by root patterns.
    pub data_definition: Option<&'a Arc<dyn DataDefinition>>,
    pub model: &'a dyn DataModel,
}

/// Split `#{window.form}.products` into `("window.form", Some("products"))`.
pub fn parse_source(reference: &str) -> Option<(&str, Option<&str>)> {
    let rest = reference.strip_prefix("#{")?;
    let (path, tail) = rest.split_once('}')?;
    if path.is_empty() {
        return None;
    }
    match tail {
        "" => Some((path, None)),
        _ => {
            let field = tail.strip_prefix('.')?;
            (!field.is_empty()).then_some((path, Some(field)))
        }
    }
}

/// Try to resolve the pattern `id`.
///
/// Returns `Ok(true)` once resolved (immediately, if it already was) and
/// `Ok(false)` while the parent or source is still unresolved. Unknown
/// references are errors.
pub fn initialize(
    tree: &mut PatternTree,
    id: PatternId,
    scope: &ResolveScope<'_>,
) -> Result<bool, ViewError> {
    let pattern = tree
        .get(id)
        .ok_or_else(|| ViewError::ComponentNotFound(format!("{id:?}")))?;
    if pattern.is_initialized() {
        return Ok(true);
    }
    let path = pattern.path().to_owned();

    let parent_definition = match pattern.parent() {
        Some(parent_id) => match tree.get(parent_id).and_then(|p| p.resolution()) {
            Some(parent) => parent.data_definition.clone(),
            None => {
                trace!(component = %path, "waiting for parent");
                return Ok(false);
            }
        },
        None => scope.data_definition.cloned(),
    };

    let mut resolution = Resolution::default();

    if let Some(reference) = pattern.source() {
        let invalid = || ViewError::InvalidSourceReference {
            component: path.clone(),
            reference: reference.to_owned(),
        };
        let (source_path, source_field) = parse_source(reference).ok_or_else(invalid)?;
        let source_id = tree.find(source_path).ok_or_else(invalid)?;
        let Some(source) = tree.get(source_id).and_then(|s| s.resolution()) else {
            trace!(component = %path, source = source_path, "waiting for source");
            return Ok(false);
        };
        let source_definition = source.data_definition.clone();

        let field_definition = match source_field {
            Some(field) => Some(lookup_field(&path, source_definition.as_ref(), field)?),
            None => None,
        };
        resolution.data_definition = match &field_definition {
            Some(field) => relation_target(&path, scope, source_definition.as_ref(), field)?,
            None => source_definition.clone(),
        };
        resolution.source = Some(SourceBinding {
            id: source_id,
            path: source_path.to_owned(),
            field: source_field.map(str::to_owned),
            data_definition: source_definition,
            field_definition,
        });
    }

    if let Some(field) = pattern.field_path() {
        let field_scope = match &resolution.source {
            Some(source) => resolution
                .data_definition
                .clone()
                .or_else(|| source.data_definition.clone()),
            None => parent_definition.clone(),
        };
        let field_definition = lookup_field(&path, field_scope.as_ref(), field)?;
        if let Some(target) = relation_target(&path, scope, field_scope.as_ref(), &field_definition)?
        {
            resolution.data_definition = Some(target);
        } else if resolution.data_definition.is_none() {
            resolution.data_definition = field_scope.clone();
        }
        resolution.field_definition = Some(field_definition);
        resolution.field_scope = field_scope;
    } else if resolution.source.is_none() {
        resolution.data_definition = parent_definition;
    }

    if let Some(model) = pattern.model() {
        let definition = scope
            .model
            .data_definition(scope.plugin_identifier, model)
            .ok_or_else(|| ViewError::UnknownModel {
                component: path.clone(),
                model: model.to_owned(),
            })?;
        resolution.data_definition = Some(definition);
    }

    if pattern.kind().requires_data_definition() && resolution.data_definition.is_none() {
        return Err(ViewError::MissingDataDefinition(path));
    }

    match tree.get_mut(id) {
        Some(pattern) => pattern.complete(resolution)?,
        None => return Err(ViewError::ComponentNotFound(path)),
    }
    trace!(component = %path, "resolved");
    Ok(true)
}

fn lookup_field(
    component: &str,
    definition: Option<&Arc<dyn DataDefinition>>,
    field: &str,
) -> Result<FieldDefinition, ViewError> {
    let definition =
        definition.ok_or_else(|| ViewError::MissingDataDefinition(component.to_owned()))?;
    definition
        .field(field)
        .cloned()
        .ok_or_else(|| ViewError::UnknownField {
            component: component.to_owned(),
            field: field.to_owned(),
        })
}

/// Data definition a relation field points at; `None` for scalar fields.
fn relation_target(
    component: &str,
    scope: &ResolveScope<'_>,
    owner: Option<&Arc<dyn DataDefinition>>,
    field: &FieldDefinition,
) -> Result<Option<Arc<dyn DataDefinition>>, ViewError> {
    let Some(entity) = field.field_type.related_entity() else {
        return Ok(None);
    };
    let plugin = owner.map_or(scope.plugin_identifier, |d| d.plugin_identifier());
    scope
        .model
        .data_definition(plugin, entity)
        .map(Some)
        .ok_or_else(|| ViewError::UnknownModel {
            component: component.to_owned(),
            model: entity.to_owned(),
        })
}
