//! Entities: persisted records handed to the view by the data layer.

use std::collections::BTreeMap;

use serde_json::Value;

use super::translation::ErrorMessage;

/// Numeric identifier of a persisted entity.
pub type EntityId = u64;

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// The value stored in one entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A scalar (text, number, boolean, date string or null).
    Value(Value),
    /// A belongs-to relation holding the referenced entity.
    BelongsTo(Box<Entity>),
}

impl FieldValue {
    /// Text form used for display and code comparison.
    ///
    /// Null scalars have no text; relations render their id.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Value(Value::Null) => None,
            Self::Value(Value::String(text)) => Some(text.clone()),
            Self::Value(other) => Some(other.to_string()),
            Self::BelongsTo(entity) => entity.id.map(|id| id.to_string()),
        }
    }

    /// The referenced entity, if this is a relation.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::BelongsTo(entity) => Some(entity),
            Self::Value(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A record of one data definition.
///
/// An entity without an id has not been persisted yet (create mode).
/// Validation errors reported by the data layer are kept per field.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Persisted id, `None` for a new entity.
    pub id: Option<EntityId>,
    /// Name of the data definition this entity belongs to.
    pub name: String,
    fields: BTreeMap<String, FieldValue>,
    errors: BTreeMap<String, ErrorMessage>,
}

impl Entity {
    /// Create a new, unsaved entity of the given data definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            fields: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Set the persisted id (builder).
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set a scalar field (builder).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(name.into(), FieldValue::Value(value.into()));
        self
    }

    /// Set a belongs-to field (builder).
    pub fn with_belongs_to(mut self, name: impl Into<String>, entity: Entity) -> Self {
        self.fields
            .insert(name.into(), FieldValue::BelongsTo(Box::new(entity)));
        self
    }

    /// Attach a validation error to a field (builder).
    pub fn with_error(mut self, field: impl Into<String>, message: ErrorMessage) -> Self {
        self.errors.insert(field.into(), message);
        self
    }

    /// Whether this entity has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Direct field access by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Replace a field value.
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Field access by dotted path, following belongs-to relations.
    ///
    /// `"product.unit"` reads `unit` of the entity referenced by `product`.
    pub fn field_by_path(&self, path: &str) -> Option<&FieldValue> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_entity()?.fields.get(segment)?;
        }
        Some(current)
    }

    /// Text of the field at `path`. The pseudo-field `id` yields the entity id.
    pub fn text(&self, path: &str) -> Option<String> {
        if path == "id" {
            return self.id.map(|id| id.to_string());
        }
        self.field_by_path(path).and_then(FieldValue::as_text)
    }

    /// The entity referenced by the belongs-to field at `path`.
    pub fn belongs_to(&self, path: &str) -> Option<&Entity> {
        self.field_by_path(path).and_then(FieldValue::as_entity)
    }

    /// Validation error reported for a field.
    pub fn error(&self, field: &str) -> Option<&ErrorMessage> {
        self.errors.get(field)
    }

    /// Record a validation error for a field.
    pub fn add_error(&mut self, field: impl Into<String>, message: ErrorMessage) {
        self.errors.insert(field.into(), message);
    }

    /// Whether the data layer reported no validation errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
