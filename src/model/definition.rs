//! Data definitions: field metadata and the entity access surface.

use std::sync::Arc;

use super::entity::{Entity, EntityId};
use super::search::{SearchCriteria, SearchResult};

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Type of a data definition field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    /// Reference to one entity of `entity`.
    BelongsTo { entity: String },
    /// Collection of `entity` records pointing back through `join_field`.
    HasMany { entity: String, join_field: String },
}

impl FieldType {
    /// Name of the related data definition for relation fields.
    pub fn related_entity(&self) -> Option<&str> {
        match self {
            Self::BelongsTo { entity } | Self::HasMany { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// Join field of a has-many relation.
    pub fn join_field(&self) -> Option<&str> {
        match self {
            Self::HasMany { join_field, .. } => Some(join_field),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldDefinition
// ---------------------------------------------------------------------------

/// Metadata of one field: type plus required/read-only rules.
///
/// `required_on_create` and `read_only_on_update` only apply to new and
/// persisted entities respectively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub required_on_create: bool,
    pub read_only: bool,
    pub read_only_on_update: bool,
}

impl FieldDefinition {
    /// A field with no required or read-only rules.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            required_on_create: false,
            read_only: false,
            read_only_on_update: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn required_on_create(mut self, required: bool) -> Self {
        self.required_on_create = required;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn read_only_on_update(mut self, read_only: bool) -> Self {
        self.read_only_on_update = read_only;
        self
    }

    /// Whether a value is required, given whether the entity is new.
    pub fn is_required_for(&self, is_new: bool) -> bool {
        self.required || (is_new && self.required_on_create)
    }

    /// Whether the field is locked, given whether the entity is new.
    pub fn is_read_only_for(&self, is_new: bool) -> bool {
        self.read_only || (!is_new && self.read_only_on_update)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Access to one entity type of the persistence layer.
pub trait DataDefinition: Send + Sync {
    /// Plugin that declares this data definition.
    fn plugin_identifier(&self) -> &str;

    /// Entity name, unique within the plugin.
    fn name(&self) -> &str;

    /// Metadata of a field.
    fn field(&self, name: &str) -> Option<&FieldDefinition>;

    /// Fetch one entity by id.
    fn get(&self, id: EntityId) -> Option<Entity>;

    /// Search with restrictions, ordering and paging.
    fn find(&self, criteria: &SearchCriteria) -> SearchResult;
}

/// Registry of data definitions, used to follow relations and explicit models.
pub trait DataModel: Send + Sync {
    fn data_definition(&self, plugin_identifier: &str, name: &str)
        -> Option<Arc<dyn DataDefinition>>;
}

impl std::fmt::Debug for dyn DataDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataDefinition({}.{})", self.plugin_identifier(), self.name())
    }
}
