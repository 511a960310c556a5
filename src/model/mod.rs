//! Collaborator interfaces for the persistence and translation layers.
//!
//! The view engine never talks to storage directly. It fetches entities by id,
//! searches with restrictions, inspects field metadata and translates message
//! codes through the narrow traits declared here:
//!
//! - **[`entity`]**: [`Entity`] records and their [`FieldValue`]s
//! - **[`definition`]**: [`DataDefinition`], [`DataModel`], field metadata
//! - **[`search`]**: [`SearchCriteria`] builder and [`SearchResult`]
//! - **[`translation`]**: [`TranslationService`], [`Locale`], [`ErrorMessage`]

pub mod definition;
pub mod entity;
pub mod search;
pub mod translation;

pub use definition::{DataDefinition, DataModel, FieldDefinition, FieldType};
pub use entity::{Entity, EntityId, FieldValue};
pub use search::{Direction, Order, Restriction, SearchCriteria, SearchResult};
pub use translation::{ErrorMessage, Locale, TranslationService};
