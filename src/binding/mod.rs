//! Per-request derivation of display values from backend entities.
//!
//! A binding pass walks the widgets owned by a form in tree order. Each widget
//! derives a [`ViewValue`] from the bound entity, and lookups record the
//! entity they resolved in the pass's [`SelectedEntities`] so later widgets
//! can use it as their context. The accumulator lives only for one pass.

pub mod expression;

use std::collections::{BTreeSet, HashMap};

pub use expression::{Expression, ExpressionError};

use crate::config::ViewConfig;
use crate::model::{Entity, FieldDefinition, Locale, TranslationService};

/// Entities selected so far in one binding pass, keyed by component path.
pub type SelectedEntities = HashMap<String, Entity>;

// ---------------------------------------------------------------------------
// ViewValue
// ---------------------------------------------------------------------------

/// A derived display value plus its validation messages and enabled flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewValue<T> {
    value: T,
    error_messages: Vec<String>,
    enabled: bool,
}

impl<T> ViewValue<T> {
    /// Wrap a value: enabled, no errors.
    pub fn new(value: T) -> Self {
        Self {
            value,
            error_messages: Vec::new(),
            enabled: true,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Add a translated, user-facing error message.
    pub fn add_error_message(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub fn has_errors(&self) -> bool {
        !self.error_messages.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Split into value, error messages and enabled flag.
    pub fn into_parts(self) -> (T, Vec<String>, bool) {
        (self.value, self.error_messages, self.enabled)
    }
}

// ---------------------------------------------------------------------------
// BindingContext
// ---------------------------------------------------------------------------

/// Everything a widget needs to derive its value during a binding pass.
pub struct BindingContext<'a> {
    /// The entity being edited. `None`, or an entity without id, means create mode.
    pub entity: Option<&'a Entity>,
    /// Accumulator of entities resolved earlier in this pass.
    pub selected_entities: &'a mut SelectedEntities,
    /// Paths whose values were edited on the client and must not be
    /// overwritten from the entity.
    pub paths_to_update: &'a BTreeSet<String>,
    pub locale: &'a Locale,
    pub translations: &'a dyn TranslationService,
    pub config: &'a ViewConfig,
}

impl BindingContext<'_> {
    /// Whether the bound entity is being created rather than updated.
    pub fn is_create(&self) -> bool {
        self.entity.map_or(true, Entity::is_new)
    }

    /// Required flag for a field under the current create/update mode.
    pub fn is_required(&self, field: Option<&FieldDefinition>) -> bool {
        field.is_some_and(|f| f.is_required_for(self.is_create()))
    }

    /// Read-only flag for a field under the current create/update mode.
    pub fn is_read_only(&self, field: Option<&FieldDefinition>) -> bool {
        field.is_some_and(|f| f.is_read_only_for(self.is_create()))
    }

    /// Translated validation error of `entity` for `field`, if any.
    pub fn field_error(&self, entity: Option<&Entity>, field: &str) -> Option<String> {
        entity
            .and_then(|e| e.error(field))
            .map(|message| self.translations.translate_error(message, self.locale))
    }

    /// Translate a single message code.
    pub fn translate(&self, code: &str) -> String {
        self.translations.translate_code(code, self.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ErrorMessage, FieldType};
    use crate::testing::memory::MemoryTranslations;

    #[test]
    fn view_value_defaults() {
        let value = ViewValue::new(5);
        assert_eq!(*value.value(), 5);
        assert!(value.is_enabled());
        assert!(!value.has_errors());
    }

    #[test]
    fn view_value_parts() {
        let mut value = ViewValue::new("x");
        value.add_error_message("bad");
        value.set_enabled(false);
        *value.value_mut() = "y";
        assert_eq!(value.into_parts(), ("y", vec!["bad".to_owned()], false));
    }

    #[test]
    fn create_and_update_modes() {
        let translations = MemoryTranslations::new();
        let config = ViewConfig::default();
        let locale = Locale::default();
        let paths = BTreeSet::new();
        let mut selected = SelectedEntities::new();
        let field = FieldDefinition::new("number", FieldType::Text)
            .required_on_create(true)
            .read_only_on_update(true);

        let persisted = Entity::new("product").with_id(1);
        let mut binding = BindingContext {
            entity: None,
            selected_entities: &mut selected,
            paths_to_update: &paths,
            locale: &locale,
            translations: &translations,
            config: &config,
        };
        assert!(binding.is_create());
        assert!(binding.is_required(Some(&field)));
        assert!(!binding.is_read_only(Some(&field)));
        assert!(!binding.is_required(None));

        binding.entity = Some(&persisted);
        assert!(!binding.is_create());
        assert!(!binding.is_required(Some(&field)));
        assert!(binding.is_read_only(Some(&field)));
    }

    #[test]
    fn field_error_is_translated() {
        let translations =
            MemoryTranslations::new().with_message("core.validate.field.error.missing", "Required");
        let config = ViewConfig::default();
        let locale = Locale::default();
        let paths = BTreeSet::new();
        let mut selected = SelectedEntities::new();
        let entity = Entity::new("product")
            .with_error("number", ErrorMessage::new("core.validate.field.error.missing"));
        let binding = BindingContext {
            entity: Some(&entity),
            selected_entities: &mut selected,
            paths_to_update: &paths,
            locale: &locale,
            translations: &translations,
            config: &config,
        };
        assert_eq!(binding.field_error(Some(&entity), "number").as_deref(), Some("Required"));
        assert_eq!(binding.field_error(Some(&entity), "name"), None);
        assert_eq!(binding.field_error(None, "number"), None);
    }
}
