//! In-memory collaborators for tests and demos.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::model::{
    DataDefinition, DataModel, Direction, Entity, EntityId, FieldDefinition, Locale,
    SearchCriteria, SearchResult, TranslationService,
};

// ---------------------------------------------------------------------------
// MemoryDataDefinition
// ---------------------------------------------------------------------------

/// A data definition holding its entities in a vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataDefinition {
    plugin_identifier: String,
    name: String,
    fields: BTreeMap<String, FieldDefinition>,
    entities: Vec<Entity>,
}

impl MemoryDataDefinition {
    pub fn new(plugin_identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            plugin_identifier: plugin_identifier.into(),
            name: name.into(),
            fields: BTreeMap::new(),
            entities: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

impl DataDefinition for MemoryDataDefinition {
    fn plugin_identifier(&self) -> &str {
        &self.plugin_identifier
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    fn get(&self, id: EntityId) -> Option<Entity> {
        self.entities.iter().find(|e| e.id == Some(id)).cloned()
    }

    fn find(&self, criteria: &SearchCriteria) -> SearchResult {
        let mut matching: Vec<&Entity> =
            self.entities.iter().filter(|e| criteria.matches(e)).collect();
        if let Some(order) = criteria.order() {
            matching.sort_by(|a, b| {
                let ordering = compare_text(a.text(&order.field), b.text(&order.field));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        let total_number_of_entities = matching.len();
        let page = matching
            .into_iter()
            .skip(criteria.first())
            .take(criteria.max().unwrap_or(usize::MAX))
            .cloned()
            .collect();
        SearchResult {
            total_number_of_entities,
            entities: page,
        }
    }
}

/// Numbers compare numerically, everything else as text; missing sorts first.
fn compare_text(a: Option<String>, b: Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(&b),
        },
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

// ---------------------------------------------------------------------------
// MemoryDataModel
// ---------------------------------------------------------------------------

/// A data model backed by a map of data definitions.
#[derive(Default)]
pub struct MemoryDataModel {
    definitions: HashMap<(String, String), Arc<dyn DataDefinition>>,
}

impl MemoryDataModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, definition: impl DataDefinition + 'static) -> Self {
        self.add_definition(Arc::new(definition));
        self
    }

    pub fn add_definition(&mut self, definition: Arc<dyn DataDefinition>) {
        let key = (
            definition.plugin_identifier().to_owned(),
            definition.name().to_owned(),
        );
        self.definitions.insert(key, definition);
    }
}

impl DataModel for MemoryDataModel {
    fn data_definition(
        &self,
        plugin_identifier: &str,
        name: &str,
    ) -> Option<Arc<dyn DataDefinition>> {
        self.definitions
            .get(&(plugin_identifier.to_owned(), name.to_owned()))
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// MemoryTranslations
// ---------------------------------------------------------------------------

/// Translations from a code → text map, shared by all locales.
#[derive(Debug, Clone, Default)]
pub struct MemoryTranslations {
    messages: HashMap<String, String>,
}

impl MemoryTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, code: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.insert(code.into(), text.into());
        self
    }
}

impl TranslationService for MemoryTranslations {
    fn translate(&self, codes: &[String], _locale: &Locale) -> String {
        codes
            .iter()
            .find_map(|code| self.messages.get(code))
            .or(codes.first())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, Restriction};

    fn products() -> MemoryDataDefinition {
        MemoryDataDefinition::new("basic", "product")
            .with_field(FieldDefinition::new("number", FieldType::Text))
            .with_entity(Entity::new("product").with_id(1).with_field("number", "B").with_field("qty", 10))
            .with_entity(Entity::new("product").with_id(2).with_field("number", "A").with_field("qty", 9))
            .with_entity(Entity::new("product").with_id(3).with_field("number", "C").with_field("qty", 100))
    }

    fn ids(result: &SearchResult) -> Vec<Option<EntityId>> {
        result.entities.iter().map(|e| e.id).collect()
    }

    #[test]
    fn get_by_id() {
        let products = products();
        assert_eq!(products.get(2).unwrap().text("number").as_deref(), Some("A"));
        assert!(products.get(9).is_none());
    }

    #[test]
    fn order_and_page() {
        let products = products();
        let result = products.find(
            &SearchCriteria::new()
                .order_by("number", Direction::Asc)
                .first_result(1)
                .max_results(1),
        );
        assert_eq!(result.total_number_of_entities, 3);
        assert_eq!(ids(&result), vec![Some(1)]);
    }

    #[test]
    fn numeric_order() {
        let products = products();
        let result = products.find(&SearchCriteria::new().order_by("qty", Direction::Desc));
        assert_eq!(ids(&result), vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn restrictions_filter() {
        let products = products();
        let result = products.find(&SearchCriteria::new().restricted_with(Restriction::eq("number", "C")));
        assert_eq!(ids(&result), vec![Some(3)]);
    }

    #[test]
    fn model_lookup() {
        let model = MemoryDataModel::new().with_definition(products());
        assert!(model.data_definition("basic", "product").is_some());
        assert!(model.data_definition("other", "product").is_none());
    }

    #[test]
    fn translations_fall_back_to_first_code() {
        let translations = MemoryTranslations::new().with_message("b", "Bee");
        let locale = Locale::default();
        assert_eq!(translations.translate(&["a".into(), "b".into()], &locale), "Bee");
        assert_eq!(translations.translate(&["a".into(), "c".into()], &locale), "a");
        assert_eq!(translations.translate(&[], &locale), "");
    }
}
