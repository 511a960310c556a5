//! Search criteria and results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Entity, EntityId, FieldValue};

// ---------------------------------------------------------------------------
// Restriction
// ---------------------------------------------------------------------------

/// A single search restriction.
#[derive(Debug, Clone, PartialEq)]
pub enum Restriction {
    /// Field text equals the value's text.
    Eq { field: String, value: Value },
    /// Field text matches a pattern where `*` stands for any run of characters.
    Like { field: String, pattern: String },
    /// Belongs-to field references the entity with `id`.
    BelongsTo { field: String, id: EntityId },
}

impl Restriction {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn belongs_to(field: impl Into<String>, id: EntityId) -> Self {
        Self::BelongsTo {
            field: field.into(),
            id,
        }
    }

    /// Evaluate the restriction against an entity held in memory.
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Self::Eq { field, value } => {
                let expected = FieldValue::Value(value.clone()).as_text();
                entity.text(field) == expected
            }
            Self::Like { field, pattern } => entity
                .text(field)
                .is_some_and(|text| wildcard_match(pattern, &text)),
            Self::BelongsTo { field, id } => match entity.field_by_path(field) {
                Some(FieldValue::BelongsTo(related)) => related.id == Some(*id),
                Some(FieldValue::Value(Value::Number(number))) => number.as_u64() == Some(*id),
                _ => false,
            },
        }
    }
}

/// Match `text` against `pattern`, where `*` matches any run of characters.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Sort direction, serialized as `asc` / `desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Ordering by one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// SearchCriteria
// ---------------------------------------------------------------------------

/// Restrictions, ordering and paging for [`DataDefinition::find`](super::DataDefinition::find).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    restrictions: Vec<Restriction>,
    order: Option<Order>,
    first_result: usize,
    max_results: Option<usize>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a restriction; all restrictions must hold.
    pub fn restricted_with(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn first_result(mut self, first: usize) -> Self {
        self.first_result = first;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    pub fn restrictions(&self) -> &[Restriction] {
        &self.restrictions
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn first(&self) -> usize {
        self.first_result
    }

    pub fn max(&self) -> Option<usize> {
        self.max_results
    }

    /// Whether every restriction holds for `entity`.
    pub fn matches(&self, entity: &Entity) -> bool {
        self.restrictions.iter().all(|r| r.matches(entity))
    }
}

/// One page of search results plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub total_number_of_entities: usize,
    pub entities: Vec<Entity>,
}
