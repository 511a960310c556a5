//! Grid: a paged, filterable list of entities.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use super::id_argument;
use crate::binding::Expression;
use crate::model::{Direction, Entity, EntityId, Restriction, SearchCriteria};
use crate::pattern::options::{split_list, OptionReader};
use crate::pattern::{ComponentOption, ComponentPattern, OptionError};
use crate::state::content::value_as_id;
use crate::state::{Content, ContentState, StateError};
use crate::tree::PatternId;
use crate::view::{ViewDefinitionState, ViewError};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// One grid column: the joined text of `fields`, or `expression` if set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridColumn {
    pub name: String,
    pub fields: Vec<String>,
    pub expression: Option<Expression>,
    pub width: Option<u32>,
    /// Clicking the cell opens the row.
    pub link: bool,
    pub hidden: bool,
}

impl GridColumn {
    /// Cell text for one entity.
    pub fn value(&self, entity: &Entity) -> String {
        match &self.expression {
            Some(expression) => expression.evaluate(entity),
            None => self
                .fields
                .iter()
                .map(|field| entity.text(field).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Field used for ordering and filtering by this column.
    fn search_field(&self) -> Option<&str> {
        self.fields
            .first()
            .map(String::as_str)
            .or_else(|| self.expression.as_ref()?.fields().next())
    }
}

/// Typed options of a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOptions {
    pub columns: Vec<GridColumn>,
    pub orderable: Vec<String>,
    pub searchable: Vec<String>,
    pub paginable: bool,
    pub full_screen: bool,
    pub height: Option<u32>,
    pub width: Option<u32>,
    /// Page size; the view's default page size applies when unset.
    pub max_entities: Option<usize>,
    /// The grid lists candidates of a lookup popup.
    pub is_lookup: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            orderable: Vec::new(),
            searchable: Vec::new(),
            paginable: true,
            full_screen: false,
            height: None,
            width: None,
            max_entities: None,
            is_lookup: false,
        }
    }
}

impl GridOptions {
    pub fn parse(path: &str, options: &[ComponentOption]) -> Result<Self, OptionError> {
        let reader = OptionReader::new(path, "grid");
        let mut parsed = Self::default();
        let mut column_lists = Vec::new();
        for option in options {
            match option.kind() {
                "column" => parsed.columns.push(parse_column(&reader, option)?),
                "orderable" => {
                    parsed.orderable = reader.list(option)?;
                    column_lists.push(option);
                }
                "searchable" => {
                    parsed.searchable = reader.list(option)?;
                    column_lists.push(option);
                }
                "paginable" => parsed.paginable = reader.bool(option)?,
                "fullScreen" => parsed.full_screen = reader.bool(option)?,
                "height" => parsed.height = Some(reader.u32(option)?),
                "width" => parsed.width = Some(reader.u32(option)?),
                "maxEntities" => parsed.max_entities = Some(reader.u32(option)? as usize),
                "isLookup" => parsed.is_lookup = reader.bool(option)?,
                _ => return Err(reader.unknown(option)),
            }
        }

        for option in column_lists {
            for name in reader.list(option)? {
                if parsed.column(&name).is_none() {
                    return Err(reader.invalid(option, &name, "a column name"));
                }
            }
        }
        Ok(parsed)
    }

    pub fn column(&self, name: &str) -> Option<&GridColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub(crate) fn create_state(&self) -> GridState {
        GridState {
            max_entities: self.max_entities,
            ..GridState::default()
        }
    }
}

fn parse_column(reader: &OptionReader<'_>, option: &ComponentOption) -> Result<GridColumn, OptionError> {
    let name = reader.attribute(option, "name")?.to_owned();
    let expression = option
        .attribute("expression")
        .map(|source| reader.parse_expression(option, source))
        .transpose()?;
    let mut fields = option.attribute("fields").map(split_list).unwrap_or_default();
    if fields.is_empty() && expression.is_none() {
        fields.push(name.clone());
    }
    Ok(GridColumn {
        name,
        fields,
        expression,
        width: reader.u32_attribute(option, "width")?,
        link: reader.bool_attribute(option, "link", false)?,
        hidden: reader.bool_attribute(option, "hidden", false)?,
    })
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Ordering requested by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOrder {
    pub column: String,
    pub direction: Direction,
}

/// One listed entity: id plus the text of every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub id: Option<EntityId>,
    pub fields: BTreeMap<String, String>,
}

/// Live state of a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridState {
    pub selected_entity_id: Option<EntityId>,
    /// Parent entity the listed entities belong to, for relation grids.
    pub belongs_to_entity_id: Option<EntityId>,
    pub first_entity: usize,
    pub max_entities: Option<usize>,
    pub total_entities: usize,
    pub order: Option<GridOrder>,
    /// Filter text per column name.
    pub filters: BTreeMap<String, String>,
    pub entities: Vec<GridRow>,
}

impl ContentState for GridState {
    fn initialize_content(&mut self, content: &Content<'_>) -> Result<(), StateError> {
        if content.contains("selectedEntityId") {
            self.selected_entity_id = content.id("selectedEntityId")?;
        }
        if content.contains("belongsToEntityId") {
            self.belongs_to_entity_id = content.id("belongsToEntityId")?;
        }
        if let Some(first) = content.usize("firstEntity")? {
            self.first_entity = first;
        }
        if let Some(max) = content.usize("maxEntities")? {
            self.max_entities = Some(max);
        }
        if let Some(total) = content.usize("totalEntities")? {
            self.total_entities = total;
        }
        if content.contains("order") {
            self.order = content.object("order")?.map(parse_order).transpose()?;
        }
        if let Some(filters) = content.object("filters")? {
            self.filters = filters.strings()?.into_iter().collect();
        }
        if let Some(entities) = content.array("entities")? {
            self.entities = entities
                .iter()
                .map(|row| parse_row(content.path(), row))
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }

    fn render_content(&self) -> Value {
        let entities: Vec<Value> = self
            .entities
            .iter()
            .map(|row| Value::Object(row_to_json(row)))
            .collect();
        json!({
            "selectedEntityId": self.selected_entity_id,
            "belongsToEntityId": self.belongs_to_entity_id,
            "firstEntity": self.first_entity,
            "maxEntities": self.max_entities,
            "totalEntities": self.total_entities,
            "order": self.order.as_ref().map(|order| json!({
                "column": order.column,
                "direction": order.direction,
            })),
            "filters": self.filters,
            "entities": entities,
        })
    }

    fn field_value(&self) -> Option<Value> {
        Some(self.selected_entity_id.map_or(Value::Null, Value::from))
    }

    fn set_field_value(&mut self, value: Option<&Value>) -> Result<bool, String> {
        self.selected_entity_id = match value {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_as_id(value).ok_or_else(|| format!("not an id: {value}"))?),
        };
        Ok(true)
    }
}

fn parse_order(order: Content<'_>) -> Result<GridOrder, StateError> {
    let column = order
        .string("column")?
        .ok_or_else(|| order.malformed("order without `column`"))?;
    let direction = match order.string("direction")?.as_deref() {
        None | Some("asc") => Direction::Asc,
        Some("desc") => Direction::Desc,
        Some(other) => return Err(order.malformed(format!("unknown direction `{other}`"))),
    };
    Ok(GridOrder { column, direction })
}

fn parse_row(path: &str, row: &Value) -> Result<GridRow, StateError> {
    let row = Content::new(path, row)?;
    let fields = match row.object("fields")? {
        Some(fields) => fields.strings()?.into_iter().collect(),
        None => BTreeMap::new(),
    };
    Ok(GridRow {
        id: row.id("id")?,
        fields,
    })
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub(crate) fn perform(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    pattern: &ComponentPattern,
    options: &GridOptions,
    event: &str,
    args: &[String],
) -> Result<bool, ViewError> {
    match event {
        "initialize" | "refresh" => refresh(state, id, pattern, options)?,
        "select" => {
            let selected = id_argument(pattern, event, args)?;
            if let Some(grid) = state.state_mut(id) {
                if let Some(grid_state) = grid.as_grid_mut() {
                    grid_state.selected_entity_id = selected;
                }
                grid.request_render();
                grid.request_update_state();
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Search the grid's data definition with the client's paging, ordering and
/// filters, restricted to the parent entity for relation grids.
pub(crate) fn refresh(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    pattern: &ComponentPattern,
    options: &GridOptions,
) -> Result<(), ViewError> {
    let Some(definition) = pattern.data_definition() else {
        return Err(ViewError::MissingDataDefinition(pattern.path().to_owned()));
    };
    let Some(current) = state.state(id).and_then(|s| s.as_grid()).cloned() else {
        return Ok(());
    };
    let source = pattern.resolution().and_then(|r| r.source.as_ref());
    let belongs_to = match source {
        Some(source) => state
            .state(source.id)
            .and_then(|s| s.field_value())
            .as_ref()
            .and_then(value_as_id),
        None => current.belongs_to_entity_id,
    };
    let join_field = pattern.resolution().and_then(|r| r.join_field());
    let page_size = options.paginable.then(|| {
        current
            .max_entities
            .or(options.max_entities)
            .unwrap_or(state.view().config().default_page_size)
    });

    let (total, rows) = match (join_field, belongs_to) {
        (Some(_), None) => (0, Vec::new()),
        _ => {
            let criteria = criteria(options, &current, join_field.zip(belongs_to), page_size);
            let result = definition.find(&criteria);
            let rows = result
                .entities
                .iter()
                .map(|entity| GridRow {
                    id: entity.id,
                    fields: options
                        .columns
                        .iter()
                        .map(|column| (column.name.clone(), column.value(entity)))
                        .collect(),
                })
                .collect();
            (result.total_number_of_entities, rows)
        }
    };
    debug!(component = pattern.path(), total, "grid refreshed");

    if let Some(grid) = state.state_mut(id) {
        if let Some(grid_state) = grid.as_grid_mut() {
            grid_state.belongs_to_entity_id = belongs_to;
            grid_state.total_entities = total;
            grid_state.entities = rows;
            if page_size.is_some() {
                grid_state.max_entities = page_size;
            }
        }
        grid.request_render();
    }
    Ok(())
}

fn criteria(
    options: &GridOptions,
    current: &GridState,
    belongs_to: Option<(&str, EntityId)>,
    page_size: Option<usize>,
) -> SearchCriteria {
    let mut criteria = SearchCriteria::new();
    if let Some((join_field, parent)) = belongs_to {
        criteria = criteria.restricted_with(Restriction::belongs_to(join_field, parent));
    }
    for (column, text) in &current.filters {
        let field = options
            .searchable
            .contains(column)
            .then(|| options.column(column)?.search_field())
            .flatten();
        if let (Some(field), false) = (field, text.trim().is_empty()) {
            criteria = criteria.restricted_with(Restriction::like(field, format!("{}*", text.trim())));
        }
    }
    if let Some(order) = &current.order {
        let field = options
            .orderable
            .contains(&order.column)
            .then(|| options.column(&order.column)?.search_field())
            .flatten();
        if let Some(field) = field {
            criteria = criteria.order_by(field, order.direction);
        }
    }
    if let Some(page_size) = page_size {
        criteria = criteria
            .first_result(current.first_entity)
            .max_results(page_size);
    }
    criteria
}

/// Content object of one row.
pub fn row_to_json(row: &GridRow) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".into(), json!(row.id));
    map.insert("fields".into(), json!(row.fields));
    map
}
