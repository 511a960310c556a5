//! Popup view of a lookup: a window holding a candidate grid and a
//! select/cancel ribbon, built with the same pattern engine.

use crate::components::ribbon::{Ribbon, RibbonActionItem, RibbonGroup};
use crate::pattern::{ComponentOption, ComponentPattern, PatternKind};
use crate::view::{ViewDefinition, ViewError};

pub const WINDOW: &str = "mainWindow";
pub const GRID: &str = "lookupGrid";
pub const RIBBON: &str = "ribbon";

/// Hidden column holding the display value of each candidate.
pub const VALUE_COLUMN: &str = "lookupValue";
/// Hidden column holding the code of each candidate.
pub const CODE_COLUMN: &str = "lookupCode";
/// Visible, linked code column.
pub const VISIBLE_CODE_COLUMN: &str = "lookupCodeVisible";

/// Build and initialize the popup view of the lookup at `path`.
///
/// With a `#{path}.field` source the popup lists the source entity's
/// relation through that field; otherwise it lists the lookup's data
/// definition.
pub fn build(view: &ViewDefinition, path: &str) -> Result<ViewDefinition, ViewError> {
    let id = view
        .tree()
        .find(path)
        .ok_or_else(|| ViewError::ComponentNotFound(path.to_owned()))?;
    let pattern = view
        .tree()
        .get(id)
        .ok_or_else(|| ViewError::ComponentNotFound(path.to_owned()))?;
    let PatternKind::Lookup(options) = pattern.kind() else {
        return Err(ViewError::NotALookup(path.to_owned()));
    };
    let resolution = pattern
        .resolution()
        .ok_or_else(|| ViewError::NotInitialized(view.name().to_owned()))?;

    let relation_source = resolution
        .source
        .as_ref()
        .and_then(|source| Some((source.data_definition.clone()?, source.field.clone()?)));
    let (definition, grid_field) = match relation_source {
        Some((definition, field)) => (Some(definition), Some(field)),
        None => (resolution.data_definition.clone(), None),
    };

    let mut popup = ViewDefinition::new(
        format!("{}.lookup.{}", view.name(), path),
        view.plugin_identifier(),
        view.services().clone(),
    )
    .with_config(view.config().clone());
    if let Some(definition) = definition {
        popup = popup.with_data_definition(definition);
    }

    let mut window = ComponentPattern::window(WINDOW)
        .with_option(ComponentOption::value("fixedHeight", "true"))
        .with_option(ComponentOption::value("header", "false"))
        .with_option(ComponentOption::value("minWidth", "false"));
    if let Some(width) = options.width {
        window = window.with_option(ComponentOption::value("width", width.to_string()));
    }
    if let Some(height) = options.height {
        window = window.with_option(ComponentOption::value("height", height.to_string()));
    }
    let window = popup.add_component_pattern(window)?;
    popup.add_child_pattern(window, ComponentPattern::ribbon(RIBBON, ribbon()))?;

    let mut grid = ComponentPattern::grid(GRID);
    if let Some(field) = grid_field {
        grid = grid.with_field_path(field);
    }
    let value_expression = options
        .expression
        .as_ref()
        .map_or_else(|| format!("#{}", options.field_code), |e| e.source().to_owned());
    grid = grid
        .with_option(
            ComponentOption::new("column")
                .with_attribute("name", VALUE_COLUMN)
                .with_attribute("expression", value_expression)
                .with_attribute("hidden", "true"),
        )
        .with_option(
            ComponentOption::new("column")
                .with_attribute("name", CODE_COLUMN)
                .with_attribute("fields", &options.field_code)
                .with_attribute("hidden", "true"),
        )
        .with_option(
            ComponentOption::new("column")
                .with_attribute("name", VISIBLE_CODE_COLUMN)
                .with_attribute("fields", &options.field_code)
                .with_attribute("link", "true"),
        );

    let mut orderable = None;
    for option in &options.grid_options {
        match option.kind() {
            "orderable" => orderable = option.raw_value().map(str::to_owned),
            _ => grid = grid.with_option(option.clone()),
        }
    }
    let orderable = match orderable.filter(|value| !value.trim().is_empty()) {
        Some(value) => format!("{value},{VISIBLE_CODE_COLUMN}"),
        None => VISIBLE_CODE_COLUMN.to_owned(),
    };
    grid = grid
        .with_option(ComponentOption::value("orderable", orderable))
        .with_option(ComponentOption::value("isLookup", "true"));
    popup.add_child_pattern(window, grid)?;

    popup.initialize()?;
    Ok(popup)
}

fn ribbon() -> Ribbon {
    Ribbon::new().with_group(
        RibbonGroup::new("navigation")
            .with_item(
                RibbonActionItem::big_button("select")
                    .with_icon("acceptIcon24.png")
                    .with_action(format!(
                        "#{{{WINDOW}.{GRID}}}.performLookupSelect; #{{{WINDOW}}}.performClose"
                    )),
            )
            .with_item(
                RibbonActionItem::big_button("cancel")
                    .with_icon("cancelIcon24.png")
                    .with_action(format!("#{{{WINDOW}}}.performClose")),
            ),
    )
}
