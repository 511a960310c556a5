//! Integration tests for mes-view.
//!
//! These tests build views from the public API, back them with the
//! in-memory data model and drive them with client-shaped JSON requests.

use std::sync::{Arc, Mutex};

use mes_view::model::{Entity, ErrorMessage, FieldDefinition, FieldType, Locale};
use mes_view::testing::{MemoryDataDefinition, MemoryDataModel, MemoryTranslations, Pilot, RequestBuilder};
use mes_view::view::EventContext;
use mes_view::{
    ComponentOption, ComponentPattern, HookDefinition, HookPhase, ViewDefinition,
    ViewDefinitionState, ViewError, ViewServices,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn model() -> Arc<MemoryDataModel> {
    let product = |id, number: &str, name: &str| {
        Entity::new("product")
            .with_id(id)
            .with_field("number", number)
            .with_field("name", name)
    };
    let substitute = |id, number: &str, product_id| {
        Entity::new("substitute")
            .with_id(id)
            .with_field("number", number)
            .with_belongs_to("product", Entity::new("product").with_id(product_id))
    };

    Arc::new(
        MemoryDataModel::new()
            .with_definition(
                MemoryDataDefinition::new("basic", "product")
                    .with_field(FieldDefinition::new("number", FieldType::Text).required(true))
                    .with_field(FieldDefinition::new("name", FieldType::Text).read_only_on_update(true))
                    .with_field(FieldDefinition::new(
                        "substitutes",
                        FieldType::HasMany {
                            entity: "substitute".into(),
                            join_field: "product".into(),
                        },
                    ))
                    .with_entity(product(1, "ABC", "Bolt"))
                    .with_entity(product(2, "XY1", "Nut"))
                    .with_entity(product(3, "XY2", "Screw")),
            )
            .with_definition(
                MemoryDataDefinition::new("basic", "substitute")
                    .with_field(FieldDefinition::new("number", FieldType::Text))
                    .with_field(FieldDefinition::new(
                        "product",
                        FieldType::BelongsTo {
                            entity: "product".into(),
                        },
                    ))
                    .with_entity(substitute(10, "S1", 1))
                    .with_entity(substitute(11, "S2", 1))
                    .with_entity(substitute(12, "S3", 2)),
            )
            .with_definition(
                MemoryDataDefinition::new("basic", "order")
                    .with_field(FieldDefinition::new("number", FieldType::Text))
                    .with_field(
                        FieldDefinition::new(
                            "product",
                            FieldType::BelongsTo {
                                entity: "product".into(),
                            },
                        )
                        .required(true),
                    )
                    .with_entity(
                        Entity::new("order")
                            .with_id(5)
                            .with_field("number", "O-5")
                            .with_belongs_to("product", Entity::new("product").with_id(2)),
                    )
                    .with_entity(
                        Entity::new("order")
                            .with_id(7)
                            .with_field("number", "O-7")
                            .with_error("product", ErrorMessage::new("core.validate.field.error.missing")),
                    ),
            ),
    )
}

fn services() -> ViewServices {
    services_with(MemoryTranslations::new())
}

fn services_with(translations: MemoryTranslations) -> ViewServices {
    ViewServices::new(model(), Arc::new(translations))
}

fn definition(services: &ViewServices, name: &str) -> Arc<dyn mes_view::model::DataDefinition> {
    services
        .model
        .data_definition("basic", name)
        .expect("fixture definition")
}

/// `window.form` editing a product, with a relation grid of substitutes.
fn product_view(services: ViewServices) -> ViewDefinition {
    let products = definition(&services, "product");
    let mut view =
        ViewDefinition::new("productDetails", "basic", services).with_data_definition(products);
    let window = view
        .add_component_pattern(ComponentPattern::window("window"))
        .unwrap();
    let form = view
        .add_child_pattern(
            window,
            ComponentPattern::form("form")
                .with_option(ComponentOption::value("expression", "#number + ' - ' + #name")),
        )
        .unwrap();
    view.add_child_pattern(form, ComponentPattern::field("number").with_field_path("number"))
        .unwrap();
    view.add_child_pattern(form, ComponentPattern::field("name").with_field_path("name"))
        .unwrap();
    view.add_child_pattern(
        form,
        ComponentPattern::grid("substitutes")
            .with_field_path("substitutes")
            .with_option(ComponentOption::new("column").with_attribute("name", "number"))
            .with_option(ComponentOption::value("orderable", "number")),
    )
    .unwrap();
    view.initialize().unwrap();
    view
}

/// `window.form` editing an order, with a product lookup.
fn order_view(services: ViewServices) -> ViewDefinition {
    let orders = definition(&services, "order");
    let mut view =
        ViewDefinition::new("orderDetails", "basic", services).with_data_definition(orders);
    let window = view
        .add_component_pattern(ComponentPattern::window("window"))
        .unwrap();
    let form = view
        .add_child_pattern(window, ComponentPattern::form("form"))
        .unwrap();
    view.add_child_pattern(form, ComponentPattern::field("number").with_field_path("number"))
        .unwrap();
    view.add_child_pattern(
        form,
        ComponentPattern::lookup("product")
            .with_field_path("product")
            .with_option(ComponentOption::value("fieldCode", "number"))
            .with_option(ComponentOption::value("expression", "#number + ' ' + #name")),
    )
    .unwrap();
    view.initialize().unwrap();
    view
}

// ---------------------------------------------------------------------------
// Form binding
// ---------------------------------------------------------------------------

#[test]
fn form_initialize_binds_entity() {
    let view = product_view(services());
    let pilot = Pilot::new(&view);

    let response = pilot.request(
        RequestBuilder::new()
            .on("window.form", "initialize")
            .content("window.form", json!({"entityId": 1})),
    );

    assert!(response.success, "{:?}", response.errors);
    insta::assert_json_snapshot!(response.content("window.form.number").unwrap(), @r#"
    {
      "required": true,
      "valid": true,
      "value": "ABC"
    }
    "#);
    assert_eq!(
        response.content("window.form").unwrap()["header"],
        json!("ABC - Bolt")
    );
    assert_eq!(response.content("window.form").unwrap()["entityId"], json!(1));
    // read-only on update
    assert_eq!(
        response.component("window.form.name").unwrap()["enabled"],
        json!(false)
    );
}

#[test]
fn create_mode_derives_required_and_read_only() {
    let view = product_view(services());
    let response = Pilot::new(&view).event("window.form", "initialize", Vec::<String>::new());

    assert!(response.success);
    let name = response.component("window.form.name").unwrap();
    assert_eq!(name["enabled"], json!(true));
    assert_eq!(name["content"]["value"], Value::Null);
    assert_eq!(response.content("window.form").unwrap()["header"], Value::Null);
}

#[test]
fn relation_grid_lists_children_of_form_entity() {
    let view = product_view(services());
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .on("window.form", "initialize")
            .content("window.form", json!({"entityId": 1})),
    );

    let grid = response.content("window.form.substitutes").unwrap();
    assert_eq!(grid["belongsToEntityId"], json!(1));
    assert_eq!(grid["totalEntities"], json!(2));
    let numbers: Vec<&Value> = grid["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| &row["fields"]["number"])
        .collect();
    assert_eq!(numbers, [&json!("S1"), &json!("S2")]);
}

#[test]
fn missing_entity_reports_failure() {
    let view = product_view(services());
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .on("window.form", "initialize")
            .content("window.form", json!({"entityId": 404})),
    );

    assert!(!response.success);
    let form = response.component("window.form").unwrap();
    assert_eq!(form["messages"][0]["type"], json!("failure"));
    assert_eq!(form["content"]["entityId"], Value::Null);
}

#[test]
fn grid_refresh_honours_paging_and_order() {
    let view = product_view(services());
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .on("window.form.substitutes", "refresh")
            .content(
                "window.form.substitutes",
                json!({
                    "belongsToEntityId": 1,
                    "firstEntity": 0,
                    "maxEntities": 1,
                    "order": {"column": "number", "direction": "desc"}
                }),
            ),
    );

    assert!(response.success, "{:?}", response.errors);
    let grid = response.content("window.form.substitutes").unwrap();
    assert_eq!(grid["totalEntities"], json!(2));
    assert_eq!(grid["entities"].as_array().unwrap().len(), 1);
    assert_eq!(grid["entities"][0]["id"], json!(11));
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[test]
fn lookup_shows_referenced_entity() {
    let view = order_view(services());
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .on("window.form", "initialize")
            .content("window.form", json!({"entityId": 5})),
    );

    assert!(response.success);
    let value = &response.content("window.form.product").unwrap()["value"];
    assert_eq!(value["selectedEntityId"], json!(2));
    assert_eq!(value["selectedEntityCode"], json!("XY1"));
    assert_eq!(value["selectedEntityValue"], json!("XY1 Nut"));
}

#[test]
fn edited_lookup_code_resolves_on_refresh() {
    let view = order_view(services());
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .on("window.form", "refresh")
            .content("window.form", json!({"entityId": 5}))
            .content("window.form.product", json!({"value": {"selectedEntityCode": "AB"}})),
    );

    assert!(response.success, "{:?}", response.errors);
    let value = &response.content("window.form.product").unwrap()["value"];
    assert_eq!(value["selectedEntityId"], json!(1));
    assert_eq!(value["selectedEntityValue"], json!("ABC Bolt"));
}

#[test]
fn ambiguous_lookup_code_fails_validation() {
    let translations = MemoryTranslations::new().with_message(
        mes_view::components::lookup::CODE_NOT_FOUND,
        "Code not found",
    );
    let view = order_view(services_with(translations));
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .on("window.form", "refresh")
            .content("window.form", json!({"entityId": 5}))
            .content("window.form.product", json!({"value": {"selectedEntityCode": "XY"}})),
    );

    assert!(!response.success);
    let lookup = response.component("window.form.product").unwrap();
    assert_eq!(lookup["content"]["value"]["selectedEntityCode"], json!("XY"));
    assert_eq!(lookup["content"]["value"]["selectedEntityId"], Value::Null);
    assert_eq!(lookup["messages"][0]["content"], json!("Code not found"));
    assert_eq!(response.content("window.form").unwrap()["valid"], json!(false));
}

#[test]
fn empty_lookup_shows_entity_field_error() {
    let translations = MemoryTranslations::new()
        .with_message("core.validate.field.error.missing", "Product is required");
    let view = order_view(services_with(translations));
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .on("window.form", "initialize")
            .content("window.form", json!({"entityId": 7})),
    );

    assert!(!response.success);
    let lookup = response.component("window.form.product").unwrap();
    assert_eq!(lookup["content"]["value"]["selectedEntityId"], Value::Null);
    assert_eq!(lookup["content"]["required"], json!(true));
    assert_eq!(lookup["messages"][0]["content"], json!("Product is required"));
    assert_eq!(lookup["messages"][0]["type"], json!("failure"));
    assert_eq!(response.content("window.form").unwrap()["valid"], json!(false));
}

#[test]
fn standalone_lookup_select() {
    let services = services();
    let mut view = ViewDefinition::new("picker", "basic", services);
    let window = view
        .add_component_pattern(ComponentPattern::window("window"))
        .unwrap();
    view.add_child_pattern(
        window,
        ComponentPattern::lookup("product")
            .with_model("product")
            .with_option(ComponentOption::value("fieldCode", "number")),
    )
    .unwrap();
    view.initialize().unwrap();

    let response = Pilot::new(&view).event("window.product", "select", ["3"]);
    assert!(response.success);
    let value = &response.content("window.product").unwrap()["value"];
    assert_eq!(value["selectedEntityCode"], json!("XY2"));
    assert_eq!(value["selectedEntityValue"], json!("XY2"));
}

#[test]
fn lookup_popup_view() {
    let view = order_view(services());
    let popup = view.lookup_view_definition("window.form.product").unwrap();

    assert!(popup.is_initialized());
    assert!(popup.get_component_by_path("mainWindow.ribbon").is_some());
    let grid = popup.get_component_by_path("mainWindow.lookupGrid").unwrap();
    assert_eq!(grid.data_definition().unwrap().name(), "product");

    let response = Pilot::new(&popup).event("mainWindow.lookupGrid", "initialize", Vec::<String>::new());
    assert!(response.success);
    let grid = response.content("mainWindow.lookupGrid").unwrap();
    assert_eq!(grid["totalEntities"], json!(3));
    assert_eq!(grid["entities"][1]["fields"]["lookupValue"], json!("XY1 Nut"));

    assert!(matches!(
        view.lookup_view_definition("window.form.number"),
        Err(ViewError::NotALookup(_))
    ));
}

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

#[test]
fn listener_receives_args() {
    let mut view = product_view(services());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    view.add_event_listener(
        "window.form.number",
        "copy",
        Arc::new(move |ctx: &mut EventContext<'_, '_>, args: &[String]| -> Result<(), ViewError> {
            recorder.lock().unwrap().extend(args.iter().cloned());
            if let Some(component) = ctx.component() {
                component.set_field_value(Some(&json!(args.join("-"))))?;
            }
            Ok(())
        }),
    )
    .unwrap();

    let response = Pilot::new(&view).event("window.form.number", "copy", ["arg1", "arg2"]);
    assert!(response.success);
    assert_eq!(*seen.lock().unwrap(), ["arg1", "arg2"]);
    let number = response.component("window.form.number").unwrap();
    assert_eq!(number["content"]["value"], json!("arg1-arg2"));
    assert_eq!(number["updateState"], json!(true));
}

#[test]
fn listener_changes_are_rendered_without_set_field_value() {
    let mut view = ViewDefinition::new("simple", "basic", services());
    view.add_component_pattern(ComponentPattern::field("componentName"))
        .unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    view.add_event_listener(
        "componentName",
        "eventName",
        Arc::new(move |ctx: &mut EventContext<'_, '_>, args: &[String]| -> Result<(), ViewError> {
            recorder.lock().unwrap().push(args.to_vec());
            if let Some(field) = ctx.component().and_then(|c| c.as_field_mut()) {
                field.value = Some("123".into());
            }
            Ok(())
        }),
    )
    .unwrap();
    view.initialize().unwrap();

    let response = Pilot::new(&view).send(&json!({
        "event": {
            "eventName": "eventName",
            "eventComponent": "componentName",
            "eventArgs": ["arg1", "arg2"]
        },
        "components": {"componentName": {"content": {"value": "qwe"}}}
    }));

    assert!(response.success, "{:?}", response.errors);
    assert_eq!(*seen.lock().unwrap(), [vec!["arg1".to_owned(), "arg2".to_owned()]]);
    assert_eq!(
        response.content("componentName").unwrap(),
        &json!({"value": "123", "required": false, "valid": false})
    );
}

#[test]
fn unknown_event_is_an_error_response() {
    let view = product_view(services());
    let response = Pilot::new(&view).event("window.form.number", "explode", Vec::<String>::new());

    assert!(!response.success);
    assert!(response.components.is_empty());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code, "eventNotFound");
    assert_eq!(response.errors[0].component.as_deref(), Some("window.form.number"));
}

#[test]
fn malformed_snapshot_is_a_partial_failure() {
    let view = product_view(services());
    let response = Pilot::new(&view).request(
        RequestBuilder::new()
            .content("window.form.number", json!({"value": "N-1"}))
            .content("window.form.name", json!({"value": ["not", "text"]}))
            .content("window.nothing", json!({})),
    );

    assert!(!response.success);
    let codes: Vec<&str> = response.errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, ["malformedState", "malformedState"]);
    // The well-formed snapshot applied and, being unchanged, is not re-sent.
    let number = response.component("window.form.number").unwrap();
    assert!(number.get("content").is_none());
}

#[test]
fn hooks_see_request_state() {
    let mut view = product_view(services());
    let seen = Arc::new(Mutex::new(Vec::new()));
    // Registered out of phase order, two per phase.
    for (phase, name) in [
        (HookPhase::PreRender, "render1"),
        (HookPhase::PostInitialize, "post1"),
        (HookPhase::PreInitialize, "pre1"),
        (HookPhase::PostInitialize, "post2"),
        (HookPhase::PreInitialize, "pre2"),
        (HookPhase::PreRender, "render2"),
    ] {
        let seen = Arc::clone(&seen);
        view.add_hook(
            phase,
            HookDefinition::new(
                name,
                Arc::new(move |state: &mut ViewDefinitionState<'_>, locale: &Locale| -> Result<(), ViewError> {
                    let value = state
                        .component("window.form.number")
                        .and_then(|c| c.field_value())
                        .unwrap_or(Value::Null);
                    seen.lock().unwrap().push(format!("{name}:{locale}:{value}"));
                    Ok(())
                }),
            ),
        );
    }

    let pilot = Pilot::new(&view).with_locale(Locale::new("pl"));
    let request = RequestBuilder::new()
        .on("window.form", "initialize")
        .content("window.form", json!({"entityId": 2}))
        .content("window.form.number", json!({"value": "N-9"}))
        .build();
    let expected = [
        "pre1:pl:null",
        "pre2:pl:null",
        "post1:pl:\"N-9\"",
        "post2:pl:\"N-9\"",
        "render1:pl:\"XY1\"",
        "render2:pl:\"XY1\"",
    ];

    let response = pilot.send(&request);
    assert!(response.success);
    assert_eq!(*seen.lock().unwrap(), expected);

    // Every hook runs once per request.
    seen.lock().unwrap().clear();
    let response = pilot.send(&request);
    assert!(response.success);
    assert_eq!(*seen.lock().unwrap(), expected);
}

#[test]
fn failing_hook_aborts_request() {
    let mut view = product_view(services());
    view.add_pre_render_hook(HookDefinition::new(
        "deny",
        Arc::new(|_: &mut ViewDefinitionState<'_>, _: &Locale| -> Result<(), ViewError> {
            Err(ViewError::hook("deny", "not allowed"))
        }),
    ));

    let response = Pilot::new(&view).broadcast("initialize");
    assert!(!response.success);
    assert_eq!(response.errors[0].code, "hookFailed");
}

#[test]
fn cyclic_sources_fail_initialization() {
    let mut view = ViewDefinition::new("cycle", "basic", services());
    let window = view
        .add_component_pattern(ComponentPattern::window("window"))
        .unwrap();
    view.add_child_pattern(window, ComponentPattern::field("a").with_source("#{window.b}"))
        .unwrap();
    view.add_child_pattern(window, ComponentPattern::field("b").with_source("#{window.a}"))
        .unwrap();

    match view.initialize() {
        Err(ViewError::DependencyCycle { view, pending }) => {
            assert_eq!(view, "cycle");
            assert_eq!(pending, ["window.a", "window.b"]);
        }
        other => panic!("expected a dependency cycle, got {other:?}"),
    }

    let response = Pilot::new(&view).broadcast("initialize");
    assert_eq!(response.errors[0].code, "notInitialized");
}

#[test]
fn response_serializes_to_client_shape() {
    let view = product_view(services());
    let response = Pilot::new(&view).broadcast("noop");
    let body = response.to_value();

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["errors"], json!([]));
    let window = &body["components"]["window"];
    assert_eq!(window["enabled"], json!(true));
    assert!(window["components"]["form"]["components"]["number"]["content"].is_object());
}

// ---------------------------------------------------------------------------
// Translations
// ---------------------------------------------------------------------------

#[test]
fn translations_fall_back_to_entity_field_codes() {
    let translations = MemoryTranslations::new()
        .with_message("basic.orderDetails.window.form.number.label", "Order no.")
        .with_message("basic.order.product.label", "Product")
        .with_message("basic.order.product.focus", "Type a code");
    let view = order_view(services_with(translations));

    let labels = view.translations(&Locale::default());
    assert_eq!(labels["basic.orderDetails.window.form.number.label"], "Order no.");
    assert_eq!(labels["basic.orderDetails.window.form.product.label"], "Product");
    assert_eq!(labels["basic.orderDetails.window.form.product.focus"], "Type a code");
    assert_eq!(
        labels["basic.orderDetails.window.label"],
        "basic.orderDetails.window.label"
    );
}
