//! Field: a single scalar value bound to an entity field.

use serde_json::{json, Value};

use crate::binding::{BindingContext, ViewValue};
use crate::pattern::options::OptionReader;
use crate::pattern::{ComponentOption, ComponentPattern, OptionError};
use crate::state::{Content, ContentState, StateError};

/// Typed options of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Value shown when creating an entity.
    pub default_value: Option<String>,
    pub required: bool,
    pub read_only: bool,
}

impl FieldOptions {
    pub fn parse(path: &str, options: &[ComponentOption]) -> Result<Self, OptionError> {
        let reader = OptionReader::new(path, "field");
        let mut parsed = Self::default();
        for option in options {
            match option.kind() {
                "defaultValue" => parsed.default_value = Some(reader.string(option)?),
                "required" => parsed.required = reader.bool(option)?,
                "readOnly" => parsed.read_only = reader.bool(option)?,
                _ => return Err(reader.unknown(option)),
            }
        }
        Ok(parsed)
    }

    pub fn create_state(&self) -> FieldState {
        FieldState {
            value: self.default_value.clone(),
            required: self.required,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldState
// ---------------------------------------------------------------------------

/// Live state of a field.
///
/// Content: `{"value": str|null, "required": bool, "valid": bool}`. `valid`
/// is rendered equal to `required`; it is not an independent validity flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: Option<String>,
    pub required: bool,
}

impl ContentState for FieldState {
    fn initialize_content(&mut self, content: &Content<'_>) -> Result<(), StateError> {
        content.required("value")?;
        self.value = content.string("value")?;
        if let Some(required) = content.bool("required")? {
            self.required = required;
        }
        Ok(())
    }

    fn render_content(&self) -> Value {
        json!({
            "value": self.value,
            "required": self.required,
            "valid": self.required,
        })
    }

    fn field_value(&self) -> Option<Value> {
        Some(self.value.clone().map_or(Value::Null, Value::String))
    }

    fn set_field_value(&mut self, value: Option<&Value>) -> Result<bool, String> {
        self.value = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(value @ (Value::Number(_) | Value::Bool(_))) => Some(value.to_string()),
            Some(other) => return Err(format!("a field value must be a scalar, got {other}")),
        };
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Display value of a field derived from the bound entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldData {
    pub value: Option<String>,
    pub required: bool,
}

/// Derive a field's value for the current binding pass.
///
/// Client-edited fields keep the value they were sent with; other fields
/// read the entity, falling back to `defaultValue` in create mode.
pub fn component_value(
    pattern: &ComponentPattern,
    options: &FieldOptions,
    current: &FieldState,
    binding: &BindingContext<'_>,
) -> ViewValue<FieldData> {
    let field = pattern.field_definition();
    let value = if binding.paths_to_update.contains(pattern.path()) {
        current.value.clone()
    } else {
        let from_entity = binding
            .entity
            .zip(pattern.field_path())
            .and_then(|(entity, field)| entity.text(field));
        match from_entity {
            Some(value) => Some(value),
            None if binding.is_create() => options.default_value.clone(),
            None => None,
        }
    };

    let mut view_value = ViewValue::new(FieldData {
        value,
        required: options.required || binding.is_required(field),
    });
    view_value.set_enabled(!(options.read_only || binding.is_read_only(field)));
    if let Some(error) = pattern
        .field_path()
        .and_then(|field| binding.field_error(binding.entity, field))
    {
        view_value.add_error_message(error);
    }
    view_value
}
