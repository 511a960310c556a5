//! Raw declarative options and the helpers that turn them into typed options.
//!
//! A [`ComponentOption`] is what a view definition file declares: an option
//! kind (`required`, `column`, `fieldCode`...) plus a bag of string
//! attributes. Each widget parses its options once, when its pattern is
//! initialized, and rejects anything it does not understand.

use std::collections::BTreeMap;

use crate::binding::{Expression, ExpressionError};

/// Attribute holding the value of single-valued options.
pub const VALUE_ATTRIBUTE: &str = "value";

// ---------------------------------------------------------------------------
// ComponentOption
// ---------------------------------------------------------------------------

/// One declarative option of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOption {
    kind: String,
    attributes: BTreeMap<String, String>,
}

impl ComponentOption {
    /// An option with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// An option with a single `value` attribute.
    pub fn value(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(kind).with_attribute(VALUE_ATTRIBUTE, value)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `value` attribute.
    pub fn raw_value(&self) -> Option<&str> {
        self.attribute(VALUE_ATTRIBUTE)
    }
}

// ---------------------------------------------------------------------------
// OptionError
// ---------------------------------------------------------------------------

/// Errors from typed option parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("unknown option `{option}` on {component_type} `{component}`")]
    Unknown {
        component: String,
        component_type: &'static str,
        option: String,
    },
    #[error("option `{option}` of `{component}` is missing attribute `{attribute}`")]
    MissingAttribute {
        component: String,
        option: String,
        attribute: String,
    },
    #[error("option `{option}` of `{component}` has invalid value `{value}`, expected {expected}")]
    InvalidValue {
        component: String,
        option: String,
        value: String,
        expected: &'static str,
    },
    #[error("option `{option}` of `{component}` has an invalid expression")]
    Expression {
        component: String,
        option: String,
        #[source]
        source: ExpressionError,
    },
}

// ---------------------------------------------------------------------------
// OptionReader
// ---------------------------------------------------------------------------

/// Typed accessors over raw options, bound to the component being parsed so
/// every error names it.
pub(crate) struct OptionReader<'a> {
    component: &'a str,
    component_type: &'static str,
}

impl<'a> OptionReader<'a> {
    pub(crate) fn new(component: &'a str, component_type: &'static str) -> Self {
        Self {
            component,
            component_type,
        }
    }

    pub(crate) fn unknown(&self, option: &ComponentOption) -> OptionError {
        OptionError::Unknown {
            component: self.component.to_owned(),
            component_type: self.component_type,
            option: option.kind().to_owned(),
        }
    }

    /// A mandatory attribute.
    pub(crate) fn attribute<'o>(
        &self,
        option: &'o ComponentOption,
        name: &str,
    ) -> Result<&'o str, OptionError> {
        option
            .attribute(name)
            .ok_or_else(|| OptionError::MissingAttribute {
                component: self.component.to_owned(),
                option: option.kind().to_owned(),
                attribute: name.to_owned(),
            })
    }

    pub(crate) fn string(&self, option: &ComponentOption) -> Result<String, OptionError> {
        self.attribute(option, VALUE_ATTRIBUTE).map(str::to_owned)
    }

    pub(crate) fn bool(&self, option: &ComponentOption) -> Result<bool, OptionError> {
        let value = self.attribute(option, VALUE_ATTRIBUTE)?;
        self.parse_bool(option, value)
    }

    /// An optional boolean attribute other than `value`.
    pub(crate) fn bool_attribute(
        &self,
        option: &ComponentOption,
        name: &str,
        default: bool,
    ) -> Result<bool, OptionError> {
        match option.attribute(name) {
            Some(value) => self.parse_bool(option, value),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, option: &ComponentOption, value: &str) -> Result<bool, OptionError> {
        match value {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.invalid(option, other, "`true` or `false`")),
        }
    }

    pub(crate) fn u32(&self, option: &ComponentOption) -> Result<u32, OptionError> {
        let value = self.attribute(option, VALUE_ATTRIBUTE)?;
        self.parse_u32(option, value)
    }

    /// An optional unsigned attribute other than `value`.
    pub(crate) fn u32_attribute(
        &self,
        option: &ComponentOption,
        name: &str,
    ) -> Result<Option<u32>, OptionError> {
        option
            .attribute(name)
            .map(|value| self.parse_u32(option, value))
            .transpose()
    }

    fn parse_u32(&self, option: &ComponentOption, value: &str) -> Result<u32, OptionError> {
        value
            .trim()
            .parse()
            .map_err(|_| self.invalid(option, value, "an unsigned integer"))
    }

    /// Comma separated list, blanks dropped.
    pub(crate) fn list(&self, option: &ComponentOption) -> Result<Vec<String>, OptionError> {
        let value = self.attribute(option, VALUE_ATTRIBUTE)?;
        Ok(split_list(value))
    }

    pub(crate) fn expression(&self, option: &ComponentOption) -> Result<Expression, OptionError> {
        let value = self.attribute(option, VALUE_ATTRIBUTE)?;
        self.parse_expression(option, value)
    }

    pub(crate) fn parse_expression(
        &self,
        option: &ComponentOption,
        value: &str,
    ) -> Result<Expression, OptionError> {
        Expression::parse(value).map_err(|source| OptionError::Expression {
            component: self.component.to_owned(),
            option: option.kind().to_owned(),
            source,
        })
    }

    pub(crate) fn invalid(
        &self,
        option: &ComponentOption,
        value: &str,
        expected: &'static str,
    ) -> OptionError {
        OptionError::InvalidValue {
            component: self.component.to_owned(),
            option: option.kind().to_owned(),
            value: value.to_owned(),
            expected,
        }
    }
}

/// Split `a, b,,c` into `["a", "b", "c"]`.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
