//! Window: the top-level container of a view.

use serde_json::{json, Value};

use crate::model::Locale;
use crate::pattern::options::OptionReader;
use crate::pattern::{ComponentOption, ComponentPattern, OptionError};
use crate::state::{Content, ContentState, StateError};
use crate::view::ViewDefinition;

/// Typed options of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub fixed_height: bool,
    /// Whether the window shows a translated header.
    pub header: bool,
    pub min_width: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            fixed_height: false,
            header: true,
            min_width: true,
            width: None,
            height: None,
        }
    }
}

impl WindowOptions {
    pub fn parse(path: &str, options: &[ComponentOption]) -> Result<Self, OptionError> {
        let reader = OptionReader::new(path, "window");
        let mut parsed = Self::default();
        for option in options {
            match option.kind() {
                "fixedHeight" => parsed.fixed_height = reader.bool(option)?,
                "header" => parsed.header = reader.bool(option)?,
                "minWidth" => parsed.min_width = reader.bool(option)?,
                "width" => parsed.width = Some(reader.u32(option)?),
                "height" => parsed.height = Some(reader.u32(option)?),
                _ => return Err(reader.unknown(option)),
            }
        }
        Ok(parsed)
    }
}

/// Header text of a new window state: `<plugin>.<view>.<path>.header`.
pub fn initial_header(
    view: &ViewDefinition,
    pattern: &ComponentPattern,
    options: &WindowOptions,
    locale: &Locale,
) -> Option<String> {
    options.header.then(|| {
        let code = format!(
            "{}.{}.{}.header",
            view.plugin_identifier(),
            view.name(),
            pattern.path()
        );
        view.services().translations.translate_code(&code, locale)
    })
}

/// Live state of a window: `{"header": str|null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowState {
    pub header: Option<String>,
}

impl ContentState for WindowState {
    fn initialize_content(&mut self, content: &Content<'_>) -> Result<(), StateError> {
        if content.contains("header") {
            self.header = content.string("header")?;
        }
        Ok(())
    }

    fn render_content(&self) -> Value {
        json!({ "header": self.header })
    }
}
