//! Ribbon: grouped action buttons, supplied as a model rather than options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{Content, ContentState, StateError};

/// Size of a ribbon button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RibbonItemType {
    #[default]
    BigButton,
    SmallButton,
}

/// One ribbon button. `action` is a client-side script reference such as
/// `#{mainWindow}.performClose`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibbonActionItem {
    pub name: String,
    pub icon: Option<String>,
    pub action: Option<String>,
    #[serde(rename = "type")]
    pub item_type: RibbonItemType,
    pub enabled: bool,
}

impl RibbonActionItem {
    pub fn new(name: impl Into<String>, item_type: RibbonItemType) -> Self {
        Self {
            name: name.into(),
            icon: None,
            action: None,
            item_type,
            enabled: true,
        }
    }

    pub fn big_button(name: impl Into<String>) -> Self {
        Self::new(name, RibbonItemType::BigButton)
    }

    pub fn small_button(name: impl Into<String>) -> Self {
        Self::new(name, RibbonItemType::SmallButton)
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// A named group of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibbonGroup {
    pub name: String,
    pub items: Vec<RibbonActionItem>,
}

impl RibbonGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: RibbonActionItem) -> Self {
        self.items.push(item);
        self
    }
}

/// The ribbon model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ribbon {
    pub groups: Vec<RibbonGroup>,
}

impl Ribbon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: RibbonGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn item(&self, group: &str, item: &str) -> Option<&RibbonActionItem> {
        self.groups
            .iter()
            .find(|g| g.name == group)?
            .items
            .iter()
            .find(|i| i.name == item)
    }

    fn item_mut(&mut self, group: &str, item: &str) -> Option<&mut RibbonActionItem> {
        self.groups
            .iter_mut()
            .find(|g| g.name == group)?
            .items
            .iter_mut()
            .find(|i| i.name == item)
    }

    pub(crate) fn create_state(&self) -> RibbonState {
        RibbonState {
            ribbon: self.clone(),
        }
    }
}

/// Live state of a ribbon: the model with per-request enabled flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RibbonState {
    pub ribbon: Ribbon,
}

impl RibbonState {
    /// Enable or disable one button. Returns `false` if it does not exist.
    pub fn set_item_enabled(&mut self, group: &str, item: &str, enabled: bool) -> bool {
        match self.ribbon.item_mut(group, item) {
            Some(found) => {
                found.enabled = enabled;
                true
            }
            None => false,
        }
    }
}

impl ContentState for RibbonState {
    /// Incoming content may only toggle `enabled` on existing buttons.
    fn initialize_content(&mut self, content: &Content<'_>) -> Result<(), StateError> {
        for group in content.array("groups")?.unwrap_or_default() {
            let group = Content::new(content.path(), group)?;
            let group_name = group
                .string("name")?
                .ok_or_else(|| group.malformed("ribbon group without `name`"))?;
            for item in group.array("items")?.unwrap_or_default() {
                let item = Content::new(content.path(), item)?;
                let item_name = item
                    .string("name")?
                    .ok_or_else(|| item.malformed("ribbon item without `name`"))?;
                let Some(enabled) = item.bool("enabled")? else {
                    continue;
                };
                if !self.set_item_enabled(&group_name, &item_name, enabled) {
                    return Err(item.malformed(format!(
                        "unknown ribbon item `{group_name}.{item_name}`"
                    )));
                }
            }
        }
        Ok(())
    }

    fn render_content(&self) -> Value {
        serde_json::to_value(&self.ribbon).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ribbon() -> Ribbon {
        Ribbon::new().with_group(
            RibbonGroup::new("actions")
                .with_item(RibbonActionItem::big_button("save").with_icon("saveIcon24.png"))
                .with_item(RibbonActionItem::small_button("delete")),
        )
    }

    #[test]
    fn renders_model() {
        let state = ribbon().create_state();
        assert_eq!(
            state.render_content(),
            json!({"groups": [{
                "name": "actions",
                "items": [
                    {"name": "save", "icon": "saveIcon24.png", "action": null, "type": "BIG_BUTTON", "enabled": true},
                    {"name": "delete", "icon": null, "action": null, "type": "SMALL_BUTTON", "enabled": true}
                ]
            }]})
        );
    }

    #[test]
    fn content_toggles_enabled() {
        let mut state = ribbon().create_state();
        let payload = json!({"groups": [{"name": "actions", "items": [{"name": "delete", "enabled": false}]}]});
        state
            .initialize_content(&Content::new("ribbon", &payload).unwrap())
            .unwrap();
        assert!(!state.ribbon.item("actions", "delete").unwrap().enabled);
        assert!(state.ribbon.item("actions", "save").unwrap().enabled);
    }

    #[test]
    fn unknown_item_is_malformed() {
        let mut state = ribbon().create_state();
        let payload = json!({"groups": [{"name": "actions", "items": [{"name": "print", "enabled": false}]}]});
        assert!(state
            .initialize_content(&Content::new("ribbon", &payload).unwrap())
            .is_err());
    }
}
