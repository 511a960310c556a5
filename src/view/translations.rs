//! Component label translations.

use std::collections::BTreeMap;

use super::ViewDefinition;
use crate::model::Locale;
use crate::pattern::{ComponentPattern, PatternKind};

/// Translate `<plugin>.<view>.<path>.label` for every component, falling
/// back to the entity field code `<plugin>.<entity>.<field>.label`. Lookups
/// also get the matching `.focus` codes.
pub(super) fn collect(view: &ViewDefinition, locale: &Locale) -> BTreeMap<String, String> {
    let translations = &view.services().translations;
    let mut result = BTreeMap::new();
    for id in view.tree().depth_first() {
        let Some(pattern) = view.tree().get(id) else {
            continue;
        };
        let mut suffixes = vec!["label"];
        if matches!(pattern.kind(), PatternKind::Lookup(_)) {
            suffixes.push("focus");
        }
        for suffix in suffixes {
            let codes = codes(view, pattern, suffix);
            let text = translations.translate(&codes, locale);
            if let Some(code) = codes.into_iter().next() {
                result.insert(code, text);
            }
        }
    }
    result
}

fn codes(view: &ViewDefinition, pattern: &ComponentPattern, suffix: &str) -> Vec<String> {
    let mut codes = vec![format!(
        "{}.{}.{}.{suffix}",
        view.plugin_identifier(),
        view.name(),
        pattern.path()
    )];
    let field_scope = pattern.resolution().and_then(|r| r.field_scope.as_ref());
    if let Some((scope, field)) = field_scope.zip(pattern.field_path()) {
        codes.push(format!(
            "{}.{}.{field}.{suffix}",
            scope.plugin_identifier(),
            scope.name()
        ));
    }
    codes
}
