//! Translation service interface and locale handling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A locale tag such as `en` or `pl`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message code plus positional variables (`{0}`, `{1}`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub code: String,
    pub vars: Vec<String>,
}

impl ErrorMessage {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            vars: Vec::new(),
        }
    }

    pub fn with_var(mut self, var: impl Into<String>) -> Self {
        self.vars.push(var.into());
        self
    }
}

/// Message lookup by code.
pub trait TranslationService: Send + Sync {
    /// Translate the first code that has a message. Falls back to the first
    /// code itself when none is known.
    fn translate(&self, codes: &[String], locale: &Locale) -> String;

    fn translate_code(&self, code: &str, locale: &Locale) -> String {
        self.translate(&[code.to_owned()], locale)
    }

    /// Translate an error message and substitute its variables.
    fn translate_error(&self, message: &ErrorMessage, locale: &Locale) -> String {
        let mut text = self.translate_code(&message.code, locale);
        for (index, var) in message.vars.iter().enumerate() {
            text = text.replace(&format!("{{{index}}}"), var);
        }
        text
    }
}
