//! Pilot: programmatic requests against an initialized view.
//!
//! The `Pilot` builds request payloads the way the browser client does and
//! sends them through [`ViewDefinition::perform_event`], so tests exercise
//! the full decode → hooks → dispatch → render pipeline.

use serde_json::{json, Map, Value};

use crate::model::Locale;
use crate::view::{ViewDefinition, ViewResponse};

// ---------------------------------------------------------------------------
// RequestBuilder
// ---------------------------------------------------------------------------

/// Builder for a request body.
///
/// # Examples
///
/// ```ignore
/// let request = RequestBuilder::new()
///     .on("window.grid", "select")
///     .args(["13"])
///     .content("window.grid", json!({"firstEntity": 0}))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    event: Option<(Option<String>, String)>,
    args: Vec<Value>,
    components: Map<String, Value>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target `event` at the component at `path`.
    pub fn on(mut self, path: &str, event: &str) -> Self {
        self.event = Some((Some(path.to_owned()), event.to_owned()));
        self
    }

    /// Broadcast `event` to every component.
    pub fn broadcast(mut self, event: &str) -> Self {
        self.event = Some((None, event.to_owned()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(|arg| Value::String(arg.into())).collect();
        self
    }

    /// Content snapshot of the component at `path`.
    pub fn content(self, path: &str, content: Value) -> Self {
        self.snapshot(path, json!({ "content": content }))
    }

    /// Full snapshot (`content`, `enabled`, `visible`, nested `components`).
    pub fn snapshot(mut self, path: &str, snapshot: Value) -> Self {
        self.components.insert(path.to_owned(), snapshot);
        self
    }

    pub fn build(self) -> Value {
        let mut request = Map::new();
        if let Some((component, name)) = self.event {
            request.insert(
                "event".into(),
                json!({
                    "eventName": name,
                    "eventComponent": component,
                    "eventArgs": self.args,
                }),
            );
        }
        request.insert("components".into(), Value::Object(self.components));
        Value::Object(request)
    }
}

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A request driver for one view.
pub struct Pilot<'v> {
    view: &'v ViewDefinition,
    locale: Locale,
}

impl<'v> Pilot<'v> {
    pub fn new(view: &'v ViewDefinition) -> Self {
        Self {
            view,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn view(&self) -> &'v ViewDefinition {
        self.view
    }

    /// Send a raw request body.
    pub fn send(&self, request: &Value) -> ViewResponse {
        self.view.perform_event(request, &self.locale)
    }

    /// Send a built request.
    pub fn request(&self, builder: RequestBuilder) -> ViewResponse {
        self.send(&builder.build())
    }

    /// Send `event` to `path` with `args` and no snapshots.
    pub fn event<I, S>(&self, path: &str, event: &str, args: I) -> ViewResponse
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(RequestBuilder::new().on(path, event).args(args))
    }

    /// Broadcast `event` with no snapshots.
    pub fn broadcast(&self, event: &str) -> ViewResponse {
        self.request(RequestBuilder::new().broadcast(event))
    }
}
