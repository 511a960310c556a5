//! Component patterns: the static, per-definition side of a component.
//!
//! A [`ComponentPattern`] is created once when a view is defined. It holds
//! identity (name, dotted path, parent link), the declarative references
//! (`field`, `source`, `model`), the raw options, custom event listeners and,
//! after initialization, its [`Resolution`] and typed options. Widget
//! behavior is selected by [`PatternKind`].

pub mod options;
pub mod resolve;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use options::{ComponentOption, OptionError};
pub use resolve::{Resolution, SourceBinding};

use crate::components::field::FieldOptions;
use crate::components::form::FormOptions;
use crate::components::grid::GridOptions;
use crate::components::lookup::LookupOptions;
use crate::components::ribbon::Ribbon;
use crate::components::window::WindowOptions;
use crate::model::{DataDefinition, FieldDefinition};
use crate::state::{ComponentState, StateKind};
use crate::tree::PatternId;
use crate::view::EventListener;

// ---------------------------------------------------------------------------
// PatternKind
// ---------------------------------------------------------------------------

/// The closed set of widget kinds, each carrying its typed options.
///
/// Options hold defaults until the pattern is initialized.
#[derive(Debug, Clone)]
pub enum PatternKind {
    Field(FieldOptions),
    Lookup(LookupOptions),
    Grid(GridOptions),
    Form(FormOptions),
    Window(WindowOptions),
    Ribbon(Ribbon),
}

impl PatternKind {
    /// Name used in error messages and translations.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Field(_) => "field",
            Self::Lookup(_) => "lookup",
            Self::Grid(_) => "grid",
            Self::Form(_) => "form",
            Self::Window(_) => "window",
            Self::Ribbon(_) => "ribbon",
        }
    }

    /// Only containers accept child patterns.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Form(_) | Self::Window(_))
    }

    /// Whether initialization fails without a data definition.
    pub fn requires_data_definition(&self) -> bool {
        matches!(self, Self::Lookup(_) | Self::Grid(_) | Self::Form(_))
    }

    /// Parse raw options into the typed options of this kind.
    fn configure(&mut self, path: &str, options: &[ComponentOption]) -> Result<(), OptionError> {
        match self {
            Self::Field(typed) => *typed = FieldOptions::parse(path, options)?,
            Self::Lookup(typed) => *typed = LookupOptions::parse(path, options)?,
            Self::Grid(typed) => *typed = GridOptions::parse(path, options)?,
            Self::Form(typed) => *typed = FormOptions::parse(path, options)?,
            Self::Window(typed) => *typed = WindowOptions::parse(path, options)?,
            Self::Ribbon(_) => {
                if let Some(option) = options.first() {
                    return Err(options::OptionReader::new(path, "ribbon").unknown(option));
                }
            }
        }
        Ok(())
    }

    fn create_state(&self) -> StateKind {
        match self {
            Self::Field(options) => StateKind::Field(options.create_state()),
            Self::Lookup(_) => StateKind::Lookup(Default::default()),
            Self::Grid(options) => StateKind::Grid(options.create_state()),
            Self::Form(_) => StateKind::Form(Default::default()),
            Self::Window(_) => StateKind::Window(Default::default()),
            Self::Ribbon(ribbon) => StateKind::Ribbon(ribbon.create_state()),
        }
    }
}

// ---------------------------------------------------------------------------
// ComponentPattern
// ---------------------------------------------------------------------------

/// Static definition of one component.
#[derive(Clone)]
pub struct ComponentPattern {
    name: String,
    path: String,
    parent: Option<PatternId>,
    field_path: Option<String>,
    source: Option<String>,
    model: Option<String>,
    options: Vec<ComponentOption>,
    listeners: HashMap<String, Vec<EventListener>>,
    kind: PatternKind,
    resolution: Option<Resolution>,
}

impl ComponentPattern {
    /// A pattern of the given kind. Its path is assigned when it is added to
    /// a tree.
    pub fn new(name: impl Into<String>, kind: PatternKind) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            parent: None,
            field_path: None,
            source: None,
            model: None,
            options: Vec::new(),
            listeners: HashMap::new(),
            kind,
            resolution: None,
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, PatternKind::Field(FieldOptions::default()))
    }

    pub fn lookup(name: impl Into<String>) -> Self {
        Self::new(name, PatternKind::Lookup(LookupOptions::default()))
    }

    pub fn grid(name: impl Into<String>) -> Self {
        Self::new(name, PatternKind::Grid(GridOptions::default()))
    }

    pub fn form(name: impl Into<String>) -> Self {
        Self::new(name, PatternKind::Form(FormOptions::default()))
    }

    pub fn window(name: impl Into<String>) -> Self {
        Self::new(name, PatternKind::Window(WindowOptions::default()))
    }

    pub fn ribbon(name: impl Into<String>, ribbon: Ribbon) -> Self {
        Self::new(name, PatternKind::Ribbon(ribbon))
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Bind to a field of the scope data definition.
    pub fn with_field_path(mut self, field: impl Into<String>) -> Self {
        self.field_path = Some(field.into());
        self
    }

    /// Depend on another component: `#{path}` or `#{path}.field`.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Use an explicit data definition of the view's plugin.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_option(mut self, option: ComponentOption) -> Self {
        self.options.push(option);
        self
    }

    /// Run `listener` after the built-in handler of `event`.
    pub fn with_listener(mut self, event: impl Into<String>, listener: EventListener) -> Self {
        self.add_listener(event, listener);
        self
    }

    pub fn add_listener(&mut self, event: impl Into<String>, listener: EventListener) {
        self.listeners.entry(event.into()).or_default().push(listener);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Globally unique dotted path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<PatternId> {
        self.parent
    }

    pub fn field_path(&self) -> Option<&str> {
        self.field_path.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn options(&self) -> &[ComponentOption] {
        &self.options
    }

    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Listeners registered for `event`, in registration order.
    pub fn listeners(&self, event: &str) -> &[EventListener] {
        self.listeners
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_initialized(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    pub fn data_definition(&self) -> Option<&Arc<dyn DataDefinition>> {
        self.resolution.as_ref()?.data_definition.as_ref()
    }

    pub fn field_definition(&self) -> Option<&FieldDefinition> {
        self.resolution.as_ref()?.field_definition.as_ref()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Called by the tree when the pattern is inserted.
    pub(crate) fn attach(&mut self, path: String, parent: Option<PatternId>) {
        self.path = path;
        self.parent = parent;
    }

    /// Parse typed options and store the resolution. Marks the pattern
    /// initialized.
    pub(crate) fn complete(&mut self, resolution: Resolution) -> Result<(), OptionError> {
        self.kind.configure(&self.path, &self.options)?;
        self.resolution = Some(resolution);
        Ok(())
    }

    /// Fresh state for one request.
    pub fn instantiate_state(&self) -> ComponentState {
        ComponentState::new(self.path.clone(), self.kind.create_state())
    }
}

impl fmt::Debug for ComponentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentPattern")
            .field("path", &self.path)
            .field("kind", &self.kind.type_name())
            .field("field_path", &self.field_path)
            .field("source", &self.source)
            .field("model", &self.model)
            .field("options", &self.options)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
