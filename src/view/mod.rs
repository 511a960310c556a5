//! View definitions: the pattern tree, hooks and the request entry point.
//!
//! A [`ViewDefinition`] is built once: patterns are added, hooks and
//! listeners registered, then [`ViewDefinition::initialize`] resolves every
//! pattern. At request time [`ViewDefinition::perform_event`] runs the fixed
//! pipeline: decode, pre-initialize hooks, apply snapshots, post-initialize
//! hooks, dispatch, pre-render hooks, render.

pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod request;
pub mod state;
mod translations;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

pub use dispatch::{EventContext, EventListener};
pub use error::ViewError;
pub use hooks::{HookDefinition, HookFn, HookPhase, Hooks};
pub use request::{EventRequest, ResponseError, ViewRequest, ViewResponse};
pub use state::ViewDefinitionState;

use crate::components::lookup;
use crate::config::ViewConfig;
use crate::model::{DataDefinition, DataModel, Locale, TranslationService};
use crate::pattern::resolve::{self, ResolveScope};
use crate::pattern::ComponentPattern;
use crate::tree::{PatternId, PatternTree};

/// Collaborators a view consumes.
#[derive(Clone)]
pub struct ViewServices {
    pub model: Arc<dyn DataModel>,
    pub translations: Arc<dyn TranslationService>,
}

impl ViewServices {
    pub fn new(model: Arc<dyn DataModel>, translations: Arc<dyn TranslationService>) -> Self {
        Self {
            model,
            translations,
        }
    }
}

impl fmt::Debug for ViewServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewServices")
    }
}

// ---------------------------------------------------------------------------
// ViewDefinition
// ---------------------------------------------------------------------------

/// A named view: pattern tree, hooks and collaborators.
#[derive(Debug)]
pub struct ViewDefinition {
    name: String,
    plugin_identifier: String,
    data_definition: Option<Arc<dyn DataDefinition>>,
    menu_accessible: bool,
    services: ViewServices,
    config: ViewConfig,
    tree: PatternTree,
    hooks: Hooks,
    initialized: bool,
    initialization_passes: usize,
}

impl ViewDefinition {
    pub fn new(
        name: impl Into<String>,
        plugin_identifier: impl Into<String>,
        services: ViewServices,
    ) -> Self {
        Self {
            name: name.into(),
            plugin_identifier: plugin_identifier.into(),
            data_definition: None,
            menu_accessible: false,
            services,
            config: ViewConfig::default(),
            tree: PatternTree::new(),
            hooks: Hooks::default(),
            initialized: false,
            initialization_passes: 0,
        }
    }

    /// Data definition root patterns resolve their fields in.
    pub fn with_data_definition(mut self, data_definition: Arc<dyn DataDefinition>) -> Self {
        self.data_definition = Some(data_definition);
        self
    }

    pub fn with_menu_accessible(mut self, menu_accessible: bool) -> Self {
        self.menu_accessible = menu_accessible;
        self
    }

    pub fn with_config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin_identifier(&self) -> &str {
        &self.plugin_identifier
    }

    pub fn data_definition(&self) -> Option<&Arc<dyn DataDefinition>> {
        self.data_definition.as_ref()
    }

    pub fn is_menu_accessible(&self) -> bool {
        self.menu_accessible
    }

    pub fn services(&self) -> &ViewServices {
        &self.services
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn tree(&self) -> &PatternTree {
        &self.tree
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Full passes the last successful `initialize` needed.
    pub fn initialization_passes(&self) -> usize {
        self.initialization_passes
    }

    // ── Definition ───────────────────────────────────────────────────

    /// Add a root pattern.
    pub fn add_component_pattern(
        &mut self,
        pattern: ComponentPattern,
    ) -> Result<PatternId, ViewError> {
        self.initialized = false;
        self.tree.insert_root(pattern)
    }

    /// Add a pattern under the container `parent`.
    pub fn add_child_pattern(
        &mut self,
        parent: PatternId,
        pattern: ComponentPattern,
    ) -> Result<PatternId, ViewError> {
        self.initialized = false;
        self.tree.insert_child(parent, pattern)
    }

    /// Pattern at a dotted path, walking the tree segment by segment.
    pub fn get_component_by_path(&self, path: &str) -> Option<&ComponentPattern> {
        self.tree.get(self.tree.resolve_path(path)?)
    }

    pub fn add_hook(&mut self, phase: HookPhase, hook: HookDefinition) {
        self.hooks.add(phase, hook);
    }

    pub fn add_pre_initialize_hook(&mut self, hook: HookDefinition) {
        self.add_hook(HookPhase::PreInitialize, hook);
    }

    pub fn add_post_initialize_hook(&mut self, hook: HookDefinition) {
        self.add_hook(HookPhase::PostInitialize, hook);
    }

    pub fn add_pre_render_hook(&mut self, hook: HookDefinition) {
        self.add_hook(HookPhase::PreRender, hook);
    }

    /// Attach a custom listener to the component at `path`.
    pub fn add_event_listener(
        &mut self,
        path: &str,
        event: impl Into<String>,
        listener: EventListener,
    ) -> Result<(), ViewError> {
        let id = self
            .tree
            .find(path)
            .ok_or_else(|| ViewError::ComponentNotFound(path.to_owned()))?;
        match self.tree.get_mut(id) {
            Some(pattern) => {
                pattern.add_listener(event, listener);
                Ok(())
            }
            None => Err(ViewError::ComponentNotFound(path.to_owned())),
        }
    }

    // ── Initialization ───────────────────────────────────────────────

    /// Resolve every pattern.
    ///
    /// Runs full passes over the tree in depth-first order until every
    /// pattern is resolved. After `max_stalled_passes` consecutive passes
    /// without progress the remaining patterns form a dependency cycle.
    pub fn initialize(&mut self) -> Result<(), ViewError> {
        if self.initialized {
            return Ok(());
        }
        let order = self.tree.depth_first();
        let scope = ResolveScope {
            plugin_identifier: &self.plugin_identifier,
            data_definition: self.data_definition.as_ref(),
            model: self.services.model.as_ref(),
        };

        let mut passes = 0;
        let mut stalled = 0;
        loop {
            passes += 1;
            let mut progress = false;
            let mut pending = Vec::new();
            for &id in &order {
                if self.tree.get(id).is_some_and(ComponentPattern::is_initialized) {
                    continue;
                }
                if resolve::initialize(&mut self.tree, id, &scope)? {
                    progress = true;
                } else if let Some(pattern) = self.tree.get(id) {
                    pending.push(pattern.path().to_owned());
                }
            }
            debug!(view = %self.name, pass = passes, pending = pending.len(), "initialization pass");

            if pending.is_empty() {
                break;
            }
            if progress {
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= self.config.max_stalled_passes {
                    warn!(view = %self.name, ?pending, "dependency cycle");
                    return Err(ViewError::DependencyCycle {
                        view: self.name.clone(),
                        pending,
                    });
                }
            }
        }
        self.initialized = true;
        self.initialization_passes = passes;
        Ok(())
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Fresh per-request state of every component.
    pub fn instantiate(&self, locale: Locale) -> Result<ViewDefinitionState<'_>, ViewError> {
        if !self.initialized {
            return Err(ViewError::NotInitialized(self.name.clone()));
        }
        Ok(ViewDefinitionState::new(self, locale))
    }

    /// Handle one JSON request. Fatal errors become an error response.
    pub fn perform_event(&self, request: &Value, locale: &Locale) -> ViewResponse {
        match self.try_perform_event(request, locale) {
            Ok(response) => response,
            Err(err) => {
                warn!(view = %self.name, error = %err, "request failed");
                ViewResponse::failure(&err)
            }
        }
    }

    /// Handle one JSON request, returning fatal errors.
    pub fn try_perform_event(
        &self,
        request: &Value,
        locale: &Locale,
    ) -> Result<ViewResponse, ViewError> {
        let request = ViewRequest::from_value(request)?;
        let mut state = self.instantiate(locale.clone())?;

        self.hooks
            .run(HookPhase::PreInitialize, &mut state, locale)?;
        state.apply_snapshots(&request.components);
        self.hooks
            .run(HookPhase::PostInitialize, &mut state, locale)?;
        if let Some(event) = &request.event {
            dispatch::dispatch(&mut state, event)?;
        } else {
            trace!(view = %self.name, "request without event");
        }
        self.hooks.run(HookPhase::PreRender, &mut state, locale)?;
        Ok(state.into_response())
    }

    // ── Derived definitions ──────────────────────────────────────────

    /// Synthesize the popup view of the lookup at `path`. The returned view
    /// is initialized.
    pub fn lookup_view_definition(&self, path: &str) -> Result<ViewDefinition, ViewError> {
        lookup::popup::build(self, path)
    }

    /// Translated labels of every component, keyed by label code.
    pub fn translations(&self, locale: &Locale) -> BTreeMap<String, String> {
        translations::collect(self, locale)
    }
}
