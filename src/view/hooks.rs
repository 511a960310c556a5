//! Lifecycle hooks run around initialization and rendering.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::error::ViewError;
use super::state::ViewDefinitionState;
use crate::model::Locale;

/// Hook callback: full view state plus the request locale.
pub type HookFn =
    Arc<dyn Fn(&mut ViewDefinitionState<'_>, &Locale) -> Result<(), ViewError> + Send + Sync>;

/// Point in the request lifecycle a hook runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Before client snapshots are applied.
    PreInitialize,
    /// After snapshots, before the event is dispatched.
    PostInitialize,
    /// After dispatch, before rendering.
    PreRender,
}

/// A named hook.
#[derive(Clone)]
pub struct HookDefinition {
    name: String,
    callback: HookFn,
}

impl HookDefinition {
    pub fn new(name: impl Into<String>, callback: HookFn) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, state: &mut ViewDefinitionState<'_>, locale: &Locale) -> Result<(), ViewError> {
        (self.callback)(state, locale)
    }
}

impl fmt::Debug for HookDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookDefinition").field(&self.name).finish()
    }
}

/// Ordered hook lists, one per phase.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    pre_initialize: Vec<HookDefinition>,
    post_initialize: Vec<HookDefinition>,
    pre_render: Vec<HookDefinition>,
}

impl Hooks {
    pub fn add(&mut self, phase: HookPhase, hook: HookDefinition) {
        self.list_mut(phase).push(hook);
    }

    pub fn get(&self, phase: HookPhase) -> &[HookDefinition] {
        match phase {
            HookPhase::PreInitialize => &self.pre_initialize,
            HookPhase::PostInitialize => &self.post_initialize,
            HookPhase::PreRender => &self.pre_render,
        }
    }

    fn list_mut(&mut self, phase: HookPhase) -> &mut Vec<HookDefinition> {
        match phase {
            HookPhase::PreInitialize => &mut self.pre_initialize,
            HookPhase::PostInitialize => &mut self.post_initialize,
            HookPhase::PreRender => &mut self.pre_render,
        }
    }

    /// Run every hook of `phase` in registration order, stopping at the
    /// first failure.
    pub fn run(
        &self,
        phase: HookPhase,
        state: &mut ViewDefinitionState<'_>,
        locale: &Locale,
    ) -> Result<(), ViewError> {
        for hook in self.get(phase) {
            trace!(hook = hook.name(), ?phase, "calling hook");
            hook.call(state, locale)?;
        }
        Ok(())
    }
}
