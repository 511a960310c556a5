//! Event dispatch: built-in widget handlers first, then custom listeners.

use std::sync::Arc;

use tracing::debug;

use super::error::ViewError;
use super::request::EventRequest;
use super::state::ViewDefinitionState;
use crate::components;
use crate::pattern::ComponentPattern;
use crate::state::ComponentState;
use crate::tree::PatternId;

/// Custom event listener attached to a pattern.
pub type EventListener =
    Arc<dyn Fn(&mut EventContext<'_, '_>, &[String]) -> Result<(), ViewError> + Send + Sync>;

/// What a listener sees: the whole view state plus the targeted component.
pub struct EventContext<'a, 'v> {
    state: &'a mut ViewDefinitionState<'v>,
    target: PatternId,
}

impl<'a, 'v> EventContext<'a, 'v> {
    pub fn new(state: &'a mut ViewDefinitionState<'v>, target: PatternId) -> Self {
        Self { state, target }
    }

    pub fn target(&self) -> PatternId {
        self.target
    }

    /// Pattern of the targeted component.
    pub fn pattern(&self) -> Option<&'v ComponentPattern> {
        self.state.pattern(self.target)
    }

    /// State of the targeted component.
    pub fn component(&mut self) -> Option<&mut ComponentState> {
        self.state.state_mut(self.target)
    }

    pub fn view_state(&mut self) -> &mut ViewDefinitionState<'v> {
        self.state
    }
}

/// Dispatch one event.
///
/// A targeted event must be handled by the component's built-in handler or
/// by at least one listener, otherwise it is `EventNotFound`. A broadcast
/// (null component) visits every component in tree order and skips those
/// without a handler.
pub(crate) fn dispatch(
    state: &mut ViewDefinitionState<'_>,
    event: &EventRequest,
) -> Result<(), ViewError> {
    let view = state.view();
    match &event.event_component {
        Some(path) => {
            let not_found = || ViewError::EventNotFound {
                component: path.clone(),
                event: event.event_name.clone(),
            };
            let id = view.tree().find(path).ok_or_else(not_found)?;
            debug!(component = %path, event = %event.event_name, "dispatching event");
            if !perform(state, id, &event.event_name, &event.event_args)? {
                return Err(not_found());
            }
        }
        None => {
            debug!(event = %event.event_name, "broadcasting event");
            for id in view.tree().depth_first() {
                perform(state, id, &event.event_name, &event.event_args)?;
            }
        }
    }
    Ok(())
}

/// Run the built-in handler and listeners of one component and mark it for
/// render. Returns whether anything handled the event.
fn perform(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    event: &str,
    args: &[String],
) -> Result<bool, ViewError> {
    let handled = components::perform_builtin(state, id, event, args)?;
    let listeners = state.pattern(id).map_or(&[][..], |p| p.listeners(event));
    for listener in listeners {
        listener(&mut EventContext::new(state, id), args)?;
    }
    let handled = handled || !listeners.is_empty();
    // Handlers may mutate typed state directly; the client gets the result.
    if handled {
        if let Some(component) = state.state_mut(id) {
            component.request_render();
        }
    }
    Ok(handled)
}
