//! Widgets: typed options, states, binding and built-in events per kind.
//!
//! Each widget module pairs the options its pattern parses with the state
//! its pattern instantiates, plus the built-in event handlers that run
//! before custom listeners.

pub mod field;
pub mod form;
pub mod grid;
pub mod lookup;
pub mod ribbon;
pub mod window;

use crate::model::EntityId;
use crate::pattern::{ComponentPattern, PatternKind};
use crate::state::content::parse_id;
use crate::state::{ComponentState, StateMessage};
use crate::tree::{PatternId, PatternTree};
use crate::view::{ViewDefinitionState, ViewError};

/// Run the built-in handler of `event` on component `id`.
///
/// Returns whether the widget handles that event.
pub(crate) fn perform_builtin(
    state: &mut ViewDefinitionState<'_>,
    id: PatternId,
    event: &str,
    args: &[String],
) -> Result<bool, ViewError> {
    let Some(pattern) = state.pattern(id) else {
        return Ok(false);
    };
    match pattern.kind() {
        PatternKind::Form(options) => form::perform(state, id, pattern, options, event),
        PatternKind::Lookup(options) => lookup::perform(state, id, pattern, options, event, args),
        PatternKind::Grid(options) => grid::perform(state, id, pattern, options, event, args),
        PatternKind::Field(_) | PatternKind::Window(_) | PatternKind::Ribbon(_) => Ok(false),
    }
}

/// First event argument as an entity id. `"null"` and `""` clear.
pub(crate) fn id_argument(
    pattern: &ComponentPattern,
    event: &str,
    args: &[String],
) -> Result<Option<EntityId>, ViewError> {
    let invalid = |argument: &str| ViewError::InvalidEventArgument {
        component: pattern.path().to_owned(),
        event: event.to_owned(),
        argument: argument.to_owned(),
    };
    let argument = args.first().ok_or_else(|| invalid(""))?;
    parse_id(argument).map_err(|_| invalid(argument))
}

/// Nearest form ancestor of `id`.
pub(crate) fn owning_form(tree: &PatternTree, id: PatternId) -> Option<PatternId> {
    tree.ancestors(id).into_iter().find(|&ancestor| {
        tree.get(ancestor)
            .is_some_and(|p| matches!(p.kind(), PatternKind::Form(_)))
    })
}

/// Replace a state's enabled flag and attach binding errors as failures.
pub(crate) fn apply_binding_result(state: &mut ComponentState, enabled: bool, errors: Vec<String>) {
    state.set_enabled(enabled);
    for error in errors {
        state.add_message(StateMessage::failure(error));
    }
    state.request_render();
}
