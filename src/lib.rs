//! # mes-view
//!
//! Server-side view-component engine: a tree of component patterns is
//! declared once per view, initialized against the data model, and then
//! serves JSON requests. Each request instantiates per-component state,
//! applies the client's snapshots, dispatches one event and renders the
//! changed components back.
//!
//! ## Core Systems
//!
//! - **[`tree`]**: slotmap-backed pattern arena with dotted-path lookup
//! - **[`pattern`]**: component patterns, options and source resolution
//! - **[`state`]**: per-request component state and its JSON content
//! - **[`view`]**: view definitions, hooks, event dispatch, request protocol
//! - **[`components`]**: Field, Lookup, Grid, Form, Window and Ribbon widgets
//! - **[`binding`]**: entity-to-component binding and header expressions
//! - **[`model`]**: data-model, search and translation collaborators
//! - **[`config`]**: engine tunables
//! - **[`testing`]**: in-memory collaborators and a request `Pilot`

// Foundation
pub mod config;
pub mod model;

// Core systems
pub mod binding;
pub mod pattern;
pub mod state;
pub mod tree;

// Views and widgets
pub mod components;
pub mod view;

// Headless testing
pub mod testing;

pub use config::ViewConfig;
pub use pattern::{ComponentOption, ComponentPattern, PatternKind};
pub use state::{ComponentState, StateMessage};
pub use tree::{PatternId, PatternTree};
pub use view::{
    EventContext, EventListener, HookDefinition, HookPhase, ViewDefinition,
    ViewDefinitionState, ViewError, ViewResponse, ViewServices,
};
