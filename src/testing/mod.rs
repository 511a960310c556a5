//! Headless testing helpers: in-memory collaborators and a request Pilot.
//!
//! Use [`memory`] to back a view with entities held in memory, and the
//! [`Pilot`] to send client-shaped requests through the full pipeline.

pub mod memory;
pub mod pilot;

pub use memory::{MemoryDataDefinition, MemoryDataModel, MemoryTranslations};
pub use pilot::{Pilot, RequestBuilder};
