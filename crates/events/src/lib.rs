//! In-process eventing for the evaluation workflow.
//!
//! The bus carries workflow events (progress changes, classification runs,
//! task lifecycle) from the engine to the WebSocket notification layer.

pub mod bus;

pub use bus::{EventBus, WorkflowEvent};
