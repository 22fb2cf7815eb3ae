//! Application layer: command and query handlers, and the turn orchestrator.

pub mod command_handlers;
pub mod orchestrator;
pub mod query_handlers;
