//! Domain layer: the game session aggregate and its state machine.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod policy;
pub mod transitions;
