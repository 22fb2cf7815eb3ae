//! Inkwell — Turn Orchestration bounded context.
//!
//! Responsible for the game session lifecycle: starting a story, accepting
//! choices, deciding when the story ends, and kicking off enrichment for
//! every turn it produces.

pub mod application;
pub mod domain;
