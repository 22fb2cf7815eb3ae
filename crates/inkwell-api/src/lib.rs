//! Inkwell HTTP gateway.
//!
//! Exposes the turn orchestrator and the standalone generators over axum.
//! The binary in `main.rs` wires configuration, telemetry and the concrete
//! providers; integration tests build the same router over test doubles.

pub mod config;
pub mod error;
pub mod registry;
pub mod routes;
pub mod state;
pub mod telemetry;
