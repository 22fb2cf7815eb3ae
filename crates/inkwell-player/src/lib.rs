//! Terminal player for the Inkwell gateway.
//!
//! The [`presenter::Presenter`] renders every turn as soon as the gateway
//! answers and backfills image and voice once the turn's enrichment settles.

pub mod config;
pub mod error;
pub mod gateway;
pub mod presenter;
pub mod render;
