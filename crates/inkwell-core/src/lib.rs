//! Inkwell Core — shared domain abstractions.
//!
//! This crate defines the traits and types that the game session, the
//! enrichment pipeline and the gateway all depend on. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod generator;
pub mod repository;
pub mod story;
