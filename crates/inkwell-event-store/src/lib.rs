//! Inkwell session stores.
//!
//! Both stores persist a game session as its event stream and enforce the
//! single-writer rule through the expected version passed on append.

pub mod memory_event_repository;
pub mod pg_event_repository;
