//! Inkwell — turn enrichment.
//!
//! Art descriptions, images and voice are produced off the critical path.
//! Every call runs isolated in its own task and every failure ends up as an
//! outcome value, never as an error of the turn that requested it.

pub mod cache;
pub mod isolation;
pub mod outcome;
pub mod pipeline;
pub mod voice;
