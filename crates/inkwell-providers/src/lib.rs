//! Inkwell — upstream generator adapters.
//!
//! HTTP clients for the services that write, paint and voice the story:
//!
//! - [`openai`] for chat completions and embeddings
//! - [`narrative`] and [`art`] for the prompts built on top of it
//! - [`freepik`] for text-to-image
//! - [`elevenlabs`] for text-to-speech
//!
//! Every adapter implements one of the generator ports from
//! `inkwell_core::generator` and reports failures as `GenerationError`.

pub mod art;
pub mod elevenlabs;
mod error;
pub mod freepik;
pub mod narrative;
pub mod openai;
pub mod premise;
