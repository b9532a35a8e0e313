//! Embedding provider implementations.

pub mod trigram;
