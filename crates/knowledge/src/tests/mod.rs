//! Cross-module scenarios and shared fakes.

pub(crate) mod support;

mod rag_system;
