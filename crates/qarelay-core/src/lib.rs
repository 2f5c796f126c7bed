//! Core domain + application logic for the question-answering relay.
//!
//! This crate is intentionally framework-agnostic. The chat transport and the answering
//! backend live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod console;
pub mod context;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod relay;

pub use errors::{Error, Result};

#[cfg(test)]
mod test_support;
