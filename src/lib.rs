//! Legal chat client library.
//!
//! Headless core of the legal-assistant chat client: document classification,
//! export, the request lifecycle controller and its backend worker.

pub mod backend;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod events;
pub mod export;
pub mod input_state;
pub mod logging;
pub mod protocol;
pub mod relative_time;
pub mod request;
pub mod scroll;
pub mod state;
pub mod transcript;
pub mod validation;

#[cfg(test)]
mod integration_tests;
