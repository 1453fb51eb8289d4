#![deny(missing_docs)]

//! Core library for the ragpanel terminal client.

/// AI microservices backend client and wire types.
pub mod backend;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Effect layer running backend exchanges against the view state.
pub mod panel;
/// Pure text rendering of the view state.
pub mod render;
/// Interactive line-driven session.
pub mod session;
/// View state container and request bookkeeping.
pub mod state;
