//! # DIORES - form controller
//!
//! Hosts the `diores-core` engine behind an HTTP API and a CLI, and talks to
//! the remote prediction service.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
