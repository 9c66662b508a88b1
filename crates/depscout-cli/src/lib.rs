//! depscout CLI library components.
//!
//! This crate provides the command-line interface for depscout's dependency
//! resolution. The main binary is in `main.rs`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod formatters;
pub mod logging;

pub use error::CliError;
