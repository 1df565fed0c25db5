//! CLI Adapter
//!
//! Command-line interface for base-bubbles.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{BubblesCmd, CliApp, Command, PriceCmd, QuoteCmd, ServeCmd, SimulateCmd, TokensCmd};
