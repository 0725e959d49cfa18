//! CLI module for dynadown
//!
//! Provides command-line interface for:
//! - serve: Open a store and answer JSON requests from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build_store, handle_line, handle_request, run, run_command, serve, Request};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
