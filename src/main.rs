//! dynadown CLI entry point
//!
//! Parses arguments, hands off to `cli::run`, prints errors to stderr and
//! exits non-zero on failure.

use dynadown::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
