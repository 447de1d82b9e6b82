//! Quire CLI entry point
//!
//! Parses arguments and dispatches to `cli::run`; errors go to stderr
//! with a non-zero exit.

use quire::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
