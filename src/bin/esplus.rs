// src/bin/esplus.rs

use clap::Parser;
use colored::*;
use esplus::cli::{Cli, dispatcher};

/// The main entry point of the `esplus` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    let cli = Cli::parse();
    log::debug!("CLI args parsed: {:?}", cli);

    if let Err(e) = dispatcher::dispatch(cli.args) {
        // espanso captures stdout only, so errors go there too.
        println!("{}: {}", esplus::t!("common.error").red().bold(), e);
        std::process::exit(1);
    }
}
