//! repotree CLI Binary

use clap::Parser;
use repotree::logging::init_logging;
use repotree::tooling::cli::{Cli, CliContext};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(Some(&cli.logging_config(&config.logging))) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let context = match CliContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing provider: {}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command).await {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
