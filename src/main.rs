//! mcpscan CLI entry point.

use clap::Parser;
use mcpscan::cli::{self, Cli, Commands, DiscoverArgs, EXIT_ERROR};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::run_discover(&DiscoverArgs::default()).await,
        Some(Commands::Discover(args)) => cli::run_discover(&args).await,
        Some(Commands::Scan(args)) => cli::run_scan(&args).await,
        Some(Commands::Lookup(args)) => cli::run_lookup(&args).await,
        Some(Commands::Audit(args)) => cli::run_audit(&args).await,
        Some(Commands::Submit(args)) => cli::run_submit(&args).await,
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
