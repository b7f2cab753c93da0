//! Repolens CLI entry point.

use clap::Parser;
use repolens::cli::{self, Cli, Commands, EXIT_ERROR};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::init_tracing(cli.quiet, cli.verbose) {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_ERROR);
    }

    let result = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args, cli.quiet).await,
        Commands::Init(args) => cli::run_init(args),
        Commands::History(args) => cli::run_history(args),
        Commands::Compare(args) => cli::run_compare(args),
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
