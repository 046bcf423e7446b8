//! Rill CLI - The Rill language command line interface.

mod commands;
mod output;

use clap::{Parser, Subcommand};

/// Main CLI structure.
#[derive(Parser)]
#[command(name = "rill")]
#[command(author, version, about = "Rill - A lazy expression language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression.
    Eval {
        /// The expression to evaluate.
        expr: String,
    },

    /// Run a Rill file.
    Run {
        /// The file to run.
        file: String,
    },

    /// Start an interactive REPL.
    Repl,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval { expr } => commands::eval::run(&expr, cli.verbose),
        Commands::Run { file } => commands::run::run(&file, cli.verbose),
        Commands::Repl => commands::repl::run(),
    };

    if let Err(e) = result {
        output::error(&e);
        std::process::exit(1);
    }
}
