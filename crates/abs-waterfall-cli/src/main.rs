mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::simulate::SimulateArgs;

/// Monthly ABS cash-flow waterfall simulation
#[derive(Parser)]
#[command(
    name = "absw",
    version,
    about = "Monthly ABS cash-flow waterfall simulation",
    long_about = "Simulates an amortising loan pool feeding a tranched note structure \
                  month by month with decimal precision. Covers tiered fees, \
                  sequential/pro-rata principal, reverse-seniority losses, reserve \
                  account, revolving reinvestment, clean-up call and IFRS 9 staging."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one deal scenario to termination
    Simulate(SimulateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args, &cli.output),
        Commands::Version => {
            println!("absw {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
