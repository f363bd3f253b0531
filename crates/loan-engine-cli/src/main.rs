mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::affordability::AffordabilityArgs;
use commands::compare::CompareArgs;
use commands::loan::{LoanArgs, ScheduleArgs};
use commands::refinance::RefinanceArgs;

/// Loan payment, amortization, affordability and refinance calculations
#[derive(Parser)]
#[command(
    name = "loancalc",
    version,
    about = "Loan payment, amortization, affordability and refinance calculations",
    long_about = "A CLI for loan calculations with decimal precision. Supports standard, \
                  interest-only, principal-only, balloon, graduated and interest-first \
                  structures, extra payments, affordability, refinance savings and \
                  scenario comparison. Set RUST_LOG=debug for diagnostics."
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
    /// Calculate a loan: payment, schedule, totals and savings from extra payments
    Loan(LoanArgs),
    /// Print the amortization schedule only
    Schedule(ScheduleArgs),
    /// Regular payment for the chosen structure and frequency
    Payment(LoanArgs),
    /// Maximum loan and home price under a debt-to-income ceiling
    Affordability(AffordabilityArgs),
    /// Compare the current loan with a refinance offer
    Refinance(RefinanceArgs),
    /// Calculate several loan scenarios side by side
    Compare(CompareArgs),
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
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Affordability(args) => commands::affordability::run_affordability(args),
        Commands::Refinance(args) => commands::refinance::run_refinance(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Version => {
            println!("loancalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
