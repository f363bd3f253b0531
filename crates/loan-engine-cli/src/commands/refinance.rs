use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_engine_core::refinance::{calculate_refinance_savings, RefinanceInput};

use crate::input;

/// Arguments for the refinance comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RefinanceArgs {
    /// Outstanding balance on the current loan
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Current rate in percent
    #[arg(long)]
    pub current_rate: Option<Decimal>,

    /// Months left on the current loan
    #[arg(long)]
    pub remaining_months: Option<u32>,

    /// Offered rate in percent
    #[arg(long)]
    pub new_rate: Option<Decimal>,

    /// Term of the new loan in months
    #[arg(long)]
    pub new_term_months: Option<u32>,

    /// Up-front closing costs
    #[arg(long)]
    pub closing_costs: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let refinance_input: RefinanceInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let remaining = args
                .remaining_months
                .ok_or("--remaining-months is required (or provide --input)")?;
            RefinanceInput {
                current_balance: args
                    .balance
                    .ok_or("--balance is required (or provide --input)")?,
                current_rate: args
                    .current_rate
                    .ok_or("--current-rate is required (or provide --input)")?,
                current_remaining_term_months: remaining,
                new_rate: args
                    .new_rate
                    .ok_or("--new-rate is required (or provide --input)")?,
                new_term_months: args.new_term_months.unwrap_or(remaining),
                closing_costs: args.closing_costs.unwrap_or(Decimal::ZERO),
            }
        }
    };

    let result = calculate_refinance_savings(&refinance_input)?;
    Ok(serde_json::to_value(result)?)
}
