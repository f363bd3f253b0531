use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use loan_engine_core::affordability::{calculate_loan_affordability, LoanAffordabilityInputs};

use crate::input;

/// Arguments for the affordability query
#[derive(Args)]
pub struct AffordabilityArgs {
    /// Gross annual income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Existing monthly debt payments
    #[arg(long)]
    pub monthly_debts: Option<Decimal>,

    /// Cash available as down payment
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Mortgage rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub years: u32,

    /// Back-end debt-to-income ceiling in percent (default 36)
    #[arg(long, alias = "dti")]
    pub debt_to_income: Option<Decimal>,

    /// Annual property tax
    #[arg(long)]
    pub property_tax: Option<Decimal>,

    /// Annual homeowner's insurance
    #[arg(long)]
    pub insurance: Option<Decimal>,

    /// Monthly private mortgage insurance
    #[arg(long)]
    pub pmi: Option<Decimal>,

    /// Monthly HOA fees
    #[arg(long)]
    pub hoa: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_affordability(args: AffordabilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let affordability_input: LoanAffordabilityInputs =
        match input::read_input(args.input.as_deref())? {
            Some(parsed) => parsed,
            None => LoanAffordabilityInputs {
                annual_income: args
                    .income
                    .ok_or("--income is required (or provide --input)")?,
                monthly_debts: args.monthly_debts.unwrap_or(Decimal::ZERO),
                down_payment: args.down_payment.unwrap_or(Decimal::ZERO),
                annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
                loan_term_years: args.years,
                debt_to_income_ratio: args.debt_to_income.unwrap_or(dec!(36)),
                annual_property_tax: args.property_tax.unwrap_or(Decimal::ZERO),
                annual_home_insurance: args.insurance.unwrap_or(Decimal::ZERO),
                monthly_pmi: args.pmi.unwrap_or(Decimal::ZERO),
                monthly_hoa_fees: args.hoa.unwrap_or(Decimal::ZERO),
            },
        };

    let result = calculate_loan_affordability(&affordability_input)?;
    Ok(serde_json::to_value(result)?)
}
