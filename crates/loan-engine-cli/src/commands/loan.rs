use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use loan_engine_core::{
    calculate_loan, calculate_payment_amount, generate_schedule, get_payments_per_year,
    yearly_breakdown, LoanInputs, PaymentFrequency, PaymentStructure,
};

use crate::input;

/// Loan parameters shared by the loan, schedule and payment commands
#[derive(Args)]
pub struct LoanArgs {
    /// Amount borrowed
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long, default_value = "0")]
    pub years: u32,

    /// Additional term in months
    #[arg(long, default_value = "0")]
    pub months: u32,

    /// weekly, biweekly, monthly, quarterly or annually
    #[arg(long, default_value = "monthly")]
    pub frequency: PaymentFrequency,

    /// Extra principal paid every period
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Date of the first payment (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// standard, interest_only, principal_only, balloon, graduated or interest_first
    #[arg(long, default_value = "standard")]
    pub structure: PaymentStructure,

    /// Balloon amount due with the last payment
    #[arg(long)]
    pub balloon: Option<Decimal>,

    /// Length of the interest-only window in months
    #[arg(long)]
    pub interest_only_months: Option<u32>,

    /// Years over which a graduated payment steps up
    #[arg(long)]
    pub graduation_years: Option<u32>,

    /// Annual graduated step-up in percent
    #[arg(long)]
    pub increase_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Aggregate the schedule by calendar year
    #[arg(long)]
    pub yearly: bool,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = resolve_loan_inputs(&args)?;
    let result = calculate_loan(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = resolve_loan_inputs(&args.loan)?;
    let schedule = generate_schedule(&inputs)?;
    if args.yearly {
        return Ok(serde_json::to_value(yearly_breakdown(&schedule))?);
    }
    Ok(serde_json::to_value(schedule)?)
}

pub fn run_payment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = resolve_loan_inputs(&args)?;
    let payment = calculate_payment_amount(&inputs)?;
    Ok(json!({
        "result": {
            "regular_payment": payment,
            "payment_frequency": inputs.payment_frequency,
            "payments_per_year": get_payments_per_year(inputs.payment_frequency),
            "total_payments": inputs.total_payments(),
            "payment_structure": inputs.payment_structure,
        }
    }))
}

/// Loan inputs from `--input`, piped stdin, or the individual flags.
pub fn resolve_loan_inputs(args: &LoanArgs) -> Result<LoanInputs, Box<dyn std::error::Error>> {
    if let Some(inputs) = input::read_input::<LoanInputs>(args.input.as_deref())? {
        return Ok(inputs);
    }

    Ok(LoanInputs {
        loan_amount: args
            .amount
            .ok_or("--amount is required (or provide --input)")?,
        annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
        loan_term_years: args.years,
        loan_term_months: args.months,
        payment_frequency: args.frequency,
        extra_payment: args.extra.unwrap_or(Decimal::ZERO),
        start_date: args
            .start_date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        payment_structure: args.structure,
        balloon_amount: args.balloon,
        interest_only_period: args.interest_only_months,
        graduation_period: args.graduation_years,
        payment_increase_rate: args.increase_rate,
    })
}
