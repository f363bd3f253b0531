use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::calculate_monthly_payment;
use crate::error::LoanEngineError;
use crate::types::{
    with_metadata, ComputationOutput, Money, Percent, MAX_AMOUNT, MAX_ANNUAL_RATE_PCT,
    MAX_TERM_MONTHS,
};
use crate::LoanEngineResult;

/// An existing loan and the refinance offer that would replace it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    /// Outstanding principal on the current loan
    pub current_balance: Money,
    /// Current rate in percent
    pub current_rate: Percent,
    pub current_remaining_term_months: u32,
    /// Offered rate in percent
    pub new_rate: Percent,
    pub new_term_months: u32,
    #[serde(default)]
    pub closing_costs: Money,
}

/// Side-by-side cost of keeping the current loan versus refinancing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceResult {
    pub current_monthly_payment: Money,
    pub new_monthly_payment: Money,
    /// Current minus new payment; negative when the new payment is higher
    pub monthly_savings: Money,
    /// Remaining cost of the current loan minus the new loan's cost and closing costs
    pub total_savings: Money,
    /// Months of savings needed to recover closing costs; `None` when monthly
    /// savings are not positive
    pub break_even_months: Option<Decimal>,
    pub current_total_interest: Money,
    pub new_total_interest: Money,
    /// Current minus new total interest
    pub interest_savings: Money,
}

/// Compare the remaining cost of the current loan with a refinance offer.
///
/// Both payments are level monthly annuities on `current_balance`. Closing
/// costs are paid up front and are not rolled into the new loan.
pub fn calculate_refinance_savings(
    input: &RefinanceInput,
) -> LoanEngineResult<ComputationOutput<RefinanceResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_refinance_input(input)?;

    let current_monthly_payment = calculate_monthly_payment(
        input.current_balance,
        input.current_rate,
        input.current_remaining_term_months,
    )?;
    let new_monthly_payment =
        calculate_monthly_payment(input.current_balance, input.new_rate, input.new_term_months)?;

    let current_total_cost =
        current_monthly_payment * Decimal::from(input.current_remaining_term_months);
    let new_total_cost = new_monthly_payment * Decimal::from(input.new_term_months);

    let monthly_savings = current_monthly_payment - new_monthly_payment;
    let total_savings = current_total_cost - new_total_cost - input.closing_costs;

    let current_total_interest = current_total_cost - input.current_balance;
    let new_total_interest = new_total_cost - input.current_balance;

    let break_even_months = if monthly_savings > Decimal::ZERO {
        Some(input.closing_costs / monthly_savings)
    } else {
        None
    };

    if let Some(months) = break_even_months {
        if months > Decimal::from(input.new_term_months) {
            warnings.push(format!(
                "Break-even of {} months falls after the new loan is repaid",
                months.round_dp(1)
            ));
        }
    }
    if input.new_term_months > input.current_remaining_term_months && total_savings < Decimal::ZERO
    {
        warnings.push(format!(
            "Lower payment comes from extending the term by {} months; total cost rises",
            input.new_term_months - input.current_remaining_term_months
        ));
    }

    let result = RefinanceResult {
        current_monthly_payment,
        new_monthly_payment,
        monthly_savings,
        total_savings,
        break_even_months,
        current_total_interest,
        new_total_interest,
        interest_savings: current_total_interest - new_total_interest,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Refinance comparison of level monthly annuities",
        input,
        warnings,
        elapsed,
        result,
    ))
}

fn validate_refinance_input(input: &RefinanceInput) -> LoanEngineResult<()> {
    if input.current_balance <= Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "current_balance".into(),
            reason: "Current balance must be positive".into(),
        });
    }
    if input.current_remaining_term_months == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "current_remaining_term_months".into(),
            reason: "Remaining term must be at least one month".into(),
        });
    }
    if input.new_term_months == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "new_term_months".into(),
            reason: "New term must be at least one month".into(),
        });
    }
    if input.closing_costs < Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "closing_costs".into(),
            reason: "Closing costs cannot be negative".into(),
        });
    }
    for (field, value) in [
        ("current_balance", input.current_balance),
        ("closing_costs", input.closing_costs),
    ] {
        if value > MAX_AMOUNT {
            return Err(LoanEngineError::InvalidInput {
                field: field.into(),
                reason: format!("Amount cannot exceed {MAX_AMOUNT}"),
            });
        }
    }
    for (field, rate) in [("current_rate", input.current_rate), ("new_rate", input.new_rate)] {
        if rate > MAX_ANNUAL_RATE_PCT {
            return Err(LoanEngineError::InvalidInput {
                field: field.into(),
                reason: format!("Annual rate cannot exceed {MAX_ANNUAL_RATE_PCT}%"),
            });
        }
    }
    for (field, months) in [
        ("current_remaining_term_months", input.current_remaining_term_months),
        ("new_term_months", input.new_term_months),
    ] {
        if months > MAX_TERM_MONTHS {
            return Err(LoanEngineError::InvalidInput {
                field: field.into(),
                reason: format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
            });
        }
    }
    Ok(())
}
