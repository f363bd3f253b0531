use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanEngineError;
use crate::time_value::annuity_present_value;
use crate::types::{
    with_metadata, ComputationOutput, Money, Percent, MAX_AMOUNT, MAX_ANNUAL_RATE_PCT,
    MAX_TERM_MONTHS,
};
use crate::LoanEngineResult;

/// Conventional front-end (housing only) ratio ceiling, percent.
const FRONT_END_GUIDELINE_PCT: Decimal = dec!(28);

/// Back-end ceiling above which most lenders stop qualifying borrowers, percent.
const QUALIFIED_MORTGAGE_DTI_PCT: Decimal = dec!(43);

/// Borrower profile for an affordability query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAffordabilityInputs {
    /// Gross annual income
    pub annual_income: Money,
    /// Existing non-housing debt payments per month
    pub monthly_debts: Money,
    pub down_payment: Money,
    /// Mortgage rate in percent
    pub annual_rate: Percent,
    pub loan_term_years: u32,
    /// Back-end debt-to-income ceiling in percent (e.g. 36)
    pub debt_to_income_ratio: Percent,
    #[serde(default)]
    pub annual_property_tax: Money,
    #[serde(default)]
    pub annual_home_insurance: Money,
    #[serde(default)]
    pub monthly_pmi: Money,
    #[serde(default)]
    pub monthly_hoa_fees: Money,
}

/// Maximum sustainable borrowing and the ratios behind it.
///
/// When the borrower has no payment capacity left every amount is zero and
/// only the ratio diagnostics are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAffordabilityResult {
    pub max_loan_amount: Money,
    /// Max loan plus down payment
    pub max_home_price: Money,
    /// Principal and interest the borrower can carry
    pub max_monthly_payment: Money,
    /// Tax, insurance, PMI and HOA per month
    pub monthly_housing_costs: Money,
    /// Principal, interest and housing costs per month
    pub total_monthly_housing_payment: Money,
    pub monthly_income: Money,
    /// Income times the debt-to-income ceiling
    pub max_total_debt_payment: Money,
    /// Housing payment / income, percent
    pub front_end_ratio: Percent,
    /// All debt including housing / income, percent
    pub back_end_ratio: Percent,
    /// Existing debts / income, percent
    pub current_debt_to_income: Percent,
}

/// Largest loan a borrower can carry under a debt-to-income ceiling.
///
/// Payment capacity = income × ceiling − existing debts − fixed housing
/// costs. The standard annuity is inverted on that capacity to give the
/// maximum principal.
pub fn calculate_loan_affordability(
    input: &LoanAffordabilityInputs,
) -> LoanEngineResult<ComputationOutput<LoanAffordabilityResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_affordability_input(input)?;

    let monthly_income = input.annual_income / dec!(12);
    let max_total_debt_payment = monthly_income * input.debt_to_income_ratio / dec!(100);
    let monthly_housing_costs = input.annual_property_tax / dec!(12)
        + input.annual_home_insurance / dec!(12)
        + input.monthly_pmi
        + input.monthly_hoa_fees;
    let capacity = max_total_debt_payment - input.monthly_debts - monthly_housing_costs;

    let current_debt_to_income = ratio_pct(input.monthly_debts, monthly_income);

    let result = if capacity <= Decimal::ZERO {
        warnings.push(format!(
            "Existing debts and housing costs already use the {}% debt-to-income ceiling; no loan is affordable",
            input.debt_to_income_ratio
        ));
        LoanAffordabilityResult {
            max_loan_amount: Decimal::ZERO,
            max_home_price: Decimal::ZERO,
            max_monthly_payment: Decimal::ZERO,
            monthly_housing_costs,
            total_monthly_housing_payment: Decimal::ZERO,
            monthly_income,
            max_total_debt_payment,
            front_end_ratio: ratio_pct(monthly_housing_costs, monthly_income),
            back_end_ratio: ratio_pct(input.monthly_debts + monthly_housing_costs, monthly_income),
            current_debt_to_income,
        }
    } else {
        let monthly_rate = input.annual_rate / dec!(100) / dec!(12);
        let periods = input.loan_term_years.saturating_mul(12);
        let max_loan_amount = annuity_present_value(capacity, monthly_rate, periods)?;
        let total_monthly_housing_payment = capacity + monthly_housing_costs;

        LoanAffordabilityResult {
            max_loan_amount,
            max_home_price: max_loan_amount + input.down_payment,
            max_monthly_payment: capacity,
            monthly_housing_costs,
            total_monthly_housing_payment,
            monthly_income,
            max_total_debt_payment,
            front_end_ratio: ratio_pct(total_monthly_housing_payment, monthly_income),
            back_end_ratio: ratio_pct(
                total_monthly_housing_payment + input.monthly_debts,
                monthly_income,
            ),
            current_debt_to_income,
        }
    };

    if result.front_end_ratio > FRONT_END_GUIDELINE_PCT {
        warnings.push(format!(
            "Front-end ratio of {}% exceeds the {FRONT_END_GUIDELINE_PCT}% housing guideline",
            result.front_end_ratio.round_dp(2)
        ));
    }
    if input.debt_to_income_ratio > QUALIFIED_MORTGAGE_DTI_PCT {
        warnings.push(format!(
            "Debt-to-income ceiling of {}% is above the {QUALIFIED_MORTGAGE_DTI_PCT}% most lenders accept",
            input.debt_to_income_ratio
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Debt-to-income capacity with inverted annuity",
        input,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn ratio_pct(amount: Money, income: Money) -> Percent {
    if income.is_zero() {
        return Decimal::ZERO;
    }
    amount / income * dec!(100)
}

fn validate_affordability_input(input: &LoanAffordabilityInputs) -> LoanEngineResult<()> {
    if input.annual_income <= Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "annual_income".into(),
            reason: "Annual income must be positive".into(),
        });
    }
    if input.loan_term_years == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "loan_term_years".into(),
            reason: "Loan term must be at least one year".into(),
        });
    }
    if input.annual_income > MAX_AMOUNT {
        return Err(LoanEngineError::InvalidInput {
            field: "annual_income".into(),
            reason: format!("Annual income cannot exceed {MAX_AMOUNT}"),
        });
    }
    if input.loan_term_years.saturating_mul(12) > MAX_TERM_MONTHS {
        return Err(LoanEngineError::InvalidInput {
            field: "loan_term_years".into(),
            reason: format!("Loan term cannot exceed {MAX_TERM_MONTHS} months"),
        });
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    if input.annual_rate > MAX_ANNUAL_RATE_PCT {
        return Err(LoanEngineError::InvalidInput {
            field: "annual_rate".into(),
            reason: format!("Annual rate cannot exceed {MAX_ANNUAL_RATE_PCT}%"),
        });
    }
    if input.debt_to_income_ratio <= Decimal::ZERO || input.debt_to_income_ratio > dec!(100) {
        return Err(LoanEngineError::InvalidInput {
            field: "debt_to_income_ratio".into(),
            reason: "Debt-to-income ratio must be between 0 and 100 percent".into(),
        });
    }
    for (field, value) in [
        ("monthly_debts", input.monthly_debts),
        ("down_payment", input.down_payment),
        ("annual_property_tax", input.annual_property_tax),
        ("annual_home_insurance", input.annual_home_insurance),
        ("monthly_pmi", input.monthly_pmi),
        ("monthly_hoa_fees", input.monthly_hoa_fees),
    ] {
        if value < Decimal::ZERO {
            return Err(LoanEngineError::InvalidInput {
                field: field.into(),
                reason: "Amount cannot be negative".into(),
            });
        }
        if value > MAX_AMOUNT {
            return Err(LoanEngineError::InvalidInput {
                field: field.into(),
                reason: format!("Amount cannot exceed {MAX_AMOUNT}"),
            });
        }
    }
    Ok(())
}
