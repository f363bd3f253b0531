use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use std::str::FromStr;

use loan_engine_core::{AmortizationEntry, LoanInputs, PaymentFrequency};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| to_napi_error(format!("Invalid {field} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_loan(input_json: String) -> NapiResult<String> {
    let input: LoanInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_engine_core::calculate_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let schedule = loan_engine_core::generate_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

#[napi]
pub fn yearly_breakdown(schedule_json: String) -> NapiResult<String> {
    let schedule: Vec<AmortizationEntry> =
        serde_json::from_str(&schedule_json).map_err(to_napi_error)?;
    let years = loan_engine_core::yearly_breakdown(&schedule);
    serde_json::to_string(&years).map_err(to_napi_error)
}

/// Regular payment for the inputs' structure and frequency, as a decimal string.
#[napi]
pub fn calculate_payment_amount(input_json: String) -> NapiResult<String> {
    let input: LoanInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment = loan_engine_core::calculate_payment_amount(&input).map_err(to_napi_error)?;
    Ok(payment.to_string())
}

/// Level monthly payment; amounts are decimal strings, the rate is in percent.
#[napi]
pub fn calculate_monthly_payment(
    principal: String,
    annual_rate: String,
    total_payments: u32,
) -> NapiResult<String> {
    let principal = parse_decimal("principal", &principal)?;
    let annual_rate = parse_decimal("annual_rate", &annual_rate)?;
    let payment = loan_engine_core::calculate_monthly_payment(principal, annual_rate, total_payments)
        .map_err(to_napi_error)?;
    Ok(payment.to_string())
}

#[napi]
pub fn get_payments_per_year(frequency: String) -> NapiResult<u32> {
    let frequency = PaymentFrequency::from_str(&frequency).map_err(to_napi_error)?;
    Ok(loan_engine_core::get_payments_per_year(frequency))
}

// ---------------------------------------------------------------------------
// Affordability / refinance / comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn loan_affordability(input_json: String) -> NapiResult<String> {
    let input: loan_engine_core::affordability::LoanAffordabilityInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_engine_core::affordability::calculate_loan_affordability(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn refinance_savings(input_json: String) -> NapiResult<String> {
    let input: loan_engine_core::refinance::RefinanceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_engine_core::refinance::calculate_refinance_savings(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_loan_scenarios(scenarios_json: String) -> NapiResult<String> {
    let scenarios: Vec<LoanInputs> =
        serde_json::from_str(&scenarios_json).map_err(to_napi_error)?;
    let output = loan_engine_core::comparison::compare_loan_scenarios(&scenarios)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
