use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::inputs::{LoanInputs, LoanTerms};
use super::schedule::{build_schedule, AmortizationEntry};
use super::structure::rule_for;
use crate::error::LoanEngineError;
use crate::time_value::annuity_payment;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::LoanEngineResult;

/// Annual rate (percent) above which a warning is attached to the result.
const HIGH_RATE_WARNING_PCT: Decimal = dec!(30);

/// Aggregate view of a generated schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    /// Amount originally borrowed
    pub principal: Money,
    /// Regular payment at the chosen frequency
    pub regular_payment: Money,
    /// Sum of every payment in the schedule
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_extra_payments: Money,
    /// Interest avoided versus the same loan without extra payments (may be negative)
    pub interest_saved: Money,
    /// "Y years, M months", or "0 months" when nothing was saved
    pub time_saved: String,
    /// Whole calendar months between the baseline and actual payoff dates
    pub time_saved_months: i32,
    pub payoff_date: NaiveDate,
    pub number_of_payments: u32,
}

/// Complete output of a single loan calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    /// Regular payment at the chosen frequency (not necessarily monthly)
    pub monthly_payment: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    /// Loan amount plus total interest
    pub total_amount: Money,
    pub payoff_date: NaiveDate,
    pub amortization_schedule: Vec<AmortizationEntry>,
    pub summary: LoanSummary,
}

/// Level monthly payment for `principal` at `annual_rate` percent over
/// `total_payments` months.
pub fn calculate_monthly_payment(
    principal: Money,
    annual_rate: Percent,
    total_payments: u32,
) -> LoanEngineResult<Money> {
    if annual_rate < Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    if total_payments == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "total_payments".into(),
            reason: "Number of payments must be > 0".into(),
        });
    }
    annuity_payment(principal, annual_rate / dec!(100) / dec!(12), total_payments)
}

/// Regular payment for `inputs`, sized by its payment structure.
pub fn calculate_payment_amount(inputs: &LoanInputs) -> LoanEngineResult<Money> {
    let terms = LoanTerms::from_inputs(inputs)?;
    (rule_for(inputs.payment_structure).regular_payment)(&terms)
}

/// Generate the schedule for `inputs` and summarise it against a baseline
/// without extra payments.
pub fn calculate_loan(inputs: &LoanInputs) -> LoanEngineResult<ComputationOutput<LoanResult>> {
    let start = Instant::now();

    let (result, warnings) = compute_loan(inputs)?;

    let methodology = format!(
        "{} amortization, {} payments",
        inputs.payment_structure, inputs.payment_frequency
    );
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(&methodology, inputs, warnings, elapsed, result))
}

/// [`calculate_loan`] without the output envelope.
pub(crate) fn compute_loan(inputs: &LoanInputs) -> LoanEngineResult<(LoanResult, Vec<String>)> {
    let (schedule, mut warnings) = build_schedule(inputs)?;
    let regular_payment = calculate_payment_amount(inputs)?;

    let payoff_date = schedule
        .last()
        .map(|entry| entry.payment_date)
        .ok_or_else(|| LoanEngineError::EmptySchedule("schedule has no entries".into()))?;

    let total_payments = checked_total(&schedule, |e| e.payment_amount, "total payments")?;
    let total_interest = checked_total(&schedule, |e| e.interest_payment, "total interest")?;
    let total_extra_payments = checked_total(&schedule, |e| e.extra_payment, "extra payments")?;

    // --- Baseline without extra payments ---
    let (baseline_interest, baseline_payoff) = if inputs.extra_payment.is_zero() {
        (total_interest, payoff_date)
    } else {
        let baseline = LoanInputs {
            extra_payment: Decimal::ZERO,
            ..inputs.clone()
        };
        let (baseline_schedule, _) = build_schedule(&baseline)?;
        let interest =
            checked_total(&baseline_schedule, |e| e.interest_payment, "baseline interest")?;
        let payoff = baseline_schedule
            .last()
            .map(|entry| entry.payment_date)
            .unwrap_or(payoff_date);
        (interest, payoff)
    };

    let interest_saved = baseline_interest - total_interest;
    let time_saved_months = months_between(payoff_date, baseline_payoff);

    // --- Reasonableness warnings ---
    if inputs.annual_rate > HIGH_RATE_WARNING_PCT {
        warnings.push(format!(
            "Annual rate of {}% is unusually high; verify the input",
            inputs.annual_rate
        ));
    }
    let nominal_payments = inputs.total_payments();
    let number_of_payments = schedule.len() as u32;
    if number_of_payments > nominal_payments {
        warnings.push(format!(
            "{} schedule overruns the nominal term by {} payments",
            inputs.payment_structure,
            number_of_payments - nominal_payments
        ));
    }

    let summary = LoanSummary {
        principal: inputs.loan_amount,
        regular_payment,
        total_payments,
        total_interest,
        total_extra_payments,
        interest_saved,
        time_saved: format_time_saved(time_saved_months),
        time_saved_months,
        payoff_date,
        number_of_payments,
    };

    let total_amount = inputs
        .loan_amount
        .checked_add(total_interest)
        .ok_or_else(|| LoanEngineError::NumericOverflow {
            context: "loan amount plus total interest".into(),
        })?;

    let result = LoanResult {
        monthly_payment: regular_payment,
        total_payments,
        total_interest,
        total_amount,
        payoff_date,
        amortization_schedule: schedule,
        summary,
    };

    Ok((result, warnings))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn checked_total(
    schedule: &[AmortizationEntry],
    field: fn(&AmortizationEntry) -> Money,
    label: &str,
) -> LoanEngineResult<Money> {
    schedule
        .iter()
        .try_fold(Decimal::ZERO, |acc, entry| acc.checked_add(field(entry)))
        .ok_or_else(|| LoanEngineError::NumericOverflow {
            context: format!("summing {label}"),
        })
}

/// Whole calendar months from `from` to `to`; negative when `to` is earlier.
fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if months > 0 && to.day() < from.day() {
        months -= 1;
    } else if months < 0 && to.day() > from.day() {
        months += 1;
    }
    months
}

fn format_time_saved(months: i32) -> String {
    if months <= 0 {
        return "0 months".to_string();
    }
    format!("{} years, {} months", months / 12, months % 12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::inputs::{PaymentFrequency, PaymentStructure};

    fn assert_close(a: Decimal, b: Decimal, tol: Decimal) {
        assert!(
            (a - b).abs() < tol,
            "Expected {a} to be close to {b} (tolerance {tol})"
        );
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mortgage() -> LoanInputs {
        LoanInputs::standard(dec!(300000), dec!(6), 30, ymd(2025, 1, 1))
    }

    #[test]
    fn test_monthly_payment_textbook_mortgage() {
        let payment = calculate_monthly_payment(dec!(300000), dec!(6), 360).unwrap();
        assert_close(payment, dec!(1798.65), dec!(0.01));
    }

    #[test]
    fn test_monthly_payment_zero_rate() {
        let payment = calculate_monthly_payment(dec!(12000), Decimal::ZERO, 12).unwrap();
        assert_eq!(payment, dec!(1000));
    }

    #[test]
    fn test_monthly_payment_rejects_zero_payments() {
        let result = calculate_monthly_payment(dec!(12000), dec!(5), 0);
        assert!(matches!(result, Err(LoanEngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_payment_amount_biweekly_scales_monthly() {
        let mut inputs = mortgage();
        inputs.payment_frequency = PaymentFrequency::Biweekly;
        let payment = calculate_payment_amount(&inputs).unwrap();
        // 1798.65 * 12 / 26
        assert_close(payment, dec!(830.15), dec!(0.01));
    }

    #[test]
    fn test_calculate_loan_reference_scenario() {
        let output = calculate_loan(&mortgage()).unwrap();
        let result = &output.result;

        assert_close(result.monthly_payment, dec!(1798.65), dec!(0.01));
        assert_eq!(result.amortization_schedule.len(), 360);
        assert_eq!(
            result.amortization_schedule.last().unwrap().remaining_balance,
            Decimal::ZERO
        );
        assert_eq!(result.payoff_date, ymd(2054, 12, 1));
        assert_eq!(result.total_amount, dec!(300000) + result.total_interest);
        assert_close(result.total_interest, dec!(347514.57), dec!(1));
        assert_eq!(result.summary.interest_saved, Decimal::ZERO);
        assert_eq!(result.summary.time_saved, "0 months");
        assert_eq!(result.summary.number_of_payments, 360);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_extra_payment_saves_interest_and_time() {
        let base = calculate_loan(&mortgage()).unwrap().result;
        let mut inputs = mortgage();
        inputs.extra_payment = dec!(200);
        let result = calculate_loan(&inputs).unwrap().result;

        assert!(result.total_interest < base.total_interest);
        assert!(result.amortization_schedule.len() < 360);
        assert_eq!(
            result.summary.interest_saved,
            base.total_interest - result.total_interest
        );
        assert!(result.summary.time_saved_months > 0);
        assert!(result.summary.time_saved.contains("years"));
        assert!(result.summary.total_extra_payments > Decimal::ZERO);
    }

    #[test]
    fn test_more_extra_never_costs_more() {
        let mut previous: Option<LoanResult> = None;
        for extra in [dec!(0), dec!(50), dec!(200), dec!(1000)] {
            let mut inputs = mortgage();
            inputs.extra_payment = extra;
            let result = calculate_loan(&inputs).unwrap().result;
            if let Some(prev) = &previous {
                assert!(result.total_interest <= prev.total_interest);
                assert!(result.payoff_date <= prev.payoff_date);
            }
            previous = Some(result);
        }
    }

    #[test]
    fn test_zero_rate_schedule_is_interest_free() {
        let inputs = LoanInputs::standard(dec!(24000), Decimal::ZERO, 2, ymd(2025, 1, 1));
        let result = calculate_loan(&inputs).unwrap().result;
        assert_eq!(result.total_interest, Decimal::ZERO);
        for entry in &result.amortization_schedule {
            assert_eq!(entry.interest_payment, Decimal::ZERO);
            assert_eq!(entry.principal_payment, dec!(1000));
        }
    }

    #[test]
    fn test_zero_term_fails() {
        let inputs = LoanInputs::standard(dec!(300000), dec!(6), 0, ymd(2025, 1, 1));
        let result = calculate_loan(&inputs);
        assert!(matches!(result, Err(LoanEngineError::EmptySchedule(_))));
    }

    #[test]
    fn test_oversized_principal_is_rejected() {
        let inputs = LoanInputs::standard(
            dec!(50000000000000000000000000000),
            dec!(6),
            30,
            ymd(2025, 1, 1),
        );
        let result = calculate_loan(&inputs);
        assert!(matches!(result, Err(LoanEngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_extreme_accepted_inputs_return_errors_not_panics() {
        for structure in [
            PaymentStructure::Standard,
            PaymentStructure::InterestOnly,
            PaymentStructure::PrincipalOnly,
            PaymentStructure::Balloon,
            PaymentStructure::Graduated,
            PaymentStructure::InterestFirst,
        ] {
            let mut inputs = LoanInputs::standard(
                crate::types::MAX_AMOUNT,
                crate::types::MAX_ANNUAL_RATE_PCT,
                100,
                ymd(2025, 1, 1),
            );
            inputs.payment_frequency = PaymentFrequency::Weekly;
            inputs.payment_structure = structure;
            inputs.balloon_amount = Some(dec!(1000));
            inputs.interest_only_period = Some(12);
            inputs.payment_increase_rate = Some(dec!(100));
            match calculate_loan(&inputs) {
                Ok(output) => assert!(output.result.total_interest >= Decimal::ZERO),
                Err(LoanEngineError::NumericOverflow { .. }) => {}
                Err(other) => panic!("{structure}: unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_graduated_overrun_is_reported() {
        let mut inputs = mortgage();
        inputs.payment_structure = PaymentStructure::Graduated;
        let output = calculate_loan(&inputs).unwrap();
        assert!(output.result.amortization_schedule.len() > 360);
        assert!(output.warnings.iter().any(|w| w.contains("nominal term")));
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(ymd(2050, 3, 1), ymd(2054, 12, 1)), 57);
        assert_eq!(months_between(ymd(2025, 1, 31), ymd(2025, 3, 15)), 1);
        assert_eq!(months_between(ymd(2025, 3, 1), ymd(2025, 1, 1)), -2);
        assert_eq!(months_between(ymd(2025, 3, 1), ymd(2025, 3, 1)), 0);
    }

    #[test]
    fn test_format_time_saved() {
        assert_eq!(format_time_saved(57), "4 years, 9 months");
        assert_eq!(format_time_saved(12), "1 years, 0 months");
        assert_eq!(format_time_saved(0), "0 months");
        assert_eq!(format_time_saved(-3), "0 months");
    }
}
