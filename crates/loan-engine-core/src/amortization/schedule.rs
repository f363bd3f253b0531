use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::inputs::{LoanInputs, LoanTerms};
use super::structure::{rule_for, PeriodContext};
use crate::error::LoanEngineError;
use crate::types::Money;
use crate::LoanEngineResult;

/// Balance at or below which the loan is considered repaid.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

/// Multiple of the nominal payment count after which generation stops.
const ITERATION_CAP_MULTIPLE: u32 = 2;

/// Upper bound on rows reserved up front; longer schedules grow on demand.
const MAX_PREALLOCATED_ROWS: u32 = 1200;

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based.
    pub payment_number: u32,
    pub payment_date: NaiveDate,
    /// Principal + interest + extra.
    pub payment_amount: Money,
    pub principal_payment: Money,
    pub interest_payment: Money,
    pub extra_payment: Money,
    /// Balance after this payment; never negative.
    pub remaining_balance: Money,
}

/// Totals for one calendar year of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBreakdown {
    pub year: i32,
    pub payments_made: u32,
    pub total_paid: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub extra_paid: Money,
    pub ending_balance: Money,
}

/// Period-by-period amortization schedule for `inputs`.
pub fn generate_schedule(inputs: &LoanInputs) -> LoanEngineResult<Vec<AmortizationEntry>> {
    build_schedule(inputs).map(|(schedule, _)| schedule)
}

/// Schedule plus any warnings raised while building it.
pub(crate) fn build_schedule(
    inputs: &LoanInputs,
) -> LoanEngineResult<(Vec<AmortizationEntry>, Vec<String>)> {
    let terms = LoanTerms::from_inputs(inputs)?;
    if terms.total_payments == 0 {
        return Err(LoanEngineError::EmptySchedule(
            "loan term has no payment periods".into(),
        ));
    }

    let rule = rule_for(inputs.payment_structure);
    let regular_payment = (rule.regular_payment)(&terms)?;
    let max_periods = terms.total_payments.saturating_mul(ITERATION_CAP_MULTIPLE);

    log::debug!(
        "building {} schedule: principal={} rate={}% payments={} regular_payment={}",
        inputs.payment_structure,
        terms.principal,
        terms.annual_rate,
        terms.total_payments,
        regular_payment
    );

    let mut warnings: Vec<String> = Vec::new();
    let mut schedule: Vec<AmortizationEntry> =
        Vec::with_capacity(terms.total_payments.min(MAX_PREALLOCATED_ROWS) as usize);
    let mut balance = terms.principal;
    let mut payment_number: u32 = 0;

    while balance > BALANCE_EPSILON && payment_number < max_periods {
        payment_number += 1;

        let payment_date = inputs
            .payment_frequency
            .payment_date(inputs.start_date, payment_number - 1)
            .ok_or_else(|| {
                LoanEngineError::DateError(format!(
                    "payment {payment_number} falls outside the supported calendar range"
                ))
            })?;

        let ctx = PeriodContext {
            terms: &terms,
            regular_payment,
            payment_number,
            balance,
            interest: balance * terms.period_rate,
        };
        let split = (rule.split_period)(&ctx)?;

        let at_cap = payment_number == max_periods;
        let settled = settle_period(balance, split.principal, inputs.extra_payment, at_cap);
        if at_cap && settled.principal > split.principal {
            let message = format!(
                "Schedule reached the {max_periods}-payment cap; payment {payment_number} retires the remaining balance of {}",
                balance.round_dp(2)
            );
            log::warn!("{message}");
            warnings.push(message);
        }

        balance = if settled.retires_loan {
            Decimal::ZERO
        } else {
            (balance - settled.principal - settled.extra).max(Decimal::ZERO)
        };

        schedule.push(AmortizationEntry {
            payment_number,
            payment_date,
            payment_amount: settled.principal + split.interest + settled.extra,
            principal_payment: settled.principal,
            interest_payment: split.interest,
            extra_payment: settled.extra,
            remaining_balance: balance,
        });
    }

    if schedule.is_empty() {
        return Err(LoanEngineError::EmptySchedule(
            "no payments were generated for the given inputs".into(),
        ));
    }

    Ok((schedule, warnings))
}

/// Principal and extra actually applied in one period.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Settlement {
    principal: Money,
    extra: Money,
    retires_loan: bool,
}

/// Clip scheduled principal and extra so the period never overdraws `balance`.
///
/// Extra absorbs the shortfall first. A residual of at most one cent, or any
/// residual when `retire` is set, is folded into principal so the balance
/// lands on exactly zero.
fn settle_period(balance: Money, principal: Money, extra: Money, retire: bool) -> Settlement {
    if principal >= balance {
        return Settlement {
            principal: balance,
            extra: Decimal::ZERO,
            retires_loan: true,
        };
    }
    if retire || principal + extra >= balance - BALANCE_EPSILON {
        let extra = extra.min(balance - principal);
        return Settlement {
            principal: balance - extra,
            extra,
            retires_loan: true,
        };
    }
    Settlement {
        principal,
        extra,
        retires_loan: false,
    }
}

/// Per-calendar-year totals, in schedule order.
pub fn yearly_breakdown(schedule: &[AmortizationEntry]) -> Vec<YearlyBreakdown> {
    let mut years: Vec<YearlyBreakdown> = Vec::new();

    for entry in schedule {
        let year = entry.payment_date.year();
        match years.last_mut() {
            Some(current) if current.year == year => {
                current.payments_made += 1;
                current.total_paid += entry.payment_amount;
                current.principal_paid += entry.principal_payment;
                current.interest_paid += entry.interest_payment;
                current.extra_paid += entry.extra_payment;
                current.ending_balance = entry.remaining_balance;
            }
            _ => years.push(YearlyBreakdown {
                year,
                payments_made: 1,
                total_paid: entry.payment_amount,
                principal_paid: entry.principal_payment,
                interest_paid: entry.interest_payment,
                extra_paid: entry.extra_payment,
                ending_balance: entry.remaining_balance,
            }),
        }
    }

    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::inputs::{PaymentFrequency, PaymentStructure};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn mortgage() -> LoanInputs {
        LoanInputs::standard(dec!(300000), dec!(6), 30, start())
    }

    fn assert_retires(schedule: &[AmortizationEntry], principal: Money) {
        let retired: Money = schedule
            .iter()
            .map(|e| e.principal_payment + e.extra_payment)
            .sum();
        assert!(
            (retired - principal).abs() < dec!(0.000001),
            "principal + extra summed to {retired}, expected {principal}"
        );
    }

    #[test]
    fn test_settle_period_clips_extra_first() {
        let settled = settle_period(dec!(500), dec!(400), dec!(200), false);
        assert_eq!(settled.principal, dec!(400));
        assert_eq!(settled.extra, dec!(100));
        assert!(settled.retires_loan);
    }

    #[test]
    fn test_settle_period_principal_exceeds_balance() {
        let settled = settle_period(dec!(300), dec!(400), dec!(200), false);
        assert_eq!(settled.principal, dec!(300));
        assert_eq!(settled.extra, Decimal::ZERO);
    }

    #[test]
    fn test_settle_period_sweeps_sub_cent_residual() {
        let settled = settle_period(dec!(1000.005), dec!(1000), Decimal::ZERO, false);
        assert_eq!(settled.principal, dec!(1000.005));
        assert_eq!(settled.extra, Decimal::ZERO);
        assert!(settled.retires_loan);
    }

    #[test]
    fn test_settle_period_leaves_ordinary_periods_alone() {
        let settled = settle_period(dec!(100000), dec!(300), dec!(50), false);
        assert_eq!(settled.principal, dec!(300));
        assert_eq!(settled.extra, dec!(50));
        assert!(!settled.retires_loan);
    }

    #[test]
    fn test_standard_schedule_shape() {
        let schedule = generate_schedule(&mortgage()).unwrap();
        assert_eq!(schedule.len(), 360);
        assert_eq!(schedule[0].payment_number, 1);
        assert_eq!(schedule[0].payment_date, start());
        assert_eq!(
            schedule[359].payment_date,
            NaiveDate::from_ymd_opt(2054, 12, 1).unwrap()
        );
        assert_eq!(schedule[359].remaining_balance, Decimal::ZERO);
        assert_retires(&schedule, dec!(300000));
    }

    #[test]
    fn test_first_period_split() {
        let schedule = generate_schedule(&mortgage()).unwrap();
        let first = &schedule[0];
        assert_eq!(first.interest_payment, dec!(1500));
        assert!((first.principal_payment - dec!(298.65)).abs() < dec!(0.01));
        assert_eq!(first.extra_payment, Decimal::ZERO);
    }

    #[test]
    fn test_extra_payment_clipped_on_final_entry() {
        let mut inputs = mortgage();
        inputs.extra_payment = dec!(500);
        let schedule = generate_schedule(&inputs).unwrap();
        let last = schedule.last().unwrap();
        assert!(last.extra_payment <= dec!(500));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert_retires(&schedule, dec!(300000));
    }

    #[test]
    fn test_balance_never_increases() {
        for structure in [
            PaymentStructure::Standard,
            PaymentStructure::InterestOnly,
            PaymentStructure::PrincipalOnly,
            PaymentStructure::Balloon,
            PaymentStructure::Graduated,
            PaymentStructure::InterestFirst,
        ] {
            let mut inputs = mortgage();
            inputs.payment_structure = structure;
            inputs.balloon_amount = Some(dec!(50000));
            inputs.interest_only_period = Some(36);
            let schedule = generate_schedule(&inputs).unwrap();
            let mut previous = inputs.loan_amount;
            for entry in &schedule {
                assert!(
                    entry.remaining_balance <= previous,
                    "{structure}: balance rose at payment {}",
                    entry.payment_number
                );
                previous = entry.remaining_balance;
            }
            assert_eq!(previous, Decimal::ZERO, "{structure}: loan not retired");
            assert!(schedule.len() <= 720, "{structure}: exceeded iteration cap");
        }
    }

    #[test]
    fn test_interest_only_window() {
        let mut inputs = mortgage();
        inputs.payment_structure = PaymentStructure::InterestOnly;
        inputs.interest_only_period = Some(24);
        let schedule = generate_schedule(&inputs).unwrap();

        for entry in &schedule[..24] {
            assert_eq!(entry.principal_payment, Decimal::ZERO);
            assert_eq!(entry.interest_payment, dec!(1500));
        }
        assert!(schedule[24].principal_payment > Decimal::ZERO);
        assert_eq!(schedule.len(), 360);
    }

    #[test]
    fn test_principal_only_charges_no_interest() {
        let mut inputs = LoanInputs::standard(dec!(120000), dec!(6), 10, start());
        inputs.payment_structure = PaymentStructure::PrincipalOnly;
        let schedule = generate_schedule(&inputs).unwrap();
        assert_eq!(schedule.len(), 120);
        assert!(schedule.iter().all(|e| e.interest_payment.is_zero()));
        assert!(schedule.iter().all(|e| e.principal_payment == dec!(1000)));
    }

    #[test]
    fn test_balloon_final_payment() {
        let mut inputs = LoanInputs::standard(dec!(200000), dec!(5), 7, start());
        inputs.payment_structure = PaymentStructure::Balloon;
        inputs.balloon_amount = Some(dec!(80000));
        let schedule = generate_schedule(&inputs).unwrap();
        assert_eq!(schedule.len(), 84);
        let last = schedule.last().unwrap();
        assert!(last.principal_payment >= dec!(80000));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_weekly_schedule_dates_and_length() {
        let mut inputs = LoanInputs::standard(dec!(20000), dec!(4), 2, start());
        inputs.payment_frequency = PaymentFrequency::Weekly;
        let schedule = generate_schedule(&inputs).unwrap();
        assert_eq!(
            schedule[1].payment_date,
            NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
        );
        assert!(schedule.len() <= 104);
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_term_is_empty_schedule() {
        let inputs = LoanInputs::standard(dec!(10000), dec!(5), 0, start());
        let result = generate_schedule(&inputs);
        assert!(matches!(result, Err(LoanEngineError::EmptySchedule(_))));
    }

    #[test]
    fn test_iteration_cap_retires_balance_with_warning() {
        // A flat 70% payment at 24% barely covers interest and cannot finish in 120 periods
        let mut inputs = LoanInputs::standard(dec!(100000), dec!(24), 5, start());
        inputs.payment_structure = PaymentStructure::Graduated;
        inputs.payment_increase_rate = Some(Decimal::ZERO);
        let (schedule, warnings) = build_schedule(&inputs).unwrap();
        assert_eq!(schedule.len(), 120);
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("cap"));
    }

    #[test]
    fn test_yearly_breakdown_groups_by_calendar_year() {
        let mut inputs = LoanInputs::standard(dec!(12000), Decimal::ZERO, 2, start());
        inputs.start_date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let schedule = generate_schedule(&inputs).unwrap();
        let years = yearly_breakdown(&schedule);

        assert_eq!(years.len(), 3);
        assert_eq!(years[0].year, 2025);
        assert_eq!(years[0].payments_made, 6);
        assert_eq!(years[0].principal_paid, dec!(3000));
        assert_eq!(years[1].payments_made, 12);
        assert_eq!(years[1].ending_balance, dec!(3000));
        assert_eq!(years[2].ending_balance, Decimal::ZERO);
    }
}
