//! Payment-structure rules.
//!
//! Each [`PaymentStructure`] owns exactly one [`StructureRule`]: how its
//! regular payment is sized and how a single period's payment divides into
//! interest and principal. The schedule builder and the payment calculator
//! both dispatch through [`rule_for`].

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use super::inputs::{LoanTerms, PaymentStructure};
use crate::error::LoanEngineError;
use crate::time_value::annuity_payment;
use crate::types::Money;
use crate::LoanEngineResult;

/// Share of the standard payment a graduated loan starts at.
const GRADUATED_START_FACTOR: Decimal = dec!(0.7);

/// State handed to a rule for one period.
pub(crate) struct PeriodContext<'a> {
    pub terms: &'a LoanTerms,
    pub regular_payment: Money,
    /// 1-based.
    pub payment_number: u32,
    /// Balance before this period's payment.
    pub balance: Money,
    /// `balance × period_rate`.
    pub interest: Money,
}

/// Scheduled interest / principal for one period, before extra payments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PeriodSplit {
    pub interest: Money,
    pub principal: Money,
}

pub(crate) struct StructureRule {
    pub structure: PaymentStructure,
    pub regular_payment: fn(&LoanTerms) -> LoanEngineResult<Money>,
    pub split_period: fn(&PeriodContext<'_>) -> LoanEngineResult<PeriodSplit>,
}

static RULES: [StructureRule; 6] = [
    StructureRule {
        structure: PaymentStructure::Standard,
        regular_payment: standard_payment,
        split_period: standard_split,
    },
    StructureRule {
        structure: PaymentStructure::InterestOnly,
        regular_payment: interest_only_payment,
        split_period: interest_only_split,
    },
    StructureRule {
        structure: PaymentStructure::PrincipalOnly,
        regular_payment: principal_only_payment,
        split_period: principal_only_split,
    },
    StructureRule {
        structure: PaymentStructure::Balloon,
        regular_payment: balloon_payment,
        split_period: balloon_split,
    },
    StructureRule {
        structure: PaymentStructure::Graduated,
        regular_payment: graduated_payment,
        split_period: graduated_split,
    },
    StructureRule {
        structure: PaymentStructure::InterestFirst,
        regular_payment: interest_first_payment,
        split_period: interest_first_split,
    },
];

/// Rule for `structure`; the standard rule when none is registered.
pub(crate) fn rule_for(structure: PaymentStructure) -> &'static StructureRule {
    RULES
        .iter()
        .find(|rule| rule.structure == structure)
        .unwrap_or(&RULES[0])
}

// ---------------------------------------------------------------------------
// Regular payment sizing
// ---------------------------------------------------------------------------

fn require_periods(terms: &LoanTerms) -> LoanEngineResult<Decimal> {
    if terms.total_payments == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "loan_term".into(),
            reason: "Loan term must cover at least one payment".into(),
        });
    }
    Ok(Decimal::from(terms.total_payments))
}

/// Annuity on `amount` at the monthly rate over the term in months, converted
/// to the payment frequency.
fn standard_payment_on(amount: Money, terms: &LoanTerms) -> LoanEngineResult<Money> {
    let periods = require_periods(terms)?;

    if terms.annual_rate.is_zero() {
        return Ok(amount / periods);
    }

    let monthly = annuity_payment(amount, terms.monthly_rate, terms.total_months)?;
    Ok(monthly * dec!(12) / Decimal::from(terms.payments_per_year))
}

fn standard_payment(terms: &LoanTerms) -> LoanEngineResult<Money> {
    standard_payment_on(terms.principal, terms)
}

fn interest_only_payment(terms: &LoanTerms) -> LoanEngineResult<Money> {
    require_periods(terms)?;
    Ok(terms.principal * terms.period_rate)
}

fn principal_only_payment(terms: &LoanTerms) -> LoanEngineResult<Money> {
    let periods = require_periods(terms)?;
    Ok(terms.principal / periods)
}

fn balloon_payment(terms: &LoanTerms) -> LoanEngineResult<Money> {
    standard_payment_on(terms.principal - terms.balloon_amount, terms)
}

fn graduated_payment(terms: &LoanTerms) -> LoanEngineResult<Money> {
    Ok(standard_payment(terms)? * GRADUATED_START_FACTOR)
}

/// Periods an interest-first loan pays the flat amount; the rest amortize.
fn flat_periods(terms: &LoanTerms) -> u32 {
    terms.total_payments / 2
}

/// Interest implied by the standard schedule, spread over the flat first half of the term.
fn interest_first_payment(terms: &LoanTerms) -> LoanEngineResult<Money> {
    let periods = require_periods(terms)?;
    let standard = standard_payment(terms)?;
    let flat = flat_periods(terms);
    if flat == 0 {
        return Ok(standard);
    }
    let implied_interest = (standard * periods - terms.principal).max(Decimal::ZERO);
    Ok(implied_interest / Decimal::from(flat))
}

// ---------------------------------------------------------------------------
// Per-period splits
// ---------------------------------------------------------------------------

/// Interest is covered in full; whatever is left of `payment` reduces principal.
fn amortizing_split(ctx: &PeriodContext<'_>, payment: Money) -> PeriodSplit {
    PeriodSplit {
        interest: ctx.interest,
        principal: (payment - ctx.interest).max(Decimal::ZERO),
    }
}

/// Level payment that retires the current balance over the periods still scheduled.
fn level_payment_on_balance(ctx: &PeriodContext<'_>) -> LoanEngineResult<Money> {
    let remaining = ctx
        .terms
        .total_payments
        .saturating_sub(ctx.payment_number - 1);
    if remaining == 0 {
        return Ok(ctx.balance + ctx.interest);
    }
    annuity_payment(ctx.balance, ctx.terms.period_rate, remaining)
}

fn standard_split(ctx: &PeriodContext<'_>) -> LoanEngineResult<PeriodSplit> {
    Ok(amortizing_split(ctx, ctx.regular_payment))
}

fn interest_only_split(ctx: &PeriodContext<'_>) -> LoanEngineResult<PeriodSplit> {
    if ctx.payment_number <= ctx.terms.interest_only_periods {
        return Ok(PeriodSplit {
            interest: ctx.interest,
            principal: Decimal::ZERO,
        });
    }
    let payment = level_payment_on_balance(ctx)?;
    Ok(amortizing_split(ctx, payment))
}

fn principal_only_split(ctx: &PeriodContext<'_>) -> LoanEngineResult<PeriodSplit> {
    Ok(PeriodSplit {
        interest: Decimal::ZERO,
        principal: ctx.regular_payment,
    })
}

fn balloon_split(ctx: &PeriodContext<'_>) -> LoanEngineResult<PeriodSplit> {
    if ctx.payment_number >= ctx.terms.total_payments {
        return Ok(PeriodSplit {
            interest: ctx.interest,
            principal: ctx.balance,
        });
    }
    Ok(amortizing_split(ctx, ctx.regular_payment))
}

fn graduated_split(ctx: &PeriodContext<'_>) -> LoanEngineResult<PeriodSplit> {
    let completed_years = (ctx.payment_number - 1) / ctx.terms.payments_per_year;
    let steps = completed_years.min(ctx.terms.graduation_years);
    let step_up = (Decimal::ONE + ctx.terms.payment_increase)
        .checked_powu(u64::from(steps))
        .ok_or_else(|| LoanEngineError::NumericOverflow {
            context: format!("graduated payment step-up after {steps} years"),
        })?;
    let payment = ctx
        .regular_payment
        .checked_mul(step_up)
        .ok_or_else(|| LoanEngineError::NumericOverflow {
            context: format!("graduated payment after {steps} step-ups"),
        })?;
    Ok(amortizing_split(ctx, payment))
}

fn interest_first_split(ctx: &PeriodContext<'_>) -> LoanEngineResult<PeriodSplit> {
    if ctx.payment_number <= flat_periods(ctx.terms) {
        return Ok(amortizing_split(ctx, ctx.regular_payment));
    }
    let payment = level_payment_on_balance(ctx)?;
    Ok(amortizing_split(ctx, payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::inputs::LoanInputs;
    use chrono::NaiveDate;

    fn terms_for(structure: PaymentStructure) -> LoanTerms {
        let mut inputs = LoanInputs::standard(
            dec!(300000),
            dec!(6),
            30,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        inputs.payment_structure = structure;
        inputs.balloon_amount = Some(dec!(60000));
        inputs.interest_only_period = Some(24);
        LoanTerms::from_inputs(&inputs).unwrap()
    }

    fn regular(structure: PaymentStructure) -> Money {
        let terms = terms_for(structure);
        (rule_for(structure).regular_payment)(&terms).unwrap()
    }

    #[test]
    fn test_every_structure_has_its_own_rule() {
        for structure in [
            PaymentStructure::Standard,
            PaymentStructure::InterestOnly,
            PaymentStructure::PrincipalOnly,
            PaymentStructure::Balloon,
            PaymentStructure::Graduated,
            PaymentStructure::InterestFirst,
        ] {
            assert_eq!(rule_for(structure).structure, structure);
        }
    }

    #[test]
    fn test_standard_regular_payment() {
        let payment = regular(PaymentStructure::Standard);
        assert!((payment - dec!(1798.65)).abs() < dec!(0.01));
    }

    #[test]
    fn test_interest_only_regular_payment_is_pure_interest() {
        assert_eq!(regular(PaymentStructure::InterestOnly), dec!(1500));
    }

    #[test]
    fn test_principal_only_regular_payment() {
        let payment = regular(PaymentStructure::PrincipalOnly);
        assert!((payment - dec!(833.3333)).abs() < dec!(0.001));
    }

    #[test]
    fn test_balloon_amortizes_principal_less_balloon() {
        let balloon = regular(PaymentStructure::Balloon);
        let standard = regular(PaymentStructure::Standard);
        // 240k of 300k amortized
        assert!((balloon - standard * dec!(0.8)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_graduated_starts_at_seventy_percent() {
        let graduated = regular(PaymentStructure::Graduated);
        let standard = regular(PaymentStructure::Standard);
        assert_eq!(graduated, standard * dec!(0.7));
    }

    #[test]
    fn test_interest_first_spreads_implied_interest_over_half_term() {
        let flat = regular(PaymentStructure::InterestFirst);
        let standard = regular(PaymentStructure::Standard);
        let implied_interest = standard * dec!(360) - dec!(300000);
        assert!((flat - implied_interest / dec!(180)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_interest_first_odd_term_uses_whole_flat_periods() {
        let inputs = LoanInputs {
            loan_term_years: 0,
            loan_term_months: 5,
            payment_structure: PaymentStructure::InterestFirst,
            ..LoanInputs::standard(
                dec!(10000),
                dec!(12),
                0,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            )
        };
        let terms = LoanTerms::from_inputs(&inputs).unwrap();
        assert_eq!(terms.total_payments, 5);

        let flat = interest_first_payment(&terms).unwrap();
        let standard = standard_payment(&terms).unwrap();
        let implied_interest = standard * dec!(5) - dec!(10000);
        assert!((flat - implied_interest / dec!(2)).abs() < dec!(0.000001));

        let split_at = |payment_number| {
            let ctx = PeriodContext {
                terms: &terms,
                regular_payment: flat,
                payment_number,
                balance: dec!(10000),
                interest: dec!(100),
            };
            interest_first_split(&ctx).unwrap()
        };
        // Payments 1-2 are flat, payment 3 starts amortizing the balance over 3 periods
        assert_eq!(split_at(2).principal, (flat - dec!(100)).max(Decimal::ZERO));
        let level = annuity_payment(dec!(10000), terms.period_rate, 3).unwrap();
        assert_eq!(split_at(3).principal, level - dec!(100));
    }

    #[test]
    fn test_interest_first_single_payment_falls_back_to_standard() {
        let inputs = LoanInputs {
            loan_term_years: 0,
            loan_term_months: 1,
            payment_structure: PaymentStructure::InterestFirst,
            ..LoanInputs::standard(
                dec!(1000),
                dec!(12),
                0,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            )
        };
        let terms = LoanTerms::from_inputs(&inputs).unwrap();
        assert_eq!(
            interest_first_payment(&terms).unwrap(),
            standard_payment(&terms).unwrap()
        );
    }

    #[test]
    fn test_balloon_final_period_retires_balance() {
        let terms = terms_for(PaymentStructure::Balloon);
        let ctx = PeriodContext {
            terms: &terms,
            regular_payment: dec!(1438.92),
            payment_number: 360,
            balance: dec!(90000),
            interest: dec!(450),
        };
        let split = balloon_split(&ctx).unwrap();
        assert_eq!(split.principal, dec!(90000));
        assert_eq!(split.interest, dec!(450));
    }

    #[test]
    fn test_graduated_step_up_caps_at_graduation_period() {
        let terms = terms_for(PaymentStructure::Graduated);
        let split_at = |payment_number| {
            let ctx = PeriodContext {
                terms: &terms,
                regular_payment: dec!(1000),
                payment_number,
                balance: dec!(100000),
                interest: Decimal::ZERO,
            };
            graduated_split(&ctx).unwrap().principal
        };
        assert_eq!(split_at(1), dec!(1000));
        assert_eq!(split_at(13), dec!(1075));
        // Year 6 onwards stays at the fifth step
        assert_eq!(split_at(61), split_at(200));
    }

    #[test]
    fn test_amortizing_split_never_negative() {
        let terms = terms_for(PaymentStructure::Graduated);
        let ctx = PeriodContext {
            terms: &terms,
            regular_payment: dec!(1000),
            payment_number: 1,
            balance: dec!(300000),
            interest: dec!(1500),
        };
        let split = graduated_split(&ctx).unwrap();
        assert_eq!(split.principal, Decimal::ZERO);
        assert_eq!(split.interest, dec!(1500));
    }
}
