use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LoanEngineError;
use crate::types::{Money, Percent, Rate, MAX_AMOUNT, MAX_ANNUAL_RATE_PCT, MAX_TERM_MONTHS};
use crate::LoanEngineResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Years over which a graduated payment keeps stepping up when unspecified.
pub const DEFAULT_GRADUATION_YEARS: u32 = 5;

/// Annual step-up of a graduated payment (percent) when unspecified.
pub const DEFAULT_PAYMENT_INCREASE_PCT: Decimal = dec!(7.5);

const PERCENT: Decimal = dec!(100);
const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Payment frequency
// ---------------------------------------------------------------------------

/// How often the borrower pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Weekly,
    Biweekly,
    #[default]
    Monthly,
    Quarterly,
    Annually,
}

impl PaymentFrequency {
    pub fn payments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Weekly => 52,
            PaymentFrequency::Biweekly => 26,
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::Annually => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::Biweekly => "biweekly",
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Quarterly => "quarterly",
            PaymentFrequency::Annually => "annually",
        }
    }

    /// Date of the payment that falls `periods_elapsed` period units after `start`.
    ///
    /// Calendar-month frequencies are offset from `start` rather than chained,
    /// so a loan starting on the 31st does not drift to the 28th after February.
    pub fn payment_date(self, start: NaiveDate, periods_elapsed: u32) -> Option<NaiveDate> {
        let n = u64::from(periods_elapsed);
        match self {
            PaymentFrequency::Weekly => start.checked_add_days(Days::new(n * 7)),
            PaymentFrequency::Biweekly => start.checked_add_days(Days::new(n * 14)),
            PaymentFrequency::Monthly => start.checked_add_months(Months::new(periods_elapsed)),
            PaymentFrequency::Quarterly => start
                .checked_add_months(Months::new(periods_elapsed.checked_mul(3)?)),
            PaymentFrequency::Annually => start
                .checked_add_months(Months::new(periods_elapsed.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weekly" => Ok(PaymentFrequency::Weekly),
            "biweekly" | "bi_weekly" => Ok(PaymentFrequency::Biweekly),
            "monthly" => Ok(PaymentFrequency::Monthly),
            "quarterly" => Ok(PaymentFrequency::Quarterly),
            "annually" | "yearly" => Ok(PaymentFrequency::Annually),
            other => Err(format!("Unknown payment frequency: {other}")),
        }
    }
}

/// Number of payments a year for a frequency (52/26/12/4/1).
pub fn get_payments_per_year(frequency: PaymentFrequency) -> u32 {
    frequency.payments_per_year()
}

// ---------------------------------------------------------------------------
// Payment structure
// ---------------------------------------------------------------------------

/// Repayment profile of the loan.
///
/// Deserialisation is lenient: a tag that names no known structure yields
/// [`PaymentStructure::Standard`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStructure {
    /// Level annuity payment.
    #[default]
    Standard,
    /// Interest only for a window, then level amortization of the balance.
    InterestOnly,
    /// Equal principal instalments with no interest attributed.
    PrincipalOnly,
    /// Payments sized on principal less the balloon; the last payment retires the rest.
    Balloon,
    /// Payments start at 70% of standard and step up each year.
    Graduated,
    /// Flat interest-heavy payment over the first half, amortizing over the second.
    InterestFirst,
}

impl PaymentStructure {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStructure::Standard => "standard",
            PaymentStructure::InterestOnly => "interest_only",
            PaymentStructure::PrincipalOnly => "principal_only",
            PaymentStructure::Balloon => "balloon",
            PaymentStructure::Graduated => "graduated",
            PaymentStructure::InterestFirst => "interest_first",
        }
    }

    /// Resolve a structure tag, falling back to `Standard` for anything unknown.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl fmt::Display for PaymentStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStructure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(PaymentStructure::Standard),
            "interest_only" => Ok(PaymentStructure::InterestOnly),
            "principal_only" => Ok(PaymentStructure::PrincipalOnly),
            "balloon" => Ok(PaymentStructure::Balloon),
            "graduated" => Ok(PaymentStructure::Graduated),
            "interest_first" => Ok(PaymentStructure::InterestFirst),
            other => Err(format!("Unknown payment structure: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for PaymentStructure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(PaymentStructure::from_tag(&tag))
    }
}

// ---------------------------------------------------------------------------
// Loan inputs
// ---------------------------------------------------------------------------

/// Everything a single loan calculation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInputs {
    /// Amount borrowed.
    pub loan_amount: Money,
    /// Nominal annual interest rate in percent (6 = 6%).
    pub annual_rate: Percent,
    pub loan_term_years: u32,
    #[serde(default)]
    pub loan_term_months: u32,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    /// Additional principal paid every period.
    #[serde(default)]
    pub extra_payment: Money,
    /// Date of the first payment.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub payment_structure: PaymentStructure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon_amount: Option<Money>,
    /// Length of the interest-only window in months.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_only_period: Option<u32>,
    /// Years over which a graduated payment steps up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_period: Option<u32>,
    /// Annual graduated step-up in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_increase_rate: Option<Percent>,
}

impl LoanInputs {
    /// Standard monthly loan with no extras, starting on `start_date`.
    pub fn standard(
        loan_amount: Money,
        annual_rate: Percent,
        loan_term_years: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            loan_amount,
            annual_rate,
            loan_term_years,
            loan_term_months: 0,
            payment_frequency: PaymentFrequency::Monthly,
            extra_payment: Decimal::ZERO,
            start_date,
            payment_structure: PaymentStructure::Standard,
            balloon_amount: None,
            interest_only_period: None,
            graduation_period: None,
            payment_increase_rate: None,
        }
    }

    /// Total term in months (years * 12 + months).
    pub fn total_months(&self) -> u32 {
        self.loan_term_years
            .saturating_mul(MONTHS_PER_YEAR)
            .saturating_add(self.loan_term_months)
    }

    /// Number of scheduled payments at the chosen frequency.
    pub fn total_payments(&self) -> u32 {
        months_to_periods(self.total_months(), self.payment_frequency.payments_per_year())
    }
}

/// Periods covering `months` at `payments_per_year`, rounded up.
pub(crate) fn months_to_periods(months: u32, payments_per_year: u32) -> u32 {
    let periods = u64::from(months) * u64::from(payments_per_year);
    let rounded_up = periods.div_ceil(u64::from(MONTHS_PER_YEAR));
    u32::try_from(rounded_up).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Derived terms
// ---------------------------------------------------------------------------

/// Validated, derived view of [`LoanInputs`] shared by the structure rules.
#[derive(Debug, Clone)]
pub(crate) struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Percent,
    pub monthly_rate: Rate,
    pub period_rate: Rate,
    pub payments_per_year: u32,
    pub total_months: u32,
    pub total_payments: u32,
    pub balloon_amount: Money,
    pub interest_only_periods: u32,
    pub graduation_years: u32,
    pub payment_increase: Rate,
}

impl LoanTerms {
    pub fn from_inputs(inputs: &LoanInputs) -> LoanEngineResult<Self> {
        validate_loan_inputs(inputs)?;

        let payments_per_year = inputs.payment_frequency.payments_per_year();
        let annual_fraction = inputs.annual_rate / PERCENT;

        Ok(Self {
            principal: inputs.loan_amount,
            annual_rate: inputs.annual_rate,
            monthly_rate: annual_fraction / Decimal::from(MONTHS_PER_YEAR),
            period_rate: annual_fraction / Decimal::from(payments_per_year),
            payments_per_year,
            total_months: inputs.total_months(),
            total_payments: inputs.total_payments(),
            balloon_amount: inputs.balloon_amount.unwrap_or(Decimal::ZERO),
            interest_only_periods: months_to_periods(
                inputs.interest_only_period.unwrap_or(0),
                payments_per_year,
            ),
            graduation_years: inputs
                .graduation_period
                .unwrap_or(DEFAULT_GRADUATION_YEARS),
            payment_increase: inputs
                .payment_increase_rate
                .unwrap_or(DEFAULT_PAYMENT_INCREASE_PCT)
                / PERCENT,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_loan_inputs(inputs: &LoanInputs) -> LoanEngineResult<()> {
    if inputs.loan_amount <= Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "loan_amount".into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if inputs.loan_amount > MAX_AMOUNT {
        return Err(LoanEngineError::InvalidInput {
            field: "loan_amount".into(),
            reason: format!("Loan amount cannot exceed {MAX_AMOUNT}"),
        });
    }
    if inputs.annual_rate < Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    if inputs.annual_rate > MAX_ANNUAL_RATE_PCT {
        return Err(LoanEngineError::InvalidInput {
            field: "annual_rate".into(),
            reason: format!("Annual rate cannot exceed {MAX_ANNUAL_RATE_PCT}%"),
        });
    }
    if inputs.total_months() > MAX_TERM_MONTHS {
        return Err(LoanEngineError::InvalidInput {
            field: "loan_term_years".into(),
            reason: format!("Loan term cannot exceed {MAX_TERM_MONTHS} months"),
        });
    }
    if inputs.extra_payment < Decimal::ZERO {
        return Err(LoanEngineError::InvalidInput {
            field: "extra_payment".into(),
            reason: "Extra payment cannot be negative".into(),
        });
    }
    if inputs.extra_payment > MAX_AMOUNT {
        return Err(LoanEngineError::InvalidInput {
            field: "extra_payment".into(),
            reason: format!("Extra payment cannot exceed {MAX_AMOUNT}"),
        });
    }
    match inputs.payment_structure {
        PaymentStructure::Balloon => {
            let balloon = inputs.balloon_amount.unwrap_or(Decimal::ZERO);
            if balloon < Decimal::ZERO {
                return Err(LoanEngineError::InvalidInput {
                    field: "balloon_amount".into(),
                    reason: "Balloon amount cannot be negative".into(),
                });
            }
            if balloon >= inputs.loan_amount {
                return Err(LoanEngineError::InvalidInput {
                    field: "balloon_amount".into(),
                    reason: "Balloon amount must be less than the loan amount".into(),
                });
            }
        }
        PaymentStructure::InterestOnly => {
            let window = inputs.interest_only_period.unwrap_or(0);
            let term = inputs.total_months();
            if term > 0 && window >= term {
                return Err(LoanEngineError::InvalidInput {
                    field: "interest_only_period".into(),
                    reason: "Interest-only period must be shorter than the loan term".into(),
                });
            }
        }
        PaymentStructure::Graduated => {
            if inputs
                .payment_increase_rate
                .is_some_and(|rate| rate < Decimal::ZERO || rate > PERCENT)
            {
                return Err(LoanEngineError::InvalidInput {
                    field: "payment_increase_rate".into(),
                    reason: "Payment increase rate must be between 0 and 100 percent".into(),
                });
            }
        }
        PaymentStructure::Standard
        | PaymentStructure::PrincipalOnly
        | PaymentStructure::InterestFirst => {}
    }

    Ok(())
}
