//! Loan amortization: payment sizing, schedule generation and loan summaries.
//!
//! Every payment structure is described by one rule in `structure`; the
//! schedule builder and the payment calculator dispatch through the same
//! table, so a structure's behaviour is defined in exactly one place.

mod inputs;
mod loan;
mod schedule;
mod structure;

pub use inputs::{
    get_payments_per_year, LoanInputs, PaymentFrequency, PaymentStructure,
    DEFAULT_GRADUATION_YEARS, DEFAULT_PAYMENT_INCREASE_PCT,
};
pub use loan::{
    calculate_loan, calculate_monthly_payment, calculate_payment_amount, LoanResult, LoanSummary,
};
pub use schedule::{
    generate_schedule, yearly_breakdown, AmortizationEntry, YearlyBreakdown, BALANCE_EPSILON,
};

pub(crate) use loan::compute_loan;
