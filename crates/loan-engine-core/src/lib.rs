pub mod error;
pub mod time_value;
pub mod types;

pub mod amortization;

#[cfg(feature = "affordability")]
pub mod affordability;

#[cfg(feature = "refinance")]
pub mod refinance;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use amortization::{
    calculate_loan, calculate_monthly_payment, calculate_payment_amount, generate_schedule,
    get_payments_per_year, yearly_breakdown, AmortizationEntry, LoanInputs, LoanResult,
    LoanSummary, PaymentFrequency, PaymentStructure, YearlyBreakdown,
};
pub use error::LoanEngineError;
pub use types::*;

/// Standard result type for all loan-engine operations
pub type LoanEngineResult<T> = Result<T, LoanEngineError>;
