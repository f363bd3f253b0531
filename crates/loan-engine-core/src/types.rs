use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Derived rates expressed as decimals (0.005 = 0.5% per period).
pub type Rate = Decimal;

/// Rates as the borrower enters them (6 = 6% per annum).
pub type Percent = Decimal;

// ---------------------------------------------------------------------------
// Input limits
// ---------------------------------------------------------------------------

/// Largest principal, income or balance accepted (one trillion).
pub const MAX_AMOUNT: Money = dec!(1000000000000);

/// Longest accepted loan term: 100 years.
pub const MAX_TERM_MONTHS: u32 = 1200;

/// Highest accepted annual rate, percent.
pub const MAX_ANNUAL_RATE_PCT: Percent = dec!(1000);

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
