use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::LoanEngineError;
use crate::types::{Money, Rate};
use crate::LoanEngineResult;

/// (1 + rate)^nper
pub fn compound_factor(rate: Rate, nper: u32) -> LoanEngineResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| LoanEngineError::NumericOverflow {
            context: format!("compound factor (1 + {rate})^{nper}"),
        })
}

/// Level payment that retires `principal` over `nper` periods at a per-period `rate`.
///
/// `P · r(1+r)^n / ((1+r)^n − 1)`, or `P / n` when the rate is zero.
pub fn annuity_payment(principal: Money, rate: Rate, nper: u32) -> LoanEngineResult<Money> {
    if nper == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(LoanEngineError::DivisionByZero {
            context: "annuity payment denominator".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| LoanEngineError::NumericOverflow {
            context: format!("annuity payment on {principal} over {nper} periods"),
        })
}

/// Principal that a level `payment` supports over `nper` periods: the inverse
/// of [`annuity_payment`].
pub fn annuity_present_value(payment: Money, rate: Rate, nper: u32) -> LoanEngineResult<Money> {
    if nper == 0 {
        return Err(LoanEngineError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return payment
            .checked_mul(Decimal::from(nper))
            .ok_or_else(|| LoanEngineError::NumericOverflow {
                context: format!("present value of {payment} over {nper} periods"),
            });
    }

    let factor = compound_factor(rate, nper)?;
    let denominator = rate * factor;

    if denominator.is_zero() {
        return Err(LoanEngineError::DivisionByZero {
            context: "annuity present value denominator".into(),
        });
    }

    payment
        .checked_mul(factor - Decimal::ONE)
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| LoanEngineError::NumericOverflow {
            context: format!("annuity present value of {payment} over {nper} periods"),
        })
}
