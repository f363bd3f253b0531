use std::time::Instant;

use crate::amortization::{compute_loan, LoanInputs, LoanResult};
use crate::types::{with_metadata, ComputationOutput};
use crate::LoanEngineResult;

/// Run [`crate::calculate_loan`] over each scenario independently.
///
/// Results keep the order of `scenarios`. The first scenario that fails
/// aborts the comparison. Warnings are prefixed with the 1-based scenario
/// number they came from.
pub fn compare_loan_scenarios(
    scenarios: &[LoanInputs],
) -> LoanEngineResult<ComputationOutput<Vec<LoanResult>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let mut results: Vec<LoanResult> = Vec::with_capacity(scenarios.len());

    for (idx, inputs) in scenarios.iter().enumerate() {
        let (result, scenario_warnings) = compute_loan(inputs)?;
        warnings.extend(
            scenario_warnings
                .into_iter()
                .map(|w| format!("Scenario {}: {w}", idx + 1)),
        );
        results.push(result);
    }

    if scenarios.is_empty() {
        warnings.push("No scenarios supplied".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Independent amortization per scenario",
        &scenarios,
        warnings,
        elapsed,
        results,
    ))
}
