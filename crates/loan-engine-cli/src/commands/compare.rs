use clap::Args;
use serde_json::Value;

use loan_engine_core::comparison::compare_loan_scenarios;
use loan_engine_core::LoanInputs;

use crate::input;

/// Arguments for scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    /// JSON file holding an array of loan inputs, or {"scenarios": [...]}
    #[arg(long)]
    pub input: Option<String>,

    /// Keep each scenario's full amortization schedule in the output
    #[arg(long)]
    pub with_schedules: bool,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::read_value(args.input.as_deref())?
        .ok_or("--input file (or piped JSON) is required for scenario comparison")?;

    let scenarios: Vec<LoanInputs> = match data {
        Value::Object(mut map) => {
            let list = map
                .remove("scenarios")
                .ok_or("expected a JSON array or an object with a \"scenarios\" array")?;
            serde_json::from_value(list)?
        }
        other => serde_json::from_value(other)?,
    };

    let output = compare_loan_scenarios(&scenarios)?;
    let mut value = serde_json::to_value(output)?;

    if !args.with_schedules {
        if let Some(Value::Array(results)) = value.get_mut("result") {
            for result in results.iter_mut().filter_map(Value::as_object_mut) {
                result.remove("amortization_schedule");
            }
        }
    }

    Ok(value)
}
