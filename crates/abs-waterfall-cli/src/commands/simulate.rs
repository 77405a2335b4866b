use clap::Args;
use serde_json::Value;

use abs_waterfall_core::simulation::input::AbsDealInput;
use abs_waterfall_core::simulate_abs;

use crate::input;
use crate::OutputFormat;

/// Arguments for a deal simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON deal file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_simulate(
    args: SimulateArgs,
    format: &OutputFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let deal: AbsDealInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <deal.json> or stdin required for simulation".into());
    };

    let output = simulate_abs(&deal)?;

    match format {
        OutputFormat::Json | OutputFormat::Minimal => Ok(serde_json::to_value(output)?),
        // One row per month, keeping the envelope's warnings and methodology.
        OutputFormat::Table | OutputFormat::Csv => {
            let rows: Vec<Value> = output
                .result
                .periods
                .iter()
                .map(|p| Value::Object(p.to_flat_map()))
                .collect();
            let mut envelope = serde_json::to_value(&output)?;
            if let Value::Object(map) = &mut envelope {
                map.insert("result".into(), Value::Array(rows));
            }
            Ok(envelope)
        }
    }
}
