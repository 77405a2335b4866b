use serde_json::Value;

/// Print a one-line outcome: terminal state, months run and per-tranche losses.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Some(summary) = result_obj.get("summary").and_then(Value::as_object) else {
        println!("{}", format_minimal(result_obj));
        return;
    };

    let state = summary
        .get("terminal_state")
        .map(format_minimal)
        .unwrap_or_else(|| "unknown".to_string());
    let periods = summary
        .get("periods_run")
        .map(format_minimal)
        .unwrap_or_default();

    let losses: Vec<String> = summary
        .get("tranches")
        .and_then(Value::as_array)
        .map(|tranches| {
            tranches
                .iter()
                .filter_map(|t| {
                    let name = t.get("name")?.as_str()?;
                    let loss = t.get("total_losses").map(format_minimal)?;
                    Some(format!("{}={}", name, loss))
                })
                .collect()
        })
        .unwrap_or_default();

    if losses.is_empty() {
        println!("{} after {} months", state, periods);
    } else {
        println!("{} after {} months; losses {}", state, periods, losses.join(" "));
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
